pub mod activation;
pub mod command;
pub mod config;
pub mod finalizer;
pub mod launcher;
pub mod matcher;
pub mod monitor;
pub mod node;
pub mod session;
pub mod topology;
