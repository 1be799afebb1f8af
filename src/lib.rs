use crate::api::scenario_dto::ScenarioDto;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads a scenario description from a JSON file.
pub fn load_scenario(file_path: &str) -> Result<ScenarioDto> {
    let scenario: ScenarioDto = parse_json_file::<ScenarioDto>(file_path)?;
    log::info!("Scenario file parsed successfully: {} nodes.", scenario.nodes.len());
    Ok(scenario)
}
