pub mod scenario_dto;
