pub mod biomass;
pub mod config;
pub mod crop_params;
pub mod crop_water;
pub mod cycle_length;
pub mod daily_inputs;
pub mod error;
pub mod grid;
pub mod growing_period;
pub mod permafrost;
pub mod pipeline;
pub mod simulation;
pub mod soil_water;
pub mod thermal;

pub use config::{Screening, SimulationConfig, Sweep};
pub use crop_params::{CropLibrary, CropParams, CropRecord};
pub use daily_inputs::{ClimateGrid, DailyClimate};
pub use error::{ConfigError, SimulationError};
pub use grid::{StudyMask, latitude_map};
pub use growing_period::{GrowingPeriodGrids, growing_period_grids};
pub use simulation::{CropSimulation, SimulationInputs, SimulationOutputs};
pub use soil_water::SoilWaterParams;
