//! Growing-period engine.
//!
//! A daily soil-moisture bucket with snow storage yields the length of
//! growing period (LGP); simple temperature counts yield LGPt5 and LGPt10.
pub mod constants;
pub mod processes;
pub mod run;

pub use run::{
    GrowingPeriod, GrowingPeriodGrids, growing_period, growing_period_grids,
    length_of_growing_period,
};
