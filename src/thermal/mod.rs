//! Thermal suitability: climate classes, temperature profiles and the
//! screening stages that produce the thermal reduction factor `fc1`.
pub mod climate_class;
pub mod profile;
pub mod screening;
