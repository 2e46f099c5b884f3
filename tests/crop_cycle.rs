//! End-to-end crop-cycle runs on small synthetic grids.
//!
//! Run: cargo test --test crop_cycle

use std::sync::atomic::AtomicBool;

use agro_cycle::biomass::{BiomassCrop, BiomassModel};
use agro_cycle::config::PermafrostScreening;
use agro_cycle::crop_water::{
    CropWaterModel, StagedWaterBalance, WaterLimitedYield, WaterRequest,
};
use agro_cycle::daily_inputs::ClimateWindow;
use agro_cycle::permafrost::{PermafrostClass, permafrost_grids};
use agro_cycle::{
    ClimateGrid, ConfigError, CropLibrary, CropSimulation, DailyClimate, GrowingPeriodGrids, SimulationConfig,
    SimulationError, SimulationInputs, SimulationOutputs, SoilWaterParams, StudyMask, Sweep,
    growing_period_grids,
    latitude_map,
};
use approx::assert_abs_diff_eq;
use nalgebra::DMatrix;

const LIBRARY: &str = r#"
[maize]
lai = 3.0
hi = 0.45
legume = false
adaptability = 3
cycle_len = 120
min_cycle_len = 90
max_cycle_len = 365
d1 = 0.3
d2 = 1.2
min_temp = 10.0
a_lai = 0.0
b_lai = 1.0
a_hi = 0.0
b_hi = 1.0
height = 2.0
perennial = false
stage_per = [15.0, 30.0, 35.0, 20.0]
kc = [0.4, 1.2, 0.6]
kc_all = 0.9
yloss_f = [0.4, 1.5, 0.5, 0.2]
yloss_f_all = 1.25

[olive]
lai = 3.0
hi = 0.45
legume = false
adaptability = 1
cycle_len = 200
min_cycle_len = 100
max_cycle_len = 300
d1 = 1.0
d2 = 1.5
min_temp = 5.0
a_lai = 100.0
b_lai = 200.0
a_hi = 50.0
b_hi = 250.0
height = 4.0
perennial = true
stage_per = [25.0, 25.0, 25.0, 25.0]
kc = [0.6, 0.7, 0.65]
kc_all = 0.65
yloss_f = [0.5, 0.5, 0.5, 0.5]
yloss_f_all = 1.0

[warm_maize]
lai = 3.0
hi = 0.45
legume = false
adaptability = 3
cycle_len = 120
min_cycle_len = 90
max_cycle_len = 365
d1 = 0.3
d2 = 1.2
min_temp = 10.0
a_lai = 0.0
b_lai = 1.0
a_hi = 0.0
b_hi = 1.0
height = 2.0
perennial = false
stage_per = [15.0, 30.0, 35.0, 20.0]
kc = [0.4, 1.2, 0.6]
kc_all = 0.9
yloss_f = [0.4, 1.5, 0.5, 0.2]
yloss_f_all = 1.25

[warm_maize.tsum]
lns = 500.0
lso = 700.0
lo = 1000.0
ho = 2000.0
hso = 3500.0
hns = 4500.0
"#;

fn crop_config(name: &str) -> SimulationConfig {
    let library = CropLibrary::from_toml_str(LIBRARY).unwrap();
    SimulationConfig::from_record(&library.crop(name).unwrap())
}

fn climate(min_t: f64, max_t: f64, precip: f64) -> DailyClimate {
    DailyClimate {
        min_t: vec![min_t; 365],
        max_t: vec![max_t; 365],
        precip: vec![precip; 365],
        short_rad: vec![220.0; 365],
        wind: vec![2.0; 365],
        rel_humidity: vec![0.6; 365],
        pet: vec![4.0; 365],
    }
}

fn uniform_grid(height: usize, width: usize, cell: DailyClimate) -> ClimateGrid {
    ClimateGrid::new(height, width, vec![cell; height * width]).unwrap()
}

fn growing(height: usize, width: usize, lgp: f64, lgpt5: f64, lgpt10: f64) -> GrowingPeriodGrids {
    GrowingPeriodGrids {
        lgp: DMatrix::from_element(height, width, lgp),
        lgpt5: DMatrix::from_element(height, width, lgpt5),
        lgpt10: DMatrix::from_element(height, width, lgpt10),
    }
}

fn run_with<B: BiomassModel, W: CropWaterModel>(
    simulation: &CropSimulation<B, W>,
    climate: &ClimateGrid,
    growing: &GrowingPeriodGrids,
) -> Result<SimulationOutputs, SimulationError> {
    let (height, width) = climate.shape();
    let latitude = latitude_map(-5.0, 5.0, height, width);
    simulation.run(
        &SimulationInputs {
            climate,
            latitude: &latitude,
            growing,
        },
        None,
    )
}

fn run(
    config: SimulationConfig,
    climate: &ClimateGrid,
    growing: &GrowingPeriodGrids,
) -> Result<SimulationOutputs, SimulationError> {
    run_with(&CropSimulation::new(config), climate, growing)
}

fn coarse_sweep() -> Sweep {
    Sweep {
        step_doy: 30,
        ..Sweep::default()
    }
}

// Potential yield independent of the window
struct FixedBiomass(f64);

impl BiomassModel for FixedBiomass {
    fn potential_yield(&self, _: &ClimateWindow<'_>, _: &BiomassCrop, _: f64) -> f64 {
        self.0
    }
}

#[test]
fn scenario_a_annual_crop_uses_nominal_cycle_length() {
    let mut config = crop_config("maize");
    config.sweep = coarse_sweep();
    let grid = uniform_grid(1, 1, climate(20.0, 30.0, 6.0));
    let out = run(config, &grid, &growing(1, 1, 200.0, 150.0, 150.0)).unwrap();

    assert_eq!(out.cycle_len_rainfed[(0, 0)], 120.0);
    assert_eq!(out.cycle_len_irrigated[(0, 0)], 120.0);
    assert!(out.yield_rainfed[(0, 0)] > 0.0);
    assert!(out.yield_irrigated[(0, 0)] > 0.0);
}

#[test]
fn scenario_b_short_perennial_season_yields_nothing_rainfed() {
    let mut config = crop_config("olive");
    config.sweep = coarse_sweep();
    let grid = uniform_grid(1, 1, climate(12.0, 24.0, 3.0));
    let out = run(config, &grid, &growing(1, 1, 80.0, 365.0, 365.0)).unwrap();

    assert_eq!(out.cycle_len_rainfed[(0, 0)], 0.0);
    assert_eq!(out.yield_rainfed[(0, 0)], 0.0);
    assert_eq!(out.fc2[(0, 0)], 0.0);
    assert_eq!(out.cycle_len_irrigated[(0, 0)], 300.0);
}

#[test]
fn scenario_c_long_perennial_season_is_capped() {
    let mut config = crop_config("olive");
    config.sweep = coarse_sweep();
    let grid = uniform_grid(1, 1, climate(12.0, 24.0, 3.0));
    let out = run(config, &grid, &growing(1, 1, 350.0, 365.0, 365.0)).unwrap();

    assert_eq!(out.cycle_len_rainfed[(0, 0)], 300.0);
    assert!(out.yield_irrigated[(0, 0)] > 0.0);
    assert!(out.yield_rainfed[(0, 0)] <= out.yield_irrigated[(0, 0)]);
}

#[test]
fn scenario_d_permafrost_cells_are_skipped() {
    assert_eq!(PermafrostClass::from_frost_index(0.70), PermafrostClass::Continuous);
    assert_eq!(PermafrostClass::from_frost_index(0.50), PermafrostClass::Sporadic);
    assert_eq!(PermafrostClass::from_frost_index(0.40), PermafrostClass::None);

    let cells = vec![climate(-20.0, -5.0, 1.0), climate(20.0, 30.0, 6.0)];
    let grid = ClimateGrid::new(1, 2, cells).unwrap();
    let frost = permafrost_grids(&grid, None, f64::NAN).unwrap();
    assert_eq!(frost.class[(0, 0)], 1.0);
    assert_eq!(frost.class[(0, 1)], 4.0);

    let mut config = crop_config("maize");
    config.sweep = coarse_sweep();
    config.screening.permafrost = Some(PermafrostScreening {
        classes: frost.class,
    });
    let out = run(config, &grid, &growing(1, 2, 365.0, 365.0, 365.0)).unwrap();
    assert_eq!(out.yield_irrigated[(0, 0)], 0.0);
    assert_eq!(out.start_day_irrigated[(0, 0)], 0.0);
    assert_eq!(out.cycle_len_irrigated[(0, 0)], 0.0);
    assert!(out.yield_irrigated[(0, 1)] > 0.0);
}

#[test]
fn scenario_e_unscreened_run_keeps_fc1_at_one() {
    let mut config = crop_config("maize");
    config.sweep = coarse_sweep();
    let cells = vec![
        climate(20.0, 30.0, 6.0),
        climate(20.0, 30.0, 1.0),
        climate(18.0, 34.0, 3.0),
        climate(22.0, 28.0, 0.5),
    ];
    let grid = ClimateGrid::new(2, 2, cells).unwrap();
    let out = run(config, &grid, &growing(2, 2, 365.0, 365.0, 365.0)).unwrap();

    for at in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        assert_eq!(out.fc1_rainfed[at], 1.0);
        assert_eq!(out.fc1_irrigated[at], 1.0);
        assert!((0.0..=1.0).contains(&out.fc2[at]));
        assert!(out.yield_rainfed[at] >= 0.0);
        assert!(out.yield_rainfed[at] <= out.yield_irrigated[at] + 1e-9);
    }
    assert!(out.fc2[(0, 0)] > out.fc2[(1, 1)]);
}

#[test]
fn growing_period_grids_feed_the_simulation() {
    let mut config = crop_config("maize");
    config.sweep = coarse_sweep();
    let cells = vec![climate(20.0, 30.0, 8.0), climate(20.0, 30.0, 0.0)];
    let grid = ClimateGrid::new(2, 1, cells).unwrap();
    let growing = growing_period_grids(&grid, None, f64::NAN).unwrap();
    assert_eq!(growing.lgp[(0, 0)], 365.0);
    assert_eq!(growing.lgp[(1, 0)], 0.0);

    let out = run(config, &grid, &growing).unwrap();
    assert_eq!(out.cycle_len_rainfed[(0, 0)], 120.0);
    assert_eq!(out.cycle_len_rainfed[(1, 0)], 0.0);
    assert_eq!(out.yield_rainfed[(1, 0)], 0.0);
    assert!(out.yield_irrigated[(1, 0)] > 0.0);
}

#[test]
fn masked_cells_hold_no_data() {
    let mut config = crop_config("maize");
    config.sweep = coarse_sweep();
    config.no_data = -9999.0;
    config.mask = Some(StudyMask::new(DMatrix::from_row_slice(
        1,
        2,
        &[true, false],
    )));
    let grid = uniform_grid(1, 2, climate(20.0, 30.0, 6.0));
    let out = run(config, &grid, &growing(1, 2, 365.0, 365.0, 365.0)).unwrap();

    assert!(out.yield_rainfed[(0, 0)] > 0.0);
    for grid in [
        &out.yield_rainfed,
        &out.yield_irrigated,
        &out.start_day_rainfed,
        &out.start_day_irrigated,
        &out.fc1_rainfed,
        &out.fc1_irrigated,
        &out.fc2,
        &out.cycle_len_rainfed,
        &out.cycle_len_irrigated,
    ] {
        assert_eq!(grid[(0, 1)], -9999.0);
    }
}

#[test]
fn repeated_runs_are_identical() {
    let mut config = crop_config("maize");
    config.sweep = coarse_sweep();
    let cells: Vec<DailyClimate> = (0..9)
        .map(|i| climate(15.0 + i as f64, 27.0 + i as f64, 0.5 * i as f64))
        .collect();
    let grid = ClimateGrid::new(3, 3, cells).unwrap();
    let growing = growing_period_grids(&grid, None, f64::NAN).unwrap();

    let simulation = CropSimulation::new(config);
    let first = run_with(&simulation, &grid, &growing).unwrap();
    let second = run_with(&simulation, &grid, &growing).unwrap();
    assert_eq!(first.yield_rainfed, second.yield_rainfed);
    assert_eq!(first.start_day_rainfed, second.start_day_rainfed);
    assert_eq!(first.fc2, second.fc2);
    assert_eq!(first.yield_irrigated, second.yield_irrigated);
}

#[test]
fn equal_yields_pick_the_earliest_day() {
    let mut config = crop_config("maize");
    config.sweep = Sweep {
        start_doy: 5,
        end_doy: 300,
        step_doy: 7,
        leap_year: false,
    };
    let simulation = CropSimulation::with_models(config, FixedBiomass(5_000.0), StagedWaterBalance);
    let grid = uniform_grid(1, 1, climate(20.0, 30.0, 3.0));
    let out = run_with(&simulation, &grid, &growing(1, 1, 365.0, 365.0, 365.0)).unwrap();

    assert_eq!(out.start_day_rainfed[(0, 0)], 5.0);
    assert_eq!(out.start_day_irrigated[(0, 0)], 5.0);
    assert_eq!(out.yield_irrigated[(0, 0)], 5_000.0);
}

#[test]
fn cold_start_days_are_gated() {
    let config = crop_config("maize");
    let mut cell = climate(20.0, 30.0, 6.0);
    for day in 0..180 {
        cell.min_t[day] = 0.0;
        cell.max_t[day] = 10.0;
    }
    let simulation = CropSimulation::with_models(config, FixedBiomass(5_000.0), StagedWaterBalance);
    let grid = uniform_grid(1, 1, cell);
    let out = run_with(&simulation, &grid, &growing(1, 1, 365.0, 365.0, 365.0)).unwrap();

    assert_eq!(out.start_day_rainfed[(0, 0)], 181.0);
    assert_eq!(out.start_day_irrigated[(0, 0)], 181.0);
}

#[test]
fn year_round_cold_cell_never_plants() {
    let mut config = crop_config("maize");
    config.sweep = coarse_sweep();
    let grid = uniform_grid(1, 1, climate(0.0, 10.0, 6.0));
    let out = run(config, &grid, &growing(1, 1, 365.0, 365.0, 365.0)).unwrap();

    assert_eq!(out.yield_rainfed[(0, 0)], 0.0);
    assert_eq!(out.yield_irrigated[(0, 0)], 0.0);
    assert_eq!(out.fc1_rainfed[(0, 0)], 0.0);
    assert_eq!(out.start_day_rainfed[(0, 0)], 1.0);
}

#[test]
fn tsum_screening_lowers_fc1() {
    let mut config = crop_config("warm_maize");
    config.sweep = coarse_sweep();
    let grid = uniform_grid(1, 1, climate(20.0, 30.0, 6.0));
    let out = run(config, &grid, &growing(1, 1, 365.0, 365.0, 365.0)).unwrap();

    // 120 days at 25 C accumulate 3000 C day, between HO and HsO
    assert_abs_diff_eq!(out.fc1_irrigated[(0, 0)], 1.0 - 0.25 * 1000.0 / 1500.0, epsilon = 1e-9);
    assert_abs_diff_eq!(out.fc1_rainfed[(0, 0)], out.fc1_irrigated[(0, 0)], epsilon = 1e-9);
}

#[test]
fn raised_cancel_flag_stops_the_run() {
    let simulation = CropSimulation::new(crop_config("maize"));
    let grid = uniform_grid(2, 2, climate(20.0, 30.0, 6.0));
    let growing = growing(2, 2, 365.0, 365.0, 365.0);
    let latitude = latitude_map(0.0, 1.0, 2, 2);
    let cancel = AtomicBool::new(true);
    let result = simulation.run(
        &SimulationInputs {
            climate: &grid,
            latitude: &latitude,
            growing: &growing,
        },
        Some(&cancel),
    );
    assert!(matches!(result, Err(SimulationError::Cancelled)));
}

#[test]
fn undefined_collaborator_output_aborts() {
    let mut config = crop_config("maize");
    config.sweep = coarse_sweep();
    let simulation = CropSimulation::with_models(config, FixedBiomass(f64::NAN), StagedWaterBalance);
    let grid = uniform_grid(1, 1, climate(20.0, 30.0, 6.0));
    let result = run_with(&simulation, &grid, &growing(1, 1, 365.0, 365.0, 365.0));
    assert!(matches!(
        result,
        Err(SimulationError::ContractViolation { row: 0, col: 0, day: 1, .. })
    ));
}

#[test]
fn mismatched_latitude_is_a_config_error() {
    let simulation = CropSimulation::new(crop_config("maize"));
    let grid = uniform_grid(2, 2, climate(20.0, 30.0, 6.0));
    let growing = growing(2, 2, 365.0, 365.0, 365.0);
    let latitude = latitude_map(0.0, 1.0, 3, 2);
    let result = simulation.run(
        &SimulationInputs {
            climate: &grid,
            latitude: &latitude,
            growing: &growing,
        },
        None,
    );
    assert!(matches!(result, Err(SimulationError::Config(_))));
}

// Reports more water-limited yield than the potential allows
struct OvershootingWater;

impl CropWaterModel for OvershootingWater {
    fn water_limited(
        &self,
        _: &ClimateWindow<'_>,
        request: &WaterRequest<'_>,
    ) -> WaterLimitedYield {
        WaterLimitedYield {
            yield_kg_ha: 1.5 * request.potential_yield,
            fc2: 1.5,
        }
    }
}

#[test]
fn out_of_range_collaborator_output_aborts() {
    let mut config = crop_config("maize");
    config.sweep = coarse_sweep();
    let simulation = CropSimulation::with_models(config, FixedBiomass(4_000.0), OvershootingWater);
    let grid = uniform_grid(1, 1, climate(20.0, 30.0, 6.0));
    let result = run_with(&simulation, &grid, &growing(1, 1, 365.0, 365.0, 365.0));
    assert!(matches!(
        result,
        Err(SimulationError::ContractViolation { row: 0, col: 0, day: 1, .. })
    ));
}

#[test]
fn undefined_soil_capacity_fails_before_any_cell() {
    let grid = uniform_grid(1, 1, climate(20.0, 30.0, 3.0));
    for sa in [f64::NAN, -50.0] {
        let mut config = crop_config("maize");
        config.sweep = coarse_sweep();
        config.soil = SoilWaterParams::with_capacity_grid(DMatrix::from_element(1, 1, sa), 0.5);
        let result = run(config, &grid, &growing(1, 1, 365.0, 365.0, 365.0));
        assert!(
            matches!(result, Err(SimulationError::Config(ConfigError::InvalidSoil(_)))),
            "Sa = {sa} accepted"
        );
    }
}

#[test]
fn masked_no_data_soil_capacity_is_ignored() {
    let mut config = crop_config("maize");
    config.sweep = coarse_sweep();
    config.soil = SoilWaterParams::with_capacity_grid(
        DMatrix::from_row_slice(1, 2, &[100.0, -9999.0]),
        0.5,
    );
    config.mask = Some(StudyMask::new(DMatrix::from_row_slice(1, 2, &[true, false])));
    let grid = uniform_grid(1, 2, climate(20.0, 30.0, 6.0));
    let out = run(config, &grid, &growing(1, 2, 365.0, 365.0, 365.0)).unwrap();
    assert!(out.yield_rainfed[(0, 0)] > 0.0);
}
