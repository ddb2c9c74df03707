//! End-to-end runs of the reference plant under the winter shock.

use bp_asm1::{
    BardenphoModel, Engine, EngineConfig, EngineError, Influent, NumericsConfig, Phase,
    PlantGeometry, SecondStageFlow, SimulationRequest, TemperatureSchedule, Trajectory,
    run_simulation,
};
use bp_sim::{IntegratorType, SimProgress};

const LIMIT_TN: f64 = 8.0;

fn run(srt: f64) -> Trajectory {
    run_simulation(srt, 50.0).unwrap()
}

fn pre_shock_peak_ammonium(t: &Trajectory) -> f64 {
    t.before(15.0).map(|r| r.ammonium).fold(0.0, f64::max)
}

#[test]
fn short_srt_washes_out_nitrifiers() {
    let t = run(5.0);
    let last = t.last().unwrap();
    let pre = pre_shock_peak_ammonium(&t);

    assert!(last.total_nitrogen > LIMIT_TN, "TN {}", last.total_nitrogen);
    assert!(last.ammonium > last.nitrate);
    assert!(last.ammonium > 5.0 * pre, "final {} vs pre-shock {pre}", last.ammonium);
    assert!(t.peak_ammonium().unwrap().ammonium >= last.ammonium);
}

#[test]
fn long_srt_holds_the_limit() {
    let t = run(20.0);
    let last = t.last().unwrap();
    assert!(last.total_nitrogen < LIMIT_TN, "TN {}", last.total_nitrogen);
    assert!(last.ammonium < 2.0);
    assert!(last.nitrate > last.ammonium);
}

#[test]
fn ten_day_srt_narrowly_misses_the_limit() {
    let last = *run(10.0).last().unwrap();
    assert!(last.total_nitrogen > LIMIT_TN, "TN {}", last.total_nitrogen);
    assert!((last.total_nitrogen - 8.66).abs() < 0.2, "TN {}", last.total_nitrogen);
}

fn run_net_of_recycle(srt: f64) -> Trajectory {
    let config = EngineConfig {
        geometry: PlantGeometry {
            second_stage_flow: SecondStageFlow::NetOfRecycle,
            ..PlantGeometry::default()
        },
        ..EngineConfig::default()
    };
    Engine::new(config)
        .unwrap()
        .run(&SimulationRequest::new(srt, 50.0))
        .unwrap()
}

#[test]
fn net_of_recycle_accounting_matches_legacy_results() {
    // Slower R2 turnover keeps more nitrifiers in the aerobic stage.
    let ten = *run_net_of_recycle(10.0).last().unwrap();
    assert!(ten.total_nitrogen < LIMIT_TN, "TN {}", ten.total_nitrogen);
    assert!((ten.total_nitrogen - 6.22).abs() < 0.15, "TN {}", ten.total_nitrogen);

    let five = *run_net_of_recycle(5.0).last().unwrap();
    assert!((five.ammonium - 26.07).abs() < 0.5, "NH4 {}", five.ammonium);
    assert!((five.total_nitrogen - 26.99).abs() < 0.5, "TN {}", five.total_nitrogen);
    assert!(five.ammonium > five.nitrate);
}

#[test]
fn longer_srt_gives_lower_final_ammonium() {
    let finals: Vec<f64> = [5.0, 15.0, 25.0]
        .into_iter()
        .map(|srt| run(srt).last().unwrap().ammonium)
        .collect();
    assert!(finals[0] > finals[1], "{finals:?}");
    assert!(finals[1] > finals[2], "{finals:?}");
}

#[test]
fn output_cadence_and_bounds() {
    let t = run(10.0);
    assert_eq!(t.len(), NumericsConfig::default().expected_records());
    assert_eq!(t.len(), 401);

    let first = t.first().unwrap();
    let last = t.last().unwrap();
    assert_eq!(first.day, 0.0);
    assert!((last.day - 40.0).abs() < 1e-9);
    assert!((first.temperature_c - 20.0).abs() < 1e-6);
    assert!((last.temperature_c - 10.0).abs() < 1e-6);

    for pair in t.records.windows(2) {
        assert!(pair[1].day > pair[0].day);
        assert!(pair[1].temperature_c <= pair[0].temperature_c);
        assert!(((pair[1].day - pair[0].day) - 0.1).abs() < 1e-9);
    }

    let midpoint = t
        .iter()
        .find(|r| (r.day - 15.5).abs() < 1e-9)
        .unwrap();
    assert!((midpoint.temperature_c - 15.0).abs() < 1e-9);

    // Day 0 is the warmed state, not the seed.
    assert_eq!(first.ammonium, t.warmed_state.last().s_nh());
    assert_eq!(last.ammonium, t.final_state.last().s_nh());

    assert!(t.is_non_negative());
    for r in t.iter() {
        assert!(r.ammonium >= 1e-4 && r.nitrate >= 1e-4);
        assert_eq!(r.total_nitrogen, r.ammonium + r.nitrate);
    }
    assert!(t.final_state.min_component() >= 1e-4);
}

#[test]
fn runs_are_deterministic() {
    let engine = Engine::with_defaults().unwrap();
    let request = SimulationRequest::new(12.0, 40.0);
    let a = engine.run(&request).unwrap();
    let b = engine.run(&request).unwrap();
    assert_eq!(a, b);
}

#[test]
fn warm_up_reaches_a_pseudo_steady_state() {
    let engine = Engine::with_defaults().unwrap();
    let request = SimulationRequest::new(20.0, 50.0);
    let config = engine.config();
    let seed = config.seed.plant(50.0);

    let derivative_at = |x: &bp_asm1::PlantState| {
        BardenphoModel::new(
            &config.params,
            engine.topology(),
            Influent {
                ammonium: 50.0,
                substrate: config.default_substrate,
            },
            20.0,
            TemperatureSchedule::constant(20.0),
            seed,
        )
        .derivative(0.0, x)
        .max_abs()
    };

    let day5 = engine.warm_up(&request).unwrap();
    let day10 = engine.warm_up_for(&request, 10.0).unwrap();

    assert!(derivative_at(&day5) < 0.02 * derivative_at(&seed));
    assert!(day10.max_abs_diff(&day5) < 0.2 * day5.max_abs_diff(&seed));

    let (r5, r10) = (day5.last(), day10.last());
    assert!((r10.s_nh() - r5.s_nh()).abs() < 0.5);
    assert!((r10.s_no() - r5.s_no()).abs() < 0.5);
    assert!((r10.s_s() - r5.s_s()).abs() < 0.5);
}

#[test]
fn invalid_requests_fail_before_integrating() {
    for (srt, nh4) in [(0.0, 50.0), (-2.0, 50.0), (f64::NAN, 50.0), (10.0, -1.0)] {
        let err = run_simulation(srt, nh4).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }), "{err}");
    }
}

#[test]
fn euler_agrees_with_rk4_at_the_reference_step() {
    let rk4 = run(20.0);
    let euler = Engine::new(EngineConfig {
        numerics: NumericsConfig {
            integrator: IntegratorType::ForwardEuler,
            ..NumericsConfig::default()
        },
        ..EngineConfig::default()
    })
    .unwrap()
    .run(&SimulationRequest::new(20.0, 50.0))
    .unwrap();

    assert_eq!(rk4.len(), euler.len());
    let (a, b) = (rk4.last().unwrap(), euler.last().unwrap());
    assert!((a.total_nitrogen - b.total_nitrogen).abs() < 0.05);
}

#[test]
fn oversized_step_reports_divergence() {
    let engine = Engine::new(EngineConfig {
        numerics: NumericsConfig {
            dt: 0.05,
            record_stride: 2,
            ..NumericsConfig::default()
        },
        ..EngineConfig::default()
    })
    .unwrap();
    let err = engine.run(&SimulationRequest::new(20.0, 50.0)).unwrap_err();
    assert!(matches!(err, EngineError::Diverged { .. }), "{err}");
}

#[test]
fn progress_covers_both_phases() {
    let engine = Engine::new(EngineConfig {
        numerics: NumericsConfig {
            warmup_days: 0.5,
            duration_days: 1.0,
            ..NumericsConfig::default()
        },
        ..EngineConfig::default()
    })
    .unwrap();

    let mut warming = 0_usize;
    let mut recording = 0_usize;
    let mut last_fraction = 0.0;
    let mut cb = |phase: Phase, p: &SimProgress| match phase {
        Phase::WarmingUp => warming += 1,
        Phase::Recording => {
            recording += 1;
            last_fraction = p.fraction_complete();
        }
    };
    let t = engine
        .run_with_progress(&SimulationRequest::new(10.0, 50.0), Some(&mut cb))
        .unwrap();

    assert_eq!(warming, 500);
    assert_eq!(recording, 1000);
    assert_eq!(last_fraction, 1.0);
    assert_eq!(t.len(), 11);
}
