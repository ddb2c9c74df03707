use bp_results::*;

fn manifest(run_id: &str, scenario_id: &str, timestamp: &str) -> RunManifest {
    RunManifest {
        run_id: run_id.to_string(),
        plant_name: "Test plant".to_string(),
        scenario_id: scenario_id.to_string(),
        timestamp: timestamp.to_string(),
        parameters: RunParameters {
            srt_days: 10.0,
            influent_ammonium: 50.0,
            influent_substrate: 300.0,
            step_feed_fraction: 0.15,
            integrator: "rk4".to_string(),
            dt_days: 0.001,
            warmup_days: 5.0,
            duration_days: 40.0,
            record_stride: 100,
        },
        solver_version: "v1".to_string(),
    }
}

/// Well-formed run id distinguished by `n`.
fn id(n: u8) -> String {
    format!("{n:064x}")
}

fn record(day: f64, ammonium: f64, nitrate: f64) -> TrajectoryRecord {
    TrajectoryRecord {
        day,
        temperature_c: 20.0,
        ammonium_mg_l: ammonium,
        nitrate_mg_l: nitrate,
        total_nitrogen_mg_l: ammonium + nitrate,
    }
}

#[test]
fn save_and_load_run() {
    let temp_dir = std::env::temp_dir().join("bp_results_test");
    let _ = std::fs::remove_dir_all(&temp_dir);

    let store = RunStore::new(temp_dir.clone()).unwrap();
    let run_id = id(123);
    let m = manifest(&run_id, "srt-10", "2026-02-25T12:00:00+00:00");
    let records = vec![record(0.0, 0.5, 5.0), record(0.1, 0.6, 4.9)];

    assert!(!store.has_run(&run_id));
    store.save_run(&m, &records).unwrap();
    assert!(store.has_run(&run_id));

    assert_eq!(store.load_manifest(&run_id).unwrap(), m);
    assert_eq!(store.load_timeseries(&run_id).unwrap(), records);
}

#[test]
fn missing_run_is_reported() {
    let temp_dir = std::env::temp_dir().join("bp_results_test_missing");
    let _ = std::fs::remove_dir_all(&temp_dir);
    let store = RunStore::new(temp_dir).unwrap();

    assert!(matches!(
        store.load_manifest(&id(7)),
        Err(ResultsError::RunNotFound { .. })
    ));
    assert!(matches!(
        store.load_timeseries(&id(7)),
        Err(ResultsError::RunNotFound { .. })
    ));
}

#[test]
fn list_runs_by_scenario() {
    let temp_dir = std::env::temp_dir().join("bp_results_test_list");
    let _ = std::fs::remove_dir_all(&temp_dir);

    let store = RunStore::new(temp_dir.clone()).unwrap();
    store
        .save_run(&manifest(&id(2), "a", "2026-02-25T13:00:00+00:00"), &[])
        .unwrap();
    store
        .save_run(&manifest(&id(1), "a", "2026-02-25T12:00:00+00:00"), &[])
        .unwrap();
    store
        .save_run(&manifest(&id(3), "b", "2026-02-25T14:00:00+00:00"), &[])
        .unwrap();

    let a_runs = store.list_runs(Some("a")).unwrap();
    let ids: Vec<&str> = a_runs.iter().map(|m| m.run_id.as_str()).collect();
    assert_eq!(ids, vec![id(1).as_str(), id(2).as_str()]);

    assert_eq!(store.list_runs(Some("b")).unwrap().len(), 1);
    assert_eq!(store.list_runs(None).unwrap().len(), 3);

    store.delete_run(&id(3)).unwrap();
    assert!(store.list_runs(Some("b")).unwrap().is_empty());
}

#[test]
fn store_for_plant_lives_beside_the_file() {
    let temp_dir = std::env::temp_dir().join("bp_results_test_for_plant");
    let _ = std::fs::remove_dir_all(&temp_dir);
    std::fs::create_dir_all(&temp_dir).unwrap();

    let store = RunStore::for_plant(&temp_dir.join("plant.yaml")).unwrap();
    assert_eq!(store.root_dir(), temp_dir.join(".bardenpho").join("runs"));
    assert!(store.root_dir().exists());
}

#[test]
fn manifest_with_a_path_for_an_id_is_not_saved() {
    let temp_dir = std::env::temp_dir().join("bp_results_test_bad_id");
    let _ = std::fs::remove_dir_all(&temp_dir);
    let store = RunStore::new(temp_dir.clone()).unwrap();

    let m = manifest("../escaped", "a", "2026-02-25T12:00:00+00:00");
    assert!(matches!(
        store.save_run(&m, &[record(0.0, 1.0, 1.0)]),
        Err(ResultsError::InvalidRunId { .. })
    ));
    assert!(!temp_dir.join("..").join("escaped").exists());
    assert!(!store.has_run("../escaped"));
}
