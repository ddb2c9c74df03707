use std::path::Path;

#[test]
fn bundled_plants_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../plants");
    for name in ["winter_shock.yaml"] {
        let path = root.join(name);
        let plant = bp_project::load_yaml(&path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        assert!(!plant.scenarios.is_empty());
        assert!(plant.scenario("srt-20").is_some());
    }
}
