use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use robot_config::retry::RecordingSleeper;
use robot_config::{
    AssetProbe, AssetStatus, ConfigError, ConfigValidationPipeline, ErrorKind, FileSecretStore,
    FsAssetChecker, RetryPolicy, SecretResolutionError, SensorSpec, StaticEnv, StructuralError,
};
use serde_json::{Value, json};
use uuid::Uuid;

/// Scratch directory holding assets and the secret store for one test.
struct Fixture {
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = std::env::temp_dir().join(format!("robot-pipeline-{}", Uuid::new_v4()));
        std::fs::create_dir_all(root.join("assets")).unwrap();
        std::fs::create_dir_all(root.join("secrets")).unwrap();
        Self { root }
    }

    fn asset(&self, name: &str, contents: &[u8]) -> String {
        let path = self.root.join("assets").join(name);
        std::fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    fn missing_asset(&self, name: &str) -> String {
        self.root.join("assets").join(name).display().to_string()
    }

    fn secrets(&self, robot_id: &str, document: &Value) {
        let store = FileSecretStore::new(self.root.join("secrets"));
        std::fs::write(
            store.document_path(robot_id),
            serde_json::to_vec(document).unwrap(),
        )
        .unwrap();
    }

    fn secrets_dir(&self) -> PathBuf {
        self.root.join("secrets")
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Filesystem probe that counts checks per path.
#[derive(Default)]
struct CountingProbe {
    checks: Mutex<BTreeMap<PathBuf, usize>>,
}

impl CountingProbe {
    fn total(&self) -> usize {
        self.checks.lock().unwrap().values().sum()
    }

    fn count(&self, path: &str) -> usize {
        self.checks
            .lock()
            .unwrap()
            .get(Path::new(path))
            .copied()
            .unwrap_or(0)
    }
}

impl AssetProbe for CountingProbe {
    fn check(&self, path: &Path) -> AssetStatus {
        *self
            .checks
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default() += 1;
        FsAssetChecker.check(path)
    }
}

struct Harness {
    pipeline: ConfigValidationPipeline,
    probe: Arc<CountingProbe>,
    sleeper: Arc<RecordingSleeper>,
}

fn harness(fixture: &Fixture, env: StaticEnv) -> Harness {
    let probe = Arc::new(CountingProbe::default());
    let sleeper = Arc::new(RecordingSleeper::new());
    let pipeline = ConfigValidationPipeline::new(
        Arc::new(FileSecretStore::new(fixture.secrets_dir())),
        Arc::new(env),
        probe.clone(),
        sleeper.clone(),
    )
    .with_asset_policy(RetryPolicy::new(
        NonZeroU32::new(3).unwrap(),
        Duration::from_secs(5),
    ))
    .with_secret_policy(RetryPolicy::new(
        NonZeroU32::new(2).unwrap(),
        Duration::from_millis(100),
    ));
    Harness {
        pipeline,
        probe,
        sleeper,
    }
}

fn three_sensors(fixture: &Fixture) -> Value {
    json!({
        "robot_id": "robotX",
        "sensors": [
            {
                "type": "sensor_a",
                "range": 30.0,
                "wgs84_coordinates": {"lat": 52.1, "lon": 4.3},
                "bit_mask": fixture.asset("mask.bin", b"\x01\x02")
            },
            {
                "type": "sensor_b",
                "wgs84_coordinates": {"lat": 52.1, "lon": 4.3},
                "speed_km_per_h": 7.5
            },
            {
                "type": "sensor_c",
                "field_map": fixture.asset("field.map", b"grid"),
                "battery_pct": 88
            }
        ]
    })
}

#[test]
fn valid_configuration_initializes_with_every_sensor() {
    let fixture = Fixture::new();
    let harness = harness(&fixture, StaticEnv::new());

    let validated = harness
        .pipeline
        .validate_and_resolve(&three_sensors(&fixture))
        .unwrap();

    let config = validated.configuration;
    assert_eq!(config.robot_id().as_str(), "robotX");
    assert_eq!(config.version(), "1.0.0");
    assert_eq!(config.sensors().len(), 3);
    assert_eq!(config.summary().len(), 3);
    assert!(config.summary()[1].starts_with("sensor_b"));
    assert_eq!(validated.report.asset_retries, 0);
    assert!(harness.sleeper.delays().is_empty());
}

#[test]
fn missing_required_field_is_structural_and_validates_earlier_sensors_once() {
    let fixture = Fixture::new();
    let harness = harness(&fixture, StaticEnv::new());
    let mut raw = three_sensors(&fixture);
    raw["sensors"]
        .as_array_mut()
        .unwrap()
        .push(json!({"type": "sensor_a", "range": 1.0, "wgs84_coordinates": {}}));

    let err = harness.pipeline.validate_and_resolve(&raw).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert!(matches!(
        err,
        ConfigError::Structural(StructuralError::MissingSensorField {
            index: 3,
            field: "bit_mask",
            ..
        })
    ));
    assert_eq!(harness.probe.count(&fixture.missing_asset("mask.bin")), 1);
    assert_eq!(harness.probe.count(&fixture.missing_asset("field.map")), 1);
    assert_eq!(harness.probe.total(), 2);
}

#[test]
fn secret_store_value_is_substituted_verbatim() {
    let fixture = Fixture::new();
    fixture.secrets(
        "robotX",
        &json!({"sensor_a": {"wgs84_coordinates": {"lat": 1.0, "lon": 2.0}}}),
    );
    let harness = harness(&fixture, StaticEnv::new());
    let mut raw = three_sensors(&fixture);
    raw["sensors"][0]["wgs84_coordinates"] = json!("SECRET:robotX:sensor_a:wgs84_coordinates");

    let validated = harness.pipeline.validate_and_resolve(&raw).unwrap();

    let SensorSpec::SensorA { coordinates, .. } = &validated.configuration.sensors()[0] else {
        panic!("first sensor is sensor_a");
    };
    assert_eq!(coordinates.get("lat"), Some(&1.0));
    assert_eq!(coordinates.get("lon"), Some(&2.0));
    assert_eq!(coordinates.len(), 2);
}

#[test]
fn environment_fallback_supplies_asset_paths() {
    let fixture = Fixture::new();
    let field_map = fixture.asset("from-env.map", b"grid");
    let env = StaticEnv::new().with("SECRET_ROBOTX_SENSOR_C_FIELD_MAP", field_map.clone());
    let harness = harness(&fixture, env);
    let mut raw = three_sensors(&fixture);
    raw["sensors"][2]["field_map"] = json!("SECRET:robotX:sensor_c:field_map");

    let validated = harness.pipeline.validate_and_resolve(&raw).unwrap();

    let SensorSpec::SensorC { field_map_path, .. } = &validated.configuration.sensors()[2] else {
        panic!("third sensor is sensor_c");
    };
    assert_eq!(field_map_path, &field_map);
}

#[test]
fn persistently_missing_asset_sleeps_five_then_ten() {
    let fixture = Fixture::new();
    let harness = harness(&fixture, StaticEnv::new());
    let mut raw = three_sensors(&fixture);
    raw["sensors"][0]["bit_mask"] = json!(fixture.missing_asset("gone.bin"));

    let err = harness.pipeline.validate_and_resolve(&raw).unwrap_err();

    let ConfigError::Asset(asset) = err else {
        panic!("expected asset failure");
    };
    assert_eq!(asset.attempts, 3);
    assert_eq!(asset.status, AssetStatus::Missing);
    assert_eq!(
        harness.sleeper.delays(),
        vec![Duration::from_secs(5), Duration::from_secs(10)]
    );
    assert_eq!(harness.probe.total(), 3);
}

#[test]
fn malformed_reference_fails_immediately() {
    let fixture = Fixture::new();
    let harness = harness(&fixture, StaticEnv::new());
    let mut raw = three_sensors(&fixture);
    raw["sensors"][1]["wgs84_coordinates"] = json!("SECRET:onlytwo");

    let err = harness.pipeline.validate_and_resolve(&raw).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::Secret(SecretResolutionError::Malformed { .. })
    ));
    assert!(harness.sleeper.delays().is_empty());
    assert_eq!(harness.probe.total(), 0);
}

#[test]
fn unresolved_secret_retries_then_fails_before_asset_checks() {
    let fixture = Fixture::new();
    let harness = harness(&fixture, StaticEnv::new());
    let mut raw = three_sensors(&fixture);
    raw["sensors"][2]["battery_pct"] = json!("SECRET:robotX:sensor_c:battery");

    let err = harness.pipeline.validate_and_resolve(&raw).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SecretResolution);
    assert!(matches!(
        err,
        ConfigError::Secret(SecretResolutionError::Unresolved { attempts: 2, .. })
    ));
    assert_eq!(harness.sleeper.delays(), vec![Duration::from_millis(100)]);
    assert_eq!(harness.probe.total(), 0);
}

#[test]
fn unknown_sensor_type_fails_before_any_secret_or_asset_work() {
    let fixture = Fixture::new();
    let harness = harness(&fixture, StaticEnv::new());
    let mut raw = three_sensors(&fixture);
    raw["sensors"][0]["wgs84_coordinates"] = json!("SECRET:robotX:sensor_a:wgs84_coordinates");
    raw["sensors"]
        .as_array_mut()
        .unwrap()
        .push(json!({"type": "sensor_z"}));

    let err = harness.pipeline.validate_and_resolve(&raw).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::Structural(StructuralError::UnknownSensorType { index: 3, .. })
    ));
    assert!(harness.sleeper.delays().is_empty());
    assert_eq!(harness.probe.total(), 0);
}

#[test]
fn empty_asset_is_reported_as_warning() {
    let fixture = Fixture::new();
    let harness = harness(&fixture, StaticEnv::new());
    let mut raw = three_sensors(&fixture);
    raw["sensors"][2]["field_map"] = json!(fixture.asset("empty.map", b""));
    raw["version"] = json!("2.0.0");

    let validated = harness.pipeline.validate_and_resolve(&raw).unwrap();

    assert_eq!(validated.configuration.version(), "2.0.0");
    assert_eq!(validated.report.warnings.len(), 1);
    assert!(validated.report.warnings[0].contains("empty"));
}
