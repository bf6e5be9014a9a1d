use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use robot_config::retry::RecordingSleeper;
use robot_config::secrets::SecretStoreError;
use robot_config::{
    AssetProbe, AssetStatus, ConfigValidationPipeline, ErrorKind, SecretStore, StaticEnv,
};
use robot_kernel::{KernelError, LifecycleError, RobotKernel, RobotState};
use robot_telemetry::RuntimeCounters;
use serde_json::{Value, json};

#[derive(Default)]
struct MemoryStore {
    documents: BTreeMap<String, Value>,
}

impl SecretStore for MemoryStore {
    fn load(&self, robot_id: &str) -> Result<Option<Value>, SecretStoreError> {
        Ok(self.documents.get(robot_id).cloned())
    }
}

/// Reports every asset present except paths containing `missing`.
struct NamedProbe;

impl AssetProbe for NamedProbe {
    fn check(&self, path: &Path) -> AssetStatus {
        if path.to_string_lossy().contains("missing") {
            AssetStatus::Missing
        } else {
            AssetStatus::Ok
        }
    }
}

fn pipeline() -> ConfigValidationPipeline {
    ConfigValidationPipeline::new(
        Arc::new(MemoryStore::default()),
        Arc::new(StaticEnv::new()),
        Arc::new(NamedProbe),
        Arc::new(RecordingSleeper::new()),
    )
}

fn config(mask: &str) -> Value {
    json!({
        "robot_id": "robot7",
        "version": "3.2.1",
        "sensors": [
            {
                "type": "sensor_a",
                "range": 5.0,
                "wgs84_coordinates": {"lat": 1.0},
                "bit_mask": mask
            },
            {"type": "sensor_b", "wgs84_coordinates": {}, "speed_km_per_h": 2.0}
        ]
    })
}

#[test]
fn starting_kernel_serves_root_only() {
    let counters = Arc::new(RuntimeCounters::new());
    let kernel = RobotKernel::new(Arc::clone(&counters));

    let root = serde_json::to_value(kernel.root()).unwrap();
    assert_eq!(
        root,
        json!({
            "message": "Robot Fleet Management System",
            "robot_id": "unknown",
            "status": "initializing"
        })
    );
    assert!(matches!(kernel.health(), Err(KernelError::NotInitialized)));
    assert!(matches!(kernel.status(), Err(KernelError::NotInitialized)));
    assert_eq!(counters.health_checks(), 1);
}

#[test]
fn bootstrap_installs_configuration() {
    let counters = Arc::new(RuntimeCounters::new());
    let mut kernel = RobotKernel::new(Arc::clone(&counters));

    let configuration = kernel.bootstrap(&pipeline(), &config("/assets/mask.bin")).unwrap();

    assert_eq!(kernel.state(), RobotState::Initialized);
    assert_eq!(configuration.robot_id().as_str(), "robot7");
    assert_eq!(kernel.root().status, "running");
    assert_eq!(kernel.root().robot_id, "robot7");

    let health = serde_json::to_value(kernel.health().unwrap()).unwrap();
    assert_eq!(health, json!({"status": "healthy", "robot_id": "robot7"}));

    let status = kernel.status().unwrap();
    assert_eq!(status.version, "3.2.1");
    assert_eq!(status.sensors.len(), 2);
    assert!(status.sensors[0].starts_with("sensor_a"));
    assert!(status.initialized);
    assert_eq!(counters.health_checks(), 1);
}

#[test]
fn rejected_configuration_leaves_kernel_failed() {
    let counters = Arc::new(RuntimeCounters::new());
    let mut kernel = RobotKernel::new(Arc::clone(&counters));

    let err = kernel
        .bootstrap(&pipeline(), &config("/assets/missing.bin"))
        .unwrap_err();

    let KernelError::Config(config_err) = &err else {
        panic!("expected configuration failure");
    };
    assert_eq!(config_err.kind(), ErrorKind::AssetValidation);
    assert!(err.to_string().starts_with("failed to initialize robot"));
    assert_eq!(kernel.state(), RobotState::Failed);
    assert!(kernel.configuration().is_none());
    assert_eq!(kernel.root().status, "initializing");
    assert!(matches!(kernel.health(), Err(KernelError::NotInitialized)));
}

#[test]
fn second_bootstrap_is_rejected_without_revalidating() {
    let counters = Arc::new(RuntimeCounters::new());
    let mut kernel = RobotKernel::new(counters);
    kernel.bootstrap(&pipeline(), &config("/assets/mask.bin")).unwrap();

    let err = kernel
        .bootstrap(&pipeline(), &config("/assets/missing.bin"))
        .unwrap_err();

    assert!(matches!(
        err,
        KernelError::Lifecycle(LifecycleError::InvalidTransition {
            from: RobotState::Initialized,
            ..
        })
    ));
    assert_eq!(kernel.state(), RobotState::Initialized);
}

#[test]
fn runtime_errors_are_recorded_without_state_change() {
    let counters = Arc::new(RuntimeCounters::new());
    let mut kernel = RobotKernel::new(Arc::clone(&counters));
    kernel.bootstrap(&pipeline(), &config("/assets/mask.bin")).unwrap();

    kernel.record_runtime_error("status serialization failed");

    assert_eq!(kernel.state(), RobotState::Initialized);
    assert_eq!(
        counters.snapshot().errors,
        vec!["status serialization failed".to_owned()]
    );
}
