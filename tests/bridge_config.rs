use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use ha_package_vision::config::{BridgeConfig, CONFIG_PATH_VAR, REQUIRED_VARS};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in REQUIRED_VARS {
        std::env::remove_var(key);
    }
    for key in [
        CONFIG_PATH_VAR,
        "MIN_CONFIDENCE",
        "MIN_X",
        "HA_ENTITY_ID",
        "MAX_FPS",
        "INFERENCE_API_URL",
        "WORKFLOW_OUTPUT",
        "HTTP_TIMEOUT_SECS",
    ] {
        std::env::remove_var(key);
    }
}

fn set_required_env() {
    std::env::set_var("VIDEO_FEED", "http://camera.local/snapshot.jpg");
    std::env::set_var("API_KEY", "rf_key");
    std::env::set_var("WORKSPACE_NAME", "home");
    std::env::set_var("WORKFLOW_ID", "package-detection");
    std::env::set_var("ACCESS_TOKEN", "ha_token");
    std::env::set_var("HOME_ASSISTANT_URL", "http://homeassistant.local:8123");
}

#[test]
fn missing_variable_fails_before_anything_else() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();
    set_required_env();
    std::env::remove_var("WORKFLOW_ID");

    let err = BridgeConfig::load().expect_err("missing WORKFLOW_ID");
    assert_eq!(
        err.to_string(),
        "Environment variable 'WORKFLOW_ID' is not set."
    );

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();
    set_required_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "filter": {
            "min_confidence": 0.6,
            "min_x": 250
        },
        "entity_id": "input_boolean.porch_package",
        "max_fps": 1.0,
        "inference_api_url": "http://127.0.0.1:9001",
        "output_field": "packages",
        "http_timeout_secs": 3
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var(CONFIG_PATH_VAR, file.path());
    std::env::set_var("MIN_X", "320");
    std::env::set_var("MAX_FPS", "0.5");

    let cfg = BridgeConfig::load().expect("load config");

    assert_eq!(cfg.filter.min_confidence, 0.6);
    assert_eq!(cfg.filter.min_x, 320.0);
    assert_eq!(cfg.entity_id, "input_boolean.porch_package");
    assert_eq!(cfg.max_fps, 0.5);
    assert_eq!(cfg.inference_api_url, "http://127.0.0.1:9001");
    assert_eq!(cfg.output_field, "packages");
    assert_eq!(cfg.http_timeout, Duration::from_secs(3));
    assert_eq!(cfg.api_key, "rf_key");

    clear_env();
}

#[test]
fn unknown_config_file_field_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();
    set_required_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, br#"{"min_confidance": 0.4}"#).expect("write config");
    std::env::set_var(CONFIG_PATH_VAR, file.path());

    let err = BridgeConfig::load().expect_err("typo in config file");
    assert!(err.to_string().contains("invalid config file"));

    clear_env();
}
