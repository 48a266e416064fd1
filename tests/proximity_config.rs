use std::sync::Mutex;
use std::time::Duration;

use tempfile::Builder;

use proximity_watch::config::{ProximityConfig, ScorePooling};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PROXIMITY_CONFIG",
        "PROXIMITY_CONFIDENCE_THRESHOLD",
        "PROXIMITY_BACKEND",
        "PROXIMITY_REPLAY_PATH",
        "PROXIMITY_TRACKED_CLASS",
        "PROXIMITY_TRACKING",
        "PROXIMITY_HISTORY_CAPACITY",
        "PROXIMITY_TREND_WINDOW",
        "PROXIMITY_SOURCE_URL",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".json").tempfile().expect("temp config");
    let json = r#"{
        "detection": {
            "confidence_threshold": 0.35,
            "nms_iou_threshold": 0.4
        },
        "tracking": {
            "tracked_class": "dog",
            "history_capacity": 60,
            "trend_window": 8,
            "pooling": "mean",
            "search_grace_secs": 3
        },
        "source": {
            "url": "stub://porch",
            "width": 1280,
            "height": 720,
            "target_fps": 15,
            "frame_limit": 500
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("PROXIMITY_CONFIG", file.path());
    std::env::set_var("PROXIMITY_TRACKED_CLASS", "cat");
    std::env::set_var("PROXIMITY_TREND_WINDOW", "5");

    let cfg = ProximityConfig::load().expect("load config");

    assert_eq!(cfg.detection.confidence_threshold, 0.35);
    assert_eq!(cfg.detection.nms_iou_threshold, Some(0.4));
    assert_eq!(cfg.detection.backend, "stub");
    assert_eq!(cfg.tracking.tracked_class, "cat");
    assert_eq!(cfg.tracking.history_capacity, 60);
    assert_eq!(cfg.tracking.trend_window, 5);
    assert_eq!(cfg.tracking.pooling, ScorePooling::Mean);
    assert_eq!(cfg.tracking.search_grace, Duration::from_secs(3));
    assert_eq!(cfg.source.url, "stub://porch");
    assert_eq!((cfg.source.width, cfg.source.height), (1280, 720));
    assert_eq!(cfg.source.target_fps, 15);
    assert_eq!(cfg.source.frame_limit, Some(500));

    clear_env();
}

#[test]
fn loads_toml_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".toml").tempfile().expect("temp config");
    let toml = r#"
[detection]
confidence_threshold = 0.6

[tracking]
enabled = false
pooling = "last"

[source]
target_fps = 0
"#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");

    let cfg = ProximityConfig::load_from(Some(file.path())).expect("load config");
    assert_eq!(cfg.detection.confidence_threshold, 0.6);
    assert!(!cfg.tracking.enabled);
    assert_eq!(cfg.tracking.pooling, ScorePooling::Last);
    assert_eq!(cfg.tracking.tracked_class, "cat");
    assert_eq!(cfg.source.target_fps, 30);

    clear_env();
}

#[test]
fn invalid_env_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PROXIMITY_HISTORY_CAPACITY", "lots");
    let err = ProximityConfig::load().unwrap_err();
    assert!(err.to_string().contains("PROXIMITY_HISTORY_CAPACITY"));
    clear_env();

    std::env::set_var("PROXIMITY_HISTORY_CAPACITY", "18446744073709551615");
    let err = ProximityConfig::load().unwrap_err();
    assert!(err.to_string().contains("history_capacity"));
    clear_env();

    std::env::set_var("PROXIMITY_TREND_WINDOW", "1");
    let err = ProximityConfig::load().unwrap_err();
    assert!(err.to_string().contains("at least 2"));
    clear_env();

    std::env::set_var("PROXIMITY_TRACKING", "maybe");
    assert!(ProximityConfig::load().is_err());
    clear_env();
}

#[test]
fn missing_config_file_names_the_path() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let err = ProximityConfig::load_from(Some(std::path::Path::new("/nonexistent/proximity.json")))
        .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/proximity.json"));
}
