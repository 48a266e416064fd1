use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::summary::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::trend::{DEFAULT_HISTORY_CAPACITY, DEFAULT_TREND_WINDOW, MAX_HISTORY_CAPACITY};

const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_TRACKED_CLASS: &str = "cat";
const DEFAULT_SEARCH_GRACE_SECS: u64 = 5;
const DEFAULT_SOURCE_URL: &str = "stub://camera0";
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
/// Used when a source reports 0 fps (unknown rate).
pub const FALLBACK_FPS: u32 = 30;

#[derive(Debug, Deserialize, Default)]
struct ProximityConfigFile {
    detection: Option<DetectionConfigFile>,
    tracking: Option<TrackingConfigFile>,
    source: Option<SourceConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    confidence_threshold: Option<f32>,
    backend: Option<String>,
    replay_path: Option<PathBuf>,
    nms_iou_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct TrackingConfigFile {
    enabled: Option<bool>,
    tracked_class: Option<String>,
    history_capacity: Option<usize>,
    trend_window: Option<usize>,
    pooling: Option<ScorePooling>,
    search_grace_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
    frame_limit: Option<u64>,
}

/// How several qualifying detections of the tracked class in one frame
/// collapse into the single score appended to the history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorePooling {
    /// Nearest instance (largest score).
    #[default]
    Max,
    Mean,
    /// Last instance in detector order.
    Last,
}

impl std::str::FromStr for ScorePooling {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "mean" => Ok(Self::Mean),
            "last" => Ok(Self::Last),
            other => Err(anyhow!("unknown pooling '{}' (expected max, mean or last)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProximityConfig {
    pub detection: DetectionSettings,
    pub tracking: TrackingSettings,
    pub source: SourceSettings,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub confidence_threshold: f32,
    pub backend: String,
    pub replay_path: Option<PathBuf>,
    pub nms_iou_threshold: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct TrackingSettings {
    pub enabled: bool,
    pub tracked_class: String,
    pub history_capacity: usize,
    pub trend_window: usize,
    pub pooling: ScorePooling,
    pub search_grace: Duration,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
    pub frame_limit: Option<u64>,
}

impl SourceSettings {
    /// Delay between frames when pacing to `target_fps`.
    pub fn frame_interval(&self) -> Duration {
        let fps = if self.target_fps == 0 {
            FALLBACK_FPS
        } else {
            self.target_fps
        };
        Duration::from_secs_f64(1.0 / fps as f64)
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self::from_file(ProximityConfigFile::default())
    }
}

impl ProximityConfig {
    /// Load from `PROXIMITY_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PROXIMITY_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file (or defaults), then apply env overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ProximityConfigFile) -> Self {
        let detection = file.detection.unwrap_or_default();
        let tracking = file.tracking.unwrap_or_default();
        let source = file.source.unwrap_or_default();

        Self {
            detection: DetectionSettings {
                confidence_threshold: detection
                    .confidence_threshold
                    .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
                backend: detection
                    .backend
                    .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
                replay_path: detection.replay_path,
                nms_iou_threshold: detection.nms_iou_threshold,
            },
            tracking: TrackingSettings {
                enabled: tracking.enabled.unwrap_or(true),
                tracked_class: tracking
                    .tracked_class
                    .unwrap_or_else(|| DEFAULT_TRACKED_CLASS.to_string()),
                history_capacity: tracking
                    .history_capacity
                    .unwrap_or(DEFAULT_HISTORY_CAPACITY),
                trend_window: tracking.trend_window.unwrap_or(DEFAULT_TREND_WINDOW),
                pooling: tracking.pooling.unwrap_or_default(),
                search_grace: Duration::from_secs(
                    tracking
                        .search_grace_secs
                        .unwrap_or(DEFAULT_SEARCH_GRACE_SECS),
                ),
            },
            source: SourceSettings {
                url: source
                    .url
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                width: source.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
                height: source.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
                target_fps: match source.target_fps {
                    Some(0) | None => FALLBACK_FPS,
                    Some(fps) => fps,
                },
                frame_limit: source.frame_limit,
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(threshold) = std::env::var("PROXIMITY_CONFIDENCE_THRESHOLD") {
            self.detection.confidence_threshold = threshold.trim().parse().map_err(|_| {
                anyhow!("PROXIMITY_CONFIDENCE_THRESHOLD must be a number, got '{}'", threshold)
            })?;
        }
        if let Ok(backend) = std::env::var("PROXIMITY_BACKEND") {
            if !backend.trim().is_empty() {
                self.detection.backend = backend.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("PROXIMITY_REPLAY_PATH") {
            if !path.trim().is_empty() {
                self.detection.replay_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(class) = std::env::var("PROXIMITY_TRACKED_CLASS") {
            if !class.trim().is_empty() {
                self.tracking.tracked_class = class.trim().to_string();
            }
        }
        if let Ok(enabled) = std::env::var("PROXIMITY_TRACKING") {
            self.tracking.enabled = parse_bool(&enabled)
                .ok_or_else(|| anyhow!("PROXIMITY_TRACKING must be true or false"))?;
        }
        if let Ok(capacity) = std::env::var("PROXIMITY_HISTORY_CAPACITY") {
            self.tracking.history_capacity = capacity
                .trim()
                .parse()
                .map_err(|_| anyhow!("PROXIMITY_HISTORY_CAPACITY must be an integer"))?;
        }
        if let Ok(window) = std::env::var("PROXIMITY_TREND_WINDOW") {
            self.tracking.trend_window = window
                .trim()
                .parse()
                .map_err(|_| anyhow!("PROXIMITY_TREND_WINDOW must be an integer"))?;
        }
        if let Ok(url) = std::env::var("PROXIMITY_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        Ok(())
    }

    /// Check cross-field constraints. Called by `load`; call again after
    /// applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        if self.tracking.tracked_class.trim().is_empty() {
            return Err(anyhow!("tracked_class must not be empty"));
        }
        if self.tracking.trend_window < 2 {
            return Err(anyhow!("trend_window must be at least 2"));
        }
        if self.tracking.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(anyhow!(
                "history_capacity ({}) must not exceed {}",
                self.tracking.history_capacity,
                MAX_HISTORY_CAPACITY
            ));
        }
        if self.tracking.trend_window > self.tracking.history_capacity {
            return Err(anyhow!(
                "trend_window ({}) must not exceed history_capacity ({})",
                self.tracking.trend_window,
                self.tracking.history_capacity
            ));
        }
        if self.tracking.search_grace.is_zero() {
            return Err(anyhow!("search_grace_secs must be greater than zero"));
        }
        if !self.detection.confidence_threshold.is_finite() {
            return Err(anyhow!("confidence_threshold must be finite"));
        }
        if let Some(iou) = self.detection.nms_iou_threshold {
            if !(iou > 0.0 && iou <= 1.0) {
                return Err(anyhow!("nms_iou_threshold must be in (0, 1], got {}", iou));
            }
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!(
                "source dimensions must be non-zero, got {}x{}",
                self.source.width,
                self.source.height
            ));
        }
        if self.detection.backend == "replay" && self.detection.replay_path.is_none() {
            return Err(anyhow!("replay backend requires detection.replay_path"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ProximityConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behaviour() {
        let cfg = ProximityConfig::default();
        assert_eq!(cfg.detection.confidence_threshold, 0.5);
        assert_eq!(cfg.detection.backend, "stub");
        assert_eq!(cfg.detection.nms_iou_threshold, None);
        assert!(cfg.tracking.enabled);
        assert_eq!(cfg.tracking.tracked_class, "cat");
        assert_eq!(cfg.tracking.history_capacity, 30);
        assert_eq!(cfg.tracking.trend_window, 5);
        assert_eq!(cfg.tracking.pooling, ScorePooling::Max);
        assert_eq!(cfg.tracking.search_grace, Duration::from_secs(5));
        assert_eq!(cfg.source.target_fps, 30);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_fps_falls_back() {
        let file: ProximityConfigFile =
            serde_json::from_str(r#"{"source": {"target_fps": 0}}"#).unwrap();
        let cfg = ProximityConfig::from_file(file);
        assert_eq!(cfg.source.target_fps, FALLBACK_FPS);
        assert_eq!(cfg.source.frame_interval(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn window_larger_than_capacity_is_rejected() {
        let mut cfg = ProximityConfig::default();
        cfg.tracking.history_capacity = 4;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("must not exceed history_capacity"));
    }

    #[test]
    fn oversize_history_capacity_is_rejected() {
        let mut cfg = ProximityConfig::default();
        cfg.tracking.history_capacity = usize::MAX;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("must not exceed 10000"));

        cfg.tracking.history_capacity = MAX_HISTORY_CAPACITY;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn pooling_parses_from_str() {
        assert_eq!("MEAN".parse::<ScorePooling>().unwrap(), ScorePooling::Mean);
        assert!("median".parse::<ScorePooling>().is_err());
    }

    #[test]
    fn replay_backend_needs_a_path() {
        let mut cfg = ProximityConfig::default();
        cfg.detection.backend = "replay".to_string();
        assert!(cfg.validate().is_err());
        cfg.detection.replay_path = Some(PathBuf::from("detections.jsonl"));
        assert!(cfg.validate().is_ok());
    }
}
