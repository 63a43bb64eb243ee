// src/config.rs
//
// Feature flags for nudgeless lane changes. Values live in an external
// key-value store; the helper takes a snapshot at construction and only
// re-reads the lane change delay once per blinker episode.

use serde_yaml::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const NUDGELESS_LANE_CHANGE: &str = "NudgelessLaneChange";
pub const LANE_CHANGE_TIMER: &str = "LaneChangeTimer";
pub const LANE_DETECTION: &str = "LaneDetection";
pub const ONE_LANE_CHANGE: &str = "OneLaneChange";

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("param `{key}` is not set")]
    Missing { key: String },

    #[error("param `{key}` has malformed value `{value}`")]
    Malformed { key: String, value: String },

    #[error("failed to read params file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse params file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Read access to persistent parameters.
pub trait ParamStore {
    fn get_bool(&self, key: &str) -> Result<bool, ParamsError>;
    fn get_int(&self, key: &str) -> Result<i64, ParamsError>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryParams {
    bools: HashMap<String, bool>,
    ints: HashMap<String, i64>,
}

impl MemoryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bool(mut self, key: &str, value: bool) -> Self {
        self.set_bool(key, value);
        self
    }

    pub fn with_int(mut self, key: &str, value: i64) -> Self {
        self.set_int(key, value);
        self
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.bools.insert(key.to_string(), value);
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.ints.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) {
        self.bools.remove(key);
        self.ints.remove(key);
    }
}

impl ParamStore for MemoryParams {
    fn get_bool(&self, key: &str) -> Result<bool, ParamsError> {
        self.bools.get(key).copied().ok_or_else(|| ParamsError::Missing {
            key: key.to_string(),
        })
    }

    fn get_int(&self, key: &str) -> Result<i64, ParamsError> {
        self.ints.get(key).copied().ok_or_else(|| ParamsError::Missing {
            key: key.to_string(),
        })
    }
}

// ============================================================================
// YAML FILE STORE
// ============================================================================

/// Flat YAML mapping of param name to value, re-read from disk on every lookup
/// so edits made mid-drive are visible to the delay re-check.
#[derive(Debug, Clone)]
pub struct YamlParams {
    path: std::path::PathBuf,
}

impl YamlParams {
    /// Open a params file, failing early if it cannot be parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ParamsError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.read_all()?;
        Ok(store)
    }

    fn read_all(&self) -> Result<HashMap<String, Value>, ParamsError> {
        let contents = fs::read_to_string(&self.path)?;
        let values: HashMap<String, Value> = serde_yaml::from_str(&contents)?;
        Ok(values)
    }

    fn lookup(&self, key: &str) -> Result<Value, ParamsError> {
        self.read_all()?
            .remove(key)
            .ok_or_else(|| ParamsError::Missing {
                key: key.to_string(),
            })
    }
}

fn malformed(key: &str, value: &Value) -> ParamsError {
    ParamsError::Malformed {
        key: key.to_string(),
        value: serde_yaml::to_string(value)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

impl ParamStore for YamlParams {
    fn get_bool(&self, key: &str) -> Result<bool, ParamsError> {
        let value = self.lookup(key)?;
        match &value {
            Value::Bool(b) => Ok(*b),
            // Params written by other tools are often stored as "0"/"1"
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(malformed(key, &value)),
            },
            Value::String(s) => match s.trim() {
                "0" | "false" => Ok(false),
                "1" | "true" => Ok(true),
                _ => Err(malformed(key, &value)),
            },
            _ => Err(malformed(key, &value)),
        }
    }

    fn get_int(&self, key: &str) -> Result<i64, ParamsError> {
        let value = self.lookup(key)?;
        match &value {
            Value::Number(n) => n.as_i64().ok_or_else(|| malformed(key, &value)),
            Value::String(s) => s.trim().parse().map_err(|_| malformed(key, &value)),
            _ => Err(malformed(key, &value)),
        }
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesireConfig {
    pub nudgeless: bool,
    /// Seconds to wait in pre lane change before a nudgeless change triggers
    pub lane_change_delay: f32,
    pub lane_detection: bool,
    pub one_lane_change: bool,
}

impl DesireConfig {
    /// Read the snapshot from the store. Sub-options are only consulted when
    /// nudgeless lane changes are enabled; otherwise they are forced off.
    pub fn from_params(params: &dyn ParamStore) -> Result<Self, ParamsError> {
        let nudgeless = params.get_bool(NUDGELESS_LANE_CHANGE)?;
        if !nudgeless {
            info!("Nudgeless lane change disabled");
            return Ok(Self::default());
        }

        let config = Self {
            nudgeless,
            lane_change_delay: read_delay(params)?,
            lane_detection: params.get_bool(LANE_DETECTION)?,
            one_lane_change: params.get_bool(ONE_LANE_CHANGE)?,
        };

        info!(
            "Nudgeless lane change enabled: delay={:.0}s, lane_detection={}, one_lane_change={}",
            config.lane_change_delay, config.lane_detection, config.one_lane_change
        );

        Ok(config)
    }
}

/// Lane change delay in seconds. Negative values are rejected.
pub fn read_delay(params: &dyn ParamStore) -> Result<f32, ParamsError> {
    let secs = params.get_int(LANE_CHANGE_TIMER)?;
    if secs < 0 {
        return Err(ParamsError::Malformed {
            key: LANE_CHANGE_TIMER.to_string(),
            value: secs.to_string(),
        });
    }
    Ok(secs as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn nudgeless_params() -> MemoryParams {
        MemoryParams::new()
            .with_bool(NUDGELESS_LANE_CHANGE, true)
            .with_int(LANE_CHANGE_TIMER, 2)
            .with_bool(LANE_DETECTION, true)
            .with_bool(ONE_LANE_CHANGE, true)
    }

    #[test]
    fn test_nudgeless_enabled_reads_all_flags() {
        let config = DesireConfig::from_params(&nudgeless_params()).unwrap();

        assert!(config.nudgeless);
        assert_eq!(config.lane_change_delay, 2.0);
        assert!(config.lane_detection);
        assert!(config.one_lane_change);
    }

    #[test]
    fn test_nudgeless_disabled_forces_sub_options_off() {
        let params = nudgeless_params().with_bool(NUDGELESS_LANE_CHANGE, false);
        let config = DesireConfig::from_params(&params).unwrap();

        assert_eq!(config, DesireConfig::default());
    }

    #[test]
    fn test_sub_options_not_required_when_disabled() {
        let params = MemoryParams::new().with_bool(NUDGELESS_LANE_CHANGE, false);
        assert!(DesireConfig::from_params(&params).is_ok());
    }

    #[test]
    fn test_missing_master_flag_is_fatal() {
        let err = DesireConfig::from_params(&MemoryParams::new()).unwrap_err();
        assert!(matches!(err, ParamsError::Missing { ref key } if key == NUDGELESS_LANE_CHANGE));
    }

    #[test]
    fn test_missing_delay_is_fatal_when_enabled() {
        let mut params = nudgeless_params();
        params.remove(LANE_CHANGE_TIMER);

        let err = DesireConfig::from_params(&params).unwrap_err();
        assert!(matches!(err, ParamsError::Missing { ref key } if key == LANE_CHANGE_TIMER));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let params = nudgeless_params().with_int(LANE_CHANGE_TIMER, -1);
        assert!(matches!(
            DesireConfig::from_params(&params),
            Err(ParamsError::Malformed { .. })
        ));
    }

    #[test]
    fn test_yaml_params_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "NudgelessLaneChange: true\nLaneChangeTimer: \"3\"\nLaneDetection: 0\nOneLaneChange: \"1\""
        )
        .unwrap();

        let params = YamlParams::load(file.path()).unwrap();
        let config = DesireConfig::from_params(&params).unwrap();

        assert!(config.nudgeless);
        assert_eq!(config.lane_change_delay, 3.0);
        assert!(!config.lane_detection);
        assert!(config.one_lane_change);
    }

    #[test]
    fn test_yaml_params_malformed_value() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NudgelessLaneChange: maybe").unwrap();

        let params = YamlParams::load(file.path()).unwrap();
        assert!(matches!(
            params.get_bool(NUDGELESS_LANE_CHANGE),
            Err(ParamsError::Malformed { .. })
        ));
    }

    #[test]
    fn test_yaml_params_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = YamlParams::load(dir.path().join("params.yaml"));
        assert!(matches!(result, Err(ParamsError::Io(_))));
    }
}
