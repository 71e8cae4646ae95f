use crate::error::{Result, WindowError};
use crate::host::{DeviceEntry, DeviceRegistry};
use crate::status::{Mode, ModeKind, PRIMARY_DOMAINS, Threshold};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory below the platform config dir holding our config file.
const CONFIG_DIR: &str = "extended-window-status";
const CONFIG_FILE: &str = "config.json";

/// Load environment variables from a .env file in the working directory.
/// Values may contain spaces without quotes; surrounding quotes are stripped.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    let Ok(content) = fs::read_to_string(env_path) else {
        return;
    };

    for (key, value) in parse_dotenv(&content) {
        // Variables already set in the environment take precedence
        if std::env::var(key).is_err() {
            // SAFETY: called from the synchronous main before the tokio runtime is built,
            // while the process is still single-threaded
            unsafe { std::env::set_var(key, value) };
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let mut value = value.trim();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }
            pairs.push((key.trim(), value));
        }
    }
    pairs
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Devices to seed the host's device registry with.
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
    #[serde(default)]
    pub windows: Vec<WindowConfig>,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
        }
    }
}

/// Setup data for one extended window sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub device_id: String,
    /// Resolved from the device registry when not given.
    #[serde(default)]
    pub device_name: Option<String>,
    /// Primary open/closed contact sensor.
    pub base_entity: String,
    /// Rotation value or upper contact sensor, depending on `mode`.
    #[serde(default)]
    pub second_entity: Option<String>,
    /// Entries written before modes existed were always rotary.
    #[serde(default)]
    pub mode: ModeKind,
    #[serde(default)]
    pub tilt_threshold: Option<f64>,
}

impl WindowConfig {
    pub fn rotary(
        device_id: impl Into<String>,
        base_entity: impl Into<String>,
        rotation_entity: impl Into<String>,
        threshold: f64,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: None,
            base_entity: base_entity.into(),
            second_entity: Some(rotation_entity.into()),
            mode: ModeKind::RotaryTilt,
            tilt_threshold: Some(threshold),
        }
    }

    pub fn dual(
        device_id: impl Into<String>,
        lower_entity: impl Into<String>,
        upper_entity: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: None,
            base_entity: lower_entity.into(),
            second_entity: Some(upper_entity.into()),
            mode: ModeKind::BinaryTilt,
            tilt_threshold: None,
        }
    }

    /// The second entity id. Empty when missing; `validate` rejects that.
    pub fn second_entity(&self) -> &str {
        self.second_entity.as_deref().unwrap_or_default()
    }

    /// Check the configuration against the host and build the typed mode.
    ///
    /// Returns the mode and the device the window belongs to.
    pub fn validate(&self, devices: &DeviceRegistry) -> Result<(Mode, DeviceEntry)> {
        let device = devices
            .get(&self.device_id)
            .ok_or_else(|| WindowError::DeviceNotFound(self.device_id.clone()))?;

        check_domain(&self.base_entity, PRIMARY_DOMAINS)?;

        let second = match self.second_entity.as_deref().map(str::trim) {
            Some(second) if !second.is_empty() => second,
            _ => return Err(WindowError::MissingSecondEntity(self.mode.to_string())),
        };
        check_domain(second, self.mode.secondary_domains())?;
        if second == self.base_entity {
            return Err(WindowError::DuplicateEntity(second.to_string()));
        }

        let mode = match self.mode {
            ModeKind::RotaryTilt => Mode::RotaryValue {
                threshold: match self.tilt_threshold {
                    Some(value) => Threshold::new(value)?,
                    None => Threshold::default(),
                },
            },
            ModeKind::BinaryTilt => {
                if self.tilt_threshold.is_some() {
                    debug!(
                        "Ignoring tilt threshold for {}: not used in {} mode",
                        self.base_entity, self.mode
                    );
                }
                Mode::DualSensor
            }
        };

        Ok((mode, device))
    }
}

fn check_domain(entity_id: &str, allowed: &[&str]) -> Result<()> {
    let valid = entity_id
        .split_once('.')
        .is_some_and(|(domain, object_id)| !object_id.is_empty() && allowed.contains(&domain));
    if valid {
        Ok(())
    } else {
        Err(WindowError::InvalidEntity {
            entity: entity_id.to_string(),
            expected: allowed.join(", "),
        })
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, or from the default location when none is given.
    ///
    /// A missing file at the default location is not an error; the built-in
    /// defaults are used instead. Environment overrides are applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        Self::resolve_from(path, &default_config_path(), |key| std::env::var(key).ok())
    }

    fn resolve_from(
        path: Option<&Path>,
        default_path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None if default_path.exists() => Self::load(default_path)?,
            None => {
                warn!(
                    "No config file at {}, using defaults",
                    default_path.display()
                );
                Self::default()
            }
        };
        config.apply_overrides(lookup);
        Ok(config)
    }

    /// Apply `EWS_*` overrides read through `lookup`. Unparsable values are ignored.
    ///
    /// `EWS_TILT_THRESHOLD` only fills in rotary windows without a threshold.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(enabled) = lookup("EWS_SIMULATION")
            && let Ok(enabled) = enabled.trim().parse()
        {
            self.simulation.enabled = enabled;
        }
        if let Some(interval) = lookup("EWS_SIMULATION_INTERVAL")
            && let Ok(secs) = interval.trim().parse()
        {
            self.simulation.interval_secs = secs;
        }
        if let Some(threshold) = lookup("EWS_TILT_THRESHOLD")
            && let Ok(threshold) = threshold.trim().parse::<f64>()
        {
            for window in &mut self.windows {
                if window.mode == ModeKind::RotaryTilt && window.tilt_threshold.is_none() {
                    window.tilt_threshold = Some(threshold);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DEFAULT_TILT_THRESHOLD;

    fn devices() -> DeviceRegistry {
        let registry = DeviceRegistry::new();
        registry.register(DeviceEntry::new("dev1", "Kitchen Window"));
        registry
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| pairs.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v.clone())
    }

    fn windows_config() -> Config {
        let mut unset = WindowConfig::rotary("dev1", "binary_sensor.a", "number.a", 0.0);
        unset.tilt_threshold = None;
        Config {
            windows: vec![
                unset,
                WindowConfig::rotary("dev1", "binary_sensor.b", "number.b", 30.0),
                WindowConfig::dual("dev1", "binary_sensor.c", "binary_sensor.d"),
            ],
            ..Config::default()
        }
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = windows_config();
        config.apply_overrides(env(&[
            ("EWS_SIMULATION", "true"),
            ("EWS_SIMULATION_INTERVAL", "3"),
            ("EWS_TILT_THRESHOLD", "65.5"),
        ]));

        assert!(config.simulation.enabled);
        assert_eq!(config.simulation.interval_secs, 3);
        assert_eq!(config.windows[0].tilt_threshold, Some(65.5));
        // Explicit threshold is kept
        assert_eq!(config.windows[1].tilt_threshold, Some(30.0));
        // Dual windows have no threshold to fill in
        assert_eq!(config.windows[2].tilt_threshold, None);
    }

    #[test]
    fn test_unparsable_overrides_are_ignored() {
        let mut config = windows_config();
        config.apply_overrides(env(&[
            ("EWS_SIMULATION", "yes please"),
            ("EWS_SIMULATION_INTERVAL", "-4"),
            ("EWS_TILT_THRESHOLD", "steep"),
        ]));

        assert!(!config.simulation.enabled);
        assert_eq!(config.simulation.interval_secs, 10);
        assert_eq!(config.windows[0].tilt_threshold, None);
    }

    #[test]
    fn test_no_overrides_leaves_config_alone() {
        let mut config = windows_config();
        config.apply_overrides(|_| None);
        assert_eq!(config.windows, windows_config().windows);
        assert!(!config.simulation.enabled);
    }

    #[test]
    fn test_resolve_missing_default_file_uses_defaults() {
        let missing = std::env::temp_dir().join(format!(
            "ews-missing-{}/config.json",
            std::process::id()
        ));
        let config =
            Config::resolve_from(None, &missing, env(&[("EWS_SIMULATION", "true")])).unwrap();
        assert!(config.windows.is_empty());
        assert!(config.devices.is_empty());
        assert!(config.simulation.enabled);
    }

    #[test]
    fn test_resolve_explicit_path_must_exist() {
        let missing = std::env::temp_dir().join(format!(
            "ews-explicit-missing-{}.json",
            std::process::id()
        ));
        assert!(matches!(
            Config::resolve_from(Some(&missing), &missing, |_| None),
            Err(WindowError::IoError(_))
        ));
    }

    #[test]
    fn test_resolve_reads_default_file() {
        let path = std::env::temp_dir().join(format!("ews-default-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{ "windows": [{ "device_id": "dev1", "base_entity": "binary_sensor.a", "second_entity": "number.a" }] }"#,
        )
        .unwrap();
        let config =
            Config::resolve_from(None, &path, env(&[("EWS_TILT_THRESHOLD", "70")])).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.windows.len(), 1);
        assert_eq!(config.windows[0].tilt_threshold, Some(70.0));
    }

    #[test]
    fn test_parse_dotenv() {
        let content = "# comment\n\nEWS_SIMULATION=true\nNAME = Living Room \nQUOTED=\"a b\"\nbroken line\n";
        assert_eq!(
            parse_dotenv(content),
            vec![
                ("EWS_SIMULATION", "true"),
                ("NAME", "Living Room"),
                ("QUOTED", "a b"),
            ]
        );
    }

    #[test]
    fn test_validate_rotary() {
        let config = WindowConfig::rotary("dev1", "binary_sensor.kitchen", "number.handle", 70.0);
        let (mode, device) = config.validate(&devices()).unwrap();
        assert_eq!(
            mode,
            Mode::RotaryValue {
                threshold: Threshold::new(70.0).unwrap()
            }
        );
        assert_eq!(device.display_name(), "Kitchen Window");
    }

    #[test]
    fn test_validate_rotary_default_threshold() {
        let mut config = WindowConfig::rotary("dev1", "input_boolean.kitchen", "input_number.handle", 0.0);
        config.tilt_threshold = None;
        let (mode, _) = config.validate(&devices()).unwrap();
        match mode {
            Mode::RotaryValue { threshold } => assert_eq!(threshold.value(), DEFAULT_TILT_THRESHOLD),
            Mode::DualSensor => panic!("expected rotary mode"),
        }
    }

    #[test]
    fn test_validate_dual() {
        let config = WindowConfig::dual("dev1", "binary_sensor.lower", "binary_sensor.upper");
        let (mode, _) = config.validate(&devices()).unwrap();
        assert_eq!(mode, Mode::DualSensor);
    }

    #[test]
    fn test_validate_unknown_device() {
        let config = WindowConfig::dual("nope", "binary_sensor.lower", "binary_sensor.upper");
        assert!(matches!(
            config.validate(&devices()),
            Err(WindowError::DeviceNotFound(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_domains() {
        let config = WindowConfig::rotary("dev1", "sensor.kitchen", "number.handle", 80.0);
        assert!(matches!(
            config.validate(&devices()),
            Err(WindowError::InvalidEntity { .. })
        ));

        // Binary secondary entity in rotary mode
        let config = WindowConfig::rotary("dev1", "binary_sensor.lower", "binary_sensor.upper", 80.0);
        assert!(matches!(
            config.validate(&devices()),
            Err(WindowError::InvalidEntity { .. })
        ));

        // Number secondary entity in dual mode
        let config = WindowConfig::dual("dev1", "binary_sensor.lower", "number.handle");
        let err = config.validate(&devices()).unwrap_err();
        assert!(err.is_invalid_configuration());

        let config = WindowConfig::dual("dev1", "binary_sensor.", "binary_sensor.upper");
        assert!(config.validate(&devices()).is_err());
    }

    #[test]
    fn test_validate_missing_or_duplicate_second_entity() {
        let mut config = WindowConfig::dual("dev1", "binary_sensor.lower", "binary_sensor.upper");
        config.second_entity = None;
        assert!(matches!(
            config.validate(&devices()),
            Err(WindowError::MissingSecondEntity(_))
        ));

        config.second_entity = Some("binary_sensor.lower".to_string());
        assert!(matches!(
            config.validate(&devices()),
            Err(WindowError::DuplicateEntity(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let config = WindowConfig::rotary("dev1", "binary_sensor.kitchen", "number.handle", -5.0);
        assert!(matches!(
            config.validate(&devices()),
            Err(WindowError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_deserialize_defaults_to_rotary() {
        let json = r#"{
            "device_id": "dev1",
            "base_entity": "binary_sensor.kitchen",
            "second_entity": "number.handle"
        }"#;
        let config: WindowConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, ModeKind::RotaryTilt);
        assert_eq!(config.tilt_threshold, None);
        assert!(config.validate(&devices()).is_ok());
    }

    #[test]
    fn test_deserialize_full_config() {
        let json = r#"{
            "devices": [{ "id": "dev1", "name": "Kitchen Window" }],
            "windows": [{
                "device_id": "dev1",
                "base_entity": "binary_sensor.lower",
                "second_entity": "binary_sensor.upper",
                "mode": "binary_tilt"
            }],
            "simulation": { "enabled": true, "interval_secs": 3 }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.devices.len(), 1);
        assert_eq!(config.windows[0].mode, ModeKind::BinaryTilt);
        assert!(config.simulation.enabled);
        assert_eq!(config.simulation.interval_secs, 3);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("ews-config-{}.json", std::process::id()));
        fs::write(&path, r#"{ "windows": [] }"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert!(config.windows.is_empty());
        assert!(!config.simulation.enabled);
        fs::remove_file(&path).unwrap();

        assert!(matches!(Config::load(&path), Err(WindowError::IoError(_))));
    }
}
