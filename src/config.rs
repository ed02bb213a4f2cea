//! Machine configuration.

use serde::{Deserialize, Serialize};

/// Where queued events are processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// On the thread calling `start`, `fire` or `fire_priority`.
    #[default]
    Passive,
    /// On a dedicated worker thread started by `start`.
    Active,
}

/// Settings a machine is built with.
///
/// # Example
///
/// ```rust
/// use statecraft::{ExecutionMode, MachineConfig};
///
/// let config: MachineConfig = serde_json::from_str(r#"{ "mode": "active" }"#).unwrap();
/// assert_eq!(config.mode, ExecutionMode::Active);
/// assert_eq!(config.name, "state-machine");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Name used in logs, extension hooks and worker thread names.
    pub name: String,
    pub mode: ExecutionMode,
}

impl MachineConfig {
    pub const DEFAULT_NAME: &'static str = "state-machine";

    pub fn passive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: ExecutionMode::Passive,
        }
    }

    pub fn active(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: ExecutionMode::Active,
        }
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::passive(Self::DEFAULT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_passive() {
        let config = MachineConfig::default();

        assert_eq!(config.name, "state-machine");
        assert_eq!(config.mode, ExecutionMode::Passive);
    }

    #[test]
    fn constructors_set_mode() {
        assert_eq!(MachineConfig::active("pump").mode, ExecutionMode::Active);
        assert_eq!(MachineConfig::passive("pump").name, "pump");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: MachineConfig = serde_json::from_str(r#"{ "name": "door" }"#).unwrap();

        assert_eq!(config, MachineConfig::passive("door"));
    }
}
