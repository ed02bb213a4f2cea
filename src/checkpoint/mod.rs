//! Saving and restoring the active states of a machine.
//!
//! A machine is saved as its active leaf states plus one history record per
//! region that remembers a last active sub-state. Restoring never runs entry
//! actions or starts do-actions; it only re-establishes where the machine is.
//!
//! Persistence itself is left to implementors of `StateMachineSaver` and
//! `StateMachineLoader`. `Snapshot` is a ready-made implementation of both
//! that encodes to JSON or to a compact binary form.
//!
//! # Example
//!
//! ```rust
//! use statecraft::checkpoint::Snapshot;
//! use statecraft::{MachineConfig, StateMachineBuilder};
//!
//! let mut builder = StateMachineBuilder::<u8, u8>::new();
//! builder.in_state(1).on(0, |t| t.goto(2));
//! builder.in_state(2);
//! let machine = builder.build(MachineConfig::passive("door")).unwrap();
//! machine.initialize(1).unwrap();
//! machine.start().unwrap();
//! machine.fire(0).unwrap();
//!
//! let json = machine.snapshot().to_json().unwrap();
//!
//! let mut builder = StateMachineBuilder::<u8, u8>::new();
//! builder.in_state(1).on(0, |t| t.goto(2));
//! builder.in_state(2);
//! let restored = builder.build(MachineConfig::passive("door")).unwrap();
//! restored.load(&Snapshot::<u8>::from_json(&json).unwrap()).unwrap();
//!
//! assert_eq!(restored.current_state_ids(), vec![2]);
//! ```

use crate::core::StateId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for the snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// The last active sub-state remembered by one region of `super_state`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord<S> {
    pub super_state: S,
    pub last_active_state: S,
}

/// Receives the state of a machine being saved.
pub trait StateMachineSaver<S: StateId> {
    /// Active leaf states; empty for a machine that never entered a state.
    fn save_current_states(&mut self, states: &[S]);

    fn save_history_states(&mut self, history: &[HistoryRecord<S>]);
}

/// Provides the state of a machine being loaded.
pub trait StateMachineLoader<S: StateId> {
    fn load_current_states(&self) -> Vec<S>;

    fn load_history_states(&self) -> Vec<HistoryRecord<S>>;
}

/// Serializable snapshot of a machine's active states and history.
/// Does NOT include actions or guards (not serializable).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<S> {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: Uuid,

    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Name of the machine the snapshot was taken from
    pub machine: String,

    /// Active leaf states
    pub current_states: Vec<S>,

    /// Remembered sub-states per region
    pub history: Vec<HistoryRecord<S>>,
}

impl<S> Snapshot<S> {
    /// An empty snapshot, ready to be filled by `StateMachine::save`.
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            machine: machine.into(),
            current_states: Vec::new(),
            history: Vec::new(),
        }
    }
}

impl<S: Serialize + DeserializeOwned> Snapshot<S> {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()
    }

    fn check_version(self) -> Result<Self, CheckpointError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(self)
    }
}

impl<S: StateId> StateMachineSaver<S> for Snapshot<S> {
    fn save_current_states(&mut self, states: &[S]) {
        self.current_states = states.to_vec();
    }

    fn save_history_states(&mut self, history: &[HistoryRecord<S>]) {
        self.history = history.to_vec();
    }
}

impl<S: StateId> StateMachineLoader<S> for Snapshot<S> {
    fn load_current_states(&self) -> Vec<S> {
        self.current_states.clone()
    }

    fn load_history_states(&self) -> Vec<HistoryRecord<S>> {
        self.history.clone()
    }
}
