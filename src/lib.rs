//! Statecraft: hierarchical state machines with orthogonal regions
//!
//! States nest inside composite states, and a composite state may own several
//! independent regions, each with exactly one active sub-state while the owner
//! is active. Events are dispatched to every active leaf, deeper states shadow
//! their ancestors, and transitions exit and enter exactly the states between
//! source and target.
//!
//! # Core Concepts
//!
//! - **Definition**: states, regions, history policies and transitions are
//!   declared through [`StateMachineBuilder`] and validated as a whole
//! - **Dispatch**: guards pick at most one transition per active branch
//! - **History**: re-entered composite states resume where they left off,
//!   one level (`Shallow`) or all the way down (`Deep`)
//! - **Do-actions**: long running work bound to a state, cancelled on exit and
//!   followed by completion transitions when it finishes
//! - **Execution**: passive machines run on the caller's thread, active ones
//!   on a worker; both share one queue with a priority tier
//! - **Checkpoints**: active states and history can be saved and restored
//!   without running any actions
//!
//! # Example
//!
//! ```rust
//! use statecraft::{state_ids, MachineConfig, StateMachineBuilder};
//!
//! state_ids! {
//!     enum Light {
//!         Off,
//!         On,
//!         Dimmed,
//!         Bright,
//!     }
//! }
//!
//! state_ids! {
//!     enum Switch {
//!         Toggle,
//!         Dim,
//!     }
//! }
//!
//! let mut builder = StateMachineBuilder::<Light, Switch>::new();
//! builder
//!     .define_hierarchy_on(Light::On)
//!     .with_initial_sub_state(Light::Bright)?
//!     .with_sub_state(Light::Dimmed)?;
//! builder.in_state(Light::Off).on(Switch::Toggle, |t| t.goto(Light::On));
//! builder.in_state(Light::On).on(Switch::Toggle, |t| t.goto(Light::Off));
//! builder.in_state(Light::Bright).on(Switch::Dim, |t| t.goto(Light::Dimmed));
//!
//! let light = builder.build(MachineConfig::passive("light"))?;
//! light.initialize(Light::Off)?;
//! light.start()?;
//! light.fire(Switch::Toggle)?;
//! light.fire(Switch::Dim)?;
//!
//! assert_eq!(light.current_state_ids(), vec![Light::Dimmed]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod error;
mod hierarchy;
pub mod machine;
pub mod validation;

// Re-export commonly used types
pub use builder::{HierarchyBuilder, StateBuilder, StateMachineBuilder, TransitionBuilder};
pub use config::{ExecutionMode, MachineConfig};
pub use core::{HistoryType, TransitionContext};
pub use error::{FaultKind, HierarchyError, StateMachineError};
pub use machine::{EventSender, ExceptionHandler, Extension, StateMachine};
