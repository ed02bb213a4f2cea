//! Builder API for declaring state machines.
//!
//! A definition is assembled through a [`StateMachineBuilder`]:
//! `in_state` declares actions and transitions of a state, while
//! `define_hierarchy_on` and `define_region_on` nest states into regions.
//! Nothing runs until [`StateMachineBuilder::build`] validates the whole
//! definition and hands back a [`StateMachine`](crate::StateMachine).
//!
//! # Example
//!
//! ```rust
//! use statecraft::core::HistoryType;
//! use statecraft::{MachineConfig, StateMachineBuilder};
//!
//! let mut builder = StateMachineBuilder::<&str, &str>::new();
//! builder
//!     .define_hierarchy_on("On")
//!     .with_history_type(HistoryType::Shallow)
//!     .with_initial_sub_state("Idle")?
//!     .with_sub_state("Busy")?;
//! builder.in_state("Idle").on("work", |t| t.goto("Busy"));
//! builder.in_state("On").on("off", |t| t.goto("Off"));
//! builder.in_state("Off").on("on", |t| t.goto("On"));
//!
//! let machine = builder.build(MachineConfig::passive("switch"))?;
//! machine.initialize("On")?;
//! machine.start()?;
//! machine.fire("work")?;
//! machine.fire("off")?;
//! machine.fire("on")?;
//!
//! assert_eq!(machine.current_state_ids(), vec!["Busy"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod hierarchy;
mod machine;
mod macros;
mod state;
mod transition;

pub use hierarchy::HierarchyBuilder;
pub use machine::StateMachineBuilder;
pub use state::StateBuilder;
pub use transition::TransitionBuilder;
