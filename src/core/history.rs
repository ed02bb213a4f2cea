//! History policy for composite states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which sub-states to enter when a composite state is re-entered.
///
/// Every region of a composite state remembers the sub-state that was active
/// when the region was last left. The history type of the composite state
/// decides how much of that memory is honoured on re-entry:
///
/// - `None`: always enter the declared initial sub-states, down to the leaves.
/// - `Shallow`: enter the remembered sub-state of each region, then continue
///   through initial sub-states below it.
/// - `Deep`: follow remembered sub-states at every level, falling back to
///   initial sub-states only where nothing was remembered.
///
/// # Example
///
/// ```rust
/// use statecraft::core::HistoryType;
///
/// assert_eq!(HistoryType::default(), HistoryType::None);
/// assert!(HistoryType::Deep.remembers());
/// assert!(!HistoryType::None.remembers());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryType {
    #[default]
    None,
    Shallow,
    Deep,
}

impl HistoryType {
    /// Whether re-entry consults the remembered sub-state at the first level.
    pub fn remembers(self) -> bool {
        !matches!(self, Self::None)
    }

    /// History policy applied one level below a remembered sub-state.
    ///
    /// Shallow history is spent after one level; deep history carries on.
    pub(crate) fn below(self) -> Self {
        match self {
            Self::Deep => Self::Deep,
            Self::None | Self::Shallow => Self::None,
        }
    }
}

impl fmt::Display for HistoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Shallow => "shallow",
            Self::Deep => "deep",
        };
        f.write_str(name)
    }
}
