//! Macros for ergonomic state machine construction.

/// Declare an enum usable as a state or event identifier.
///
/// Derives everything [`StateId`](crate::core::StateId) and
/// [`EventId`](crate::core::EventId) need, plus serde support so machines
/// using the enum can be captured in a [`Snapshot`](crate::checkpoint::Snapshot).
/// Also generates a `name()` method returning the variant name.
///
/// # Example
///
/// ```
/// use statecraft::state_ids;
///
/// state_ids! {
///     pub enum PlayerState {
///         Off,
///         On,
///         Playing,
///         Paused,
///     }
/// }
///
/// assert_eq!(PlayerState::Paused.name(), "Paused");
/// ```
#[macro_export]
macro_rules! state_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Debug,
            serde::Serialize,
            serde::Deserialize
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            #[allow(dead_code)]
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
