//! Core State trait for state graph nodes.
//!
//! Every state a subject can occupy implements this trait. The state
//! machine compares states by [`State::name`], so two values with the
//! same name are the same state as far as staleness detection goes.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for named states in a state graph.
///
/// # Required Traits
///
/// - `Clone`: states are copied into every transition context
/// - `PartialEq`: states must be comparable in tests and audit records
/// - `Debug`: states must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: states are persisted by state assistants
///
/// # Example
///
/// ```rust
/// use switchyard::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum OrderState {
///     Created,
///     Paid,
///     Shipped,
///     Cancelled,
/// }
///
/// impl State for OrderState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Created => "Created",
///             Self::Paid => "Paid",
///             Self::Shipped => "Shipped",
///             Self::Cancelled => "Cancelled",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Shipped | Self::Cancelled)
///     }
/// }
///
/// assert!(OrderState::Paid.same_as(&OrderState::Paid));
/// assert!(!OrderState::Paid.same_as(&OrderState::Created));
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// The state's name. This is the value persisted and compared.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }

    /// Name equality, the comparison used for staleness checks.
    fn same_as(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}
