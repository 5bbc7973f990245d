//! Envelope-budgeting engine.
//!
//! A user owns at most one [`Budget`] per calendar-month period and splits
//! it into named [`Envelope`]s. The link between the two is an
//! [`Allocation`]: the slice of one budget assigned to one envelope for
//! that period.
//!
//! The engine keeps a derived invariant: after every allocation write, the
//! budget's [`BudgetStatus`] reflects the sum of its allocations compared
//! to the budgeted amount (`==` complete, `<` incomplete, `>` invalid).
//! Multi-step writes run inside a single database transaction, so a failed
//! step never leaves a partial allocation behind.
//!
//! All amounts are `i64` minor units (cents), which makes the status
//! comparison exact.

pub use allocations::{Allocation, AllocationStatus};
pub use budgets::{Budget, BudgetStatus};
pub use context::{RequestContext, current_period};
pub use envelopes::{Envelope, EnvelopeStatus};
pub use error::EngineError;
pub use ops::{BudgetData, Engine, EngineBuilder, EnvelopeData, EnvelopeIds, UserBudget};
pub use pagination::{Page, SortBy, SortDirection};

mod allocations;
mod budgets;
mod context;
mod envelopes;
mod error;
mod ops;
mod pagination;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
