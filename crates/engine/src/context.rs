//! Request context: who is calling, and for which budgeting period.
//!
//! The context is built once at the API boundary and threaded into every
//! budget and envelope operation, so the engine never reads ambient state.

use chrono::{Datelike, Local, NaiveDate};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// The caller's identity and budgeting period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub period: NaiveDate,
}

impl RequestContext {
    pub fn new(user_id: Uuid, period: NaiveDate) -> Self {
        Self { user_id, period }
    }

    /// Build a context for an authenticated principal and the current
    /// period.
    ///
    /// The period is never caller-supplied through this path, so a user
    /// cannot target an arbitrary month.
    pub fn resolve(authenticated: Option<Uuid>) -> ResultEngine<Self> {
        let user_id = authenticated.ok_or(EngineError::Unauthorized)?;
        Ok(Self {
            user_id,
            period: current_period(),
        })
    }
}

/// First day of the current calendar month in server local time.
pub fn current_period() -> NaiveDate {
    first_of_month(Local::now().date_naive())
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month.
    date.with_day(1).unwrap_or(date)
}
