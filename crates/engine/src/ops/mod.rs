use sea_orm::{DatabaseConnection, DbErr, SqlErr, UpdateResult};

use crate::{EngineError, ResultEngine, TolerancePolicy};

mod access;
mod handovers;
mod reconciliation;
mod shifts;

pub use access::Actor;
pub use reconciliation::CashFlowSummary;
pub use shifts::ShiftListFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    tolerance: TolerancePolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The tolerance policy confirmations are judged against.
    pub fn tolerance(&self) -> TolerancePolicy {
        self.tolerance
    }
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Interprets the result of a transition UPDATE guarded on the current
/// status: zero rows affected means another writer took the transition first.
fn require_transition(result: UpdateResult, message: &str) -> ResultEngine<()> {
    if result.rows_affected == 0 {
        return Err(EngineError::Conflict(message.to_string()));
    }
    Ok(())
}

/// Maps a unique-constraint violation on insert to a conflict. The schema
/// backs the uniqueness checks done inside the transaction, so a racing
/// inserter that slips past the check still surfaces as a conflict.
fn unique_violation(err: DbErr, message: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::Conflict(message.to_string()),
        _ => EngineError::Database(err),
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    tolerance: TolerancePolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default tolerance policy
    pub fn tolerance(mut self, tolerance: TolerancePolicy) -> EngineBuilder {
        self.tolerance = tolerance;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            tolerance: self.tolerance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn losing_a_guarded_transition_is_a_conflict() {
        let err = require_transition(
            UpdateResult { rows_affected: 0 },
            "shift was closed concurrently",
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::Conflict("shift was closed concurrently".to_string())
        );
    }

    #[test]
    fn winning_a_guarded_transition_passes() {
        assert!(require_transition(UpdateResult { rows_affected: 1 }, "unused").is_ok());
    }

    #[test]
    fn non_unique_database_errors_pass_through() {
        let err = unique_violation(DbErr::Custom("boom".to_string()), "duplicate");
        assert!(matches!(err, EngineError::Database(_)));
    }
}
