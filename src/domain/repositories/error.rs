//! Errors returned by the durable store.

/// Failure of a store operation.
///
/// Unique-constraint violations are split out because callers treat them as an
/// authoritative "already taken" answer rather than an infrastructure fault.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated ({})", constraint.as_deref().unwrap_or("unknown"))]
    UniqueViolation { constraint: Option<String> },

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return Self::UniqueViolation {
                constraint: db.constraint().map(str::to_string),
            };
        }

        Self::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));

        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_unique_violation_message_names_constraint() {
        let err = StoreError::UniqueViolation {
            constraint: Some("links_alias_key".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unique constraint violated (links_alias_key)"
        );
    }
}
