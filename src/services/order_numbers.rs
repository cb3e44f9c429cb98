//! Order number generation.
//!
//! Numbers come from a named counter row bumped with a single atomic
//! `UPDATE .. RETURNING`, so concurrent checkouts can never read the same
//! value; the datastore's row lock is the only coordination. The counter
//! only moves forward: a checkout that later fails to commit simply burns
//! its number, which keeps numbers unique even across rollbacks.

use metrics::counter;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, Set, Statement};
use std::sync::Arc;
use tracing::{error, instrument, warn};

use crate::entities::order_sequence;
use crate::errors::{is_unique_violation, CheckoutError};

const SEQUENCE_NAME: &str = "orders";
const PREFIX: &str = "ORD-";
const MAX_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct OrderNumberGenerator {
    db: Arc<DatabaseConnection>,
}

impl OrderNumberGenerator {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Issue the next order number. Safe for unbounded concurrent callers.
    ///
    /// The only retryable condition is the first-ever call racing another
    /// caller to seed the counter row; exhausting the attempts is fatal for
    /// this checkout attempt and never falls back to a non-unique scheme.
    #[instrument(skip(self))]
    pub async fn generate(&self) -> Result<String, CheckoutError> {
        for _attempt in 0..MAX_ATTEMPTS {
            if let Some(value) = self.increment().await? {
                return Ok(format!("{PREFIX}{value:06}"));
            }
            match self.seed().await {
                Ok(()) => {}
                Err(e) if is_unique_violation(&e) => {
                    // Another caller seeded the row first; the next
                    // increment will succeed.
                    warn!("lost the race to seed the order sequence, retrying");
                    counter!("checkout.order_numbers.seed_races", 1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        error!(
            attempts = MAX_ATTEMPTS,
            "order number sequence unavailable after retries"
        );
        counter!("checkout.order_numbers.exhausted", 1);
        Err(CheckoutError::Transient {
            reason: "order number sequence unavailable".to_string(),
        })
    }

    /// Atomically bump the counter and read the new value. `None` means the
    /// counter row does not exist yet.
    async fn increment(&self) -> Result<Option<i64>, DbErr> {
        let backend = self.db.get_database_backend();
        let update = Statement::from_string(
            backend,
            format!(
                "UPDATE order_sequences SET last_value = last_value + 1 \
                 WHERE name = '{SEQUENCE_NAME}' RETURNING last_value"
            ),
        );
        let row = self.db.query_one(update).await?;
        row.map(|r| r.try_get::<i64>("", "last_value")).transpose()
    }

    async fn seed(&self) -> Result<(), DbErr> {
        order_sequence::ActiveModel {
            name: Set(SEQUENCE_NAME.to_string()),
            last_value: Set(0),
        }
        .insert(&*self.db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_zero_padded_and_prefixed() {
        assert_eq!(format!("{PREFIX}{:06}", 1i64), "ORD-000001");
        assert_eq!(format!("{PREFIX}{:06}", 100042i64), "ORD-100042");
        // Wider than the pad: grows, never truncates.
        assert_eq!(format!("{PREFIX}{:06}", 12_345_678i64), "ORD-12345678");
    }
}
