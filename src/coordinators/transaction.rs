use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::errors::internal::DatabaseError;
use crate::errors::{InternalError, ServiceError};

/// Observable lifecycle of a `TransactionCoordinator`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    Active,
    Committed,
    RolledBack,
}

enum Slot {
    Idle,
    Active(DatabaseTransaction),
    Committed,
    RolledBack,
}

/// Owns the single transaction of one logical multi-step mutation
///
/// ```text
/// Idle --begin--> Active --commit---> Committed
///                        --rollback-> RolledBack
/// ```
///
/// A coordinator is used once. It hands out the open transaction through
/// `connection()` and never opens a second one; a coordinator dropped while
/// `Active` rolls its transaction back.
pub struct TransactionCoordinator {
    db: DatabaseConnection,
    operation: &'static str,
    slot: Slot,
}

impl TransactionCoordinator {
    pub fn new(db: DatabaseConnection, operation: &'static str) -> Self {
        Self {
            db,
            operation,
            slot: Slot::Idle,
        }
    }

    /// `new` followed by `begin`
    pub async fn start(db: DatabaseConnection, operation: &'static str) -> Result<Self, ServiceError> {
        let mut coordinator = Self::new(db, operation);
        coordinator.begin().await?;
        Ok(coordinator)
    }

    pub fn state(&self) -> TransactionState {
        match self.slot {
            Slot::Idle => TransactionState::Idle,
            Slot::Active(_) => TransactionState::Active,
            Slot::Committed => TransactionState::Committed,
            Slot::RolledBack => TransactionState::RolledBack,
        }
    }

    /// Open the underlying transaction
    ///
    /// # Errors
    /// `TransactionStartFailed` when the storage cannot open a transaction,
    /// or when this coordinator is not `Idle`
    pub async fn begin(&mut self) -> Result<(), ServiceError> {
        if !matches!(self.slot, Slot::Idle) {
            tracing::error!(operation = self.operation, state = ?self.state(), "Transaction re-entry rejected");
            return Err(ServiceError::TransactionStartFailed(format!(
                "{}: transaction already used",
                self.operation
            )));
        }

        let txn = self.db.begin().await.map_err(|source| {
            ServiceError::from_internal(
                self.operation,
                InternalError::Database(DatabaseError::TransactionBegin { source }),
            )
        })?;

        tracing::debug!(operation = self.operation, "Transaction started");
        self.slot = Slot::Active(txn);
        Ok(())
    }

    /// The open transaction, for handing to store calls
    pub fn connection(&self) -> Result<&DatabaseTransaction, ServiceError> {
        match &self.slot {
            Slot::Active(txn) => Ok(txn),
            _ => Err(ServiceError::NoActiveTransaction),
        }
    }

    pub async fn commit(&mut self) -> Result<(), ServiceError> {
        match std::mem::replace(&mut self.slot, Slot::Committed) {
            Slot::Active(txn) => match txn.commit().await {
                Ok(()) => {
                    tracing::debug!(operation = self.operation, "Transaction committed");
                    Ok(())
                }
                Err(source) => {
                    self.slot = Slot::RolledBack;
                    Err(ServiceError::from_internal(
                        self.operation,
                        InternalError::Database(DatabaseError::TransactionCommit { source }),
                    ))
                }
            },
            previous => {
                self.slot = previous;
                Err(ServiceError::NoActiveTransaction)
            }
        }
    }

    pub async fn rollback(&mut self) -> Result<(), ServiceError> {
        match std::mem::replace(&mut self.slot, Slot::RolledBack) {
            Slot::Active(txn) => {
                txn.rollback().await.map_err(|source| {
                    ServiceError::from_internal(
                        self.operation,
                        InternalError::Database(DatabaseError::TransactionRollback { source }),
                    )
                })?;
                tracing::debug!(operation = self.operation, "Transaction rolled back");
                Ok(())
            }
            previous => {
                self.slot = previous;
                Err(ServiceError::NoActiveTransaction)
            }
        }
    }

    /// Commit on `Ok`, roll back on `Err`
    ///
    /// The work's own error is what the caller sees; a rollback failure is
    /// only logged.
    pub async fn finish<T>(&mut self, result: Result<T, InternalError>) -> Result<T, ServiceError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::error!(
                        operation = self.operation,
                        error = %rollback_err,
                        "Rollback failed after operation error"
                    );
                }
                Err(ServiceError::from_internal(self.operation, err))
            }
        }
    }
}

impl Drop for TransactionCoordinator {
    fn drop(&mut self) {
        if matches!(self.slot, Slot::Active(_)) {
            tracing::warn!(operation = self.operation, "Transaction dropped while active, rolling back");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::RoleStore;
    use crate::test::utils::setup_test_database;
    use crate::types::NewRole;

    #[tokio::test]
    async fn test_state_transitions_on_commit() {
        let db = setup_test_database().await;
        let mut tx = TransactionCoordinator::new(db, "test_commit");
        assert_eq!(tx.state(), TransactionState::Idle);

        tx.begin().await.unwrap();
        assert_eq!(tx.state(), TransactionState::Active);

        tx.commit().await.unwrap();
        assert_eq!(tx.state(), TransactionState::Committed);
    }

    #[tokio::test]
    async fn test_commit_and_rollback_require_active_transaction() {
        let db = setup_test_database().await;
        let mut tx = TransactionCoordinator::new(db, "test_idle");

        assert_eq!(tx.commit().await.unwrap_err(), ServiceError::NoActiveTransaction);
        assert_eq!(tx.rollback().await.unwrap_err(), ServiceError::NoActiveTransaction);
        assert_eq!(tx.connection().unwrap_err(), ServiceError::NoActiveTransaction);
        assert_eq!(tx.state(), TransactionState::Idle);
    }

    #[tokio::test]
    async fn test_second_begin_is_rejected() {
        let db = setup_test_database().await;
        let mut tx = TransactionCoordinator::start(db, "test_reentry").await.unwrap();

        let err = tx.begin().await.unwrap_err();
        assert!(matches!(err, ServiceError::TransactionStartFailed(_)));
        assert_eq!(tx.state(), TransactionState::Active);

        tx.rollback().await.unwrap();
        assert!(matches!(tx.begin().await.unwrap_err(), ServiceError::TransactionStartFailed(_)));
    }

    #[tokio::test]
    async fn test_finish_with_error_discards_writes() {
        let db = setup_test_database().await;
        let store = RoleStore::new();

        let mut tx = TransactionCoordinator::start(db.clone(), "test_finish").await.unwrap();
        let result: Result<(), InternalError> = async {
            let conn = tx.connection().map_err(|_| InternalError::not_found("transaction", "test"))?;
            store.insert(conn, &NewRole::new("admin").unwrap()).await?;
            Err(InternalError::not_found("permission", 7))
        }
        .await;
        let err = tx.finish(result).await.unwrap_err();

        assert_eq!(err, ServiceError::NotFound("permission not found: 7".to_string()));
        assert_eq!(tx.state(), TransactionState::RolledBack);
        assert_eq!(store.count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_finish_with_ok_commits_writes() {
        let db = setup_test_database().await;
        let store = RoleStore::new();

        let mut tx = TransactionCoordinator::start(db.clone(), "test_finish").await.unwrap();
        let result = store.insert(tx.connection().unwrap(), &NewRole::new("admin").unwrap()).await;
        let role = tx.finish(result).await.unwrap();

        assert_eq!(tx.state(), TransactionState::Committed);
        assert_eq!(store.find_by_id(&db, role.id).await.unwrap(), Some(role));
    }

    #[tokio::test]
    async fn test_dropping_active_coordinator_rolls_back() {
        let db = setup_test_database().await;
        let store = RoleStore::new();

        {
            let tx = TransactionCoordinator::start(db.clone(), "test_drop").await.unwrap();
            store.insert(tx.connection().unwrap(), &NewRole::new("admin").unwrap()).await.unwrap();
        }

        assert_eq!(store.count(&db).await.unwrap(), 0);
    }
}
