//! Unit of Work: one atomic transaction spanning many repository calls.
//!
//! # Responsibility
//! - Open a `BEGIN IMMEDIATE` transaction and hand out repositories bound to
//!   it, so callers never reach the connection directly.
//! - Guarantee commit-or-rollback on every exit path.
//! - Enforce caller-supplied deadlines and cancellation between steps.
//!
//! # Invariants
//! - A unit that is dropped without `commit()` rolls back, including while
//!   unwinding from a panic.
//! - An expired deadline or a cancelled token always ends in rollback, never
//!   in a partial commit.

use crate::repo::archive_repo::SqliteArchiveRepository;
use crate::repo::catalog_repo::SqliteCatalogRepository;
use crate::repo::grade_repo::SqliteGradeRepository;
use crate::repo::group_repo::SqliteGroupRepository;
use crate::repo::student_repo::SqliteStudentRepository;
use crate::repo::RepoError;
use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag used to abort an in-flight unit of work from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-call transaction limits.
#[derive(Debug, Clone, Default)]
pub struct TransactionOptions {
    /// Budget for the whole unit, measured from `begin`.
    pub timeout: Option<Duration>,
    pub cancellation: Option<CancellationToken>,
}

impl TransactionOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Failure of the transaction itself rather than of the work inside it.
#[derive(Debug)]
pub enum TransactionError {
    /// Begin, statement or commit failed in the store.
    Store(RepoError),
    DeadlineExceeded { timeout_ms: u128 },
    Cancelled,
}

impl Display for TransactionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store failure: {err}"),
            Self::DeadlineExceeded { timeout_ms } => {
                write!(f, "unit of work exceeded its {timeout_ms} ms deadline")
            }
            Self::Cancelled => write!(f, "unit of work was cancelled"),
        }
    }
}

impl Error for TransactionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::DeadlineExceeded { .. } => None,
            Self::Cancelled => None,
        }
    }
}

impl From<RepoError> for TransactionError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

impl From<rusqlite::Error> for TransactionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(value.into())
    }
}

/// One open write transaction plus repository accessors bound to it.
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
    started_at: Instant,
    timeout: Option<Duration>,
    cancellation: Option<CancellationToken>,
}

impl<'conn> UnitOfWork<'conn> {
    /// Begins an immediate transaction, taking the write lock up front.
    ///
    /// Competing writers wait up to the connection busy timeout.
    pub fn begin(
        conn: &'conn Connection,
        options: &TransactionOptions,
    ) -> Result<Self, TransactionError> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        debug!("event=uow_begin module=uow status=ok");
        Ok(Self {
            tx,
            started_at: Instant::now(),
            timeout: options.timeout,
            cancellation: options.cancellation.clone(),
        })
    }

    pub fn groups(&self) -> SqliteGroupRepository<'_> {
        SqliteGroupRepository::new(&self.tx)
    }

    pub fn students(&self) -> SqliteStudentRepository<'_> {
        SqliteStudentRepository::new(&self.tx)
    }

    pub fn grades(&self) -> SqliteGradeRepository<'_> {
        SqliteGradeRepository::new(&self.tx)
    }

    pub fn catalog(&self) -> SqliteCatalogRepository<'_> {
        SqliteCatalogRepository::new(&self.tx)
    }

    pub fn archive(&self) -> SqliteArchiveRepository<'_> {
        SqliteArchiveRepository::new(&self.tx)
    }

    /// Fails once the deadline has passed or the token was cancelled.
    ///
    /// Called between steps of multi-step work.
    pub fn checkpoint(&self) -> Result<(), TransactionError> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Err(TransactionError::Cancelled);
        }
        if let Some(timeout) = self.timeout {
            if self.started_at.elapsed() >= timeout {
                return Err(TransactionError::DeadlineExceeded {
                    timeout_ms: timeout.as_millis(),
                });
            }
        }
        Ok(())
    }

    pub fn commit(self) -> Result<(), TransactionError> {
        self.tx.commit()?;
        debug!(
            "event=uow_commit module=uow status=ok duration_ms={}",
            self.started_at.elapsed().as_millis()
        );
        Ok(())
    }

    pub fn rollback(self) -> Result<(), TransactionError> {
        self.tx.rollback()?;
        debug!(
            "event=uow_rollback module=uow status=ok duration_ms={}",
            self.started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

/// Runs `work` inside one unit of work.
///
/// Commits when `work` returns `Ok` and the unit is still within its limits;
/// rolls back otherwise. A failed rollback is logged and the original error
/// is returned.
pub fn run_in_transaction<T, E, F>(
    conn: &Connection,
    options: &TransactionOptions,
    work: F,
) -> Result<T, E>
where
    F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
    E: From<TransactionError>,
{
    let uow = UnitOfWork::begin(conn, options)?;

    let outcome = work(&uow).and_then(|value| {
        uow.checkpoint()?;
        Ok(value)
    });

    match outcome {
        Ok(value) => {
            uow.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback() {
                warn!(
                    "event=uow_rollback module=uow status=error error_code=rollback_failed error={}",
                    rollback_err
                );
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{run_in_transaction, CancellationToken, TransactionError, TransactionOptions};
    use crate::db::open_db_in_memory;
    use crate::model::group::StudentGroup;
    use crate::repo::group_repo::GroupRepository;
    use crate::repo::RepoError;
    use std::time::Duration;

    #[derive(Debug)]
    enum TestError {
        Tx(TransactionError),
        Forced,
    }

    impl From<TransactionError> for TestError {
        fn from(value: TransactionError) -> Self {
            Self::Tx(value)
        }
    }

    impl From<RepoError> for TestError {
        fn from(value: RepoError) -> Self {
            Self::Tx(TransactionError::Store(value))
        }
    }

    fn group_count(conn: &rusqlite::Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM student_groups;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn ok_work_commits() {
        let conn = open_db_in_memory().unwrap();
        let group = StudentGroup::new("CS-1", "Computer Science 1", 20);

        run_in_transaction(&conn, &TransactionOptions::default(), |uow| {
            uow.groups().insert_group(&group)?;
            Ok::<_, TestError>(())
        })
        .unwrap();

        assert_eq!(group_count(&conn), 1);
    }

    #[test]
    fn failing_work_rolls_back_every_write() {
        let conn = open_db_in_memory().unwrap();

        let err = run_in_transaction(&conn, &TransactionOptions::default(), |uow| {
            uow.groups()
                .insert_group(&StudentGroup::new("A", "Alpha", 10))?;
            uow.groups()
                .insert_group(&StudentGroup::new("B", "Beta", 10))?;
            Err::<(), _>(TestError::Forced)
        })
        .unwrap_err();

        assert!(matches!(err, TestError::Forced));
        assert_eq!(group_count(&conn), 0);
    }

    #[test]
    fn cancelled_token_rolls_back_before_commit() {
        let conn = open_db_in_memory().unwrap();
        let token = CancellationToken::new();
        let options = TransactionOptions::default().with_cancellation(token.clone());

        let err = run_in_transaction(&conn, &options, |uow| {
            uow.groups()
                .insert_group(&StudentGroup::new("A", "Alpha", 10))?;
            token.cancel();
            Ok::<_, TestError>(())
        })
        .unwrap_err();

        assert!(matches!(err, TestError::Tx(TransactionError::Cancelled)));
        assert_eq!(group_count(&conn), 0);
    }

    #[test]
    fn zero_timeout_is_exceeded_at_first_checkpoint() {
        let conn = open_db_in_memory().unwrap();
        let options = TransactionOptions::default().with_timeout(Duration::ZERO);

        let err = run_in_transaction(&conn, &options, |uow| {
            uow.checkpoint()?;
            Ok::<_, TestError>(())
        })
        .unwrap_err();

        assert!(matches!(
            err,
            TestError::Tx(TransactionError::DeadlineExceeded { timeout_ms: 0 })
        ));
    }

    #[test]
    fn nested_unit_of_work_is_rejected_by_the_store() {
        let conn = open_db_in_memory().unwrap();

        let err = run_in_transaction(&conn, &TransactionOptions::default(), |_outer| {
            run_in_transaction(&conn, &TransactionOptions::default(), |_inner| {
                Ok::<_, TestError>(())
            })
        })
        .unwrap_err();

        assert!(matches!(err, TestError::Tx(TransactionError::Store(_))));
    }
}
