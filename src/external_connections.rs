use sqlx::PgConnection;

/// A handle to an acquired database connection which can be borrowed to issue queries
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Provides access to external systems the business logic communicates with, so
/// driven adapters can stay agnostic of whether they're talking to a connection
/// pool, an open transaction, or a test double.
pub trait ExternalConnectivity {
    type DbHandle<'cxn_borrow>: ConnectionHandle + Send
    where
        Self: 'cxn_borrow;

    /// Acquires a database connection for the duration of one logical query.
    /// The connection is released when the returned handle is dropped, so callers
    /// must not hold a handle across unrelated awaits.
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}

/// An in-progress database transaction. Dropping the handle without calling
/// [TransactionHandle::commit] rolls the transaction back, which makes every
/// early-return and panic path a rollback path without per-call-site cleanup.
pub trait TransactionHandle {
    /// Commits the transaction, persisting everything executed through it
    async fn commit(self) -> Result<(), anyhow::Error>;
}

/// Implemented by connectivity providers which can open a database transaction
pub trait Transactable {
    type Handle: ExternalConnectivity + TransactionHandle + Send;

    async fn start_transaction(&self) -> Result<Self::Handle, anyhow::Error>;
}
