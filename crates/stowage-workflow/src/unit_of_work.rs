use async_trait::async_trait;

/// An open database transaction.
///
/// Every repository call in a workflow receives the unit of work
/// explicitly. Finishing consumes it, so a unit of work is committed or
/// rolled back at most once.
#[async_trait]
pub trait UnitOfWork: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn commit(self) -> Result<(), Self::Error>;

    async fn rollback(self) -> Result<(), Self::Error>;
}

/// Opens units of work, typically a database pool.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    type Transaction: UnitOfWork;

    async fn begin(&self) -> Result<Self::Transaction, <Self::Transaction as UnitOfWork>::Error>;
}

/// Error type of the units of work opened by `S`.
pub type UnitOfWorkError<S> =
    <<S as TransactionSource>::Transaction as UnitOfWork>::Error;
