use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("Constraint `{0}` violated")]
    Conflict(String),
    #[error("Query failed: {0}")]
    Query(DieselError),
    #[error("Cannot encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Blocking task failed: {0}")]
    Worker(String),
    #[error("Injected failure at `{0}`")]
    Injected(&'static str),
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(
                kind @ (DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation),
                info,
            ) => StoreError::Conflict(
                info.constraint_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{kind:?}")),
            ),
            err => StoreError::Query(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum OrderingError {
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("Cart is empty. Add items before placing an order.")]
    EmptyCart,
    #[error("Some items in your cart are no longer available. Please remove them and try again.")]
    ItemsUnavailable,
    #[error("This truck is not accepting orders at the moment.")]
    TruckNotAccepting,
    #[error("Scheduled pickup time must be at least 30 minutes from now")]
    ScheduleTooSoon,
    #[error("Unexpected internal error")]
    Internal(#[source] StoreError),
}

impl OrderingError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        OrderingError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        OrderingError::NotFound(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        OrderingError::InvalidInput(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        OrderingError::Conflict(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        OrderingError::Unavailable(message.into())
    }
}

impl From<StoreError> for OrderingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                OrderingError::Conflict(format!("Conflicts with an existing record ({constraint})"))
            }
            err => OrderingError::Internal(err),
        }
    }
}

impl From<DieselError> for OrderingError {
    fn from(err: DieselError) -> Self {
        StoreError::from(err).into()
    }
}

pub type OrderingResult<T> = Result<T, OrderingError>;
