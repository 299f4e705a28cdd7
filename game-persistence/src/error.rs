use game_types::GameError;
use sea_orm::DbErr;

/// Failures from the session store. `Rejected` carries a precondition that
/// was checked inside the store transaction, so nothing was written.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Rejected(#[from] GameError),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn rejection(&self) -> Option<&GameError> {
        match self {
            StoreError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}
