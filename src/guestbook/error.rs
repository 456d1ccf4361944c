use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not valid guestbook JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}
