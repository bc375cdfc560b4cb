use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid api url: {0}")]
    InvalidUrl(String),
    #[error("server error: {0}")]
    Status(u16),
    #[error("the API returned HTML instead of JSON, check the deployment settings")]
    HtmlResponse,
    #[error("request failed: {0}")]
    Api(String),
}
