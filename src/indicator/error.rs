use thiserror::Error;

/// Errors raised while setting up a coordinator. Its operations never fail.
#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("visibility coordinator must be created inside a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
