//! The module contains the errors the engine can return.
//!
//! The derivation components (index, stats, listing) are total and never
//! fail. Errors only come from the drafts, when a form cannot be turned into
//! a valid domain object:
//!
//! - [`InvalidBill`] thrown when a bill draft breaks an invariant.
//! - [`InvalidShop`] thrown when a shop draft breaks an invariant.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//!  [`InvalidBill`]: EngineError::InvalidBill
//!  [`InvalidShop`]: EngineError::InvalidShop
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid bill: {0}")]
    InvalidBill(String),
    #[error("Invalid shop: {0}")]
    InvalidShop(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
}
