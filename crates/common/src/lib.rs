//! Shared building blocks for the inventory client workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
