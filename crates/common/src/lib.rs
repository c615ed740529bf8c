//! Common types shared across the refresh gate workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
