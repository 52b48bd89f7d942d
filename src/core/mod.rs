//! Core types shared across the installer.
//!
//! Currently this is the error vocabulary: [`IrisError`] for typed root
//! causes and [`ErrorContext`] for what the user finally sees.

pub mod error;

pub use error::{ErrorContext, IrisError, user_friendly_error};
