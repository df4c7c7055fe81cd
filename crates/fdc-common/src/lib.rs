//! FDC Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the FDC ingest workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`FdcError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber configuration shared by every binary
//! - **Types**: the denormalized document model written to the document store
//!
//! # Example
//!
//! ```no_run
//! use fdc_common::types::{DocType, Food};
//!
//! let food = Food::new("45001000", "Enriched Bread", DocType::Legacy);
//! assert_eq!(food.fdc_id, "45001000");
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{FdcError, Result};
