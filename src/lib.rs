//! Absenteeism inference service.
//!
//! Turns a raw employee record into the model's training feature layout,
//! predicts absent hours with a stacked regressor and optionally assigns a
//! k-means risk cluster. A separate report generator renders descriptive
//! charts from the employee dataset.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod reports;

pub use error::{AppError, Result};
