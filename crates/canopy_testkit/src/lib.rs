//! # Canopy Testkit
//!
//! Test utilities for Canopy.
//!
//! This crate provides:
//! - Store fixtures and replay helpers
//! - Property-based generators for hierarchy operation sequences
//! - A naive reference model used as an oracle
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use canopy_testkit::prelude::*;
//!
//! let store = sample_forest().unwrap();
//! let index = store.current();
//! assert_eq!(index.view(None).root_keys(), &[10, 40]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
