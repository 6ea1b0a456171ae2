//! # Formats Module
//!
//! On-disk representation of the patient record.
//! File I/O lives in the app layer; this module only converts bytes.

mod persistence;

pub use persistence::*;
