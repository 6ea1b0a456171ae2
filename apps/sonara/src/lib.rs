//! # Sonara
//!
//! The application side of the Sonara finger-exercise tracker.
//!
//! `sonara-core` decides what a frame means; this crate gets frames in and
//! results out:
//!
//! - `source` reads detector output (JSON lines from a file, stdin or a
//!   spawned detector process)
//! - `tracker` drives one session and applies the save policy
//! - `render` draws the status overlay in the terminal
//! - `store` keeps the patient record on disk
//! - `config` loads the TOML tracker configuration
//! - `api` serves the same tracker over HTTP
//! - `cli` ties everything to the command line

pub mod api;
pub mod cli;
pub mod config;
pub mod render;
pub mod source;
pub mod store;
pub mod tracker;
