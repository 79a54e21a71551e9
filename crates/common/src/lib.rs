//! Common utilities used across the cinder workspace.
//!
//! This crate provides the small shared helpers the interpreter and configuration crates
//! depend on: hex encoding, signed word reinterpretation, and file IO.

/// General utility functions and types for common tasks.
pub mod utils;
