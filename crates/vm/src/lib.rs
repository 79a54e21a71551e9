//! Cinder EVM bytecode interpreter
//!
//! This crate provides a gas-metered interpreter for EVM bytecode, pinned to the Cancun opcode set.
//! State lives behind the [`core::host::Host`] trait; [`core::vm::Executor`] is the entry point.

/// Core VM implementation, including memory, stack, gas accounting, and opcodes
pub mod core;

/// Error types raised while executing bytecode
pub mod error;
