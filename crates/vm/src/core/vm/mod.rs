//! Virtual Machine implementation for EVM execution.
//!
//! This module provides the core VM struct and its execution logic,
//! organized into submodules for better maintainability.

/// Per-frame execution state.
pub mod context;
mod core;
mod dispatch;
mod execution;
mod executor;

/// Opcode handlers organized by category.
pub mod handlers;

pub use self::core::VM;
pub use context::{CallEnv, ExecutionContext, FrameKind};
pub use execution::{ExecutionResult, Instruction, Message, Outcome};
pub use executor::Executor;
