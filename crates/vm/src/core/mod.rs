/// Jump destination analysis for bytecode
pub mod analysis;

/// Constants used throughout the VM implementation
pub mod constants;

/// Gas cost tables, dynamic cost helpers, and the gas meter
pub mod gas;

/// The [`host::Host`] trait through which the VM reaches world state
pub mod host;

/// Log implementation for event handling
pub mod log;

/// Memory implementation for VM memory management
pub mod memory;

/// Opcode definitions and metadata
pub mod opcodes;

/// Stack implementation for the VM
pub mod stack;

/// An in-memory, journaled [`host::Host`] implementation
pub mod storage;

/// Core virtual machine implementation
pub mod vm;

/// 256-bit word arithmetic
pub mod word;
