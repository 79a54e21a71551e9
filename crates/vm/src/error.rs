//! Execution errors. Every variant halts the context that raised it.

use alloy::primitives::U256;

/// An error which halts the current execution context with a failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A push would exceed the 1024 item stack limit
    #[error("stack overflow")]
    StackOverflow,
    /// An instruction needed more items than the stack holds
    #[error("stack underflow")]
    StackUnderflow,
    /// The remaining gas does not cover the instruction
    #[error("out of gas")]
    OutOfGas,
    /// The byte at the program counter is not a defined opcode, or is `INVALID`
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),
    /// A jump targeted something other than a `JUMPDEST`
    #[error("invalid jump destination: {0:#x}")]
    InvalidJump(U256),
    /// A memory offset or size is too large to address
    #[error("invalid memory access")]
    InvalidMemoryAccess,
    /// `RETURNDATACOPY` read past the end of the return data buffer
    #[error("return data out of bounds")]
    ReturnDataOutOfBounds,
    /// A state-modifying instruction ran inside a static call
    #[error("state change attempted in static context")]
    StaticStateChange,
    /// The call depth limit was reached
    #[error("max call depth exceeded")]
    MaxCallDepthExceeded,
    /// `CREATE`/`CREATE2` init code is larger than the configured limit
    #[error("init code size limit exceeded")]
    CreateInitCodeSizeLimit,
    /// Deployed runtime code is larger than the configured limit
    #[error("contract size limit exceeded")]
    CreateContractSizeLimit,
    /// Deployed runtime code starts with the reserved `0xEF` byte
    #[error("contract code starts with 0xef")]
    CreateContractStartingWithEF,
    /// The host failed to serve a request
    #[error("host error: {0}")]
    Host(String),
}

impl From<eyre::Report> for Error {
    fn from(report: eyre::Report) -> Self {
        Error::Host(format!("{report:#}"))
    }
}
