use alloy::primitives::{Address, Bytes, U256};

use crate::error::Error;

/// A request to execute bytecode. It is the input of [`super::Executor::execute`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    /// The code to run.
    pub bytecode: Bytes,

    /// The gas available to the execution.
    pub gas_limit: u64,

    /// The input data provided to the contract call.
    pub calldata: Bytes,

    /// The address of the executing contract.
    pub address: Address,

    /// The address that directly called this contract.
    pub caller: Address,

    /// The address that originated the transaction.
    pub origin: Address,

    /// The amount of ether sent with the call (in wei).
    pub value: U256,

    /// Whether state modifications are forbidden.
    pub is_static: bool,
}

/// How an execution context halted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// `STOP`, `RETURN`, `SELFDESTRUCT`, or running off the end of the code.
    Success {
        /// The data returned by the execution.
        output: Bytes,
        /// The gas left unused.
        gas_remaining: u64,
    },
    /// `REVERT`. State changes are discarded but unused gas is kept.
    Revert {
        /// The revert data.
        output: Bytes,
        /// The gas left unused.
        gas_remaining: u64,
    },
    /// An exceptional halt. State changes are discarded and all gas is consumed.
    Fail {
        /// Why execution failed.
        reason: Error,
        /// Always zero.
        gas_remaining: u64,
    },
}

impl Outcome {
    /// The returned or reverted data. Empty for failures.
    pub fn output(&self) -> &[u8] {
        match self {
            Outcome::Success { output, .. } | Outcome::Revert { output, .. } => output.as_ref(),
            Outcome::Fail { .. } => &[],
        }
    }

    /// The gas left unused.
    pub fn gas_remaining(&self) -> u64 {
        match self {
            Outcome::Success { gas_remaining, .. } |
            Outcome::Revert { gas_remaining, .. } |
            Outcome::Fail { gas_remaining, .. } => *gas_remaining,
        }
    }

    /// Whether the execution succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// [`ExecutionResult`] is the result of a single top-level execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    /// How the execution halted.
    pub outcome: Outcome,

    /// The amount of gas consumed during the execution.
    pub gas_used: u64,

    /// The accumulated `SSTORE` refund counter. Zero unless the execution succeeded. Refund
    /// capping is left to the caller.
    pub gas_refund: i64,
}

impl ExecutionResult {
    /// Whether the execution succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// The returned or reverted data.
    pub fn output(&self) -> &[u8] {
        self.outcome.output()
    }
}

/// [`Instruction`] is a record of one executed instruction. It is returned by the [`super::VM::step`]
/// function, and contains necessary tracing information.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// The position of this instruction in the bytecode.
    pub pc: usize,

    /// The opcode value of the instruction. Running off the end of the code reads as `STOP`.
    pub opcode: u8,

    /// The call depth of the context that executed the instruction.
    pub depth: usize,

    /// The context's gas before the instruction.
    pub gas_before: u64,

    /// The context's gas after the instruction.
    pub gas_after: u64,

    /// The context's stack size after the instruction.
    pub stack_size: usize,
}
