use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};

use crate::{
    core::{analysis::AnalyzedBytecode, gas::Gas, host::Checkpoint, memory::Memory, stack::Stack},
    error::Error,
};

use super::execution::Outcome;

/// The addresses and flags a context executes under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallEnv {
    /// The account whose storage and balance the code acts on (`ADDRESS`).
    pub address: Address,
    /// The account that made the call (`CALLER`).
    pub caller: Address,
    /// The account the code was loaded from.
    pub code_address: Address,
    /// The apparent value of the call (`CALLVALUE`).
    pub value: U256,
    /// Whether state modifications are forbidden.
    pub is_static: bool,
}

/// What created a context, and therefore how its parent resumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// A message call. Output is copied to `return_offset..return_offset + return_size` in the
    /// parent's memory.
    Call {
        /// Where the parent wants the output.
        return_offset: usize,
        /// How many bytes of output the parent wants.
        return_size: usize,
    },
    /// Contract creation. On success the output is deployed at `address`.
    Create {
        /// The address of the new contract.
        address: Address,
    },
}

/// The mutable state of one call frame.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    /// The operand stack.
    pub stack: Stack,
    /// The frame's memory.
    pub memory: Memory,
    /// The program counter.
    pub pc: usize,
    /// The frame's gas meter.
    pub gas: Gas,
    /// The code being executed, with its jump table.
    pub code: Arc<AnalyzedBytecode>,
    /// The input data of the call.
    pub calldata: Bytes,
    /// The output of the most recent child call or create.
    pub return_data: Bytes,
    /// The addresses and flags of the call.
    pub env: CallEnv,
    /// The nesting depth; the top-level context is depth 0.
    pub depth: usize,
    /// The refund counter accumulated by this frame and its successful children.
    pub refund: i64,
    /// The host checkpoint taken when the frame was entered.
    pub checkpoint: Checkpoint,
    /// How the frame was created.
    pub kind: FrameKind,
    /// Set once the frame halts.
    pub halted: Option<Outcome>,
}

impl ExecutionContext {
    /// Creates a running context at pc 0 with an empty stack and memory.
    pub fn new(
        code: Arc<AnalyzedBytecode>,
        calldata: Bytes,
        env: CallEnv,
        gas_limit: u64,
        depth: usize,
        checkpoint: Checkpoint,
        kind: FrameKind,
    ) -> Self {
        ExecutionContext {
            stack: Stack::new(),
            memory: Memory::new(),
            pc: 0,
            gas: Gas::new(gas_limit),
            code,
            calldata,
            return_data: Bytes::new(),
            env,
            depth,
            refund: 0,
            checkpoint,
            kind,
            halted: None,
        }
    }

    /// Whether the context has halted.
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Halts successfully with `output`.
    pub fn succeed(&mut self, output: Bytes) {
        self.halted = Some(Outcome::Success { output, gas_remaining: self.gas.remaining() });
    }

    /// Halts with a revert carrying `output`.
    pub fn revert(&mut self, output: Bytes) {
        self.halted = Some(Outcome::Revert { output, gas_remaining: self.gas.remaining() });
    }

    /// Halts with a failure, consuming all remaining gas.
    pub fn fail(&mut self, reason: Error) {
        self.gas.consume_all();
        self.halted = Some(Outcome::Fail { reason, gas_remaining: 0 });
    }
}
