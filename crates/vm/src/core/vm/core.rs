use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use cinder_config::GasParams;
use tracing::warn;

#[cfg(feature = "step-tracing")]
use std::time::Instant;
#[cfg(feature = "step-tracing")]
use tracing::trace;

use crate::{
    core::{
        analysis::AnalyzedBytecode,
        gas::{memory_expansion_cost, CostTable, Limits},
        host::Host,
        opcodes::{Opcode, STOP},
    },
    error::Error,
};

use super::{
    context::{CallEnv, ExecutionContext, FrameKind},
    dispatch,
    execution::{ExecutionResult, Instruction, Message, Outcome},
    handlers,
};

/// The [`VM`] struct represents an EVM instance. \
/// It drives the current [`ExecutionContext`] one instruction at a time. Contexts suspended by a
/// call or create wait on an explicit frame stack, so nesting never recurses natively.
#[derive(Debug)]
pub struct VM<'a> {
    /// The context currently executing.
    pub ctx: ExecutionContext,

    /// Suspended ancestors of `ctx`, outermost first. `parents[d]` is the context at depth `d`.
    parents: Vec<ExecutionContext>,

    /// The world state.
    pub(crate) host: &'a mut dyn Host,

    /// Instruction costs.
    pub(crate) costs: &'a dyn CostTable,

    /// Call depth and code size limits.
    pub(crate) limits: Limits,

    /// The address that originated the transaction.
    pub origin: Address,

    /// Counter for operations executed (only available with step-tracing feature).
    #[cfg(feature = "step-tracing")]
    pub operation_count: u128,

    /// The time when execution started (only available with step-tracing feature).
    #[cfg(feature = "step-tracing")]
    pub start_time: Instant,
}

impl<'a> VM<'a> {
    /// Creates a new [`VM`] ready to run `message` at depth 0. The caller and the executing
    /// address are warmed, and a host checkpoint is opened for the whole execution.
    ///
    /// ```
    /// use alloy::primitives::Bytes;
    /// use cinder_vm::core::{
    ///     gas::{GasSchedule, Limits},
    ///     storage::InMemoryHost,
    ///     vm::{Message, VM},
    /// };
    ///
    /// let mut host = InMemoryHost::new();
    /// let schedule = GasSchedule::default();
    /// let message = Message {
    ///     bytecode: Bytes::from_static(&[0x00]),
    ///     gas_limit: 1_000_000,
    ///     ..Default::default()
    /// };
    ///
    /// let vm = VM::new(&mut host, &schedule, Limits::default(), message);
    /// assert_eq!(vm.ctx.pc, 0);
    /// assert!(!vm.is_finished());
    /// ```
    pub fn new(
        host: &'a mut dyn Host,
        costs: &'a dyn CostTable,
        limits: Limits,
        message: Message,
    ) -> VM<'a> {
        host.warm_account(message.origin);
        host.warm_account(message.caller);
        host.warm_account(message.address);
        let checkpoint = host.checkpoint();

        let env = CallEnv {
            address: message.address,
            caller: message.caller,
            code_address: message.address,
            value: message.value,
            is_static: message.is_static,
        };
        let ctx = ExecutionContext::new(
            Arc::new(AnalyzedBytecode::new(message.bytecode)),
            message.calldata,
            env,
            message.gas_limit,
            0,
            checkpoint,
            FrameKind::Call { return_offset: 0, return_size: 0 },
        );

        VM {
            ctx,
            parents: Vec::new(),
            host,
            costs,
            limits,
            origin: message.origin,
            #[cfg(feature = "step-tracing")]
            operation_count: 0,
            #[cfg(feature = "step-tracing")]
            start_time: Instant::now(),
        }
    }

    /// The dynamic gas parameters of the active cost table.
    #[inline]
    pub(crate) fn gas_params(&self) -> &'a GasParams {
        self.costs.params()
    }

    /// The current call depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.ctx.depth
    }

    /// Whether the top-level context has halted.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.parents.is_empty() && self.ctx.is_halted()
    }

    /// The cost of growing the current memory to cover `offset..offset + size`.
    #[inline]
    pub(crate) fn memory_expansion(&self, offset: usize, size: usize) -> u64 {
        memory_expansion_cost(self.ctx.memory.size(), offset, size, self.gas_params())
    }

    /// Pops one operand and pushes `op(a)`.
    #[inline]
    pub(crate) fn unary_op(&mut self, op: fn(U256) -> U256) -> Result<(), Error> {
        let a = self.ctx.stack.pop()?;
        self.ctx.stack.push(op(a))
    }

    /// Pops two operands and pushes `op(a, b)`, where `a` was on top.
    #[inline]
    pub(crate) fn binary_op(&mut self, op: fn(U256, U256) -> U256) -> Result<(), Error> {
        let [a, b] = self.ctx.stack.pop_n::<2>()?;
        self.ctx.stack.push(op(a, b))
    }

    /// Pops three operands and pushes `op(a, b, c)`, where `a` was on top.
    #[inline]
    pub(crate) fn ternary_op(&mut self, op: fn(U256, U256, U256) -> U256) -> Result<(), Error> {
        let [a, b, c] = self.ctx.stack.pop_n::<3>()?;
        self.ctx.stack.push(op(a, b, c))
    }

    /// Suspends the current context and makes `child` current.
    pub(crate) fn enter(&mut self, child: ExecutionContext) {
        let parent = std::mem::replace(&mut self.ctx, child);
        self.parents.push(parent);
    }

    /// Resumes the parent of a halted context.
    fn leave(&mut self) {
        let Some(parent) = self.parents.pop() else { return };
        let child = std::mem::replace(&mut self.ctx, parent);
        if let Err(reason) = dispatch::resume(self, child) {
            self.fail(reason);
        }
    }

    fn fail(&mut self, reason: Error) {
        if let Error::Host(message) = &reason {
            warn!(depth = self.ctx.depth, pc = self.ctx.pc, "host error: {}", message);
        }
        self.ctx.fail(reason);
    }

    /// Decodes, validates, charges, and runs the instruction at the program counter.
    fn execute_instruction(&mut self) -> Result<(), Error> {
        // running off the end of the code is an implicit STOP
        let Some(byte) = self.ctx.code.byte_at(self.ctx.pc) else {
            self.ctx.succeed(Bytes::new());
            return Ok(());
        };

        let opcode = Opcode::from_byte(byte).ok_or(Error::InvalidOpcode(byte))?;
        let info = opcode.info();
        self.ctx.stack.require(info.inputs() as usize, info.outputs() as usize)?;
        if self.ctx.env.is_static && !info.is_view() {
            return Err(Error::StaticStateChange);
        }

        // Consume the base gas for the opcode
        self.ctx.gas.record_cost(self.costs.base_cost(opcode))?;
        self.ctx.pc += 1;

        #[cfg(feature = "step-tracing")]
        {
            self.operation_count += 1;
        }

        // execute the operation
        match opcode {
            Opcode::STOP => handlers::control::stop(self),

            Opcode::ADD => handlers::arithmetic::add(self),
            Opcode::MUL => handlers::arithmetic::mul(self),
            Opcode::SUB => handlers::arithmetic::sub(self),
            Opcode::DIV => handlers::arithmetic::div(self),
            Opcode::SDIV => handlers::arithmetic::sdiv(self),
            Opcode::MOD => handlers::arithmetic::modulo(self),
            Opcode::SMOD => handlers::arithmetic::smod(self),
            Opcode::ADDMOD => handlers::arithmetic::addmod(self),
            Opcode::MULMOD => handlers::arithmetic::mulmod(self),
            Opcode::EXP => handlers::arithmetic::exp(self),
            Opcode::SIGNEXTEND => handlers::arithmetic::signextend(self),

            Opcode::LT => handlers::comparison::lt(self),
            Opcode::GT => handlers::comparison::gt(self),
            Opcode::SLT => handlers::comparison::slt(self),
            Opcode::SGT => handlers::comparison::sgt(self),
            Opcode::EQ => handlers::comparison::eq(self),
            Opcode::ISZERO => handlers::comparison::iszero(self),

            Opcode::AND => handlers::bitwise::and(self),
            Opcode::OR => handlers::bitwise::or(self),
            Opcode::XOR => handlers::bitwise::xor(self),
            Opcode::NOT => handlers::bitwise::not(self),
            Opcode::BYTE => handlers::bitwise::byte(self),
            Opcode::SHL => handlers::bitwise::shl(self),
            Opcode::SHR => handlers::bitwise::shr(self),
            Opcode::SAR => handlers::bitwise::sar(self),

            Opcode::KECCAK256 => handlers::crypto::keccak256(self),

            Opcode::ADDRESS => handlers::environment::address(self),
            Opcode::BALANCE => handlers::environment::balance(self),
            Opcode::ORIGIN => handlers::environment::origin(self),
            Opcode::CALLER => handlers::environment::caller(self),
            Opcode::CALLVALUE => handlers::environment::callvalue(self),
            Opcode::CALLDATALOAD => handlers::environment::calldataload(self),
            Opcode::CALLDATASIZE => handlers::environment::calldatasize(self),
            Opcode::CALLDATACOPY => handlers::environment::calldatacopy(self),
            Opcode::CODESIZE => handlers::environment::codesize(self),
            Opcode::CODECOPY => handlers::environment::codecopy(self),
            Opcode::GASPRICE => handlers::environment::gasprice(self),
            Opcode::EXTCODESIZE => handlers::environment::extcodesize(self),
            Opcode::EXTCODECOPY => handlers::environment::extcodecopy(self),
            Opcode::RETURNDATASIZE => handlers::environment::returndatasize(self),
            Opcode::RETURNDATACOPY => handlers::environment::returndatacopy(self),
            Opcode::EXTCODEHASH => handlers::environment::extcodehash(self),

            Opcode::BLOCKHASH => handlers::block::blockhash(self),
            Opcode::COINBASE => handlers::block::coinbase(self),
            Opcode::TIMESTAMP => handlers::block::timestamp(self),
            Opcode::NUMBER => handlers::block::number(self),
            Opcode::PREVRANDAO => handlers::block::prevrandao(self),
            Opcode::GASLIMIT => handlers::block::gaslimit(self),
            Opcode::CHAINID => handlers::block::chainid(self),
            Opcode::SELFBALANCE => handlers::block::selfbalance(self),
            Opcode::BASEFEE => handlers::block::basefee(self),
            Opcode::BLOBHASH => handlers::block::blobhash(self),
            Opcode::BLOBBASEFEE => handlers::block::blobbasefee(self),

            Opcode::POP => handlers::stack::pop(self),
            Opcode::MLOAD => handlers::memory::mload(self),
            Opcode::MSTORE => handlers::memory::mstore(self),
            Opcode::MSTORE8 => handlers::memory::mstore8(self),
            Opcode::SLOAD => handlers::storage::sload(self),
            Opcode::SSTORE => handlers::storage::sstore(self),
            Opcode::JUMP => handlers::control::jump(self),
            Opcode::JUMPI => handlers::control::jumpi(self),
            Opcode::PC => handlers::control::pc(self),
            Opcode::MSIZE => handlers::memory::msize(self),
            Opcode::GAS => handlers::control::gas(self),
            Opcode::JUMPDEST => Ok(()),
            Opcode::TLOAD => handlers::storage::tload(self),
            Opcode::TSTORE => handlers::storage::tstore(self),
            Opcode::MCOPY => handlers::memory::mcopy(self),

            Opcode::PUSH0 => handlers::stack::push0(self),
            Opcode::PUSH1 |
            Opcode::PUSH2 |
            Opcode::PUSH3 |
            Opcode::PUSH4 |
            Opcode::PUSH5 |
            Opcode::PUSH6 |
            Opcode::PUSH7 |
            Opcode::PUSH8 |
            Opcode::PUSH9 |
            Opcode::PUSH10 |
            Opcode::PUSH11 |
            Opcode::PUSH12 |
            Opcode::PUSH13 |
            Opcode::PUSH14 |
            Opcode::PUSH15 |
            Opcode::PUSH16 |
            Opcode::PUSH17 |
            Opcode::PUSH18 |
            Opcode::PUSH19 |
            Opcode::PUSH20 |
            Opcode::PUSH21 |
            Opcode::PUSH22 |
            Opcode::PUSH23 |
            Opcode::PUSH24 |
            Opcode::PUSH25 |
            Opcode::PUSH26 |
            Opcode::PUSH27 |
            Opcode::PUSH28 |
            Opcode::PUSH29 |
            Opcode::PUSH30 |
            Opcode::PUSH31 |
            Opcode::PUSH32 => handlers::stack::push_n(self, info.immediate_size() as usize),

            Opcode::DUP1 |
            Opcode::DUP2 |
            Opcode::DUP3 |
            Opcode::DUP4 |
            Opcode::DUP5 |
            Opcode::DUP6 |
            Opcode::DUP7 |
            Opcode::DUP8 |
            Opcode::DUP9 |
            Opcode::DUP10 |
            Opcode::DUP11 |
            Opcode::DUP12 |
            Opcode::DUP13 |
            Opcode::DUP14 |
            Opcode::DUP15 |
            Opcode::DUP16 => handlers::stack::dup_n(self, (byte - Opcode::DUP1.byte() + 1) as usize),

            Opcode::SWAP1 |
            Opcode::SWAP2 |
            Opcode::SWAP3 |
            Opcode::SWAP4 |
            Opcode::SWAP5 |
            Opcode::SWAP6 |
            Opcode::SWAP7 |
            Opcode::SWAP8 |
            Opcode::SWAP9 |
            Opcode::SWAP10 |
            Opcode::SWAP11 |
            Opcode::SWAP12 |
            Opcode::SWAP13 |
            Opcode::SWAP14 |
            Opcode::SWAP15 |
            Opcode::SWAP16 => {
                handlers::stack::swap_n(self, (byte - Opcode::SWAP1.byte() + 1) as usize)
            }

            Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
                handlers::logging::log_n(self, (byte - Opcode::LOG0.byte()) as usize)
            }

            Opcode::CREATE => handlers::system::create(self),
            Opcode::CALL => handlers::system::call(self),
            Opcode::CALLCODE => handlers::system::callcode(self),
            Opcode::RETURN => handlers::system::op_return(self),
            Opcode::DELEGATECALL => handlers::system::delegatecall(self),
            Opcode::CREATE2 => handlers::system::create2(self),
            Opcode::STATICCALL => handlers::system::staticcall(self),
            Opcode::REVERT => handlers::system::revert(self),
            Opcode::INVALID => Err(Error::InvalidOpcode(byte)),
            Opcode::SELFDESTRUCT => handlers::system::selfdestruct(self),
        }
    }

    /// Executes the next instruction of the current context and returns a record of it. When the
    /// instruction halts a nested context, its parent is resumed before returning.
    ///
    /// ```
    /// use alloy::primitives::Bytes;
    /// use cinder_vm::core::{
    ///     gas::{GasSchedule, Limits},
    ///     storage::InMemoryHost,
    ///     vm::{Message, VM},
    /// };
    ///
    /// let mut host = InMemoryHost::new();
    /// let schedule = GasSchedule::default();
    /// let message = Message {
    ///     // PUSH1 0x01 STOP
    ///     bytecode: Bytes::from_static(&[0x60, 0x01, 0x00]),
    ///     gas_limit: 100,
    ///     ..Default::default()
    /// };
    /// let mut vm = VM::new(&mut host, &schedule, Limits::default(), message);
    ///
    /// let instruction = vm.step();
    /// assert_eq!((instruction.pc, instruction.opcode), (0, 0x60));
    /// assert_eq!((instruction.gas_before, instruction.gas_after), (100, 97));
    /// assert_eq!(vm.ctx.pc, 2);
    ///
    /// vm.step(); // 0x00 STOP
    /// assert!(vm.is_finished());
    /// ```
    pub fn step(&mut self) -> Instruction {
        let pc = self.ctx.pc;
        let depth = self.ctx.depth;
        let gas_before = self.ctx.gas.remaining();
        let opcode = self.ctx.code.byte_at(pc).unwrap_or(STOP);

        if !self.ctx.is_halted() {
            if let Err(reason) = self.execute_instruction() {
                self.fail(reason);
            }
        }

        // a call or create may have switched contexts; report on the one that ran
        let frame = self.parents.get(depth).unwrap_or(&self.ctx);
        let instruction = Instruction {
            pc,
            opcode,
            depth,
            gas_before,
            gas_after: frame.gas.remaining(),
            stack_size: frame.stack.size(),
        };

        // if step-tracing feature is enabled, print the current operation
        #[cfg(feature = "step-tracing")]
        trace!(
            pc,
            depth,
            opcode = crate::core::opcodes::opcode_name(opcode),
            gas = instruction.gas_after,
            stack = %frame.stack,
            ops_per_sec = (self.operation_count as f64 / self.start_time.elapsed().as_secs_f64()),
            "executed opcode"
        );

        if self.ctx.is_halted() && !self.parents.is_empty() {
            self.leave();
        }

        instruction
    }

    /// Executes until the top-level context halts, then settles the host checkpoint.
    pub fn execute(&mut self) -> ExecutionResult {
        let outcome = loop {
            match &self.ctx.halted {
                Some(outcome) if self.parents.is_empty() => break outcome.clone(),
                _ => {
                    self.step();
                }
            }
        };
        let gas_refund = if outcome.is_success() {
            self.host.commit(self.ctx.checkpoint);
            self.ctx.refund
        } else {
            self.host.revert_to(self.ctx.checkpoint);
            0
        };

        ExecutionResult {
            gas_used: self.ctx.gas.limit() - outcome.gas_remaining(),
            outcome,
            gas_refund,
        }
    }
}
