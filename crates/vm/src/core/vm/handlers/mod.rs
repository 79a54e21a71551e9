//! EVM opcode handlers organized by category.
//!
//! Each submodule contains handler functions for related opcodes. A handler runs after the
//! interpreter has validated stack arity and charged the base cost; it charges any dynamic cost
//! from peeked operands before popping them.

/// Arithmetic operations: ADD, MUL, SUB, DIV, SDIV, MOD, SMOD, ADDMOD, MULMOD, EXP, SIGNEXTEND
pub mod arithmetic;

/// Bitwise operations: AND, OR, XOR, NOT, BYTE, SHL, SHR, SAR
pub mod bitwise;

/// Block information: BLOCKHASH, COINBASE, TIMESTAMP, NUMBER, etc.
pub mod block;

/// Comparison operations: LT, GT, SLT, SGT, EQ, ISZERO
pub mod comparison;

/// Control flow: STOP, JUMP, JUMPI, PC, GAS
pub mod control;

/// Cryptographic operations: KECCAK256
pub mod crypto;

/// Environment information: ADDRESS, BALANCE, CALLER, CALLVALUE, CALLDATALOAD, etc.
pub mod environment;

/// Logging operations: LOG0-LOG4
pub mod logging;

/// Memory operations: MLOAD, MSTORE, MSTORE8, MSIZE, MCOPY
pub mod memory;

/// Stack operations: POP, PUSH0-PUSH32, DUP1-DUP16, SWAP1-SWAP16
pub mod stack;

/// Storage operations: SLOAD, SSTORE, TLOAD, TSTORE
pub mod storage;

/// System operations: CREATE, CALL, CALLCODE, RETURN, DELEGATECALL, STATICCALL, CREATE2, REVERT,
/// SELFDESTRUCT
pub mod system;

#[cfg(test)]
pub(crate) mod tests {
    use alloy::primitives::{Bytes, U256};
    use cinder_common::utils::strings::decode_hex;

    use crate::core::{
        gas::{GasSchedule, Limits},
        storage::InMemoryHost,
        vm::{ExecutionResult, Message, VM},
    };

    /// Runs `code` as `message` against `host`, returning the result and the final stack of the
    /// top-level context, bottom first. A zero gas limit in `message` means one million.
    pub(crate) fn run_on(
        host: &mut InMemoryHost,
        mut message: Message,
        code: &str,
    ) -> (ExecutionResult, Vec<U256>) {
        message.bytecode = Bytes::from(decode_hex(code).expect("invalid bytecode"));
        if message.gas_limit == 0 {
            message.gas_limit = 1_000_000;
        }

        let schedule = GasSchedule::default();
        let mut vm = VM::new(host, &schedule, Limits::default(), message);
        let result = vm.execute();
        (result, vm.ctx.stack.as_slice().to_vec())
    }

    pub(crate) fn run_with(
        mut host: InMemoryHost,
        message: Message,
        code: &str,
    ) -> (ExecutionResult, Vec<U256>) {
        run_on(&mut host, message, code)
    }

    pub(crate) fn run(code: &str, gas_limit: u64) -> (ExecutionResult, Vec<U256>) {
        run_with(InMemoryHost::new(), Message { gas_limit, ..Default::default() }, code)
    }
}
