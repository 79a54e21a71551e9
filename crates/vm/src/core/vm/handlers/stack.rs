use alloy::primitives::U256;

use crate::{core::memory::padded_slice, error::Error};

use super::super::core::VM;

/// POP - Remove item from stack
pub fn pop(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.pop()?;
    Ok(())
}

/// PUSH0 - Push 0 onto stack
pub fn push0(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::ZERO)
}

/// PUSH1-PUSH32 - Push N bytes onto stack
pub fn push_n(vm: &mut VM<'_>, num_bytes: usize) -> Result<(), Error> {
    // immediates running past the end of the code read as zero
    let bytes = padded_slice(vm.ctx.code.code(), vm.ctx.pc, num_bytes);
    vm.ctx.pc += num_bytes;

    vm.ctx.stack.push(U256::from_be_slice(&bytes))
}

/// DUP1-DUP16 - Duplicate Nth stack item
pub fn dup_n(vm: &mut VM<'_>, index: usize) -> Result<(), Error> {
    vm.ctx.stack.dup(index)
}

/// SWAP1-SWAP16 - Exchange 1st and Nth stack items
pub fn swap_n(vm: &mut VM<'_>, index: usize) -> Result<(), Error> {
    vm.ctx.stack.swap(index)
}
