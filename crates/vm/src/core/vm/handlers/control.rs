use alloy::primitives::{Bytes, U256};

use crate::error::Error;

use super::super::core::VM;

/// STOP - Halts execution
pub fn stop(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.succeed(Bytes::new());
    Ok(())
}

/// JUMP - Alter the program counter
pub fn jump(vm: &mut VM<'_>) -> Result<(), Error> {
    let target = vm.ctx.stack.pop()?;
    jump_to(vm, target)
}

/// JUMPI - Conditionally alter the program counter
pub fn jumpi(vm: &mut VM<'_>) -> Result<(), Error> {
    let [target, condition] = vm.ctx.stack.pop_n::<2>()?;
    if condition.is_zero() {
        return Ok(());
    }
    jump_to(vm, target)
}

fn jump_to(vm: &mut VM<'_>, target: U256) -> Result<(), Error> {
    if !vm.ctx.code.is_valid_jump(target) {
        return Err(Error::InvalidJump(target));
    }

    // valid targets are within the code, so they fit a usize
    vm.ctx.pc = usize::try_from(target).map_err(|_| Error::InvalidJump(target))?;
    Ok(())
}

/// PC - Get the value of the program counter prior to the increment
pub fn pc(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from(vm.ctx.pc - 1))
}

/// GAS - Get the amount of available gas
pub fn gas(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from(vm.ctx.gas.remaining()))
}
