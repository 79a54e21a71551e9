use crate::{core::gas::sstore_cost, error::Error};

use super::super::core::VM;

/// SLOAD - Load word from storage
pub fn sload(vm: &mut VM<'_>) -> Result<(), Error> {
    let key = vm.ctx.stack.peek(0)?;
    let address = vm.ctx.env.address;

    // consume dynamic gas
    if vm.host.warm_storage(address, key) {
        let params = vm.gas_params();
        vm.ctx.gas.record_cost(params.cold_sload.saturating_sub(params.warm_access))?;
    }

    vm.ctx.stack.pop()?;
    let value = vm.host.get_storage(address, key)?;
    vm.ctx.stack.push(value)
}

/// SSTORE - Save word to storage
pub fn sstore(vm: &mut VM<'_>) -> Result<(), Error> {
    let params = vm.gas_params();

    // a store may not consume the call stipend
    if vm.ctx.gas.remaining() <= params.sstore_sentry {
        return Err(Error::OutOfGas);
    }

    let [key, value] = vm.ctx.stack.peek_n::<2>()?;
    let address = vm.ctx.env.address;
    let original = vm.host.get_original_storage(address, key)?;
    let current = vm.host.get_storage(address, key)?;
    let is_cold = vm.host.warm_storage(address, key);

    // consume dynamic gas
    let (gas_cost, refund) = sstore_cost(original, current, value, is_cold, params);
    vm.ctx.gas.record_cost(gas_cost)?;

    vm.ctx.stack.pop_n::<2>()?;
    vm.host.set_storage(address, key, value)?;
    vm.ctx.refund += refund;
    Ok(())
}

/// TLOAD - Load word from transient storage
pub fn tload(vm: &mut VM<'_>) -> Result<(), Error> {
    let key = vm.ctx.stack.pop()?;
    let value = vm.host.get_transient(vm.ctx.env.address, key)?;
    vm.ctx.stack.push(value)
}

/// TSTORE - Save word to transient storage
pub fn tstore(vm: &mut VM<'_>) -> Result<(), Error> {
    let [key, value] = vm.ctx.stack.pop_n::<2>()?;
    vm.host.set_transient(vm.ctx.env.address, key, value)?;
    Ok(())
}
