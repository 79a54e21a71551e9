use alloy::primitives::U256;

use crate::{
    core::{
        gas::{cold_account_surcharge, copy_cost},
        memory::{padded_slice, resolve_range},
        word::{as_usize_saturated, from_address, to_address},
    },
    error::Error,
};

use super::super::core::VM;

/// Charges the copy and memory expansion cost of writing `size` bytes at `dest_offset`, and
/// returns the resolved destination range.
fn charge_copy(vm: &mut VM<'_>, dest_offset: U256, size: U256) -> Result<(usize, usize), Error> {
    let (dest_offset, size) = resolve_range(dest_offset, size)?;
    let gas_cost = copy_cost(size, vm.gas_params()) + vm.memory_expansion(dest_offset, size);
    vm.ctx.gas.record_cost(gas_cost)?;
    Ok((dest_offset, size))
}

/// Warms the account referenced by the top of the stack, charging the cold access surcharge.
fn charge_account_access(vm: &mut VM<'_>) -> Result<(), Error> {
    let address = to_address(vm.ctx.stack.peek(0)?);
    let is_cold = vm.host.warm_account(address);
    vm.ctx.gas.record_cost(cold_account_surcharge(is_cold, vm.gas_params()))
}

/// ADDRESS - Get address of currently executing account
pub fn address(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(from_address(vm.ctx.env.address))
}

/// BALANCE - Get balance of the given account
pub fn balance(vm: &mut VM<'_>) -> Result<(), Error> {
    // consume dynamic gas
    charge_account_access(vm)?;

    let address = to_address(vm.ctx.stack.pop()?);
    let balance = vm.host.get_balance(address)?;
    vm.ctx.stack.push(balance)
}

/// ORIGIN - Get execution origination address
pub fn origin(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(from_address(vm.origin))
}

/// CALLER - Get caller address
pub fn caller(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(from_address(vm.ctx.env.caller))
}

/// CALLVALUE - Get deposited value by the instruction/transaction responsible for this execution
pub fn callvalue(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(vm.ctx.env.value)
}

/// CALLDATALOAD - Get input data of current environment
pub fn calldataload(vm: &mut VM<'_>) -> Result<(), Error> {
    let i = as_usize_saturated(vm.ctx.stack.pop()?);
    let result = U256::from_be_slice(&padded_slice(&vm.ctx.calldata, i, 32));
    vm.ctx.stack.push(result)
}

/// CALLDATASIZE - Get size of input data in current environment
pub fn calldatasize(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from(vm.ctx.calldata.len()))
}

/// CALLDATACOPY - Copy input data in current environment to memory
pub fn calldatacopy(vm: &mut VM<'_>) -> Result<(), Error> {
    let [dest_offset, _, size] = vm.ctx.stack.peek_n::<3>()?;
    let (dest_offset, size) = charge_copy(vm, dest_offset, size)?;

    let [_, offset, _] = vm.ctx.stack.pop_n::<3>()?;
    let value = padded_slice(&vm.ctx.calldata, as_usize_saturated(offset), size);
    vm.ctx.memory.store(dest_offset, &value);
    Ok(())
}

/// CODESIZE - Get size of code running in current environment
pub fn codesize(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from(vm.ctx.code.len()))
}

/// CODECOPY - Copy code running in current environment to memory
pub fn codecopy(vm: &mut VM<'_>) -> Result<(), Error> {
    let [dest_offset, _, size] = vm.ctx.stack.peek_n::<3>()?;
    let (dest_offset, size) = charge_copy(vm, dest_offset, size)?;

    let [_, offset, _] = vm.ctx.stack.pop_n::<3>()?;
    let value = padded_slice(vm.ctx.code.code(), as_usize_saturated(offset), size);
    vm.ctx.memory.store(dest_offset, &value);
    Ok(())
}

/// GASPRICE - Get price of gas in current environment
pub fn gasprice(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(vm.host.gas_price())
}

/// EXTCODESIZE - Get size of an account's code
pub fn extcodesize(vm: &mut VM<'_>) -> Result<(), Error> {
    // consume dynamic gas
    charge_account_access(vm)?;

    let address = to_address(vm.ctx.stack.pop()?);
    let code = vm.host.get_code(address)?;
    vm.ctx.stack.push(U256::from(code.len()))
}

/// EXTCODECOPY - Copy an account's code to memory
pub fn extcodecopy(vm: &mut VM<'_>) -> Result<(), Error> {
    let [_, dest_offset, _, size] = vm.ctx.stack.peek_n::<4>()?;
    let (dest_offset, size) = resolve_range(dest_offset, size)?;

    // consume dynamic gas
    charge_account_access(vm)?;
    let gas_cost = copy_cost(size, vm.gas_params()) + vm.memory_expansion(dest_offset, size);
    vm.ctx.gas.record_cost(gas_cost)?;

    let [address, _, offset, _] = vm.ctx.stack.pop_n::<4>()?;
    if size == 0 {
        return Ok(());
    }
    let code = vm.host.get_code(to_address(address))?;
    let value = padded_slice(&code, as_usize_saturated(offset), size);
    vm.ctx.memory.store(dest_offset, &value);
    Ok(())
}

/// RETURNDATASIZE - Get size of output data from the previous call from the current environment
pub fn returndatasize(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from(vm.ctx.return_data.len()))
}

/// RETURNDATACOPY - Copy output data from the previous call to memory
pub fn returndatacopy(vm: &mut VM<'_>) -> Result<(), Error> {
    let [dest_offset, offset, size] = vm.ctx.stack.peek_n::<3>()?;

    // reading past the end of the buffer halts, unlike the other copies
    let end = offset.checked_add(size).ok_or(Error::ReturnDataOutOfBounds)?;
    if end > U256::from(vm.ctx.return_data.len()) {
        return Err(Error::ReturnDataOutOfBounds);
    }

    let (dest_offset, size) = charge_copy(vm, dest_offset, size)?;
    vm.ctx.stack.pop_n::<3>()?;

    let offset = as_usize_saturated(offset);
    let value = vm.ctx.return_data.slice(offset..offset + size);
    vm.ctx.memory.store(dest_offset, &value);
    Ok(())
}

/// EXTCODEHASH - Get hash of an account's code
pub fn extcodehash(vm: &mut VM<'_>) -> Result<(), Error> {
    // consume dynamic gas
    charge_account_access(vm)?;

    let address = to_address(vm.ctx.stack.pop()?);
    let hash = vm.host.get_code_hash(address)?;
    vm.ctx.stack.push(U256::from_be_bytes(hash.0))
}
