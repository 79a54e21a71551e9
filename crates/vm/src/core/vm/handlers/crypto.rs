use alloy::primitives::U256;

use crate::{
    core::{gas::keccak_cost, memory::resolve_range},
    error::Error,
};

use super::super::core::VM;

/// KECCAK256 - Compute Keccak-256 hash
pub fn keccak256(vm: &mut VM<'_>) -> Result<(), Error> {
    let [offset, size] = vm.ctx.stack.peek_n::<2>()?;
    let (offset, size) = resolve_range(offset, size)?;

    // consume dynamic gas
    let gas_cost = keccak_cost(size, vm.gas_params()) + vm.memory_expansion(offset, size);
    vm.ctx.gas.record_cost(gas_cost)?;

    vm.ctx.stack.pop_n::<2>()?;
    vm.ctx.memory.expand(offset, size);
    let data = vm.ctx.memory.access(offset, size);
    let result = vm.host.keccak256(&data);

    vm.ctx.stack.push(U256::from_be_bytes(result.0))
}
