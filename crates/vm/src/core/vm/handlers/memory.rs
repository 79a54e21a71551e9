use alloy::primitives::U256;

use crate::{
    core::{
        constants::WORD_SIZE,
        gas::copy_cost,
        memory::resolve_range,
    },
    error::Error,
};

use super::super::core::VM;

/// Resolves a fixed-size access at the word `offset` and charges its memory expansion.
fn charge_access(vm: &mut VM<'_>, offset: U256, size: usize) -> Result<usize, Error> {
    let (offset, size) = resolve_range(offset, U256::from(size))?;
    vm.ctx.gas.record_cost(vm.memory_expansion(offset, size))?;
    Ok(offset)
}

/// MLOAD - Load word from memory
pub fn mload(vm: &mut VM<'_>) -> Result<(), Error> {
    let offset = vm.ctx.stack.peek(0)?;
    let offset = charge_access(vm, offset, WORD_SIZE)?;

    vm.ctx.stack.pop()?;
    vm.ctx.memory.expand(offset, WORD_SIZE);
    let result = vm.ctx.memory.load_word(offset);
    vm.ctx.stack.push(result)
}

/// MSTORE - Save word to memory
pub fn mstore(vm: &mut VM<'_>) -> Result<(), Error> {
    let offset = vm.ctx.stack.peek(0)?;
    let offset = charge_access(vm, offset, WORD_SIZE)?;

    let [_, value] = vm.ctx.stack.pop_n::<2>()?;
    vm.ctx.memory.store_word(offset, value);
    Ok(())
}

/// MSTORE8 - Save byte to memory
pub fn mstore8(vm: &mut VM<'_>) -> Result<(), Error> {
    let offset = vm.ctx.stack.peek(0)?;
    let offset = charge_access(vm, offset, 1)?;

    let [_, value] = vm.ctx.stack.pop_n::<2>()?;
    vm.ctx.memory.store_byte(offset, value.byte(0));
    Ok(())
}

/// MSIZE - Get the size of active memory in bytes
pub fn msize(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from(vm.ctx.memory.size()))
}

/// MCOPY - Copy memory areas
pub fn mcopy(vm: &mut VM<'_>) -> Result<(), Error> {
    let [dest_offset, offset, size] = vm.ctx.stack.peek_n::<3>()?;
    let (dest_offset, size) = resolve_range(dest_offset, size)?;
    let (offset, _) = resolve_range(offset, U256::from(size))?;

    // consume dynamic gas
    let gas_cost = copy_cost(size, vm.gas_params()) +
        vm.memory_expansion(offset.max(dest_offset), size);
    vm.ctx.gas.record_cost(gas_cost)?;

    vm.ctx.stack.pop_n::<3>()?;
    vm.ctx.memory.copy(dest_offset, offset, size);
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use crate::{
        core::vm::{handlers::tests::run, Outcome},
        error::Error,
    };

    #[test]
    fn test_mload_of_untouched_memory_is_zero_and_grows() {
        // PUSH1 0x10 MLOAD MSIZE
        let (result, stack) = run("60105159", 100_000);
        assert_eq!(stack, vec![U256::ZERO, U256::from(64)]);
        assert_eq!(result.gas_used, 3 + 3 + 6 + 2);
    }

    #[test]
    fn test_mstore8_writes_low_byte() {
        // PUSH2 0x1234 PUSH1 0 MSTORE8 PUSH1 0 MLOAD
        let (_, stack) = run("611234600053600051", 100_000);
        assert_eq!(stack, vec![U256::from(0x34) << 248]);
    }

    #[test]
    fn test_mcopy_overlapping() {
        // PUSH1 0x11 PUSH1 0 MSTORE8 PUSH1 0x22 PUSH1 1 MSTORE8
        // PUSH1 2 PUSH1 0 PUSH1 1 MCOPY PUSH1 0 MLOAD
        let (_, stack) = run("601160005360226001536002600060015e600051", 100_000);
        let expected = (U256::from(0x11) << 248) | (U256::from(0x11) << 240) | (U256::from(0x22) << 232);
        assert_eq!(stack, vec![expected]);
    }

    #[test]
    fn test_huge_offset_is_invalid_memory_access() {
        // PUSH8 2^40 MLOAD
        let (result, _) = run("67000001000000000051", 100_000);
        assert_eq!(result.outcome, Outcome::Fail { reason: Error::InvalidMemoryAccess, gas_remaining: 0 });
        assert_eq!(result.gas_used, 100_000);
    }
}
