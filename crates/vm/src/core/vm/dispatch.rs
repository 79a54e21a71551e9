//! Resuming a parent context once its child has halted.

use alloy::primitives::{Address, Bytes, U256};
use tracing::debug;

use crate::{
    core::{constants::EOF_MAGIC, word::from_address},
    error::Error,
};

use super::{
    context::{ExecutionContext, FrameKind},
    core::VM,
    execution::Outcome,
};

/// Hands the outcome of the halted `child` to `vm.ctx`, its parent. State changes made by the
/// child are committed or rolled back, unused gas is returned, and the parent's stack receives
/// the call or create result.
pub(super) fn resume(vm: &mut VM<'_>, child: ExecutionContext) -> Result<(), Error> {
    let Some(outcome) = child.halted else {
        return Err(Error::Host("resumed a context that has not halted".to_string()));
    };

    let outcome = match (child.kind, outcome) {
        (FrameKind::Create { address }, Outcome::Success { output, gas_remaining }) => {
            deploy(vm, address, output, gas_remaining)?
        }
        (_, outcome) => outcome,
    };

    debug!(
        depth = child.depth,
        success = outcome.is_success(),
        gas_remaining = outcome.gas_remaining(),
        "context halted"
    );

    match outcome {
        Outcome::Success { output, gas_remaining } => {
            vm.host.commit(child.checkpoint);
            vm.ctx.gas.return_gas(gas_remaining);
            vm.ctx.refund += child.refund;

            match child.kind {
                FrameKind::Call { return_offset, return_size } => {
                    copy_return_data(&mut vm.ctx, output, return_offset, return_size);
                    vm.ctx.stack.push(U256::from(1u8))
                }
                FrameKind::Create { address } => {
                    vm.ctx.return_data = Bytes::new();
                    vm.ctx.stack.push(from_address(address))
                }
            }
        }
        Outcome::Revert { output, gas_remaining } => {
            vm.host.revert_to(child.checkpoint);
            vm.ctx.gas.return_gas(gas_remaining);

            match child.kind {
                FrameKind::Call { return_offset, return_size } => {
                    copy_return_data(&mut vm.ctx, output, return_offset, return_size)
                }
                FrameKind::Create { .. } => vm.ctx.return_data = output,
            }
            vm.ctx.stack.push(U256::ZERO)
        }
        Outcome::Fail { reason, .. } => {
            debug!(depth = child.depth, "child context failed: {}", reason);
            vm.host.revert_to(child.checkpoint);
            vm.ctx.return_data = Bytes::new();
            vm.ctx.stack.push(U256::ZERO)
        }
    }
}

/// Installs the runtime code returned by a successful init code run, charging the deposit
/// cost from the child's leftover gas.
fn deploy(
    vm: &mut VM<'_>,
    address: Address,
    code: Bytes,
    gas_remaining: u64,
) -> Result<Outcome, Error> {
    let failed = |reason| Outcome::Fail { reason, gas_remaining: 0 };

    if code.len() > vm.limits.max_code_size {
        return Ok(failed(Error::CreateContractSizeLimit));
    }
    if code.first() == Some(&EOF_MAGIC) {
        return Ok(failed(Error::CreateContractStartingWithEF));
    }

    let deposit = vm.gas_params().code_deposit_byte.saturating_mul(code.len() as u64);
    let Some(gas_remaining) = gas_remaining.checked_sub(deposit) else {
        return Ok(failed(Error::OutOfGas));
    };

    vm.host.set_code(address, code)?;
    Ok(Outcome::Success { output: Bytes::new(), gas_remaining })
}

/// Sets the parent's return data buffer and copies as much of `output` as fits into the
/// return region of its memory.
fn copy_return_data(
    ctx: &mut ExecutionContext,
    output: Bytes,
    return_offset: usize,
    return_size: usize,
) {
    let size = return_size.min(output.len());
    ctx.memory.store(return_offset, &output[..size]);
    ctx.return_data = output;
}
