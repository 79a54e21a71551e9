use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256, U256};
use tracing::debug;

use crate::{
    core::{
        analysis::AnalyzedBytecode,
        gas::{cold_account_surcharge, keccak_cost, word_count},
        host::CreateScheme,
        memory::resolve_range,
        word::{as_u64_saturated, to_address},
    },
    error::Error,
};

use super::super::{
    context::{CallEnv, ExecutionContext, FrameKind},
    core::VM,
};

/// The four message call opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

impl CallKind {
    /// Whether the opcode takes a value operand.
    fn has_value(self) -> bool {
        matches!(self, CallKind::Call | CallKind::CallCode)
    }
}

/// The gas a parent may hand to a child after keeping back one 64th (EIP-150).
fn all_but_one_64th(remaining: u64) -> u64 {
    remaining - remaining / 64
}

/// The end of a memory range, zero for empty ranges.
fn range_end((offset, size): (usize, usize)) -> usize {
    if size == 0 {
        0
    } else {
        offset + size
    }
}

/// Halts the call or create early: the child's whole gas allowance, stipend included, goes
/// back to the caller and 0 is pushed.
fn abort_call(vm: &mut VM<'_>, child_gas: u64, reason: &str) -> Result<(), Error> {
    debug!(depth = vm.ctx.depth, pc = vm.ctx.pc - 1, "call aborted: {}", reason);
    vm.ctx.gas.return_gas(child_gas);
    vm.ctx.stack.push(U256::ZERO)
}

fn message_call(vm: &mut VM<'_>, kind: CallKind) -> Result<(), Error> {
    let (gas_limit, to, value, args, ret) = if kind.has_value() {
        let [gas_limit, to, value, args_offset, args_size, ret_offset, ret_size] =
            vm.ctx.stack.peek_n::<7>()?;
        (gas_limit, to, value, (args_offset, args_size), (ret_offset, ret_size))
    } else {
        let [gas_limit, to, args_offset, args_size, ret_offset, ret_size] =
            vm.ctx.stack.peek_n::<6>()?;
        (gas_limit, to, U256::ZERO, (args_offset, args_size), (ret_offset, ret_size))
    };

    let transfers_value = kind.has_value() && !value.is_zero();
    if kind == CallKind::Call && transfers_value && vm.ctx.env.is_static {
        return Err(Error::StaticStateChange);
    }

    let args = resolve_range(args.0, args.1)?;
    let ret = resolve_range(ret.0, ret.1)?;
    let to = to_address(to);

    // consume dynamic gas
    let params = vm.gas_params();
    let widest = if range_end(args) >= range_end(ret) { args } else { ret };
    let mut gas_cost = vm.memory_expansion(widest.0, widest.1);
    let is_cold = vm.host.warm_account(to);
    gas_cost += cold_account_surcharge(is_cold, params);
    if transfers_value {
        gas_cost += params.call_value_transfer;
        if kind == CallKind::Call && !vm.host.account_exists(to)? {
            gas_cost += params.call_new_account;
        }
    }
    vm.ctx.gas.record_cost(gas_cost)?;

    if kind.has_value() {
        vm.ctx.stack.pop_n::<7>()?;
    } else {
        vm.ctx.stack.pop_n::<6>()?;
    }
    vm.ctx.memory.expand(args.0, args.1);
    vm.ctx.memory.expand(ret.0, ret.1);
    vm.ctx.return_data = Bytes::new();

    // gas forwarded to the child, and charged to the parent
    let forwarded = as_u64_saturated(gas_limit).min(all_but_one_64th(vm.ctx.gas.remaining()));
    vm.ctx.gas.record_cost(forwarded)?;
    let child_gas = if transfers_value { forwarded + params.call_stipend } else { forwarded };

    if vm.ctx.depth >= vm.limits.max_call_depth {
        return abort_call(vm, child_gas, &Error::MaxCallDepthExceeded.to_string());
    }
    if transfers_value && vm.host.get_balance(vm.ctx.env.address)? < value {
        return abort_call(vm, child_gas, "insufficient balance");
    }

    let parent = vm.ctx.env;
    let env = match kind {
        CallKind::Call => CallEnv {
            address: to,
            caller: parent.address,
            code_address: to,
            value,
            is_static: parent.is_static,
        },
        CallKind::CallCode => CallEnv {
            address: parent.address,
            caller: parent.address,
            code_address: to,
            value,
            is_static: parent.is_static,
        },
        CallKind::DelegateCall => CallEnv {
            address: parent.address,
            caller: parent.caller,
            code_address: to,
            value: parent.value,
            is_static: parent.is_static,
        },
        CallKind::StaticCall => CallEnv {
            address: to,
            caller: parent.address,
            code_address: to,
            value: U256::ZERO,
            is_static: true,
        },
    };

    let code = vm.host.get_code(to)?;
    let calldata = Bytes::from(vm.ctx.memory.access(args.0, args.1));
    let checkpoint = vm.host.checkpoint();
    if kind == CallKind::Call && !vm.host.transfer(parent.address, to, value)? {
        vm.host.revert_to(checkpoint);
        return abort_call(vm, child_gas, "insufficient balance");
    }

    debug!(
        depth = vm.ctx.depth + 1,
        kind = ?kind,
        target = %to,
        gas = child_gas,
        "entering call"
    );
    let child = ExecutionContext::new(
        Arc::new(AnalyzedBytecode::new(code)),
        calldata,
        env,
        child_gas,
        vm.ctx.depth + 1,
        checkpoint,
        FrameKind::Call { return_offset: ret.0, return_size: ret.1 },
    );
    vm.enter(child);
    Ok(())
}

fn create_contract(vm: &mut VM<'_>, is_create2: bool) -> Result<(), Error> {
    let [value, offset, size] = vm.ctx.stack.peek_n::<3>()?;
    let (offset, size) = resolve_range(offset, size)?;
    if size > vm.limits.max_initcode_size {
        return Err(Error::CreateInitCodeSizeLimit);
    }

    // consume dynamic gas
    let params = vm.gas_params();
    let mut gas_cost = params.initcode_word * word_count(size) + vm.memory_expansion(offset, size);
    if is_create2 {
        gas_cost += keccak_cost(size, params);
    }
    vm.ctx.gas.record_cost(gas_cost)?;

    let salt = if is_create2 {
        let [_, _, _, salt] = vm.ctx.stack.pop_n::<4>()?;
        salt
    } else {
        vm.ctx.stack.pop_n::<3>()?;
        U256::ZERO
    };
    vm.ctx.memory.expand(offset, size);
    vm.ctx.return_data = Bytes::new();

    let creator = vm.ctx.env.address;
    if vm.ctx.depth >= vm.limits.max_call_depth {
        return abort_call(vm, 0, &Error::MaxCallDepthExceeded.to_string());
    }
    if vm.host.get_balance(creator)? < value {
        return abort_call(vm, 0, "insufficient balance");
    }
    let nonce = vm.host.get_nonce(creator)?;
    if nonce == u64::MAX {
        return abort_call(vm, 0, "creator nonce overflow");
    }
    vm.host.increment_nonce(creator)?;

    let init_code = Bytes::from(vm.ctx.memory.access(offset, size));
    let scheme = if is_create2 {
        CreateScheme::Create2 {
            creator,
            salt: B256::from(salt.to_be_bytes::<32>()),
            init_code_hash: vm.host.keccak256(&init_code),
        }
    } else {
        CreateScheme::Create { creator, nonce }
    };
    let address = vm.host.create_address(scheme)?;
    vm.host.warm_account(address);

    // creates forward everything they can
    let child_gas = all_but_one_64th(vm.ctx.gas.remaining());
    vm.ctx.gas.record_cost(child_gas)?;

    // EIP-7610: nonce, code, or storage at the target is a collision
    if vm.host.get_nonce(address)? != 0
        || !vm.host.get_code(address)?.is_empty()
        || vm.host.has_storage(address)?
    {
        debug!(depth = vm.ctx.depth, address = %address, "create collision");
        return vm.ctx.stack.push(U256::ZERO);
    }

    let checkpoint = vm.host.checkpoint();
    vm.host.create_account(address)?;
    if !vm.host.transfer(creator, address, value)? {
        vm.host.revert_to(checkpoint);
        return abort_call(vm, child_gas, "insufficient balance");
    }

    debug!(depth = vm.ctx.depth + 1, address = %address, gas = child_gas, "entering create");
    let env = CallEnv { address, caller: creator, code_address: address, value, is_static: false };
    let child = ExecutionContext::new(
        Arc::new(AnalyzedBytecode::new(init_code)),
        Bytes::new(),
        env,
        child_gas,
        vm.ctx.depth + 1,
        checkpoint,
        FrameKind::Create { address },
    );
    vm.enter(child);
    Ok(())
}

/// Charges for and reads the `(offset, size)` memory range on top of the stack.
fn output_range(vm: &mut VM<'_>) -> Result<Bytes, Error> {
    let [offset, size] = vm.ctx.stack.peek_n::<2>()?;
    let (offset, size) = resolve_range(offset, size)?;

    // consume dynamic gas
    vm.ctx.gas.record_cost(vm.memory_expansion(offset, size))?;

    vm.ctx.stack.pop_n::<2>()?;
    vm.ctx.memory.expand(offset, size);
    Ok(Bytes::from(vm.ctx.memory.access(offset, size)))
}

/// CREATE - Create a new account with associated code
pub fn create(vm: &mut VM<'_>) -> Result<(), Error> {
    create_contract(vm, false)
}

/// CALL - Message-call into an account
pub fn call(vm: &mut VM<'_>) -> Result<(), Error> {
    message_call(vm, CallKind::Call)
}

/// CALLCODE - Message-call into this account with alternative account's code
pub fn callcode(vm: &mut VM<'_>) -> Result<(), Error> {
    message_call(vm, CallKind::CallCode)
}

/// RETURN - Halt execution returning output data
pub fn op_return(vm: &mut VM<'_>) -> Result<(), Error> {
    let output = output_range(vm)?;
    vm.ctx.succeed(output);
    Ok(())
}

/// DELEGATECALL - Message-call into this account with an alternative account's code
pub fn delegatecall(vm: &mut VM<'_>) -> Result<(), Error> {
    message_call(vm, CallKind::DelegateCall)
}

/// CREATE2 - Create a new account with associated code at a predictable address
pub fn create2(vm: &mut VM<'_>) -> Result<(), Error> {
    create_contract(vm, true)
}

/// STATICCALL - Static message-call into an account
pub fn staticcall(vm: &mut VM<'_>) -> Result<(), Error> {
    message_call(vm, CallKind::StaticCall)
}

/// REVERT - Halt execution reverting state changes
pub fn revert(vm: &mut VM<'_>) -> Result<(), Error> {
    let output = output_range(vm)?;
    vm.ctx.revert(output);
    Ok(())
}

/// SELFDESTRUCT - Halt execution and hand the account's balance to a beneficiary
pub fn selfdestruct(vm: &mut VM<'_>) -> Result<(), Error> {
    let beneficiary: Address = to_address(vm.ctx.stack.peek(0)?);
    let address = vm.ctx.env.address;

    // consume dynamic gas
    let params = vm.gas_params();
    let mut gas_cost = if vm.host.warm_account(beneficiary) { params.cold_account_access } else { 0 };
    if !vm.host.get_balance(address)?.is_zero() && !vm.host.account_exists(beneficiary)? {
        gas_cost += params.selfdestruct_new_account;
    }
    vm.ctx.gas.record_cost(gas_cost)?;

    vm.ctx.stack.pop()?;
    vm.host.selfdestruct(address, beneficiary)?;
    vm.ctx.succeed(Bytes::new());
    Ok(())
}
