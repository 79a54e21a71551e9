use alloy::primitives::U256;

use crate::{
    core::{
        constants::BLOCK_HASH_HISTORY,
        word::{as_usize_saturated, from_address},
    },
    error::Error,
};

use super::super::core::VM;

/// BLOCKHASH - Get the hash of one of the 256 most recent complete blocks
pub fn blockhash(vm: &mut VM<'_>) -> Result<(), Error> {
    let number = vm.ctx.stack.pop()?;
    let current = vm.host.block().number;

    // only the window below the current block is visible
    let hash = match u64::try_from(number) {
        Ok(number) if number < current && current - number <= BLOCK_HASH_HISTORY => {
            U256::from_be_bytes(vm.host.get_block_hash(number)?.0)
        }
        _ => U256::ZERO,
    };
    vm.ctx.stack.push(hash)
}

/// COINBASE - Get the block's beneficiary address
pub fn coinbase(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(from_address(vm.host.block().coinbase))
}

/// TIMESTAMP - Get the block's timestamp
pub fn timestamp(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from(vm.host.block().timestamp))
}

/// NUMBER - Get the block's number
pub fn number(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from(vm.host.block().number))
}

/// PREVRANDAO - Get the beacon chain randomness of the previous block
pub fn prevrandao(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from_be_bytes(vm.host.block().prevrandao.0))
}

/// GASLIMIT - Get the block's gas limit
pub fn gaslimit(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from(vm.host.block().gas_limit))
}

/// CHAINID - Get the chain ID
pub fn chainid(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(U256::from(vm.host.block().chain_id))
}

/// SELFBALANCE - Get balance of currently executing account
pub fn selfbalance(vm: &mut VM<'_>) -> Result<(), Error> {
    let balance = vm.host.get_balance(vm.ctx.env.address)?;
    vm.ctx.stack.push(balance)
}

/// BASEFEE - Get the base fee
pub fn basefee(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(vm.host.block().base_fee)
}

/// BLOBHASH - Get a versioned hash of one of the transaction's blobs
pub fn blobhash(vm: &mut VM<'_>) -> Result<(), Error> {
    let index = as_usize_saturated(vm.ctx.stack.pop()?);
    let hash = vm.host.blob_hash(index).map(|hash| U256::from_be_bytes(hash.0)).unwrap_or_default();
    vm.ctx.stack.push(hash)
}

/// BLOBBASEFEE - Get the blob base fee of the current block
pub fn blobbasefee(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ctx.stack.push(vm.host.block().blob_base_fee)
}
