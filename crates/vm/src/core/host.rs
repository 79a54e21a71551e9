use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use eyre::Result;

use super::log::Log;

/// A position in the host's journal. State changes made after a checkpoint can be rolled back
/// with [`Host::revert_to`].
pub type Checkpoint = usize;

/// Block-level context exposed to the `0x40` family of opcodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockEnv {
    /// The block's beneficiary.
    pub coinbase: Address,
    /// The block's timestamp.
    pub timestamp: u64,
    /// The block's number.
    pub number: u64,
    /// The beacon chain randomness mix.
    pub prevrandao: B256,
    /// The block's gas limit.
    pub gas_limit: u64,
    /// The chain id.
    pub chain_id: u64,
    /// The block's base fee.
    pub base_fee: U256,
    /// The block's blob base fee.
    pub blob_base_fee: U256,
}

/// How a new contract's address is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateScheme {
    /// `CREATE`: derived from the creator and its nonce.
    Create {
        /// The creating account.
        creator: Address,
        /// The creator's nonce before the create.
        nonce: u64,
    },
    /// `CREATE2`: derived from the creator, a salt, and the init code hash.
    Create2 {
        /// The creating account.
        creator: Address,
        /// The user supplied salt.
        salt: B256,
        /// `keccak256` of the init code.
        init_code_hash: B256,
    },
}

/// Everything the interpreter needs from the outside world.
///
/// The trait is object safe; the VM holds a `&mut dyn Host`. Fallible methods return an
/// [`eyre::Result`], and an error fails the execution context that made the request.
pub trait Host: std::fmt::Debug {
    /// Reads a persistent storage slot.
    fn get_storage(&mut self, address: Address, key: U256) -> Result<U256>;

    /// Writes a persistent storage slot.
    fn set_storage(&mut self, address: Address, key: U256, value: U256) -> Result<()>;

    /// Reads a slot's value as of the start of the transaction.
    fn get_original_storage(&mut self, address: Address, key: U256) -> Result<U256>;

    /// Reads a transient storage slot.
    fn get_transient(&mut self, address: Address, key: U256) -> Result<U256>;

    /// Writes a transient storage slot.
    fn set_transient(&mut self, address: Address, key: U256, value: U256) -> Result<()>;

    /// The balance of `address`.
    fn get_balance(&mut self, address: Address) -> Result<U256>;

    /// The code of `address`, empty when it has none.
    fn get_code(&mut self, address: Address) -> Result<Bytes>;

    /// The code hash of `address`, zero when the account does not exist.
    fn get_code_hash(&mut self, address: Address) -> Result<B256>;

    /// The hash of block `number`, zero when it is unknown.
    fn get_block_hash(&mut self, number: u64) -> Result<B256>;

    /// Whether `address` exists.
    fn account_exists(&mut self, address: Address) -> Result<bool>;

    /// Whether `address` holds any non-zero storage slot.
    fn has_storage(&mut self, address: Address) -> Result<bool>;

    /// The nonce of `address`.
    fn get_nonce(&mut self, address: Address) -> Result<u64>;

    /// Increments the nonce of `address`.
    fn increment_nonce(&mut self, address: Address) -> Result<()>;

    /// Moves `value` from `from` to `to`. Returns `false`, changing nothing, when `from` cannot
    /// afford it.
    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<bool>;

    /// Creates a fresh contract account at `address` with nonce 1.
    fn create_account(&mut self, address: Address) -> Result<()>;

    /// Installs runtime code at `address`.
    fn set_code(&mut self, address: Address, code: Bytes) -> Result<()>;

    /// Destroys `address` (as far as EIP-6780 allows) and sends its balance to `beneficiary`.
    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> Result<()>;

    /// Records a log.
    fn log(&mut self, log: Log) -> Result<()>;

    /// Marks `address` warm. Returns `true` if it was cold.
    fn warm_account(&mut self, address: Address) -> bool;

    /// Marks a storage slot warm. Returns `true` if it was cold.
    fn warm_storage(&mut self, address: Address, key: U256) -> bool;

    /// Derives the address of a new contract.
    fn create_address(&mut self, scheme: CreateScheme) -> Result<Address>;

    /// Opens a checkpoint.
    fn checkpoint(&mut self) -> Checkpoint;

    /// Keeps the changes made since `checkpoint`.
    fn commit(&mut self, checkpoint: Checkpoint);

    /// Discards the changes made since `checkpoint`.
    fn revert_to(&mut self, checkpoint: Checkpoint);

    /// The current block context.
    fn block(&self) -> &BlockEnv;

    /// The transaction's gas price.
    fn gas_price(&self) -> U256;

    /// The transaction's blob versioned hash at `index`.
    fn blob_hash(&self, index: usize) -> Option<B256>;

    /// Hashes `data` with keccak-256.
    fn keccak256(&self, data: &[u8]) -> B256 {
        keccak256(data)
    }
}
