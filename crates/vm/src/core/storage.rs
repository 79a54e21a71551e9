use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use eyre::{OptionExt, Result};
use hashbrown::{HashMap, HashSet};

use super::{
    host::{BlockEnv, Checkpoint, CreateScheme, Host},
    log::Log,
};

/// An account held by the [`InMemoryHost`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    /// The account's balance.
    pub balance: U256,
    /// The account's nonce.
    pub nonce: u64,
    /// The account's runtime code.
    pub code: Bytes,
}

impl Account {
    /// An account is empty when it has no code, a zero nonce, and a zero balance (EIP-161).
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code.is_empty()
    }
}

#[derive(Clone, Debug)]
enum JournalEntry {
    Account { address: Address, previous: Option<Account> },
    Storage { address: Address, key: U256, previous: Option<U256> },
    Transient { address: Address, key: U256, previous: Option<U256> },
    AccountWarmed(Address),
    SlotWarmed(Address, U256),
    Created(Address),
    Log,
}

/// The [`InMemoryHost`] struct is a complete [`Host`] backed by hash maps. \
/// \
/// Every mutation is journaled, so checkpoints can be rolled back. Storage values as of the start
/// of the transaction are remembered for the `SSTORE` schedule, and access sets track warm
/// accounts and slots.
#[derive(Clone, Debug, Default)]
pub struct InMemoryHost {
    accounts: HashMap<Address, Account>,
    storage: HashMap<(Address, U256), U256>,
    original: HashMap<(Address, U256), U256>,
    transient: HashMap<(Address, U256), U256>,
    warm_accounts: HashSet<Address>,
    warm_slots: HashSet<(Address, U256)>,
    created: HashSet<Address>,
    logs: Vec<Log>,
    journal: Vec<JournalEntry>,
    block: BlockEnv,
    block_hashes: HashMap<u64, B256>,
    gas_price: U256,
    blob_hashes: Vec<B256>,
}

impl InMemoryHost {
    /// Creates a new, empty [`InMemoryHost`].
    ///
    /// ```
    /// use cinder_vm::core::storage::InMemoryHost;
    ///
    /// let host = InMemoryHost::new();
    /// assert!(host.logs().is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block context.
    pub fn with_block(mut self, block: BlockEnv) -> Self {
        self.block = block;
        self
    }

    /// Sets the transaction's gas price.
    pub fn set_gas_price(&mut self, gas_price: U256) {
        self.gas_price = gas_price;
    }

    /// Sets the transaction's blob versioned hashes.
    pub fn set_blob_hashes(&mut self, hashes: Vec<B256>) {
        self.blob_hashes = hashes;
    }

    /// Records the hash of a past block.
    pub fn insert_block_hash(&mut self, number: u64, hash: B256) {
        self.block_hashes.insert(number, hash);
    }

    /// Places an account in the world state, outside of any journal.
    ///
    /// ```
    /// use alloy::primitives::{Address, Bytes, U256};
    /// use cinder_vm::core::storage::InMemoryHost;
    ///
    /// let mut host = InMemoryHost::new();
    /// host.insert_account(Address::ZERO, U256::from(10), Bytes::from_static(&[0x00]));
    /// assert_eq!(host.balance(Address::ZERO), U256::from(10));
    /// ```
    pub fn insert_account(&mut self, address: Address, balance: U256, code: Bytes) {
        let account = self.accounts.entry(address).or_default();
        account.balance = balance;
        account.code = code;
    }

    /// Places a storage value in the world state, outside of any journal.
    pub fn insert_storage(&mut self, address: Address, key: U256, value: U256) {
        self.storage.insert((address, key), value);
    }

    /// The current value of a storage slot.
    pub fn storage(&self, address: Address, key: U256) -> U256 {
        self.storage.get(&(address, key)).copied().unwrap_or_default()
    }

    /// The current balance of an account.
    pub fn balance(&self, address: Address) -> U256 {
        self.accounts.get(&address).map(|a| a.balance).unwrap_or_default()
    }

    /// The account at `address`, if any.
    pub fn account(&self, address: Address) -> Option<&Account> {
        self.accounts.get(&address)
    }

    /// The logs emitted so far.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Ends the transaction: clears the journal, transient storage, access sets, and
    /// start-of-transaction storage values. Logs are kept.
    pub fn finalize_transaction(&mut self) {
        self.journal.clear();
        self.original.clear();
        self.transient.clear();
        self.warm_accounts.clear();
        self.warm_slots.clear();
        self.created.clear();
    }

    fn touch_account(&mut self, address: Address) -> &mut Account {
        let previous = self.accounts.get(&address).cloned();
        self.journal.push(JournalEntry::Account { address, previous });
        self.accounts.entry(address).or_default()
    }

    fn write_storage(&mut self, address: Address, key: U256, value: U256) {
        let previous = self.storage.insert((address, key), value);
        self.journal.push(JournalEntry::Storage { address, key, previous });
    }
}

impl Host for InMemoryHost {
    fn get_storage(&mut self, address: Address, key: U256) -> Result<U256> {
        Ok(self.storage(address, key))
    }

    fn set_storage(&mut self, address: Address, key: U256, value: U256) -> Result<()> {
        let current = self.storage(address, key);
        self.original.entry((address, key)).or_insert(current);
        self.write_storage(address, key, value);
        Ok(())
    }

    fn get_original_storage(&mut self, address: Address, key: U256) -> Result<U256> {
        match self.original.get(&(address, key)) {
            Some(value) => Ok(*value),
            None => Ok(self.storage(address, key)),
        }
    }

    fn get_transient(&mut self, address: Address, key: U256) -> Result<U256> {
        Ok(self.transient.get(&(address, key)).copied().unwrap_or_default())
    }

    fn set_transient(&mut self, address: Address, key: U256, value: U256) -> Result<()> {
        let previous = self.transient.insert((address, key), value);
        self.journal.push(JournalEntry::Transient { address, key, previous });
        Ok(())
    }

    fn get_balance(&mut self, address: Address) -> Result<U256> {
        Ok(self.balance(address))
    }

    fn get_code(&mut self, address: Address) -> Result<Bytes> {
        Ok(self.accounts.get(&address).map(|a| a.code.clone()).unwrap_or_default())
    }

    fn get_code_hash(&mut self, address: Address) -> Result<B256> {
        Ok(match self.accounts.get(&address) {
            Some(account) if !account.is_empty() => keccak256(&account.code),
            _ => B256::ZERO,
        })
    }

    fn get_block_hash(&mut self, number: u64) -> Result<B256> {
        Ok(self.block_hashes.get(&number).copied().unwrap_or_default())
    }

    fn account_exists(&mut self, address: Address) -> Result<bool> {
        Ok(self.accounts.get(&address).is_some_and(|a| !a.is_empty()))
    }

    fn has_storage(&mut self, address: Address) -> Result<bool> {
        Ok(self.storage.iter().any(|((owner, _), value)| *owner == address && !value.is_zero()))
    }

    fn get_nonce(&mut self, address: Address) -> Result<u64> {
        Ok(self.accounts.get(&address).map(|a| a.nonce).unwrap_or_default())
    }

    fn increment_nonce(&mut self, address: Address) -> Result<()> {
        let account = self.touch_account(address);
        account.nonce = account.nonce.checked_add(1).ok_or_eyre("nonce overflow")?;
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<bool> {
        if self.balance(from) < value {
            return Ok(false);
        }
        if value.is_zero() || from == to {
            return Ok(true);
        }

        let sender = self.touch_account(from);
        sender.balance -= value;
        let recipient = self.touch_account(to);
        recipient.balance = recipient.balance.checked_add(value).ok_or_eyre("balance overflow")?;
        Ok(true)
    }

    fn create_account(&mut self, address: Address) -> Result<()> {
        let account = self.touch_account(address);
        account.nonce = 1;
        account.code = Bytes::new();
        self.created.insert(address);
        self.journal.push(JournalEntry::Created(address));
        Ok(())
    }

    fn set_code(&mut self, address: Address, code: Bytes) -> Result<()> {
        self.touch_account(address).code = code;
        Ok(())
    }

    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> Result<()> {
        let balance = self.balance(address);
        self.transfer(address, beneficiary, balance)?;

        // EIP-6780: only accounts created in this transaction are removed
        if self.created.contains(&address) {
            let keys = self
                .storage
                .keys()
                .filter(|(owner, _)| *owner == address)
                .map(|(_, key)| *key)
                .collect::<Vec<_>>();
            for key in keys {
                let previous = self.storage.remove(&(address, key));
                self.journal.push(JournalEntry::Storage { address, key, previous });
            }

            let previous = self.accounts.remove(&address);
            self.journal.push(JournalEntry::Account { address, previous });
        }
        Ok(())
    }

    fn log(&mut self, log: Log) -> Result<()> {
        self.logs.push(log);
        self.journal.push(JournalEntry::Log);
        Ok(())
    }

    fn warm_account(&mut self, address: Address) -> bool {
        let cold = self.warm_accounts.insert(address);
        if cold {
            self.journal.push(JournalEntry::AccountWarmed(address));
        }
        cold
    }

    fn warm_storage(&mut self, address: Address, key: U256) -> bool {
        let cold = self.warm_slots.insert((address, key));
        if cold {
            self.journal.push(JournalEntry::SlotWarmed(address, key));
        }
        cold
    }

    fn create_address(&mut self, scheme: CreateScheme) -> Result<Address> {
        Ok(match scheme {
            CreateScheme::Create { creator, nonce } => creator.create(nonce),
            CreateScheme::Create2 { creator, salt, init_code_hash } => {
                creator.create2(salt.0, init_code_hash.0)
            }
        })
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.journal.len()
    }

    fn commit(&mut self, _checkpoint: Checkpoint) {
        // entries stay in the journal so an enclosing checkpoint can still roll them back
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint {
            let Some(entry) = self.journal.pop() else { break };
            match entry {
                JournalEntry::Account { address, previous } => match previous {
                    Some(account) => {
                        self.accounts.insert(address, account);
                    }
                    None => {
                        self.accounts.remove(&address);
                    }
                },
                JournalEntry::Storage { address, key, previous } => match previous {
                    Some(value) => {
                        self.storage.insert((address, key), value);
                    }
                    None => {
                        self.storage.remove(&(address, key));
                    }
                },
                JournalEntry::Transient { address, key, previous } => match previous {
                    Some(value) => {
                        self.transient.insert((address, key), value);
                    }
                    None => {
                        self.transient.remove(&(address, key));
                    }
                },
                JournalEntry::AccountWarmed(address) => {
                    self.warm_accounts.remove(&address);
                }
                JournalEntry::SlotWarmed(address, key) => {
                    self.warm_slots.remove(&(address, key));
                }
                JournalEntry::Created(address) => {
                    self.created.remove(&address);
                }
                JournalEntry::Log => {
                    self.logs.pop();
                }
            }
        }
    }

    fn block(&self) -> &BlockEnv {
        &self.block
    }

    fn gas_price(&self) -> U256 {
        self.gas_price
    }

    fn blob_hash(&self, index: usize) -> Option<B256> {
        self.blob_hashes.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xbb)
    }

    #[test]
    fn test_sstore_sload() {
        let mut host = InMemoryHost::new();
        host.set_storage(alice(), U256::from(1), U256::from(1)).expect("host error");
        assert_eq!(host.get_storage(alice(), U256::from(1)).expect("host error"), U256::from(1));
        assert_eq!(host.get_storage(alice(), U256::from(255)).expect("host error"), U256::ZERO);
        assert_eq!(host.get_storage(bob(), U256::from(1)).expect("host error"), U256::ZERO);
    }

    #[test]
    fn test_original_storage_survives_writes() {
        let mut host = InMemoryHost::new();
        host.insert_storage(alice(), U256::ZERO, U256::from(7));

        host.set_storage(alice(), U256::ZERO, U256::from(8)).expect("host error");
        host.set_storage(alice(), U256::ZERO, U256::from(9)).expect("host error");
        assert_eq!(host.get_original_storage(alice(), U256::ZERO).expect("host error"), U256::from(7));

        host.finalize_transaction();
        assert_eq!(host.get_original_storage(alice(), U256::ZERO).expect("host error"), U256::from(9));
    }

    #[test]
    fn test_revert_to_checkpoint() {
        let mut host = InMemoryHost::new();
        host.insert_account(alice(), U256::from(100), Bytes::new());
        host.set_storage(alice(), U256::ZERO, U256::from(1)).expect("host error");

        let checkpoint = host.checkpoint();
        host.set_storage(alice(), U256::ZERO, U256::from(2)).expect("host error");
        host.set_transient(alice(), U256::ZERO, U256::from(3)).expect("host error");
        assert!(host.transfer(alice(), bob(), U256::from(40)).expect("host error"));
        assert!(host.warm_account(bob()));
        host.log(Log::new(alice(), vec![], &[])).expect("host error");

        host.revert_to(checkpoint);
        assert_eq!(host.storage(alice(), U256::ZERO), U256::from(1));
        assert_eq!(host.get_transient(alice(), U256::ZERO).expect("host error"), U256::ZERO);
        assert_eq!(host.balance(alice()), U256::from(100));
        assert!(host.account(bob()).is_none());
        assert!(host.warm_account(bob()));
        assert!(host.logs().is_empty());
    }

    #[test]
    fn test_commit_keeps_changes_revertible_by_parent() {
        let mut host = InMemoryHost::new();
        let outer = host.checkpoint();
        let inner = host.checkpoint();
        host.set_storage(alice(), U256::ZERO, U256::from(1)).expect("host error");
        host.commit(inner);
        assert_eq!(host.storage(alice(), U256::ZERO), U256::from(1));

        host.revert_to(outer);
        assert_eq!(host.storage(alice(), U256::ZERO), U256::ZERO);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut host = InMemoryHost::new();
        host.insert_account(alice(), U256::from(5), Bytes::new());
        assert!(!host.transfer(alice(), bob(), U256::from(6)).expect("host error"));
        assert_eq!(host.balance(alice()), U256::from(5));
        assert_eq!(host.balance(bob()), U256::ZERO);
    }

    #[test]
    fn test_access_sets() {
        let mut host = InMemoryHost::new();
        assert!(host.warm_storage(alice(), U256::from(1)));
        assert!(!host.warm_storage(alice(), U256::from(1)));
        assert!(host.warm_storage(bob(), U256::from(1)));
        assert!(host.warm_account(alice()));
        assert!(!host.warm_account(alice()));
    }

    #[test]
    fn test_create_address_schemes() {
        let mut host = InMemoryHost::new();
        let creator = Address::ZERO;
        assert_eq!(
            host.create_address(CreateScheme::Create { creator, nonce: 0 }).expect("host error"),
            "0xbd770416a3345f91e4b34576cb804a576fa48eb1".parse::<Address>().expect("bad address")
        );
        assert_eq!(
            host.create_address(CreateScheme::Create2 {
                creator,
                salt: B256::ZERO,
                init_code_hash: keccak256([0x00u8]),
            })
            .expect("host error"),
            "0x4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38".parse::<Address>().expect("bad address")
        );
    }

    #[test]
    fn test_code_hash_and_existence() {
        let mut host = InMemoryHost::new();
        assert_eq!(host.get_code_hash(alice()).expect("host error"), B256::ZERO);
        assert!(!host.account_exists(alice()).expect("host error"));

        host.insert_account(alice(), U256::ZERO, Bytes::from_static(&[0x00]));
        assert_eq!(host.get_code_hash(alice()).expect("host error"), keccak256([0x00u8]));
        assert!(host.account_exists(alice()).expect("host error"));
    }

    #[test]
    fn test_selfdestruct_only_removes_new_accounts() {
        let mut host = InMemoryHost::new();
        host.insert_account(alice(), U256::from(10), Bytes::from_static(&[0x00]));
        host.selfdestruct(alice(), bob()).expect("host error");
        assert!(host.account(alice()).is_some());
        assert_eq!(host.balance(bob()), U256::from(10));

        let fresh = Address::repeat_byte(0xcc);
        host.create_account(fresh).expect("host error");
        host.set_storage(fresh, U256::ZERO, U256::from(1)).expect("host error");
        host.selfdestruct(fresh, bob()).expect("host error");
        assert!(host.account(fresh).is_none());
        assert_eq!(host.storage(fresh, U256::ZERO), U256::ZERO);
    }

    #[test]
    fn test_has_storage_ignores_zero_slots() {
        let mut host = InMemoryHost::new();
        assert!(!host.has_storage(alice()).expect("host error"));

        host.set_storage(alice(), U256::from(3), U256::from(1)).expect("host error");
        assert!(host.has_storage(alice()).expect("host error"));
        assert!(!host.has_storage(bob()).expect("host error"));

        host.set_storage(alice(), U256::from(3), U256::ZERO).expect("host error");
        assert!(!host.has_storage(alice()).expect("host error"));
    }
}
