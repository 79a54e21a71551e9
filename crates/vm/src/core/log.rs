use alloy::primitives::{Address, Bytes, B256};

/// The [`Log`] struct represents a log emitted by a `LOG0-LOG4` opcode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// The address of the contract that emitted the log.
    pub address: Address,
    /// Zero to four indexed topics.
    pub topics: Vec<B256>,
    /// The unindexed log data.
    pub data: Bytes,
}

impl Log {
    /// Creates a new [`Log`] with the given emitter, topics, and data.
    pub fn new(address: Address, topics: Vec<B256>, data: &[u8]) -> Log {
        Log { address, topics, data: Bytes::copy_from_slice(data) }
    }
}
