/// The maximum number of items on the stack.
pub const STACK_LIMIT: usize = 1024;

/// The size of a machine word in bytes.
pub const WORD_SIZE: usize = 32;

/// The largest memory offset (or offset plus size) the VM will address.
pub const MAX_MEMORY_SIZE: usize = u32::MAX as usize;

/// Runtime code may not begin with this byte (EIP-3541).
pub const EOF_MAGIC: u8 = 0xef;

/// How many of the most recent blocks `BLOCKHASH` can see.
pub const BLOCK_HASH_HISTORY: u64 = 256;
