use alloy::primitives::U256;

use crate::{
    core::{
        constants::{MAX_MEMORY_SIZE, WORD_SIZE},
        word::as_usize_saturated,
    },
    error::Error,
};

/// The [`Memory`] struct represents the memory of an EVM execution context.
///
/// Memory is conceptually an infinite array of zero bytes. Only the prefix that has been touched
/// is materialized, and its length is always a multiple of 32. Memory does not price its own
/// growth: callers charge [`crate::core::gas::memory_expansion_cost`] before calling
/// [`Memory::expand`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    /// Vector storing memory data
    memory: Vec<u8>,
}

impl Memory {
    /// Creates a new [`Memory`] with an empty memory vector
    pub fn new() -> Memory {
        Memory { memory: Vec::with_capacity(2048) }
    }

    /// Gets the current size of the memory in bytes.
    ///
    /// ```
    /// use cinder_vm::core::memory::Memory;
    ///
    /// let memory = Memory::new();
    /// assert_eq!(memory.size(), 0);
    /// ```
    #[inline]
    pub fn size(&self) -> usize {
        self.memory.len()
    }

    /// Gets the current size of the memory in 32-byte words.
    #[inline]
    pub fn word_count(&self) -> usize {
        self.memory.len() / WORD_SIZE
    }

    /// Returns the materialized memory.
    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }

    /// Grows the memory to the smallest multiple of 32 bytes covering `offset..offset + size`.
    /// A zero `size` never grows memory.
    ///
    /// ```
    /// use cinder_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.expand(0, 33);
    /// assert_eq!(memory.size(), 64);
    ///
    /// memory.expand(1000, 0);
    /// assert_eq!(memory.size(), 64);
    /// ```
    pub fn expand(&mut self, offset: usize, size: usize) {
        if size == 0 {
            return;
        }

        let new_size = offset.saturating_add(size).div_ceil(WORD_SIZE) * WORD_SIZE;
        if new_size > self.memory.len() {
            self.memory.resize(new_size, 0u8);
        }
    }

    /// Read `size` bytes starting at `offset`. Bytes past the materialized region read as zero,
    /// and memory is not grown.
    ///
    /// ```
    /// use cinder_vm::core::memory::Memory;
    ///
    /// let memory = Memory::new();
    /// assert_eq!(memory.access(100, 4), vec![0u8; 4]);
    /// assert_eq!(memory.size(), 0);
    /// ```
    pub fn access(&self, offset: usize, size: usize) -> Vec<u8> {
        padded_slice(&self.memory, offset, size)
    }

    /// Read the 32-byte word starting at `offset`.
    pub fn load_word(&self, offset: usize) -> U256 {
        U256::from_be_slice(&self.access(offset, WORD_SIZE))
    }

    /// Write `value` at `offset`, growing memory as needed.
    ///
    /// ```
    /// use cinder_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.store(4, &[0xff]);
    /// assert_eq!(memory.size(), 32);
    /// assert_eq!(memory.access(3, 3), vec![0x00, 0xff, 0x00]);
    /// ```
    pub fn store(&mut self, offset: usize, value: &[u8]) {
        if value.is_empty() {
            return;
        }

        self.expand(offset, value.len());
        self.memory[offset..offset + value.len()].copy_from_slice(value);
    }

    /// Write a big-endian word at `offset`.
    pub fn store_word(&mut self, offset: usize, value: U256) {
        self.store(offset, &value.to_be_bytes::<32>());
    }

    /// Write a single byte at `offset`.
    pub fn store_byte(&mut self, offset: usize, value: u8) {
        self.store(offset, &[value]);
    }

    /// Copy `size` bytes from `src` to `dest`. The regions may overlap.
    pub fn copy(&mut self, dest: usize, src: usize, size: usize) {
        if size == 0 {
            return;
        }

        self.expand(src, size);
        self.expand(dest, size);
        self.memory.copy_within(src..src + size, dest);
    }
}

/// Copies `size` bytes out of `source` starting at `offset`, zero-padding anything past the
/// end of `source`.
///
/// ```
/// use cinder_vm::core::memory::padded_slice;
///
/// assert_eq!(padded_slice(&[1, 2, 3], 1, 4), vec![2, 3, 0, 0]);
/// assert_eq!(padded_slice(&[1, 2, 3], usize::MAX, 2), vec![0, 0]);
/// ```
pub fn padded_slice(source: &[u8], offset: usize, size: usize) -> Vec<u8> {
    let mut value = vec![0u8; size];
    if offset < source.len() {
        let end = offset.saturating_add(size).min(source.len());
        value[..end - offset].copy_from_slice(&source[offset..end]);
    }
    value
}

/// Converts an `(offset, size)` pair of stack words into an addressable memory range.
///
/// A zero size resolves to `(0, 0)` whatever the offset. Ranges reaching past
/// [`MAX_MEMORY_SIZE`] fail with [`Error::InvalidMemoryAccess`].
pub fn resolve_range(offset: U256, size: U256) -> Result<(usize, usize), Error> {
    if size.is_zero() {
        return Ok((0, 0));
    }

    let offset = as_usize_saturated(offset);
    let size = as_usize_saturated(size);
    match offset.checked_add(size) {
        Some(end) if end <= MAX_MEMORY_SIZE => Ok((offset, size)),
        _ => Err(Error::InvalidMemoryAccess),
    }
}
