//! Jump destination analysis. Bytecode is scanned once, and every `JUMPDEST` byte that is an
//! instruction (rather than PUSH data) is recorded in a bitset.

use alloy::primitives::{Bytes, U256};

use crate::core::opcodes::{JUMPDEST, PUSH1, PUSH32};

/// A fixed-size bitset over code offsets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct BitSet {
    bits: Vec<u64>,
    len: usize,
}

impl BitSet {
    fn new_empty(len: usize) -> Self {
        Self { bits: vec![0; len.div_ceil(64)], len }
    }

    fn get(&self, idx: usize) -> bool {
        if idx >= self.len {
            return false;
        }
        (self.bits[idx / 64] >> (idx % 64)) & 1 == 1
    }

    fn set(&mut self, idx: usize) {
        if idx >= self.len {
            return;
        }
        self.bits[idx / 64] |= 1_u64 << (idx % 64);
    }
}

/// Bytecode paired with its valid jump destinations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalyzedBytecode {
    code: Bytes,
    jump_table: BitSet,
}

impl AnalyzedBytecode {
    /// Scans `code` for valid jump destinations.
    ///
    /// ```
    /// use alloy::primitives::{Bytes, U256};
    /// use cinder_vm::core::analysis::AnalyzedBytecode;
    ///
    /// // PUSH1 0x5b JUMPDEST
    /// let code = AnalyzedBytecode::new(Bytes::from_static(&[0x60, 0x5b, 0x5b]));
    /// assert!(!code.is_valid_jump(U256::from(1)));
    /// assert!(code.is_valid_jump(U256::from(2)));
    /// ```
    pub fn new(code: Bytes) -> Self {
        let mut jump_table = BitSet::new_empty(code.len());

        let mut pc = 0;
        while pc < code.len() {
            let byte = code[pc];
            if byte == JUMPDEST {
                jump_table.set(pc);
            } else if (PUSH1..=PUSH32).contains(&byte) {
                pc += (byte - PUSH1 + 1) as usize;
            }
            pc += 1;
        }

        Self { code, jump_table }
    }

    /// The raw bytecode.
    #[inline]
    pub fn code(&self) -> &Bytes {
        &self.code
    }

    /// The length of the bytecode in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Whether the bytecode is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// The byte at `pc`, or `None` past the end of the code.
    #[inline]
    pub fn byte_at(&self, pc: usize) -> Option<u8> {
        self.code.get(pc).copied()
    }

    /// Whether `target` is a `JUMPDEST` instruction.
    #[inline]
    pub fn is_valid_jump(&self, target: U256) -> bool {
        usize::try_from(target).is_ok_and(|target| self.jump_table.get(target))
    }
}
