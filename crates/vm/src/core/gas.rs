//! Gas accounting: the pluggable [`CostTable`], the [`Gas`] meter, and helpers for the dynamic
//! parts of instruction costs.

use alloy::primitives::U256;
use cinder_config::{Configuration, GasParams};
use eyre::{eyre, Result};

use crate::{
    core::{
        constants::WORD_SIZE,
        opcodes::{Opcode, OPCODE_INFO_TABLE},
        word::exp_byte_len,
    },
    error::Error,
};

/// A source of instruction costs. The interpreter charges [`CostTable::base_cost`] before an
/// instruction runs and reads dynamic cost parameters from [`CostTable::params`].
pub trait CostTable: std::fmt::Debug + Send + Sync {
    /// The static cost of `opcode`.
    fn base_cost(&self, opcode: Opcode) -> u64;

    /// Parameters for the dynamic components of instruction costs.
    fn params(&self) -> &GasParams;
}

/// The default [`CostTable`]: a flat table of base costs plus [`GasParams`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasSchedule {
    base: [u64; 256],
    params: GasParams,
}

impl Default for GasSchedule {
    fn default() -> Self {
        let mut base = [0u64; 256];
        for (cost, info) in base.iter_mut().zip(OPCODE_INFO_TABLE.iter()) {
            if let Some(info) = info {
                *cost = info.min_gas() as u64;
            }
        }
        GasSchedule { base, params: GasParams::default() }
    }
}

impl GasSchedule {
    /// Builds a schedule from a [`Configuration`], applying its `opcode_costs` overrides.
    ///
    /// ```
    /// use cinder_config::Configuration;
    /// use cinder_vm::core::{gas::{CostTable, GasSchedule}, opcodes::Opcode};
    ///
    /// let mut config = Configuration::default();
    /// config.opcode_costs.insert("ADD".to_string(), 1);
    ///
    /// let schedule = GasSchedule::from_config(&config).expect("invalid schedule");
    /// assert_eq!(schedule.base_cost(Opcode::ADD), 1);
    /// assert_eq!(schedule.base_cost(Opcode::MUL), 5);
    /// ```
    pub fn from_config(config: &Configuration) -> Result<Self> {
        let mut schedule = GasSchedule { params: config.gas.clone(), ..Default::default() };
        for (name, cost) in &config.opcode_costs {
            let opcode = Opcode::from_name(name)
                .ok_or_else(|| eyre!("unknown opcode in opcode_costs: {}", name))?;
            schedule.set_base_cost(opcode, *cost);
        }
        Ok(schedule)
    }

    /// Overrides the base cost of a single opcode.
    pub fn set_base_cost(&mut self, opcode: Opcode, cost: u64) {
        self.base[opcode.byte() as usize] = cost;
    }
}

impl CostTable for GasSchedule {
    #[inline]
    fn base_cost(&self, opcode: Opcode) -> u64 {
        self.base[opcode.byte() as usize]
    }

    #[inline]
    fn params(&self) -> &GasParams {
        &self.params
    }
}

/// Execution limits that are not gas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting depth of calls and creates.
    pub max_call_depth: usize,
    /// Maximum size of deployed runtime code.
    pub max_code_size: usize,
    /// Maximum size of init code.
    pub max_initcode_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits::from(&Configuration::default())
    }
}

impl From<&Configuration> for Limits {
    fn from(config: &Configuration) -> Self {
        Limits {
            max_call_depth: config.max_call_depth,
            max_code_size: config.max_code_size,
            max_initcode_size: config.max_initcode_size,
        }
    }
}

/// The gas meter of a single execution context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gas {
    limit: u64,
    remaining: u64,
}

impl Gas {
    /// Creates a meter holding `limit` gas.
    pub const fn new(limit: u64) -> Self {
        Gas { limit, remaining: limit }
    }

    /// The gas the context started with.
    #[inline]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// The gas left.
    #[inline]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// The gas consumed so far.
    #[inline]
    pub const fn spent(&self) -> u64 {
        self.limit - self.remaining
    }

    /// Deducts `cost`, failing with [`Error::OutOfGas`] (and deducting nothing) when it does not
    /// fit.
    ///
    /// ```
    /// use cinder_vm::{core::gas::Gas, error::Error};
    ///
    /// let mut gas = Gas::new(10);
    /// assert_eq!(gas.record_cost(4), Ok(()));
    /// assert_eq!(gas.record_cost(7), Err(Error::OutOfGas));
    /// assert_eq!(gas.remaining(), 6);
    /// ```
    #[inline]
    pub fn record_cost(&mut self, cost: u64) -> Result<(), Error> {
        self.remaining = self.remaining.checked_sub(cost).ok_or(Error::OutOfGas)?;
        Ok(())
    }

    /// Returns gas that was forwarded but not used.
    #[inline]
    pub fn return_gas(&mut self, amount: u64) {
        self.remaining = self.remaining.saturating_add(amount).min(self.limit);
    }

    /// Consumes everything that is left.
    #[inline]
    pub fn consume_all(&mut self) {
        self.remaining = 0;
    }
}

/// The number of 32-byte words needed to hold `size` bytes.
#[inline]
pub fn word_count(size: usize) -> u64 {
    size.div_ceil(WORD_SIZE) as u64
}

/// The total cost of a memory of `size` bytes: `memory_word * w + w^2 / memory_quad_divisor`.
pub fn memory_cost(size: usize, params: &GasParams) -> u64 {
    let words = word_count(size);
    let quadratic = words
        .saturating_mul(words)
        .checked_div(params.memory_quad_divisor)
        .unwrap_or(0);
    params.memory_word.saturating_mul(words).saturating_add(quadratic)
}

/// The cost of growing memory from `current_size` bytes to cover `offset..offset + size`.
/// Zero when no growth is needed, including whenever `size` is zero.
///
/// ```
/// use cinder_config::GasParams;
/// use cinder_vm::core::gas::memory_expansion_cost;
///
/// let params = GasParams::default();
/// assert_eq!(memory_expansion_cost(0, 0, 32, &params), 3);
/// assert_eq!(memory_expansion_cost(32, 0, 32, &params), 0);
/// assert_eq!(memory_expansion_cost(0, 1024, 0, &params), 0);
/// ```
pub fn memory_expansion_cost(
    current_size: usize,
    offset: usize,
    size: usize,
    params: &GasParams,
) -> u64 {
    if size == 0 {
        return 0;
    }

    let new_size = offset.saturating_add(size);
    if new_size <= current_size {
        return 0;
    }
    memory_cost(new_size, params).saturating_sub(memory_cost(current_size, params))
}

/// The per-word cost of copying `size` bytes.
#[inline]
pub fn copy_cost(size: usize, params: &GasParams) -> u64 {
    params.copy_word.saturating_mul(word_count(size))
}

/// The per-word cost of hashing `size` bytes.
#[inline]
pub fn keccak_cost(size: usize, params: &GasParams) -> u64 {
    params.keccak_word.saturating_mul(word_count(size))
}

/// The dynamic cost of `EXP` for `exponent`.
#[inline]
pub fn exp_cost(exponent: U256, params: &GasParams) -> u64 {
    params.exp_byte.saturating_mul(exp_byte_len(exponent))
}

/// The surcharge for touching an account or slot for the first time in a transaction.
#[inline]
pub fn cold_account_surcharge(is_cold: bool, params: &GasParams) -> u64 {
    if is_cold {
        params.cold_account_access.saturating_sub(params.warm_access)
    } else {
        0
    }
}

/// The dynamic cost and refund delta of an `SSTORE` (EIP-2200, EIP-2929, EIP-3529).
///
/// `original` is the slot value at the start of the transaction and `current` its value before
/// this store. The returned cost includes the cold access charge when `is_cold`.
pub fn sstore_cost(
    original: U256,
    current: U256,
    new: U256,
    is_cold: bool,
    params: &GasParams,
) -> (u64, i64) {
    let mut cost = if is_cold { params.cold_sload } else { 0 };
    let mut refund = 0i64;
    let clears_refund = params.sstore_clears_refund as i64;

    if new == current {
        return (cost + params.warm_access, refund);
    }

    if original == current {
        if original.is_zero() {
            cost += params.sstore_set;
        } else {
            cost += params.sstore_reset;
            if new.is_zero() {
                refund += clears_refund;
            }
        }
        return (cost, refund);
    }

    // dirty slot
    cost += params.warm_access;
    if !original.is_zero() {
        if current.is_zero() {
            refund -= clears_refund;
        } else if new.is_zero() {
            refund += clears_refund;
        }
    }
    if original == new {
        let restored = if original.is_zero() { params.sstore_set } else { params.sstore_reset };
        refund += restored.saturating_sub(params.warm_access) as i64;
    }
    (cost, refund)
}
