//! Configuration management for cinder
//!
//! This crate provides the [`Configuration`] consumed by the interpreter: execution limits,
//! every dynamic gas parameter, and per-opcode base cost overrides. Configurations are stored
//! as TOML and can be loaded, saved, and updated key by key.

/// Error types for the configuration module
pub mod error;

use std::{collections::BTreeMap, path::PathBuf};

use crate::error::Error;
use cinder_common::utils::io::file::{delete_file, read_file, write_file};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable that points at an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "CINDER_CONFIG";

/// Environment variable that overrides [`Configuration::max_call_depth`] after loading.
pub const MAX_CALL_DEPTH_ENV: &str = "CINDER_MAX_CALL_DEPTH";

/// Dynamic gas parameters. Defaults follow the Cancun schedule.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GasParams {
    /// Linear cost per 32-byte word of memory.
    pub memory_word: u64,
    /// Divisor of the quadratic memory term (`words^2 / divisor`).
    pub memory_quad_divisor: u64,
    /// Cost per word copied by the `*COPY` family.
    pub copy_word: u64,
    /// Cost per word hashed by `KECCAK256` and `CREATE2`.
    pub keccak_word: u64,
    /// Cost per significant byte of the `EXP` exponent.
    pub exp_byte: u64,
    /// Cost per topic of a `LOGn`.
    pub log_topic: u64,
    /// Cost per byte of `LOGn` data.
    pub log_data_byte: u64,
    /// Cost of accessing a warm account or storage slot.
    pub warm_access: u64,
    /// Cost of the first access to an account in a transaction.
    pub cold_account_access: u64,
    /// Cost of the first access to a storage slot in a transaction.
    pub cold_sload: u64,
    /// `SSTORE` cost when a clean slot goes from zero to non-zero.
    pub sstore_set: u64,
    /// `SSTORE` cost when a clean non-zero slot is modified.
    pub sstore_reset: u64,
    /// Refund granted when a slot is cleared.
    pub sstore_clears_refund: u64,
    /// `SSTORE` fails when the remaining gas is at or below this value.
    pub sstore_sentry: u64,
    /// Surcharge for a call that transfers value.
    pub call_value_transfer: u64,
    /// Surcharge for a value transfer that brings a new account into existence.
    pub call_new_account: u64,
    /// Gas given for free to the callee of a value-bearing call.
    pub call_stipend: u64,
    /// Cost per word of init code for `CREATE` and `CREATE2`.
    pub initcode_word: u64,
    /// Cost per byte of deployed runtime code.
    pub code_deposit_byte: u64,
    /// Surcharge for a `SELFDESTRUCT` that sends value to an empty account.
    pub selfdestruct_new_account: u64,
}

impl Default for GasParams {
    fn default() -> Self {
        GasParams {
            memory_word: 3,
            memory_quad_divisor: 512,
            copy_word: 3,
            keccak_word: 6,
            exp_byte: 50,
            log_topic: 375,
            log_data_byte: 8,
            warm_access: 100,
            cold_account_access: 2600,
            cold_sload: 2100,
            sstore_set: 20000,
            sstore_reset: 2900,
            sstore_clears_refund: 4800,
            sstore_sentry: 2300,
            call_value_transfer: 9000,
            call_new_account: 25000,
            call_stipend: 2300,
            initcode_word: 2,
            code_deposit_byte: 200,
            selfdestruct_new_account: 25000,
        }
    }
}

impl GasParams {
    /// Returns a mutable reference to the parameter named `key`, if it exists.
    fn field_mut(&mut self, key: &str) -> Option<&mut u64> {
        let field = match key {
            "memory_word" => &mut self.memory_word,
            "memory_quad_divisor" => &mut self.memory_quad_divisor,
            "copy_word" => &mut self.copy_word,
            "keccak_word" => &mut self.keccak_word,
            "exp_byte" => &mut self.exp_byte,
            "log_topic" => &mut self.log_topic,
            "log_data_byte" => &mut self.log_data_byte,
            "warm_access" => &mut self.warm_access,
            "cold_account_access" => &mut self.cold_account_access,
            "cold_sload" => &mut self.cold_sload,
            "sstore_set" => &mut self.sstore_set,
            "sstore_reset" => &mut self.sstore_reset,
            "sstore_clears_refund" => &mut self.sstore_clears_refund,
            "sstore_sentry" => &mut self.sstore_sentry,
            "call_value_transfer" => &mut self.call_value_transfer,
            "call_new_account" => &mut self.call_new_account,
            "call_stipend" => &mut self.call_stipend,
            "initcode_word" => &mut self.initcode_word,
            "code_deposit_byte" => &mut self.code_deposit_byte,
            "selfdestruct_new_account" => &mut self.selfdestruct_new_account,
            _ => return None,
        };
        Some(field)
    }
}

/// The [`Configuration`] struct represents the settings of the interpreter. The VM reads its
/// limits and gas schedule from here.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Configuration {
    /// Maximum nesting depth of calls and creates.
    pub max_call_depth: usize,

    /// Maximum size of deployed runtime code, in bytes.
    pub max_code_size: usize,

    /// Maximum size of `CREATE`/`CREATE2` init code, in bytes.
    pub max_initcode_size: usize,

    /// Dynamic gas parameters.
    pub gas: GasParams,

    /// Base cost overrides keyed by opcode mnemonic, e.g. `SLOAD = 800`.
    pub opcode_costs: BTreeMap<String, u64>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            max_call_depth: 1024,
            max_code_size: 24576,
            max_initcode_size: 49152,
            gas: GasParams::default(),
            opcode_costs: BTreeMap::new(),
        }
    }
}

impl Configuration {
    /// Returns the path of the configuration file: `$CINDER_CONFIG` when set, otherwise
    /// `$HOME/.cinder/config.toml`.
    #[allow(deprecated)]
    pub fn default_path() -> Result<PathBuf, Error> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let mut home = std::env::home_dir().ok_or_else(|| {
            Error::Generic(
                "failed to get home directory. does your os support `std::env::home_dir()`?"
                    .to_string(),
            )
        })?;
        home.push(".cinder");
        home.push("config.toml");
        Ok(home)
    }

    /// Returns the current configuration, creating a default file when none exists.
    pub fn load() -> Result<Self, Error> {
        let path = Self::default_path()?;
        let mut config = Self::load_from(path_str(&path)?)?;

        if let Ok(depth) = std::env::var(MAX_CALL_DEPTH_ENV) {
            debug!("overriding max_call_depth with {}", MAX_CALL_DEPTH_ENV);
            config.update_in_memory("max_call_depth", &depth)?;
        }

        Ok(config)
    }

    /// Loads the configuration stored at `path`, creating a default file when none exists.
    pub fn load_from(path: &str) -> Result<Self, Error> {
        if !std::path::Path::new(path).exists() {
            debug!(path, "no configuration found, writing defaults");
            let config = Configuration::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = read_file(path)
            .map_err(|e| Error::Generic(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Parses a configuration from TOML. Missing keys take their default values.
    ///
    /// ```
    /// use cinder_config::Configuration;
    ///
    /// let config = Configuration::from_toml("max_call_depth = 64\n[gas]\ncall_stipend = 0\n")
    ///     .expect("failed to parse config");
    /// assert_eq!(config.max_call_depth, 64);
    /// assert_eq!(config.gas.call_stipend, 0);
    /// assert_eq!(config.gas.cold_sload, 2100);
    /// ```
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| Error::ParseError(format!("failed to parse config file: {e}")))
    }

    /// Serializes the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string(&self)
            .map_err(|e| Error::ParseError(format!("failed to serialize config: {e}")))
    }

    /// Saves the configuration to the default path.
    pub fn save(&self) -> Result<(), Error> {
        let path = Self::default_path()?;
        self.save_to(path_str(&path)?)
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &str) -> Result<(), Error> {
        write_file(path, &self.to_toml()?)
            .map_err(|e| Error::Generic(format!("failed to write config file: {e}")))
    }

    /// Deletes the configuration file at the default path.
    pub fn delete() -> Result<(), Error> {
        let path = Self::default_path()?;
        delete_file(path_str(&path)?);
        Ok(())
    }

    /// Update a single key/value pair and write the configuration to the default path.
    ///
    /// Keys are `max_call_depth`, `max_code_size`, `max_initcode_size`, `gas.<param>` and
    /// `opcode_costs.<MNEMONIC>`.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.update_in_memory(key, value)?;

        // write the updated config to disk
        self.save()?;

        Ok(())
    }

    /// Update a single key/value pair without touching the disk.
    ///
    /// ```
    /// use cinder_config::Configuration;
    ///
    /// let mut config = Configuration::default();
    /// config.update_in_memory("gas.cold_sload", "1800").expect("failed to update");
    /// config.update_in_memory("opcode_costs.sload", "50").expect("failed to update");
    /// assert_eq!(config.gas.cold_sload, 1800);
    /// assert_eq!(config.opcode_costs.get("SLOAD"), Some(&50));
    /// ```
    pub fn update_in_memory(&mut self, key: &str, value: &str) -> Result<(), Error> {
        match key {
            "max_call_depth" => self.max_call_depth = parse_number(key, value)?,
            "max_code_size" => self.max_code_size = parse_number(key, value)?,
            "max_initcode_size" => self.max_initcode_size = parse_number(key, value)?,
            _ => {
                if let Some(param) = key.strip_prefix("gas.") {
                    let field = self.gas.field_mut(param).ok_or_else(|| invalid_key(key))?;
                    *field = parse_number(key, value)?;
                } else if let Some(mnemonic) = key.strip_prefix("opcode_costs.") {
                    if mnemonic.is_empty() {
                        return Err(invalid_key(key));
                    }
                    self.opcode_costs.insert(mnemonic.to_uppercase(), parse_number(key, value)?);
                } else {
                    return Err(invalid_key(key));
                }
            }
        }

        Ok(())
    }
}

fn path_str(path: &std::path::Path) -> Result<&str, Error> {
    path.to_str().ok_or_else(|| Error::Generic("failed to convert path to string".to_string()))
}

fn invalid_key(key: &str) -> Error {
    Error::Generic(format!("invalid key: \'{key}\' is not a valid configuration key."))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| Error::ParseError(format!("invalid value for \'{key}\': \'{value}\'")))
}
