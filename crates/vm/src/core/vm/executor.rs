use cinder_config::Configuration;
use eyre::{Result, WrapErr};
use tracing::debug;

use crate::core::{
    gas::{GasSchedule, Limits},
    host::Host,
};

use super::{
    core::VM,
    execution::{ExecutionResult, Instruction, Message},
};

/// The entry point for running bytecode. An [`Executor`] holds the gas schedule and limits and
/// can run any number of messages, each against a caller-supplied [`Host`].
///
/// ```
/// use alloy::primitives::{Bytes, U256};
/// use cinder_vm::core::{
///     storage::InMemoryHost,
///     vm::{Executor, Message},
/// };
///
/// let executor = Executor::default();
/// let mut host = InMemoryHost::new();
///
/// // PUSH1 0x2a PUSH1 0x00 MSTORE PUSH1 0x20 PUSH1 0x00 RETURN
/// let message = Message {
///     bytecode: Bytes::from_static(&[
///         0x60, 0x2a, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
///     ]),
///     gas_limit: 100_000,
///     ..Default::default()
/// };
///
/// let result = executor.execute(&mut host, message);
/// assert!(result.is_success());
/// assert_eq!(U256::from_be_slice(result.output()), U256::from(42));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Executor {
    schedule: GasSchedule,
    limits: Limits,
}

impl Executor {
    /// Creates an executor from an explicit schedule and limits.
    pub fn new(schedule: GasSchedule, limits: Limits) -> Self {
        Self { schedule, limits }
    }

    /// Creates an executor from a [`Configuration`]. Fails when the configuration overrides
    /// the cost of an unknown opcode.
    pub fn from_config(config: &Configuration) -> Result<Self> {
        let schedule =
            GasSchedule::from_config(config).wrap_err("failed to build gas schedule")?;
        Ok(Self { schedule, limits: Limits::from(config) })
    }

    /// The gas schedule in use.
    pub fn schedule(&self) -> &GasSchedule {
        &self.schedule
    }

    /// The limits in use.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Runs `message` to completion against `host`.
    pub fn execute(&self, host: &mut dyn Host, message: Message) -> ExecutionResult {
        self.execute_with_inspector(host, message, |_| {})
    }

    /// Runs `message` to completion, calling `inspect` with the record of every executed
    /// instruction, nested ones included.
    pub fn execute_with_inspector<F>(
        &self,
        host: &mut dyn Host,
        message: Message,
        mut inspect: F,
    ) -> ExecutionResult
    where
        F: FnMut(&Instruction),
    {
        debug!(
            address = %message.address,
            caller = %message.caller,
            gas_limit = message.gas_limit,
            code_size = message.bytecode.len(),
            "executing message"
        );

        let mut vm = VM::new(host, &self.schedule, self.limits, message);
        while !vm.is_finished() {
            let instruction = vm.step();
            inspect(&instruction);
        }
        let result = vm.execute();

        debug!(
            success = result.is_success(),
            gas_used = result.gas_used,
            gas_refund = result.gas_refund,
            "execution finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Bytes;
    use cinder_common::utils::strings::decode_hex;

    use super::*;
    use crate::core::{opcodes::Opcode, storage::InMemoryHost};

    fn message(bytecode: &str, gas_limit: u64) -> Message {
        Message {
            bytecode: Bytes::from(decode_hex(bytecode).expect("invalid bytecode")),
            gas_limit,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_applies_overrides() {
        let mut config = Configuration::default();
        config.max_call_depth = 8;
        config.opcode_costs.insert("ADD".to_string(), 10);

        let executor = Executor::from_config(&config).expect("failed to build executor");
        assert_eq!(executor.limits().max_call_depth, 8);

        let mut host = InMemoryHost::new();
        // PUSH1 1 PUSH1 2 ADD
        let result = executor.execute(&mut host, message("6001600201", 1000));
        assert_eq!(result.gas_used, 3 + 3 + 10);
    }

    #[test]
    fn test_from_config_rejects_unknown_opcode() {
        let mut config = Configuration::default();
        config.opcode_costs.insert("NOTANOPCODE".to_string(), 1);
        assert!(Executor::from_config(&config).is_err());
    }

    #[test]
    fn test_inspector_sees_every_instruction() {
        let executor = Executor::default();
        let mut host = InMemoryHost::new();

        let mut opcodes = Vec::new();
        let result = executor.execute_with_inspector(&mut host, message("6001600201", 1000), |i| {
            opcodes.push(i.opcode)
        });

        assert!(result.is_success());
        // the final record is the implicit STOP past the end of the code
        assert_eq!(
            opcodes,
            vec![Opcode::PUSH1.byte(), Opcode::PUSH1.byte(), Opcode::ADD.byte(), Opcode::STOP.byte()]
        );
    }
}
