use crate::{
    core::{gas::exp_cost, word},
    error::Error,
};

use super::super::core::VM;

/// ADD - Addition operation
pub fn add(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::add)
}

/// MUL - Multiplication operation
pub fn mul(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::mul)
}

/// SUB - Subtraction operation
pub fn sub(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::sub)
}

/// DIV - Integer division operation
pub fn div(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::div)
}

/// SDIV - Signed integer division operation
pub fn sdiv(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::sdiv)
}

/// MOD - Modulo operation
pub fn modulo(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::rem)
}

/// SMOD - Signed modulo operation
pub fn smod(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::smod)
}

/// ADDMOD - Addition modulo operation
pub fn addmod(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ternary_op(word::addmod)
}

/// MULMOD - Multiplication modulo operation
pub fn mulmod(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.ternary_op(word::mulmod)
}

/// EXP - Exponential operation
pub fn exp(vm: &mut VM<'_>) -> Result<(), Error> {
    let exponent = vm.ctx.stack.peek(1)?;

    // consume dynamic gas
    vm.ctx.gas.record_cost(exp_cost(exponent, vm.gas_params()))?;

    vm.binary_op(word::exp)
}

/// SIGNEXTEND - Sign extension operation
pub fn signextend(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::signextend)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use crate::core::vm::{handlers::tests::run, Outcome};

    #[test]
    fn test_add_wraps() {
        // PUSH1 1 PUSH32 MAX ADD, returned
        let (result, _) = run(
            "60017fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff0160005260206000f3",
            100_000,
        );
        assert_eq!(U256::from_be_slice(result.output()), U256::ZERO);
    }

    #[test]
    fn test_exp_charges_per_exponent_byte() {
        // PUSH2 0x0100 PUSH1 2 EXP
        let (result, _) = run("61010060020a", 100_000);
        assert_eq!(result.gas_used, 3 + 3 + 10 + 50 * 2);

        // exponent zero has no dynamic cost
        let (result, _) = run("600060020a", 100_000);
        assert_eq!(result.gas_used, 3 + 3 + 10);
    }

    #[test]
    fn test_exp_out_of_gas_before_result() {
        let (result, _) = run("61010060020a", 3 + 3 + 10 + 99);
        assert!(matches!(result.outcome, Outcome::Fail { .. }));
        assert_eq!(result.gas_used, 3 + 3 + 10 + 99);
    }
}
