use crate::{core::word, error::Error};

use super::super::core::VM;

/// AND - Bitwise AND operation
pub fn and(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::and)
}

/// OR - Bitwise OR operation
pub fn or(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::or)
}

/// XOR - Bitwise XOR operation
pub fn xor(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::xor)
}

/// NOT - Bitwise NOT operation
pub fn not(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.unary_op(word::not)
}

/// BYTE - Retrieve single byte from word
pub fn byte(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::byte)
}

/// SHL - Shift left operation
pub fn shl(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::shl)
}

/// SHR - Logical shift right operation
pub fn shr(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::shr)
}

/// SAR - Arithmetic shift right operation
pub fn sar(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::sar)
}
