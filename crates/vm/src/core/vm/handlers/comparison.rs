use crate::{core::word, error::Error};

use super::super::core::VM;

/// LT - Less-than comparison
pub fn lt(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::lt)
}

/// GT - Greater-than comparison
pub fn gt(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::gt)
}

/// SLT - Signed less-than comparison
pub fn slt(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::slt)
}

/// SGT - Signed greater-than comparison
pub fn sgt(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::sgt)
}

/// EQ - Equality comparison
pub fn eq(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.binary_op(word::eq)
}

/// ISZERO - Simple not operator
pub fn iszero(vm: &mut VM<'_>) -> Result<(), Error> {
    vm.unary_op(word::iszero)
}
