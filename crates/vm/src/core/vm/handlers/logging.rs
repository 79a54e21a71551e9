use alloy::primitives::B256;

use crate::{
    core::{log::Log, memory::resolve_range},
    error::Error,
};

use super::super::core::VM;

/// LOG0-LOG4 - Append log record with N topics
pub fn log_n(vm: &mut VM<'_>, topic_count: usize) -> Result<(), Error> {
    let [offset, size] = vm.ctx.stack.peek_n::<2>()?;
    let (offset, size) = resolve_range(offset, size)?;

    // consume dynamic gas
    let params = vm.gas_params();
    let gas_cost = params
        .log_topic
        .saturating_mul(topic_count as u64)
        .saturating_add(params.log_data_byte.saturating_mul(size as u64))
        .saturating_add(vm.memory_expansion(offset, size));
    vm.ctx.gas.record_cost(gas_cost)?;

    vm.ctx.stack.pop_n::<2>()?;
    let mut topics = Vec::with_capacity(topic_count);
    for _ in 0..topic_count {
        topics.push(B256::from(vm.ctx.stack.pop()?.to_be_bytes::<32>()));
    }

    vm.ctx.memory.expand(offset, size);
    let data = vm.ctx.memory.access(offset, size);
    vm.host.log(Log::new(vm.ctx.env.address, topics, &data))?;
    Ok(())
}
