//! Benchmark for testing VM performance with Fibonacci sequence calculations.

use alloy::primitives::{Bytes, U256};
use cinder_common::utils::strings::decode_hex;
use cinder_vm::core::{
    storage::InMemoryHost,
    vm::{Executor, Message},
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

/// Iterative fibonacci of the first calldata word, returned as a word.
const FIB: &str = "600035600060015b82156019578091019160019003916007565b5060005260206000f3";

fn test_fib(c: &mut Criterion) {
    let mut group = c.benchmark_group("cinder_vm");

    let executor = Executor::default();
    let bytecode = Bytes::from(decode_hex(FIB).expect("invalid bytecode"));
    let calldata = Bytes::from(U256::from(100).to_be_bytes::<32>().to_vec());

    group.sample_size(500);
    group.bench_function(BenchmarkId::from_parameter("fib"), |b| {
        b.iter(|| {
            // build the evm
            let mut host = InMemoryHost::new();
            let message = Message {
                bytecode: bytecode.clone(),
                calldata: calldata.clone(),
                gas_limit: 10_000_000,
                ..Default::default()
            };

            // run the evm
            let result = executor.execute(&mut host, message);

            assert_eq!(
                result.output(),
                &[
                    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 19, 51,
                    219, 118, 167, 197, 148, 191, 195
                ]
            );
        });
    });

    group.finish();
}

criterion_group!(benches, test_fib);
criterion_main!(benches);
