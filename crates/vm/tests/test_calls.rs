//! Integration tests for nested execution: message calls, contract creation, and the state
//! rollback rules between frames.

#[cfg(test)]
mod integration_tests {
    use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
    use cinder_common::utils::strings::{decode_hex, encode_hex};
    use cinder_vm::{
        core::{
            gas::{GasSchedule, Limits},
            storage::InMemoryHost,
            vm::{Executor, ExecutionResult, Message, Outcome, VM},
            word::from_address,
        },
        error::Error,
    };

    const PARENT: Address = Address::repeat_byte(0xaa);
    const CHILD: Address = Address::repeat_byte(0xcc);

    fn push_address(address: Address) -> String {
        format!("73{}", encode_hex(address.as_slice()))
    }

    fn bytes(hex: &str) -> Bytes {
        Bytes::from(decode_hex(hex).expect("invalid bytecode"))
    }

    /// Runs `code` as `PARENT` with `CHILD` deployed, returning the result and the final stack.
    fn run_parent(
        host: &mut InMemoryHost,
        limits: Limits,
        code: &str,
    ) -> (ExecutionResult, Vec<U256>) {
        let bytecode = bytes(code);
        if host.account(PARENT).is_none() {
            host.insert_account(PARENT, U256::ZERO, bytecode.clone());
        }

        let schedule = GasSchedule::default();
        let message = Message {
            bytecode,
            gas_limit: 5_000_000,
            address: PARENT,
            caller: Address::repeat_byte(0xee),
            origin: Address::repeat_byte(0xee),
            ..Default::default()
        };
        let mut vm = VM::new(host, &schedule, limits, message);
        let result = vm.execute();
        (result, vm.ctx.stack.as_slice().to_vec())
    }

    /// `CALL(0xffff, CHILD, value, args 0..0, ret ret_offset..ret_offset+ret_size)`
    fn call_child(value: u8, ret_offset: u8, ret_size: u8) -> String {
        format!(
            "60{ret_size:02x}60{ret_offset:02x}6000600060{value:02x}{}61fffff1",
            push_address(CHILD)
        )
    }

    #[test]
    fn test_reverting_child_propagates_output_and_keeps_parent_state() {
        let mut host = InMemoryHost::new();
        // SSTORE(0, 0x99) MSTORE8(0, 0xab) REVERT(0, 1)
        host.insert_account(CHILD, U256::ZERO, bytes("609960005560ab60005360016000fd"));

        // SSTORE(0, 1) CALL(.., ret 0x20..0x40) RETURNDATASIZE MLOAD(0x20)
        let code = format!("6001600055{}3d602051", call_child(0, 0x20, 0x20));
        let (result, stack) = run_parent(&mut host, Limits::default(), &code);

        assert!(result.is_success());
        assert_eq!(stack, vec![U256::ZERO, U256::from(1), U256::from(0xab) << 248]);
        assert_eq!(host.storage(PARENT, U256::ZERO), U256::from(1));
        assert_eq!(host.storage(CHILD, U256::ZERO), U256::ZERO);
    }

    #[test]
    fn test_successful_call_copies_output() {
        let mut host = InMemoryHost::new();
        // MSTORE(0, 42) RETURN(0, 32)
        host.insert_account(CHILD, U256::ZERO, bytes("602a60005260206000f3"));

        // CALL(.., ret 0..0x20) MLOAD(0) RETURNDATASIZE
        let code = format!("{}6000513d", call_child(0, 0, 0x20));
        let (result, stack) = run_parent(&mut host, Limits::default(), &code);

        assert!(result.is_success());
        assert_eq!(stack, vec![U256::from(1), U256::from(42), U256::from(32)]);
    }

    #[test]
    fn test_short_return_region_truncates_copy() {
        let mut host = InMemoryHost::new();
        host.insert_account(CHILD, U256::ZERO, bytes("602a60005260206000f3"));

        // CALL(.., ret 0..1) MLOAD(0)
        let code = format!("{}600051", call_child(0, 0, 1));
        let (_, stack) = run_parent(&mut host, Limits::default(), &code);

        // only the most significant byte of the word (zero) lands in memory
        assert_eq!(stack, vec![U256::from(1), U256::ZERO]);
    }

    #[test]
    fn test_call_transfers_value() {
        let mut host = InMemoryHost::new();
        host.insert_account(CHILD, U256::ZERO, bytes("00"));
        host.insert_account(PARENT, U256::from(100), Bytes::new());

        let (result, stack) = run_parent(&mut host, Limits::default(), &call_child(10, 0, 0));
        assert!(result.is_success());
        assert_eq!(stack, vec![U256::from(1)]);
        assert_eq!(host.balance(PARENT), U256::from(90));
        assert_eq!(host.balance(CHILD), U256::from(10));
    }

    #[test]
    fn test_child_sees_call_environment() {
        let mut host = InMemoryHost::new();
        host.insert_account(PARENT, U256::from(100), Bytes::new());
        // SSTORE(0, CALLER) SSTORE(1, CALLVALUE) SSTORE(2, ORIGIN)
        host.insert_account(CHILD, U256::ZERO, bytes("336000553460015532600255"));

        let (result, _) = run_parent(&mut host, Limits::default(), &call_child(7, 0, 0));
        assert!(result.is_success());
        assert_eq!(host.storage(CHILD, U256::ZERO), from_address(PARENT));
        assert_eq!(host.storage(CHILD, U256::from(1)), U256::from(7));
        assert_eq!(host.storage(CHILD, U256::from(2)), from_address(Address::repeat_byte(0xee)));
    }

    #[test]
    fn test_delegatecall_runs_in_caller_context() {
        let mut host = InMemoryHost::new();
        // SSTORE(0, CALLER)
        host.insert_account(CHILD, U256::ZERO, bytes("33600055"));

        // DELEGATECALL(0xffff, CHILD, args 0..0, ret 0..0)
        let code = format!("6000600060006000{}61fffff4", push_address(CHILD));
        let (result, stack) = run_parent(&mut host, Limits::default(), &code);

        assert!(result.is_success());
        assert_eq!(stack, vec![U256::from(1)]);
        assert_eq!(host.storage(PARENT, U256::ZERO), from_address(Address::repeat_byte(0xee)));
        assert_eq!(host.storage(CHILD, U256::ZERO), U256::ZERO);
    }

    #[test]
    fn test_staticcall_forbids_state_changes() {
        let mut host = InMemoryHost::new();
        // SSTORE(0, 1)
        host.insert_account(CHILD, U256::ZERO, bytes("6001600055"));

        // STATICCALL(0xffff, CHILD, args 0..0, ret 0..0) GAS
        let code = format!("6000600060006000{}61fffffa5a", push_address(CHILD));
        let (result, stack) = run_parent(&mut host, Limits::default(), &code);

        assert!(result.is_success());
        assert_eq!(stack[0], U256::ZERO);
        assert_eq!(host.storage(CHILD, U256::ZERO), U256::ZERO);

        // the failed child consumed everything it was given
        let remaining = stack[1].to::<u64>();
        assert!(5_000_000 - remaining > 0xffff);
    }

    #[test]
    fn test_call_depth_limit() {
        let mut host = InMemoryHost::new();
        // SSTORE(0, SLOAD(0) + 1) CALL(GAS, ADDRESS, 0, 0, 0, 0, 0) STOP
        let code = "60005460010160005560006000600060006000305af100";
        host.insert_account(PARENT, U256::ZERO, bytes(code));

        let limits = Limits { max_call_depth: 4, ..Default::default() };
        let (result, _) = run_parent(&mut host, limits, code);

        assert!(result.is_success());
        // depths 0 through 4 each ran once
        assert_eq!(host.storage(PARENT, U256::ZERO), U256::from(5));
    }

    #[test]
    fn test_create_deploys_runtime_code() {
        let mut host = InMemoryHost::new();
        let runtime = "602a60005260206000f3";
        // MSTORE(0, runtime) RETURN(22, 10)
        let init = format!("69{runtime}600052600a6016f3");

        // MSTORE(0, init) CREATE(0, 13, 19)
        let code = format!("72{init}6000526013600d6000f0");
        let (result, stack) = run_parent(&mut host, Limits::default(), &code);
        assert!(result.is_success());

        let expected = PARENT.create(0);
        assert_eq!(stack, vec![from_address(expected)]);

        let account = host.account(expected).expect("contract was not created");
        assert_eq!(account.code, bytes(runtime));
        assert_eq!(account.nonce, 1);
        assert_eq!(host.account(PARENT).map(|a| a.nonce), Some(1));

        // the deployed code runs
        let message = Message { bytecode: account.code.clone(), gas_limit: 100_000, ..Default::default() };
        let result = Executor::default().execute(&mut host, message);
        assert_eq!(U256::from_be_slice(result.output()), U256::from(42));
    }

    #[test]
    fn test_create2_address() {
        let mut host = InMemoryHost::new();
        let init = "69602a60005260206000f3600052600a6016f3";

        // MSTORE(0, init) CREATE2(0, 13, 19, salt 1)
        let code = format!("72{init}60005260016013600d6000f5");
        let (result, stack) = run_parent(&mut host, Limits::default(), &code);
        assert!(result.is_success());

        let salt = B256::from(U256::from(1).to_be_bytes::<32>());
        let expected = PARENT.create2(salt.0, keccak256(bytes(init)).0);
        assert_eq!(stack, vec![from_address(expected)]);
        assert!(host.account(expected).is_some_and(|a| !a.code.is_empty()));
    }

    #[test]
    fn test_reverting_init_code() {
        let mut host = InMemoryHost::new();
        // MSTORE8(0, 0xab) REVERT(0, 1)
        let init = "60ab60005360016000fd";

        // MSTORE(0, init) CREATE(0, 22, 10) RETURNDATASIZE
        let code = format!("69{init}600052600a60166000f03d");
        let (result, stack) = run_parent(&mut host, Limits::default(), &code);

        assert!(result.is_success());
        assert_eq!(stack, vec![U256::ZERO, U256::from(1)]);
        assert!(host.account(PARENT.create(0)).is_none());
        // the creator's nonce is still spent
        assert_eq!(host.account(PARENT).map(|a| a.nonce), Some(1));
    }

    #[test]
    fn test_runtime_code_starting_with_ef_is_rejected() {
        let mut host = InMemoryHost::new();
        // MSTORE8(0, 0xef) RETURN(0, 1)
        let init = "60ef60005360016000f3";

        let code = format!("69{init}600052600a60166000f0");
        let (result, stack) = run_parent(&mut host, Limits::default(), &code);

        assert!(result.is_success());
        assert_eq!(stack, vec![U256::ZERO]);
        assert!(host.account(PARENT.create(0)).is_none());
    }

    #[test]
    fn test_oversized_init_code_fails_the_creator() {
        let mut host = InMemoryHost::new();
        let limits = Limits { max_initcode_size: 8, ..Default::default() };

        // CREATE(0, 0, 9)
        let (result, _) = run_parent(&mut host, limits, "600960006000f0");
        assert_eq!(
            result.outcome,
            Outcome::Fail { reason: Error::CreateInitCodeSizeLimit, gas_remaining: 0 }
        );
    }

    #[test]
    fn test_failed_top_level_rolls_back() {
        let mut host = InMemoryHost::new();
        // SSTORE(0, 1) INVALID
        let (result, _) = run_parent(&mut host, Limits::default(), "6001600055fe");
        assert!(!result.is_success());
        assert_eq!(result.gas_refund, 0);
        assert_eq!(host.storage(PARENT, U256::ZERO), U256::ZERO);
    }

    #[test]
    fn test_child_refund_is_merged() {
        let mut host = InMemoryHost::new();
        host.insert_storage(CHILD, U256::ZERO, U256::from(1));
        // SSTORE(0, 0)
        host.insert_account(CHILD, U256::ZERO, bytes("6000600055"));

        let (result, _) = run_parent(&mut host, Limits::default(), &call_child(0, 0, 0));
        assert!(result.is_success());
        assert_eq!(result.gas_refund, 4800);
    }

    #[test]
    fn test_value_call_gas_returns_stipend_and_unused_gas() {
        let mut host = InMemoryHost::new();
        host.insert_account(CHILD, U256::ZERO, bytes("00"));
        host.insert_account(PARENT, U256::from(100), Bytes::new());

        let (result, _) = run_parent(&mut host, Limits::default(), &call_child(10, 0, 0));
        assert!(result.is_success());
        // pushes, cold CALL, value transfer, less the stipend the child left unused
        assert_eq!(result.gas_used, 21 + 2600 + 9000 - 2300);
    }

    #[test]
    fn test_reverting_child_gas() {
        let mut host = InMemoryHost::new();
        // REVERT(0, 0)
        host.insert_account(CHILD, U256::ZERO, bytes("60006000fd"));

        let (result, stack) = run_parent(&mut host, Limits::default(), &call_child(0, 0, 0));
        assert!(result.is_success());
        assert_eq!(stack, vec![U256::ZERO]);
        assert_eq!(result.gas_used, 21 + 2600 + 6);
    }

    #[test]
    fn test_failing_child_consumes_forwarded_gas() {
        let mut host = InMemoryHost::new();
        host.insert_account(CHILD, U256::ZERO, bytes("fe"));

        let (result, stack) = run_parent(&mut host, Limits::default(), &call_child(0, 0, 0));
        assert!(result.is_success());
        assert_eq!(stack, vec![U256::ZERO]);
        assert_eq!(result.gas_used, 21 + 2600 + 0xffff);
    }

    #[test]
    fn test_forwarded_gas_is_capped_at_63_64ths() {
        let mut host = InMemoryHost::new();
        host.insert_account(CHILD, U256::ZERO, bytes("fe"));
        // the 0xffff gas operand is more than the parent can give
        let message = Message {
            bytecode: bytes(&call_child(0, 0, 0)),
            gas_limit: 10_000,
            address: PARENT,
            ..Default::default()
        };
        let result = Executor::default().execute(&mut host, message);
        assert!(result.is_success());

        let remaining = 10_000 - 21 - 2600;
        assert_eq!(result.gas_used, 10_000 - remaining / 64);
    }

    #[test]
    fn test_unaffordable_value_call_returns_stipend() {
        let mut host = InMemoryHost::new();
        let target = Address::repeat_byte(0xbb);

        // CALL(0xffff, target, 1, 0, 0, 0, 0) from an account with no balance
        let code = format!("60006000600060006001{}61fffff1", push_address(target));
        let (result, stack) = run_parent(&mut host, Limits::default(), &code);

        assert!(result.is_success());
        assert_eq!(stack, vec![U256::ZERO]);
        // pushes, cold CALL, value transfer, new account, less the returned stipend
        assert_eq!(result.gas_used, 21 + 2600 + 9000 + 25000 - 2300);
        assert!(host.account(target).is_none());
    }

    #[test]
    fn test_value_call_past_depth_limit_returns_stipend() {
        let mut host = InMemoryHost::new();
        host.insert_account(CHILD, U256::ZERO, bytes("00"));
        host.insert_account(PARENT, U256::from(100), Bytes::new());

        let limits = Limits { max_call_depth: 0, ..Default::default() };
        let (result, stack) = run_parent(&mut host, limits, &call_child(10, 0, 0));

        assert!(result.is_success());
        assert_eq!(stack, vec![U256::ZERO]);
        assert_eq!(result.gas_used, 21 + 2600 + 9000 - 2300);
        assert_eq!(host.balance(PARENT), U256::from(100));
    }

    #[test]
    fn test_create_collides_with_existing_storage() {
        let mut host = InMemoryHost::new();
        let target = PARENT.create(0);
        host.insert_storage(target, U256::ZERO, U256::from(1));

        // CREATE(0, 0, 0)
        let (result, stack) = run_parent(&mut host, Limits::default(), "600060006000f0");
        assert!(result.is_success());
        assert_eq!(stack, vec![U256::ZERO]);
        assert!(host.account(target).is_none());
    }
}
