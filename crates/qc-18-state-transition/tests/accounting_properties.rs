//! # Gas Accounting Properties (qc-18)
//!
//! Property tests over the gas schedule and full transitions:
//!
//! 1. **Refund cap** - refund is exactly `min(gas_used / 2, counter)`
//! 2. **Overflow guard** - intrinsic gas never wraps
//! 3. **Gas conservation** - every bought unit is used or returned
//! 4. **Determinism** - equal inputs give equal outputs and states
//! 5. **Nonce monotonicity** - +1 on success, unchanged on mismatch

use proptest::prelude::*;
use qc_18_state_transition::prelude::*;

const SENDER: Address = Address::new([0x5E; 20]);
const TARGET: Address = Address::new([0xC0; 20]);
const MINER: Address = Address::new([0xEE; 20]);
const BLOCK_GAS: u64 = 30_000_000;

fn make_engine(call_cost: u64, refund: u64) -> TransferEngine {
    let block = BlockContext {
        coinbase: MINER,
        ..BlockContext::default()
    };
    TransferEngine::new(ChainConfig::default(), block)
        .with_call_cost(call_cost)
        .with_refund_per_call(refund)
}

fn reference_intrinsic(schedule: &GasSchedule, data: &[u8]) -> u128 {
    let non_zero = data.iter().filter(|b| **b != 0).count() as u128;
    let zero = data.len() as u128 - non_zero;
    u128::from(schedule.tx_gas)
        + non_zero * u128::from(schedule.tx_data_non_zero_gas)
        + zero * u128::from(schedule.tx_data_zero_gas)
}

proptest! {
    #[test]
    fn test_refund_is_capped(gas_used in any::<u64>(), counter in any::<u64>()) {
        let refund = calculate_refund(gas_used, counter);
        prop_assert_eq!(refund, std::cmp::min(gas_used / 2, counter));
        prop_assert!(refund <= gas_used / 2);
        prop_assert!(refund <= counter);
    }

    #[test]
    fn test_intrinsic_gas_never_wraps(
        data in prop::collection::vec(any::<u8>(), 0..64),
        non_zero_cost in any::<u64>(),
        zero_cost in any::<u64>(),
        base in any::<u64>(),
    ) {
        let schedule = GasSchedule {
            tx_gas: base,
            tx_data_non_zero_gas: non_zero_cost,
            tx_data_zero_gas: zero_cost,
            ..GasSchedule::default()
        };
        let expected = reference_intrinsic(&schedule, &data);

        match schedule.intrinsic_gas(&data, false, true) {
            Ok(gas) => prop_assert_eq!(u128::from(gas), expected),
            Err(err) => {
                prop_assert_eq!(err, ConsensusError::OutOfGas);
                prop_assert!(expected > u128::from(u64::MAX));
            }
        }
    }

    #[test]
    fn test_gas_is_conserved(
        gas_limit in 21_000u64..1_000_000,
        call_cost in 0u64..1_200_000,
        refund in 0u64..500_000,
        price in 1u64..1_000,
    ) {
        let mut state = InMemoryWorldState::new();
        let funds = U256::from(gas_limit) * U256::from(price);
        state.set_balance(SENDER, funds);
        let mut engine = make_engine(call_cost, refund);
        let mut pool = GasPool::new(BLOCK_GAS);
        let msg = Message::call(SENDER, TARGET, 0, gas_limit, U256::from(price)).into();

        let outcome = apply_message(
            &mut engine,
            &mut state,
            &msg,
            &mut pool,
            None,
            TransitionConfig::default(),
        )
        .unwrap();

        prop_assert!(outcome.gas_used <= gas_limit);
        prop_assert_eq!(BLOCK_GAS - pool.gas(), outcome.gas_used);
        prop_assert_eq!(
            funds - state.get_balance(SENDER),
            U256::from(outcome.gas_used) * U256::from(price)
        );
    }

    #[test]
    fn test_transition_is_deterministic(
        gas_limit in 21_000u64..200_000,
        data in prop::collection::vec(any::<u8>(), 0..32),
        value in 0u64..10_000,
        fail in any::<bool>(),
    ) {
        let mut initial = InMemoryWorldState::new();
        initial.set_balance(SENDER, U256::from(10_000_000));
        let msg: TransitionMessage = Message::call(SENDER, TARGET, 0, gas_limit, U256::one())
            .with_value(U256::from(value))
            .with_data(data)
            .into();

        let run = || {
            let mut state = initial.clone();
            let mut engine = make_engine(700, 100);
            if fail {
                engine = engine.failing_with(EngineError::Revert(String::new()));
            }
            let mut pool = GasPool::new(BLOCK_GAS);
            let result = apply_message(
                &mut engine,
                &mut state,
                &msg,
                &mut pool,
                None,
                TransitionConfig::default(),
            );
            (result, state, pool)
        };

        let (first, first_state, first_pool) = run();
        let (second, second_state, second_pool) = run();
        prop_assert_eq!(first, second);
        prop_assert_eq!(first_state, second_state);
        prop_assert_eq!(first_pool, second_pool);
    }

    #[test]
    fn test_nonce_monotonic(state_nonce in 0u64..1_000, msg_nonce in 0u64..1_000) {
        let mut state = InMemoryWorldState::new();
        state.set_balance(SENDER, U256::from(1_000_000));
        state.set_nonce(SENDER, state_nonce);
        let mut engine = make_engine(700, 0);
        let mut pool = GasPool::new(BLOCK_GAS);
        let msg = Message::call(SENDER, TARGET, msg_nonce, 50_000, U256::one()).into();

        let result = apply_message(
            &mut engine,
            &mut state,
            &msg,
            &mut pool,
            None,
            TransitionConfig::default(),
        );

        if state_nonce == msg_nonce {
            prop_assert!(result.is_ok());
            prop_assert_eq!(state.get_nonce(SENDER), state_nonce + 1);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(state.get_nonce(SENDER), state_nonce);
        }
    }
}
