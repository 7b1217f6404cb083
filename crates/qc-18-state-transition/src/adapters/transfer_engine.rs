//! # Transfer Engine
//!
//! Execution engine without an interpreter: creations deploy the init code
//! verbatim as contract code, calls only move value. Gas is charged as a
//! flat cost per operation.
//!
//! Suitable for value-transfer chains, simulations and tests. Failures can be
//! scripted to exercise revert and out-of-gas handling.

use crate::adapters::state_adapter::InMemoryWorldState;
use crate::domain::entities::{BlockContext, CallOutcome, ChainConfig, CreateOutcome};
use crate::domain::services::compute_contract_address;
use crate::domain::value_objects::{Address, Bytes, U256};
use crate::errors::EngineError;
use crate::ports::outbound::{ExecutionEngine, WorldState};
use tracing::debug;

/// Default flat gas charged by a call.
pub const DEFAULT_CALL_COST: u64 = 700;

/// Default flat gas charged by a creation.
pub const DEFAULT_CREATE_COST: u64 = 32_000;

/// Flat-cost engine that moves value and deploys code.
#[derive(Clone, Debug)]
pub struct TransferEngine {
    chain_config: ChainConfig,
    block: BlockContext,
    call_cost: u64,
    create_cost: u64,
    refund_per_call: u64,
    output: Bytes,
    scripted_error: Option<EngineError>,
    invocations: usize,
}

impl TransferEngine {
    /// Create an engine for `block` on a chain with `chain_config`.
    #[must_use]
    pub fn new(chain_config: ChainConfig, block: BlockContext) -> Self {
        Self {
            chain_config,
            block,
            call_cost: DEFAULT_CALL_COST,
            create_cost: DEFAULT_CREATE_COST,
            refund_per_call: 0,
            output: Bytes::new(),
            scripted_error: None,
            invocations: 0,
        }
    }

    /// Sets the flat call cost.
    #[must_use]
    pub fn with_call_cost(mut self, cost: u64) -> Self {
        self.call_cost = cost;
        self
    }

    /// Sets the flat creation cost.
    #[must_use]
    pub fn with_create_cost(mut self, cost: u64) -> Self {
        self.create_cost = cost;
        self
    }

    /// Adds `refund` to the refund counter on every successful call.
    #[must_use]
    pub fn with_refund_per_call(mut self, refund: u64) -> Self {
        self.refund_per_call = refund;
        self
    }

    /// Return data of successful calls.
    #[must_use]
    pub fn with_output(mut self, output: Bytes) -> Self {
        self.output = output;
        self
    }

    /// Makes every execution fail with `error` after the balance check.
    #[must_use]
    pub fn failing_with(mut self, error: EngineError) -> Self {
        self.scripted_error = Some(error);
        self
    }

    /// Number of create/call invocations so far.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Gas left after a failed execution: a revert keeps the unused gas,
    /// every other error consumes all of it.
    fn gas_left_after(error: &EngineError, gas: u64, cost: u64) -> u64 {
        match error {
            EngineError::Revert(_) => gas - cost,
            _ => 0,
        }
    }
}

impl ExecutionEngine<InMemoryWorldState> for TransferEngine {
    fn chain_config(&self) -> &ChainConfig {
        &self.chain_config
    }

    fn block_context(&self) -> &BlockContext {
        &self.block
    }

    fn create(
        &mut self,
        state: &mut InMemoryWorldState,
        caller: Address,
        code: &[u8],
        gas: u64,
        value: U256,
    ) -> CreateOutcome {
        self.invocations += 1;

        if state.get_balance(caller) < value {
            return CreateOutcome {
                gas_left: gas,
                error: Some(EngineError::InsufficientBalance),
                ..CreateOutcome::default()
            };
        }

        let nonce = state.get_nonce(caller);
        state.increment_nonce(caller);
        let address = compute_contract_address(caller, nonce);

        let collision = state
            .account(address)
            .is_some_and(|account| account.nonce != 0 || !account.code.is_empty());
        if collision {
            return CreateOutcome {
                address,
                error: Some(EngineError::ContractAddressCollision),
                ..CreateOutcome::default()
            };
        }

        if gas < self.create_cost {
            return CreateOutcome {
                address,
                error: Some(EngineError::OutOfGas),
                ..CreateOutcome::default()
            };
        }

        if let Some(error) = self.scripted_error.clone() {
            return CreateOutcome {
                address,
                gas_left: Self::gas_left_after(&error, gas, self.create_cost),
                error: Some(error),
                ..CreateOutcome::default()
            };
        }

        // Value sent to the address ahead of the deployment stays there.
        state.touch(address);
        state.sub_balance(caller, value);
        state.add_balance(address, value);
        state.set_code(address, Bytes::from_slice(code));

        debug!(%caller, %address, code_len = code.len(), "Contract deployed");
        CreateOutcome {
            output: Bytes::from_slice(code),
            address,
            gas_left: gas - self.create_cost,
            error: None,
        }
    }

    fn call(
        &mut self,
        state: &mut InMemoryWorldState,
        caller: Address,
        to: Address,
        input: &[u8],
        gas: u64,
        value: U256,
    ) -> CallOutcome {
        self.invocations += 1;

        if state.get_balance(caller) < value {
            return CallOutcome {
                gas_left: gas,
                error: Some(EngineError::InsufficientBalance),
                ..CallOutcome::default()
            };
        }

        if gas < self.call_cost {
            return CallOutcome {
                error: Some(EngineError::OutOfGas),
                ..CallOutcome::default()
            };
        }

        if let Some(error) = self.scripted_error.clone() {
            return CallOutcome {
                gas_left: Self::gas_left_after(&error, gas, self.call_cost),
                error: Some(error),
                ..CallOutcome::default()
            };
        }

        state.touch(to);
        state.sub_balance(caller, value);
        state.add_balance(to, value);
        state.add_refund(self.refund_per_call);

        debug!(%caller, %to, input_len = input.len(), "Call executed");
        CallOutcome {
            output: self.output.clone(),
            gas_left: gas - self.call_cost,
            error: None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
