//! # State Transition
//!
//! Applies one message to the world state:
//!
//! 1. Pre-check: touch the sender, validate the nonce, buy gas
//! 2. Resolve the payload (private messages fetch it from the transport)
//! 3. Charge intrinsic gas on the resolved payload
//! 4. Dispatch to the engine (create or call)
//! 5. Settle: refund, return unused gas, pay the coinbase
//!
//! A [`StateTransition`] lives for exactly one message. The world state, the
//! engine and the gas pool are borrowed from the caller, which must apply the
//! messages of a block sequentially and in order.
//!
//! Once gas has been bought the transition runs to completion. Early returns
//! after the purchase are consensus errors, which invalidate the enclosing
//! block anyway. The one exception is a private call this node is not a party
//! to: it returns the whole purchase to the sender and the pool.

mod privacy;
mod settlement;

pub use privacy::ResolvedPayload;

use crate::config::TransitionConfig;
use crate::domain::entities::{ExecutionOutcome, Message, TransitionMessage};
use crate::domain::value_objects::{Address, U256};
use crate::errors::ConsensusError;
use crate::ports::outbound::{
    BlockGasPool, ExecutionEngine, PrivateTransactionManager, WorldState,
};
use tracing::{debug, instrument, warn};

/// Per-message transition context.
pub struct StateTransition<'a, S, E, G>
where
    S: WorldState,
    E: ExecutionEngine<S>,
    G: BlockGasPool,
{
    gas_pool: &'a mut G,
    msg: &'a TransitionMessage,
    gas: u64,
    initial_gas: u64,
    gas_price: U256,
    value: U256,
    data: &'a [u8],
    state: &'a mut S,
    engine: &'a mut E,
    private_tx: Option<&'a dyn PrivateTransactionManager>,
    config: TransitionConfig,
}

impl<'a, S, E, G> StateTransition<'a, S, E, G>
where
    S: WorldState,
    E: ExecutionEngine<S>,
    G: BlockGasPool,
{
    /// Creates a transition of `msg` with the default configuration and no
    /// private transport.
    pub fn new(
        engine: &'a mut E,
        state: &'a mut S,
        msg: &'a TransitionMessage,
        gas_pool: &'a mut G,
    ) -> Self {
        let message = msg.message();
        Self {
            gas_pool,
            msg,
            gas: 0,
            initial_gas: 0,
            gas_price: message.gas_price,
            value: message.value,
            data: message.data.as_slice(),
            state,
            engine,
            private_tx: None,
            config: TransitionConfig::default(),
        }
    }

    /// Uses `private_tx` to resolve private payloads.
    #[must_use]
    pub fn with_private_transport(mut self, private_tx: &'a dyn PrivateTransactionManager) -> Self {
        self.private_tx = Some(private_tx);
        self
    }

    /// Overrides the configuration.
    #[must_use]
    pub fn with_config(mut self, config: TransitionConfig) -> Self {
        self.config = config;
        self
    }

    /// Remaining gas.
    #[must_use]
    pub fn gas(&self) -> u64 {
        self.gas
    }

    /// Gas bought by the pre-check.
    #[must_use]
    pub fn initial_gas(&self) -> u64 {
        self.initial_gas
    }

    /// Gas consumed so far.
    #[must_use]
    pub fn gas_used(&self) -> u64 {
        self.initial_gas - self.gas
    }

    fn message(&self) -> &'a Message {
        self.msg.message()
    }

    /// Returns the sender, creating its account if it does not exist yet.
    fn sender(&mut self) -> Address {
        let from = self.message().from;
        self.state.touch(from);
        from
    }

    fn use_gas(&mut self, amount: u64) -> Result<(), ConsensusError> {
        if self.gas < amount {
            return Err(ConsensusError::OutOfGas);
        }
        self.gas -= amount;
        Ok(())
    }

    /// Debits `gas * gas_price` from the sender and `gas` from the block pool.
    ///
    /// Both debits happen or neither does.
    fn buy_gas(&mut self) -> Result<(), ConsensusError> {
        let msg = self.message();
        let available = self.state.get_balance(msg.from);
        let cost = match U256::from(msg.gas).checked_mul(self.gas_price) {
            Some(cost) if cost <= available => cost,
            other => {
                return Err(ConsensusError::InsufficientBalanceForGas {
                    required: other.unwrap_or(U256::MAX),
                    available,
                })
            }
        };

        self.gas_pool.sub_gas(msg.gas)?;
        self.gas += msg.gas;
        self.initial_gas = msg.gas;
        self.state.sub_balance(msg.from, cost);
        Ok(())
    }

    /// Touches the sender, validates the nonce and buys gas.
    ///
    /// # Errors
    ///
    /// - `NonceTooHigh` / `NonceTooLow` on a nonce mismatch (when checked)
    /// - `NonceMax` if the sender nonce is already `u64::MAX`
    /// - `InsufficientBalanceForGas` if the sender cannot prepay the gas
    /// - `GasPool` if the block has not enough gas left
    pub fn pre_check(&mut self) -> Result<(), ConsensusError> {
        let msg = self.message();
        let sender = self.sender();
        let nonce = self.state.get_nonce(sender);

        if msg.check_nonce {
            if nonce < msg.nonce {
                return Err(ConsensusError::NonceTooHigh {
                    state: nonce,
                    message: msg.nonce,
                });
            } else if nonce > msg.nonce {
                return Err(ConsensusError::NonceTooLow {
                    state: nonce,
                    message: msg.nonce,
                });
            }
        }
        // Every applied message consumes a nonce.
        if nonce == u64::MAX {
            return Err(ConsensusError::NonceMax { nonce });
        }
        self.buy_gas()
    }

    /// Applies the message.
    ///
    /// Returns the execution outcome, or a consensus error if the message is
    /// invalid for the current state. Private messages always report zero gas
    /// used.
    ///
    /// # Errors
    ///
    /// Any [`ConsensusError`]; the message must then be rejected.
    #[instrument(
        name = "transition",
        skip(self),
        fields(from = %self.message().from, private = self.msg.is_private())
    )]
    pub fn transition(mut self) -> Result<ExecutionOutcome, ConsensusError> {
        if let Err(err) = self.pre_check() {
            warn!(%err, "Pre-check rejected message");
            return Err(err);
        }

        let msg = self.message();
        let sender = self.sender();
        let block_number = self.engine.block_context().number;
        let homestead = self.engine.chain_config().is_homestead(block_number);
        let contract_creation = msg.is_contract_creation();

        let ResolvedPayload { data, is_private } =
            self.resolve_payload(sender, contract_creation)?;

        let intrinsic = self
            .config
            .gas_schedule
            .intrinsic_gas(&data, contract_creation, homestead)
            .inspect_err(|err| warn!(%err, "Intrinsic gas overflow"))?;
        if let Err(err) = self.use_gas(intrinsic) {
            warn!(intrinsic, gas = self.gas, "Gas limit below intrinsic gas");
            return Err(err);
        }
        debug!(intrinsic, gas = self.gas, homestead, "Intrinsic gas paid");

        let (return_data, vm_error) = match msg.to {
            None => {
                debug!(%sender, private = is_private, "Dispatching create");
                let outcome =
                    self.engine
                        .create(self.state, sender, &data, self.gas, self.value);
                self.gas = outcome.gas_left;
                (outcome.output, outcome.error)
            }
            Some(to) => {
                // Private calls already bumped the nonce during resolution.
                if !is_private {
                    self.state.increment_nonce(sender);
                }
                if is_private && data.is_empty() {
                    debug!(%to, "Empty private payload, node is not a party");
                    self.return_purchased_gas(sender);
                    return Ok(ExecutionOutcome::empty());
                }

                debug!(%sender, %to, private = is_private, "Dispatching call");
                let outcome =
                    self.engine
                        .call(self.state, sender, to, &data, self.gas, self.value);
                self.gas = outcome.gas_left;
                (outcome.output, outcome.error)
            }
        };

        if let Some(err) = &vm_error {
            warn!(%err, gas_left = self.gas, "Engine returned with error");
            if err.is_consensus() {
                return Err(ConsensusError::InsufficientBalanceForTransfer);
            }
        }

        self.settle(sender);

        let gas_used = if is_private { 0 } else { self.gas_used() };
        debug!(gas_used, failed = vm_error.is_some(), "Transition complete");
        Ok(ExecutionOutcome {
            return_data,
            gas_used,
            vm_error,
        })
    }
}

/// Applies `msg` against `state` with `engine`, debiting `gas_pool`.
///
/// # Errors
///
/// Any [`ConsensusError`]; the message must then be rejected.
pub fn apply_message<S, E, G>(
    engine: &mut E,
    state: &mut S,
    msg: &TransitionMessage,
    gas_pool: &mut G,
    private_tx: Option<&dyn PrivateTransactionManager>,
    config: TransitionConfig,
) -> Result<ExecutionOutcome, ConsensusError>
where
    S: WorldState,
    E: ExecutionEngine<S>,
    G: BlockGasPool,
{
    let transition = StateTransition::new(engine, state, msg, gas_pool).with_config(config);
    match private_tx {
        Some(private_tx) => transition.with_private_transport(private_tx).transition(),
        None => transition.transition(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
