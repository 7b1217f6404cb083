//! # State Transition Service
//!
//! Node-level entry point. Holds the configuration and the private transport
//! shared by every transition, applies messages in block order and keeps
//! execution statistics.

use crate::adapters::private_store::{load_private_transport, PRIVATE_CONFIG_ENV};
use crate::config::TransitionConfig;
use crate::domain::entities::{ExecutionOutcome, TransitionMessage};
use crate::errors::{ConfigError, ConsensusError};
use crate::ports::outbound::{
    BlockGasPool, ExecutionEngine, PrivateTransactionManager, WorldState,
};
use crate::transition::StateTransition;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Statistics for the State Transition Service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Messages executed without engine error.
    pub applied: u64,
    /// Messages executed with an engine error (revert, out of gas, ...).
    pub reverted: u64,
    /// Messages rejected with a consensus error.
    pub rejected: u64,
    /// Private messages executed (subset of `applied` + `reverted`).
    pub private_applied: u64,
    /// Total gas reported by executed messages.
    pub total_gas_used: u64,
}

/// Result of applying a batch of messages.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Outcomes of the messages applied before the batch stopped.
    pub outcomes: Vec<ExecutionOutcome>,
    /// Index and error of the message that stopped the batch.
    pub rejection: Option<(usize, ConsensusError)>,
}

impl BatchOutcome {
    /// Returns true if every message of the batch was applied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Applies messages with a shared configuration and private transport.
pub struct StateTransitionService {
    config: TransitionConfig,
    private_tx: Option<Arc<dyn PrivateTransactionManager>>,
    stats: RwLock<ServiceStats>,
}

impl StateTransitionService {
    /// Create a service without a private transport.
    #[must_use]
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            private_tx: None,
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    /// Sets the private transport used to resolve private payloads.
    #[must_use]
    pub fn with_private_transport(mut self, private_tx: Arc<dyn PrivateTransactionManager>) -> Self {
        self.private_tx = Some(private_tx);
        self
    }

    /// Create a service from the environment.
    ///
    /// The configuration comes from [`TransitionConfig::from_env`]; the
    /// private transport from `cli_private_config` or, if absent, the
    /// `PRIVATE_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns error if a named config file cannot be loaded.
    pub fn from_env(cli_private_config: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let config = TransitionConfig::from_env()?;
        let mut service = Self::new(config);
        if let Some(store) = load_private_transport(cli_private_config, PRIVATE_CONFIG_ENV)? {
            service = service.with_private_transport(Arc::new(store));
        }
        info!(
            privacy_protocol = config.privacy_protocol,
            private_transport = service.private_tx.is_some(),
            "State transition service configured"
        );
        Ok(service)
    }

    /// Service configuration.
    #[must_use]
    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Get current service statistics.
    #[must_use]
    pub fn stats(&self) -> ServiceStats {
        self.stats.read().clone()
    }

    /// Applies one message and records it in the statistics.
    ///
    /// The refund counter of `state` is cleared first.
    ///
    /// # Errors
    ///
    /// Any [`ConsensusError`]; the message must then be rejected.
    pub fn apply_message<S, E, G>(
        &self,
        engine: &mut E,
        state: &mut S,
        msg: &TransitionMessage,
        gas_pool: &mut G,
    ) -> Result<ExecutionOutcome, ConsensusError>
    where
        S: WorldState,
        E: ExecutionEngine<S>,
        G: BlockGasPool,
    {
        state.reset_refund();

        let transition =
            StateTransition::new(engine, state, msg, gas_pool).with_config(self.config);
        let result = match self.private_tx.as_deref() {
            Some(private_tx) => transition.with_private_transport(private_tx).transition(),
            None => transition.transition(),
        };

        let mut stats = self.stats.write();
        match &result {
            Ok(outcome) => {
                if outcome.failed() {
                    stats.reverted += 1;
                } else {
                    stats.applied += 1;
                }
                if msg.is_private() && self.config.privacy_protocol {
                    stats.private_applied += 1;
                }
                stats.total_gas_used = stats.total_gas_used.saturating_add(outcome.gas_used);
            }
            Err(_) => stats.rejected += 1,
        }
        result
    }

    /// Applies `messages` in order against one gas pool.
    ///
    /// Stops at the first consensus error. Messages after it are not touched.
    #[instrument(skip_all, fields(messages = messages.len()))]
    pub fn apply_messages<S, E, G>(
        &self,
        engine: &mut E,
        state: &mut S,
        messages: &[TransitionMessage],
        gas_pool: &mut G,
    ) -> BatchOutcome
    where
        S: WorldState,
        E: ExecutionEngine<S>,
        G: BlockGasPool,
    {
        let mut batch = BatchOutcome::default();
        for (index, msg) in messages.iter().enumerate() {
            match self.apply_message(engine, state, msg, gas_pool) {
                Ok(outcome) => batch.outcomes.push(outcome),
                Err(err) => {
                    warn!(index, %err, "Batch stopped at rejected message");
                    batch.rejection = Some((index, err));
                    break;
                }
            }
        }
        debug!(
            applied = batch.outcomes.len(),
            pool_left = gas_pool.gas(),
            "Batch finished"
        );
        batch
    }
}

impl Default for StateTransitionService {
    fn default() -> Self {
        Self::new(TransitionConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{GasPool, InMemoryPrivateStore, InMemoryWorldState, TransferEngine};
    use crate::domain::entities::{BlockContext, ChainConfig, Message};
    use crate::domain::value_objects::{Address, U256};
    use crate::errors::EngineError;

    const ALICE: Address = Address::new([0xA1; 20]);
    const BOB: Address = Address::new([0xB0; 20]);

    fn funded_state() -> InMemoryWorldState {
        let mut state = InMemoryWorldState::new();
        state.set_balance(ALICE, U256::from(10_000_000));
        state
    }

    fn engine() -> TransferEngine {
        TransferEngine::new(ChainConfig::default(), BlockContext::default())
    }

    #[test]
    fn test_stats_track_outcomes() {
        let service = StateTransitionService::default();
        let mut state = funded_state();
        let mut pool = GasPool::new(10_000_000);

        let ok = Message::call(ALICE, BOB, 0, 50_000, U256::one()).into();
        service
            .apply_message(&mut engine(), &mut state, &ok, &mut pool)
            .unwrap();

        let reverted = Message::call(ALICE, BOB, 1, 50_000, U256::one()).into();
        let mut failing = engine().failing_with(EngineError::Revert(String::new()));
        let outcome = service
            .apply_message(&mut failing, &mut state, &reverted, &mut pool)
            .unwrap();
        assert!(outcome.failed());

        let stale = Message::call(ALICE, BOB, 0, 50_000, U256::one()).into();
        assert!(service
            .apply_message(&mut engine(), &mut state, &stale, &mut pool)
            .is_err());

        let stats = service.stats();
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.reverted, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.total_gas_used, 2 * (21_000 + 700));
    }

    #[test]
    fn test_refund_counter_cleared_between_messages() {
        let service = StateTransitionService::default();
        let mut state = funded_state();
        state.add_refund(1_000_000);
        let mut pool = GasPool::new(10_000_000);

        let msg = Message::call(ALICE, BOB, 0, 50_000, U256::one()).into();
        let outcome = service
            .apply_message(&mut engine(), &mut state, &msg, &mut pool)
            .unwrap();
        assert_eq!(outcome.gas_used, 21_700);
    }

    #[test]
    fn test_batch_stops_at_first_rejection() {
        let service = StateTransitionService::default();
        let mut state = funded_state();
        let mut pool = GasPool::new(10_000_000);
        let mut engine = engine();

        let messages: Vec<TransitionMessage> = vec![
            Message::call(ALICE, BOB, 0, 30_000, U256::one()).into(),
            Message::call(ALICE, BOB, 1, 30_000, U256::one()).into(),
            Message::call(ALICE, BOB, 5, 30_000, U256::one()).into(),
            Message::call(ALICE, BOB, 2, 30_000, U256::one()).into(),
        ];

        let batch = service.apply_messages(&mut engine, &mut state, &messages, &mut pool);
        assert!(!batch.is_complete());
        assert_eq!(batch.outcomes.len(), 2);
        assert_eq!(
            batch.rejection,
            Some((
                2,
                ConsensusError::NonceTooHigh {
                    state: 2,
                    message: 5
                }
            ))
        );
        assert_eq!(state.get_nonce(ALICE), 2);
        assert_eq!(engine.invocations(), 2);
    }

    #[test]
    fn test_private_messages_counted() {
        let store = Arc::new(InMemoryPrivateStore::new());
        let reference = store.send(&[0x01], "alice", &[]).unwrap();
        let service = StateTransitionService::default().with_private_transport(store);
        let mut state = funded_state();
        let mut pool = GasPool::new(10_000_000);

        let msg = TransitionMessage::Private(
            Message::call(ALICE, BOB, 0, 50_000, U256::one()).with_data(reference),
        );
        let outcome = service
            .apply_message(&mut engine(), &mut state, &msg, &mut pool)
            .unwrap();

        assert_eq!(outcome.gas_used, 0);
        assert_eq!(service.stats().private_applied, 1);
        assert_eq!(service.stats().applied, 1);
    }
}
