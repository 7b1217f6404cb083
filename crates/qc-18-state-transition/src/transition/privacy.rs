//! Private payload resolution.
//!
//! A private message carries a reference in its data field. The payload is
//! fetched from the private transport before intrinsic gas is charged, so a
//! private message pays for the payload it actually executes.

use super::StateTransition;
use crate::domain::value_objects::Address;
use crate::errors::{ConsensusError, PrivateTxError};
use crate::ports::outbound::{BlockGasPool, ExecutionEngine, WorldState};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Payload a message executes with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPayload<'a> {
    /// Call input or init code.
    pub data: Cow<'a, [u8]>,
    /// True if the payload came from the private transport.
    pub is_private: bool,
}

impl<'a, S, E, G> StateTransition<'a, S, E, G>
where
    S: WorldState,
    E: ExecutionEngine<S>,
    G: BlockGasPool,
{
    /// Resolves the payload of the message.
    ///
    /// Public messages (and every message when the privacy protocol is off)
    /// use their data as is. Private messages fetch the payload by reference.
    ///
    /// Private messages increment the sender nonce here unless they create a
    /// contract, in which case the engine does it. A failed fetch always
    /// increments the nonce before the error is returned.
    ///
    /// # Errors
    ///
    /// `PrivateTransport` if the payload cannot be fetched or no transport is
    /// configured.
    pub fn resolve_payload(
        &mut self,
        sender: Address,
        contract_creation: bool,
    ) -> Result<ResolvedPayload<'a>, ConsensusError> {
        if !self.msg.is_private() || !self.config.privacy_protocol {
            return Ok(ResolvedPayload {
                data: Cow::Borrowed(self.data),
                is_private: false,
            });
        }

        let fetched = match self.private_tx {
            Some(private_tx) => private_tx.receive(self.data),
            None => Err(PrivateTxError::NotConfigured),
        };

        if fetched.is_err() || !contract_creation {
            self.state.increment_nonce(sender);
        }

        match fetched {
            Ok(payload) => {
                debug!(%sender, payload_len = payload.len(), "Resolved private payload");
                Ok(ResolvedPayload {
                    data: Cow::Owned(payload.into_vec()),
                    is_private: true,
                })
            }
            Err(err) => {
                warn!(%sender, %err, "Private payload fetch failed");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{GasPool, InMemoryPrivateStore, InMemoryWorldState, TransferEngine};
    use crate::config::TransitionConfig;
    use crate::domain::entities::{BlockContext, ChainConfig, Message, TransitionMessage};
    use crate::domain::value_objects::{Bytes, U256};
    use crate::ports::outbound::PrivateTransactionManager;

    const ALICE: Address = Address::new([0xA1; 20]);
    const BOB: Address = Address::new([0xB0; 20]);

    struct Fixture {
        state: InMemoryWorldState,
        engine: TransferEngine,
        pool: GasPool,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                state: InMemoryWorldState::new(),
                engine: TransferEngine::new(ChainConfig::default(), BlockContext::default()),
                pool: GasPool::new(1_000_000),
            }
        }

        fn resolve(
            &mut self,
            msg: &TransitionMessage,
            store: Option<&dyn PrivateTransactionManager>,
            config: TransitionConfig,
        ) -> Result<(Vec<u8>, bool), ConsensusError> {
            let mut st = StateTransition::new(&mut self.engine, &mut self.state, msg, &mut self.pool)
                .with_config(config);
            if let Some(store) = store {
                st = st.with_private_transport(store);
            }
            let creation = msg.message().is_contract_creation();
            st.resolve_payload(ALICE, creation)
                .map(|resolved| (resolved.data.into_owned(), resolved.is_private))
        }
    }

    #[test]
    fn test_public_message_borrows_data() {
        let mut fixture = Fixture::new();
        let msg = Message::call(ALICE, BOB, 0, 50_000, U256::one())
            .with_data(vec![1, 2, 3])
            .into();

        let (data, private) = fixture
            .resolve(&msg, None, TransitionConfig::default())
            .unwrap();
        assert_eq!(data, vec![1, 2, 3]);
        assert!(!private);
        assert_eq!(fixture.state.get_nonce(ALICE), 0);
    }

    #[test]
    fn test_private_call_fetches_and_bumps_nonce() {
        let store = InMemoryPrivateStore::new();
        let reference = store.send(&[0xCA, 0xFE], "alice", &[]).unwrap();
        let mut fixture = Fixture::new();
        let msg = TransitionMessage::Private(
            Message::call(ALICE, BOB, 0, 50_000, U256::one()).with_data(reference),
        );

        let (data, private) = fixture
            .resolve(&msg, Some(&store), TransitionConfig::default())
            .unwrap();
        assert_eq!(data, vec![0xCA, 0xFE]);
        assert!(private);
        assert_eq!(fixture.state.get_nonce(ALICE), 1);
    }

    #[test]
    fn test_private_create_leaves_nonce_to_engine() {
        let store = InMemoryPrivateStore::new();
        let reference = store.send(&[0x60, 0x00], "alice", &[]).unwrap();
        let mut fixture = Fixture::new();
        let msg = TransitionMessage::Private(Message::create(
            ALICE,
            0,
            100_000,
            U256::one(),
            reference,
        ));

        let (data, _) = fixture
            .resolve(&msg, Some(&store), TransitionConfig::default())
            .unwrap();
        assert_eq!(data, vec![0x60, 0x00]);
        assert_eq!(fixture.state.get_nonce(ALICE), 0);
    }

    #[test]
    fn test_failed_fetch_bumps_nonce_even_for_create() {
        let store = InMemoryPrivateStore::new();
        store.fail_with("enclave offline");
        let mut fixture = Fixture::new();
        let msg = TransitionMessage::Private(Message::create(
            ALICE,
            0,
            100_000,
            U256::one(),
            Bytes::from_slice(&[0u8; 32]),
        ));

        let result = fixture.resolve(&msg, Some(&store), TransitionConfig::default());
        assert_eq!(
            result,
            Err(ConsensusError::PrivateTransport(PrivateTxError::Transport(
                "enclave offline".to_string()
            )))
        );
        assert_eq!(fixture.state.get_nonce(ALICE), 1);
    }

    #[test]
    fn test_missing_transport_is_fetch_failure() {
        let mut fixture = Fixture::new();
        let msg = TransitionMessage::Private(Message::call(ALICE, BOB, 0, 50_000, U256::one()));

        let result = fixture.resolve(&msg, None, TransitionConfig::default());
        assert_eq!(
            result,
            Err(ConsensusError::PrivateTransport(PrivateTxError::NotConfigured))
        );
        assert_eq!(fixture.state.get_nonce(ALICE), 1);
    }

    #[test]
    fn test_privacy_protocol_disabled_treats_private_as_public() {
        let mut fixture = Fixture::new();
        let msg = TransitionMessage::Private(
            Message::call(ALICE, BOB, 0, 50_000, U256::one()).with_data(vec![9; 32]),
        );
        let config = TransitionConfig {
            privacy_protocol: false,
            ..TransitionConfig::default()
        };

        let (data, private) = fixture.resolve(&msg, None, config).unwrap();
        assert_eq!(data, vec![9; 32]);
        assert!(!private);
        assert_eq!(fixture.state.get_nonce(ALICE), 0);
    }
}
