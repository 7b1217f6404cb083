//! # Core Domain Entities
//!
//! Messages entering a transition, the block environment they are applied
//! in, and the outcomes flowing back out of the engine and the transition.

use crate::domain::value_objects::{Address, Bytes, U256};
use crate::errors::EngineError;
use serde::{Deserialize, Serialize};

// =============================================================================
// MESSAGE
// =============================================================================

/// A signed, decoded message ready to be applied to the world state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender (recovered from the signature).
    pub from: Address,
    /// Recipient. `None` requests a contract creation.
    pub to: Option<Address>,
    /// Price paid per unit of gas.
    pub gas_price: U256,
    /// Gas limit purchased up front.
    pub gas: u64,
    /// Value transferred to the recipient or new contract.
    pub value: U256,
    /// Sender nonce carried by the message.
    pub nonce: u64,
    /// Whether the nonce must match the sender's account nonce.
    pub check_nonce: bool,
    /// Calldata or init code. For private messages, the payload reference.
    pub data: Bytes,
}

impl Message {
    /// Creates a call message with nonce checking enabled and zero value.
    #[must_use]
    pub fn call(from: Address, to: Address, nonce: u64, gas: u64, gas_price: U256) -> Self {
        Self {
            from,
            to: Some(to),
            gas_price,
            gas,
            value: U256::zero(),
            nonce,
            check_nonce: true,
            data: Bytes::new(),
        }
    }

    /// Creates a contract-creation message with nonce checking enabled.
    #[must_use]
    pub fn create(from: Address, nonce: u64, gas: u64, gas_price: U256, code: Bytes) -> Self {
        Self {
            from,
            to: None,
            gas_price,
            gas,
            value: U256::zero(),
            nonce,
            check_nonce: true,
            data: code,
        }
    }

    /// Sets the transferred value.
    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Disables nonce checking (calls from system contexts, simulations).
    #[must_use]
    pub fn without_nonce_check(mut self) -> Self {
        self.check_nonce = false;
        self
    }

    /// Returns true if this message creates a contract.
    #[must_use]
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// A message as seen by the transition: public, or private with its payload
/// held off-chain by the private transaction manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionMessage {
    /// Payload is carried in `data`.
    Public(Message),
    /// `data` is an opaque reference resolved through the private transport.
    Private(Message),
}

impl TransitionMessage {
    /// The underlying message.
    #[must_use]
    pub fn message(&self) -> &Message {
        match self {
            Self::Public(msg) | Self::Private(msg) => msg,
        }
    }

    /// Returns true for private messages.
    #[must_use]
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Private(_))
    }
}

impl From<Message> for TransitionMessage {
    fn from(msg: Message) -> Self {
        Self::Public(msg)
    }
}

// =============================================================================
// BLOCK ENVIRONMENT
// =============================================================================

/// Block being built or validated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block number.
    pub number: u64,
    /// Fee recipient (block proposer).
    pub coinbase: Address,
    /// Block gas limit. Seeds the block's gas pool.
    pub gas_limit: u64,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            number: 0,
            coinbase: Address::ZERO,
            gas_limit: 30_000_000,
        }
    }
}

/// Fork activation schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain ID.
    pub chain_id: u64,
    /// Homestead activation block. `None` means never.
    pub homestead_block: Option<u64>,
}

impl ChainConfig {
    /// Returns true if Homestead rules apply at `number`.
    #[must_use]
    pub fn is_homestead(&self, number: u64) -> bool {
        self.homestead_block.is_some_and(|block| number >= block)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            homestead_block: Some(0),
        }
    }
}

// =============================================================================
// ENGINE OUTCOMES
// =============================================================================

/// Result of an engine CREATE.
#[derive(Clone, Debug, Default)]
pub struct CreateOutcome {
    /// Init code return data.
    pub output: Bytes,
    /// Address of the created contract.
    pub address: Address,
    /// Gas left after execution.
    pub gas_left: u64,
    /// Execution error, if any.
    pub error: Option<EngineError>,
}

/// Result of an engine CALL.
#[derive(Clone, Debug, Default)]
pub struct CallOutcome {
    /// Return data.
    pub output: Bytes,
    /// Gas left after execution.
    pub gas_left: u64,
    /// Execution error, if any.
    pub error: Option<EngineError>,
}

// =============================================================================
// TRANSITION OUTCOME
// =============================================================================

/// A message that was executed, successfully or not.
///
/// Consensus failures never produce an outcome; they are returned as
/// [`ConsensusError`](crate::errors::ConsensusError).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Data returned by the engine.
    pub return_data: Bytes,
    /// Gas charged to the message. Always zero for private messages.
    pub gas_used: u64,
    /// Engine error for a reverted/failed execution.
    pub vm_error: Option<EngineError>,
}

impl ExecutionOutcome {
    /// Outcome of a message that short-circuited without touching the engine.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the engine reported an execution failure.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.vm_error.is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_builders() {
        let from = Address::new([1u8; 20]);
        let to = Address::new([2u8; 20]);
        let msg = Message::call(from, to, 3, 50_000, U256::from(2))
            .with_value(U256::from(7))
            .with_data(vec![0xAA]);

        assert!(!msg.is_contract_creation());
        assert!(msg.check_nonce);
        assert_eq!(msg.value, U256::from(7));
        assert_eq!(msg.data.as_slice(), &[0xAA]);

        let create = Message::create(from, 0, 100_000, U256::one(), Bytes::new());
        assert!(create.is_contract_creation());
        assert!(!create.without_nonce_check().check_nonce);
    }

    #[test]
    fn test_transition_message_variants() {
        let msg = Message::call(Address::ZERO, Address::ZERO, 0, 21_000, U256::one());
        let public: TransitionMessage = msg.clone().into();
        let private = TransitionMessage::Private(msg.clone());

        assert!(!public.is_private());
        assert!(private.is_private());
        assert_eq!(private.message(), &msg);
    }

    #[test]
    fn test_homestead_activation() {
        let config = ChainConfig {
            chain_id: 1,
            homestead_block: Some(100),
        };
        assert!(!config.is_homestead(99));
        assert!(config.is_homestead(100));

        let never = ChainConfig {
            chain_id: 1,
            homestead_block: None,
        };
        assert!(!never.is_homestead(u64::MAX));
    }

    #[test]
    fn test_outcome_failed_flag() {
        assert!(!ExecutionOutcome::empty().failed());
        let reverted = ExecutionOutcome {
            vm_error: Some(EngineError::Revert("nope".to_string())),
            ..ExecutionOutcome::default()
        };
        assert!(reverted.failed());
    }
}
