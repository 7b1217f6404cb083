//! # Error Types
//!
//! A transition reports failures on two disjoint channels:
//!
//! - [`ConsensusError`] is returned as `Err` from a transition. The message is
//!   invalid for the current state and must never be included in a block.
//! - [`EngineError`] is carried inside a successful
//!   [`ExecutionOutcome`](crate::domain::ExecutionOutcome). The message ran,
//!   consumed gas and is recorded as reverted.

use crate::domain::value_objects::U256;
use thiserror::Error;

// =============================================================================
// CONSENSUS ERRORS
// =============================================================================

/// Errors that reject a message outright.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// Account nonce is lower than the message nonce.
    #[error("nonce too high: state nonce {state}, message nonce {message}")]
    NonceTooHigh { state: u64, message: u64 },

    /// Account nonce is higher than the message nonce.
    #[error("nonce too low: state nonce {state}, message nonce {message}")]
    NonceTooLow { state: u64, message: u64 },

    /// Account nonce cannot be incremented any further.
    #[error("nonce has max value: {nonce}")]
    NonceMax { nonce: u64 },

    /// Sender cannot prepay `gas_limit * gas_price`.
    #[error("insufficient balance to pay for gas: required {required}, available {available}")]
    InsufficientBalanceForGas { required: U256, available: U256 },

    /// The block gas pool cannot cover the gas limit.
    #[error(transparent)]
    GasPool(#[from] GasPoolError),

    /// Intrinsic gas overflowed u64 or exceeded the purchased gas.
    #[error("out of gas")]
    OutOfGas,

    /// The private payload could not be fetched.
    #[error("private transaction manager: {0}")]
    PrivateTransport(#[from] PrivateTxError),

    /// The engine could not move the message value before executing code.
    #[error("insufficient balance for transfer")]
    InsufficientBalanceForTransfer,
}

// =============================================================================
// ENGINE ERRORS
// =============================================================================

/// Errors reported by the execution engine during create/call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Caller balance does not cover the value transfer.
    #[error("insufficient balance for transfer")]
    InsufficientBalance,

    /// Execution ran out of gas.
    #[error("out of gas")]
    OutOfGas,

    /// Execution reverted.
    #[error("execution reverted: {0}")]
    Revert(String),

    /// A contract already exists at the derived creation address.
    #[error("contract address collision")]
    ContractAddressCollision,

    /// Nested call depth limit reached.
    #[error("max call depth exceeded")]
    CallDepthExceeded,

    /// Any other engine failure.
    #[error("engine error: {0}")]
    Other(String),
}

impl EngineError {
    /// Returns true if this error invalidates the message.
    ///
    /// Only a failed value transfer ahead of code execution does; every other
    /// engine error is an ordinary execution failure that still consumes gas.
    #[must_use]
    pub fn is_consensus(&self) -> bool {
        matches!(self, Self::InsufficientBalance)
    }
}

// =============================================================================
// GAS POOL ERRORS
// =============================================================================

/// Errors from the block gas pool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GasPoolError {
    /// Requested gas exceeds what is left in the block.
    #[error("gas limit reached: requested {requested}, available {available}")]
    GasLimitReached { requested: u64, available: u64 },
}

// =============================================================================
// PRIVATE TRANSPORT ERRORS
// =============================================================================

/// Errors from the private transaction manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrivateTxError {
    /// No private transaction manager is configured on this node.
    #[error("no private transaction manager configured")]
    NotConfigured,

    /// Reference has the wrong length.
    #[error("invalid payload reference: expected 32 bytes, got {len}")]
    InvalidReference { len: usize },

    /// Payload store I/O failure.
    #[error("payload store I/O at {path}: {error}")]
    Io { path: String, error: String },

    /// Transport-level failure.
    #[error("transport failure: {0}")]
    Transport(String),
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Errors while loading configuration files.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read {path}: {error}")]
    Io { path: String, error: String },

    /// File could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

// =============================================================================
// TESTS
// =============================================================================
