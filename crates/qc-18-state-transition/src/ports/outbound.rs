//! # Driven Ports (SPI - Outbound)
//!
//! Collaborators a transition borrows for its duration:
//! - the world state store
//! - the block gas pool
//! - the execution engine
//! - the private transaction manager
//!
//! All of them are shared across the transitions of a block. Callers must
//! apply messages one at a time, in block order; no port here is expected to
//! arbitrate concurrent writers.

use crate::domain::entities::{BlockContext, CallOutcome, ChainConfig, CreateOutcome};
use crate::domain::value_objects::{Address, Bytes, U256};
use crate::errors::{GasPoolError, PrivateTxError};

// =============================================================================
// WORLD STATE
// =============================================================================

/// Account-level view of the world state.
///
/// Operations are infallible at this layer. A missing account is a valid
/// state: reads return zero values.
pub trait WorldState {
    /// Returns true if the account exists.
    fn exists(&self, address: Address) -> bool;

    /// Creates a zero-initialized account.
    fn create_account(&mut self, address: Address);

    /// Account balance.
    fn get_balance(&self, address: Address) -> U256;

    /// Debits `amount` from the account.
    fn sub_balance(&mut self, address: Address, amount: U256);

    /// Credits `amount` to the account.
    fn add_balance(&mut self, address: Address, amount: U256);

    /// Account nonce.
    fn get_nonce(&self, address: Address) -> u64;

    /// Overwrites the account nonce.
    fn set_nonce(&mut self, address: Address, nonce: u64);

    /// Refund counter accumulated by the engine during the current message.
    fn get_refund(&self) -> u64;

    /// Clears the refund counter. Called before each message.
    fn reset_refund(&mut self);

    /// Creates the account if it does not exist yet.
    ///
    /// Touching changes the state root even when the message later fails.
    fn touch(&mut self, address: Address) {
        if !self.exists(address) {
            self.create_account(address);
        }
    }

    /// Increments the account nonce by one, wrapping at `u64::MAX`.
    ///
    /// Transitions never reach the wrap: the pre-check rejects senders whose
    /// nonce is already at the maximum.
    fn increment_nonce(&mut self, address: Address) {
        let nonce = self.get_nonce(address);
        self.set_nonce(address, nonce.wrapping_add(1));
    }
}

// =============================================================================
// BLOCK GAS POOL
// =============================================================================

/// Gas still available to the transactions of the current block.
pub trait BlockGasPool {
    /// Reserves `amount` gas.
    ///
    /// # Errors
    ///
    /// Fails without side effects if less than `amount` remains.
    fn sub_gas(&mut self, amount: u64) -> Result<(), GasPoolError>;

    /// Returns `amount` unused gas to the pool.
    fn add_gas(&mut self, amount: u64);

    /// Remaining gas.
    fn gas(&self) -> u64;
}

// =============================================================================
// EXECUTION ENGINE
// =============================================================================

/// Executes init code and calls against the world state.
///
/// The engine owns value transfer, code execution and the creation nonce of
/// the caller. Apart from [`EngineError::InsufficientBalance`] every error it
/// reports is an ordinary execution failure.
///
/// [`EngineError::InsufficientBalance`]: crate::errors::EngineError::InsufficientBalance
pub trait ExecutionEngine<S: WorldState + ?Sized> {
    /// Fork schedule of the chain.
    fn chain_config(&self) -> &ChainConfig;

    /// Block the engine executes in.
    fn block_context(&self) -> &BlockContext;

    /// Deploys a contract from `code`.
    fn create(
        &mut self,
        state: &mut S,
        caller: Address,
        code: &[u8],
        gas: u64,
        value: U256,
    ) -> CreateOutcome;

    /// Calls `to` with `input`.
    fn call(
        &mut self,
        state: &mut S,
        caller: Address,
        to: Address,
        input: &[u8],
        gas: u64,
        value: U256,
    ) -> CallOutcome;
}

// =============================================================================
// PRIVATE TRANSACTION MANAGER
// =============================================================================

/// Off-chain store for private payloads.
///
/// A private message carries only a reference on chain. Nodes that are party
/// to it can resolve the reference to the plaintext; other nodes receive an
/// empty payload.
pub trait PrivateTransactionManager: Send + Sync {
    /// Stores `payload` for the `from` party and its recipients.
    ///
    /// # Errors
    ///
    /// Fails if the payload cannot be stored or distributed.
    fn send(&self, payload: &[u8], from: &str, to: &[String]) -> Result<Bytes, PrivateTxError>;

    /// Resolves `reference` to the plaintext payload.
    ///
    /// Returns an empty payload when this node is not a party.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or malformed references.
    fn receive(&self, reference: &[u8]) -> Result<Bytes, PrivateTxError>;
}

// =============================================================================
// TESTS
// =============================================================================
