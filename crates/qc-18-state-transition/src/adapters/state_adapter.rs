//! # State Adapter
//!
//! In-memory world state. Used by tests, simulations and single-node setups;
//! a persistent backend implements the same `WorldState` port.

use crate::domain::value_objects::{Address, Bytes, U256};
use crate::ports::outbound::WorldState;
use std::collections::HashMap;

/// Account record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    /// Balance.
    pub balance: U256,
    /// Nonce.
    pub nonce: u64,
    /// Contract code (empty for externally owned accounts).
    pub code: Bytes,
}

/// In-memory world state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryWorldState {
    accounts: HashMap<Address, Account>,
    refund: u64,
}

impl InMemoryWorldState {
    /// Create a new empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the account, if it exists.
    #[must_use]
    pub fn account(&self, address: Address) -> Option<&Account> {
        self.accounts.get(&address)
    }

    /// Number of existing accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Set balance for an address, creating the account if needed.
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.accounts.entry(address).or_default().balance = balance;
    }

    /// Set code for an address, creating the account if needed.
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        self.accounts.entry(address).or_default().code = code;
    }

    /// Contract code (empty if none).
    #[must_use]
    pub fn get_code(&self, address: Address) -> Bytes {
        self.accounts
            .get(&address)
            .map(|account| account.code.clone())
            .unwrap_or_default()
    }

    /// Adds to the refund counter.
    pub fn add_refund(&mut self, amount: u64) {
        self.refund = self.refund.saturating_add(amount);
    }
}

impl WorldState for InMemoryWorldState {
    fn exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    fn create_account(&mut self, address: Address) {
        self.accounts.insert(address, Account::default());
    }

    fn get_balance(&self, address: Address) -> U256 {
        self.accounts
            .get(&address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    fn sub_balance(&mut self, address: Address, amount: U256) {
        let account = self.accounts.entry(address).or_default();
        account.balance = account.balance.saturating_sub(amount);
    }

    fn add_balance(&mut self, address: Address, amount: U256) {
        let account = self.accounts.entry(address).or_default();
        account.balance = account.balance.saturating_add(amount);
    }

    fn get_nonce(&self, address: Address) -> u64 {
        self.accounts
            .get(&address)
            .map(|account| account.nonce)
            .unwrap_or(0)
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.accounts.entry(address).or_default().nonce = nonce;
    }

    fn get_refund(&self) -> u64 {
        self.refund
    }

    fn reset_refund(&mut self) {
        self.refund = 0;
    }
}

// =============================================================================
// TESTS
// =============================================================================
