//! # QC-18 State Transition - Transaction Application Subsystem
//!
//! **Subsystem ID:** 18
//!
//! ## Purpose
//!
//! Applies a single transaction message to the world state: validates the
//! sender nonce, buys gas against the block gas pool, charges intrinsic gas,
//! dispatches to the execution engine and settles refunds and fees.
//!
//! Private messages carry a reference instead of their payload. The payload
//! is fetched from the private transport before intrinsic gas is charged;
//! a node that is not a party to the message resolves it to an empty payload
//! and skips execution.
//!
//! ## Outcomes
//!
//! | Result | Meaning | Block |
//! |--------|---------|-------|
//! | `Err(ConsensusError)` | Message invalid for the current state | Rejected |
//! | `Ok` with `vm_error` | Execution failed (revert, out of gas) | Included, gas charged |
//! | `Ok` without `vm_error` | Execution succeeded | Included |
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Gas schedule | `domain/gas.rs` | Intrinsic gas, refund cap |
//! | Pre-check | `transition/mod.rs` | Nonce check, gas purchase |
//! | Privacy resolver | `transition/privacy.rs` | Private payload fetch, nonce rule |
//! | Orchestrator | `transition/mod.rs` | Create / call dispatch |
//! | Settlement | `transition/settlement.rs` | Refund, gas return, coinbase fee |
//! | Service | `service.rs` | Ordered batches, statistics |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `WorldState` | Balances, nonces, refund counter |
//! | `BlockGasPool` | Per-block gas ceiling |
//! | `ExecutionEngine` | Contract creation and calls |
//! | `PrivateTransactionManager` | Private payload transport |
//!
//! ## Usage Example
//!
//! ```
//! use qc_18_state_transition::prelude::*;
//!
//! let alice = Address::new([0xA1; 20]);
//! let bob = Address::new([0xB0; 20]);
//!
//! let mut state = InMemoryWorldState::new();
//! state.set_balance(alice, U256::from(1_000_000));
//! let block = BlockContext::default();
//! let mut pool = GasPool::for_block(&block);
//! let mut engine = TransferEngine::new(ChainConfig::default(), block);
//!
//! let msg = Message::call(alice, bob, 0, 50_000, U256::one()).with_value(U256::from(10));
//! let outcome = StateTransitionService::default()
//!     .apply_message(&mut engine, &mut state, &msg.into(), &mut pool)
//!     .unwrap();
//!
//! assert!(!outcome.failed());
//! assert_eq!(state.get_balance(bob), U256::from(10));
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;
pub mod transition;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        BlockContext, CallOutcome, ChainConfig, CreateOutcome, ExecutionOutcome, Message,
        TransitionMessage,
    };

    // Value objects
    pub use crate::domain::value_objects::{Address, Bytes, Hash, U256};

    // Domain services
    pub use crate::domain::gas::{calculate_refund, costs, intrinsic_gas, GasSchedule};
    pub use crate::domain::services::{compute_contract_address, keccak256};

    // Ports
    pub use crate::ports::outbound::{
        BlockGasPool, ExecutionEngine, PrivateTransactionManager, WorldState,
    };

    // Errors
    pub use crate::errors::{
        ConfigError, ConsensusError, EngineError, GasPoolError, PrivateTxError,
    };

    // Adapters
    pub use crate::adapters::{
        load_private_transport, DirectoryPrivateStore, GasPool, InMemoryPrivateStore,
        InMemoryWorldState, PrivateStoreConfig, TransferEngine, DEFAULT_CALL_COST,
        DEFAULT_CREATE_COST, PRIVATE_CONFIG_ENV,
    };

    // Transition
    pub use crate::config::TransitionConfig;
    pub use crate::transition::{apply_message, StateTransition};

    // Service
    pub use crate::service::{BatchOutcome, ServiceStats, StateTransitionService};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 18;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "State Transition";

// =============================================================================
// TESTS
// =============================================================================
