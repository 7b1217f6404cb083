//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete implementations of the outbound ports.
//!
//! - `InMemoryWorldState` implements `WorldState`
//! - `GasPool` implements `BlockGasPool`
//! - `InMemoryPrivateStore` / `DirectoryPrivateStore` implement
//!   `PrivateTransactionManager`
//! - `TransferEngine` implements `ExecutionEngine`

pub mod gas_pool;
pub mod private_store;
pub mod state_adapter;
pub mod transfer_engine;

pub use gas_pool::*;
pub use private_store::*;
pub use state_adapter::*;
pub use transfer_engine::*;
