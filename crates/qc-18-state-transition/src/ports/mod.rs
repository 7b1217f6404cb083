//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for the collaborators a state transition consumes.
//!
//! - **Driven Ports (Outbound)**: `WorldState`, `BlockGasPool`,
//!   `ExecutionEngine`, `PrivateTransactionManager`
//! - The driving side is the `transition` module itself
//! - No concrete implementations in this module

pub mod outbound;

pub use outbound::*;
