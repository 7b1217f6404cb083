//! # Domain Layer (Inner Hexagon)
//!
//! Messages, gas arithmetic and hashing. No I/O and no collaborator access:
//! everything that touches the world state lives in `transition`.

pub mod entities;
pub mod gas;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use gas::{calculate_refund, costs, intrinsic_gas, GasSchedule};
pub use services::*;
pub use value_objects::*;
