//! # Intrinsic Gas
//!
//! Fixed and per-byte gas charged before any execution happens, plus the
//! refund cap applied after execution.
//!
//! Every node must compute bit-identical values here, so all arithmetic is
//! done on `u64` with explicit overflow checks ahead of each multiplication.

use crate::errors::ConsensusError;
use serde::Deserialize;

// =============================================================================
// DEFAULT COSTS
// =============================================================================

/// Default transaction gas costs.
pub mod costs {
    /// Base gas for a call, and for a creation before Homestead.
    pub const TX_GAS: u64 = 21_000;
    /// Base gas for a contract creation from Homestead on.
    pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
    /// Gas per non-zero payload byte.
    pub const TX_DATA_NON_ZERO_GAS: u64 = 68;
    /// Gas per zero payload byte.
    pub const TX_DATA_ZERO_GAS: u64 = 4;
}

// =============================================================================
// GAS SCHEDULE
// =============================================================================

/// The four constants intrinsic gas is computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    /// Base cost of a call (and of a pre-Homestead creation).
    pub tx_gas: u64,
    /// Base cost of a post-Homestead creation.
    pub tx_gas_contract_creation: u64,
    /// Cost per non-zero payload byte.
    pub tx_data_non_zero_gas: u64,
    /// Cost per zero payload byte.
    pub tx_data_zero_gas: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            tx_gas: costs::TX_GAS,
            tx_gas_contract_creation: costs::TX_GAS_CONTRACT_CREATION,
            tx_data_non_zero_gas: costs::TX_DATA_NON_ZERO_GAS,
            tx_data_zero_gas: costs::TX_DATA_ZERO_GAS,
        }
    }
}

impl GasSchedule {
    /// Base cost for a message of the given kind under the given fork rules.
    #[must_use]
    pub const fn base_cost(&self, contract_creation: bool, homestead: bool) -> u64 {
        if contract_creation && homestead {
            self.tx_gas_contract_creation
        } else {
            self.tx_gas
        }
    }

    /// Computes the intrinsic gas of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::OutOfGas`] if the total does not fit in a `u64`.
    pub fn intrinsic_gas(
        &self,
        data: &[u8],
        contract_creation: bool,
        homestead: bool,
    ) -> Result<u64, ConsensusError> {
        let mut gas = self.base_cost(contract_creation, homestead);
        if data.is_empty() {
            return Ok(gas);
        }

        let non_zero = data.iter().filter(|&&byte| byte != 0).count() as u64;
        let zero = data.len() as u64 - non_zero;

        gas = charge_bytes(gas, non_zero, self.tx_data_non_zero_gas)?;
        gas = charge_bytes(gas, zero, self.tx_data_zero_gas)?;
        Ok(gas)
    }
}

/// Adds `count * per_byte` to `gas`, checking for overflow before multiplying.
fn charge_bytes(gas: u64, count: u64, per_byte: u64) -> Result<u64, ConsensusError> {
    if per_byte == 0 {
        return Ok(gas);
    }
    if (u64::MAX - gas) / per_byte < count {
        return Err(ConsensusError::OutOfGas);
    }
    Ok(gas + count * per_byte)
}

/// Computes intrinsic gas with the default schedule.
///
/// # Errors
///
/// Returns [`ConsensusError::OutOfGas`] on `u64` overflow.
pub fn intrinsic_gas(
    data: &[u8],
    contract_creation: bool,
    homestead: bool,
) -> Result<u64, ConsensusError> {
    GasSchedule::default().intrinsic_gas(data, contract_creation, homestead)
}

// =============================================================================
// GAS REFUND
// =============================================================================

/// Effective refund: the store's refund counter, capped at half the gas used.
#[must_use]
pub fn calculate_refund(gas_used: u64, refund_counter: u64) -> u64 {
    let max_refund = gas_used / 2;
    refund_counter.min(max_refund)
}

// =============================================================================
// TESTS
// =============================================================================
