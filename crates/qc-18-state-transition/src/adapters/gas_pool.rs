//! # Gas Pool
//!
//! Per-block gas counter shared by every transition of the block.

use crate::domain::entities::BlockContext;
use crate::errors::GasPoolError;
use crate::ports::outbound::BlockGasPool;
use std::fmt;
use tracing::warn;

/// Gas still available in the block being processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasPool(u64);

impl GasPool {
    /// Creates a pool holding the block gas limit.
    #[must_use]
    pub const fn new(gas_limit: u64) -> Self {
        Self(gas_limit)
    }

    /// Creates a pool holding the gas limit of `block`.
    #[must_use]
    pub const fn for_block(block: &BlockContext) -> Self {
        Self(block.gas_limit)
    }
}

impl BlockGasPool for GasPool {
    fn sub_gas(&mut self, amount: u64) -> Result<(), GasPoolError> {
        if self.0 < amount {
            return Err(GasPoolError::GasLimitReached {
                requested: amount,
                available: self.0,
            });
        }
        self.0 -= amount;
        Ok(())
    }

    fn add_gas(&mut self, amount: u64) {
        match self.0.checked_add(amount) {
            Some(gas) => self.0 = gas,
            None => {
                warn!(pool = self.0, amount, "Gas pool overflow, saturating");
                self.0 = u64::MAX;
            }
        }
    }

    fn gas(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GasPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_and_add() {
        let mut pool = GasPool::new(100_000);
        pool.sub_gas(60_000).unwrap();
        assert_eq!(pool.gas(), 40_000);

        pool.add_gas(10_000);
        assert_eq!(pool.gas(), 50_000);
    }

    #[test]
    fn test_exhausted_pool_is_untouched() {
        let mut pool = GasPool::new(20_000);
        let err = pool.sub_gas(21_000).unwrap_err();
        assert_eq!(
            err,
            GasPoolError::GasLimitReached {
                requested: 21_000,
                available: 20_000
            }
        );
        assert_eq!(pool.gas(), 20_000);
    }

    #[test]
    fn test_for_block_uses_block_gas_limit() {
        let block = BlockContext {
            gas_limit: 8_000_000,
            ..BlockContext::default()
        };
        assert_eq!(GasPool::for_block(&block).gas(), 8_000_000);
        assert_eq!(GasPool::for_block(&BlockContext::default()).gas(), 30_000_000);
    }

    #[test]
    fn test_add_saturates() {
        let mut pool = GasPool::new(u64::MAX - 1);
        pool.add_gas(10);
        assert_eq!(pool.gas(), u64::MAX);
    }
}
