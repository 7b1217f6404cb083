//! Gas settlement after execution.

use super::StateTransition;
use crate::domain::gas::calculate_refund;
use crate::domain::value_objects::{Address, U256};
use crate::ports::outbound::{BlockGasPool, ExecutionEngine, WorldState};
use tracing::debug;

impl<S, E, G> StateTransition<'_, S, E, G>
where
    S: WorldState,
    E: ExecutionEngine<S>,
    G: BlockGasPool,
{
    /// Applies the refund, returns unused gas and pays the coinbase.
    ///
    /// The fee is computed from the gas used before the refund is applied.
    pub(super) fn settle(&mut self, sender: Address) {
        let gas_used = self.gas_used();
        self.refund_gas(sender, gas_used);

        let coinbase = self.engine.block_context().coinbase;
        let fee = U256::from(gas_used).saturating_mul(self.gas_price);
        self.state.add_balance(coinbase, fee);
        debug!(%coinbase, gas_used, %fee, "Fee paid");
    }

    fn refund_gas(&mut self, sender: Address, gas_used: u64) {
        let refund = calculate_refund(gas_used, self.state.get_refund());
        self.gas += refund;

        let remaining = U256::from(self.gas).saturating_mul(self.gas_price);
        self.state.add_balance(sender, remaining);
        self.gas_pool.add_gas(self.gas);
        debug!(%sender, refund, returned = self.gas, "Unused gas returned");
    }

    /// Returns every unit of bought gas to the sender and the pool. Used when
    /// a message is skipped without execution.
    pub(super) fn return_purchased_gas(&mut self, sender: Address) {
        self.gas = self.initial_gas;
        let remaining = U256::from(self.gas).saturating_mul(self.gas_price);
        self.state.add_balance(sender, remaining);
        self.gas_pool.add_gas(self.gas);
        debug!(%sender, returned = self.gas, "Purchased gas returned");
    }
}
