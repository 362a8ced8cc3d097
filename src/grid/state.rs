//! Shared grid state
//!
//! A fresh, empty `GridState` is created by the startup sequencer and
//! injected into the tracker and coordinator. The statistics reporter only
//! ever sees point-in-time snapshots.

use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;

/// Point-in-time view of the grid's trading state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridStateSnapshot {
    pub current_position: Decimal,
    pub average_price: Decimal,
    pub current_price: Decimal,
    pub active_orders: u64,
    pub total_filled: u64,
    pub total_volume: Decimal,
    pub realized_pnl: Decimal,
}

/// Shared, internally synchronized grid state. Cloning shares the same
/// underlying state.
#[derive(Debug, Clone, Default)]
pub struct GridState {
    inner: Arc<RwLock<GridStateSnapshot>>,
}

impl GridState {
    /// A fresh, empty state for a new run.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> GridStateSnapshot {
        self.inner.read().expect("grid state lock").clone()
    }

    pub fn set_current_price(&self, price: Decimal) {
        self.inner.write().expect("grid state lock").current_price = price;
    }

    pub fn set_active_orders(&self, count: u64) {
        self.inner.write().expect("grid state lock").active_orders = count;
    }

    /// Record a fill: updates position, average entry price, realized PnL
    /// and the cumulative fill counters. Positive `quantity` buys, negative
    /// sells.
    pub fn record_fill(&self, price: Decimal, quantity: Decimal) {
        let mut state = self.inner.write().expect("grid state lock");

        let old_position = state.current_position;
        let new_position = old_position + quantity;

        if quantity > Decimal::ZERO && old_position >= Decimal::ZERO {
            // Adding to a long: weighted average entry
            let old_cost = state.average_price * old_position;
            let add_cost = price * quantity;
            if new_position > Decimal::ZERO {
                state.average_price = (old_cost + add_cost) / new_position;
            }
        } else if quantity < Decimal::ZERO && old_position > Decimal::ZERO {
            // Reducing a long: realize against the average entry
            let closed = quantity.abs().min(old_position);
            let average_price = state.average_price;
            state.realized_pnl += (price - average_price) * closed;
            if new_position == Decimal::ZERO {
                state.average_price = Decimal::ZERO;
            }
        } else {
            // Short-side bookkeeping mirrors the long side
            let old_abs = old_position.abs();
            if quantity < Decimal::ZERO && old_position <= Decimal::ZERO {
                let old_cost = state.average_price * old_abs;
                let add_cost = price * quantity.abs();
                let new_abs = new_position.abs();
                if new_abs > Decimal::ZERO {
                    state.average_price = (old_cost + add_cost) / new_abs;
                }
            } else if quantity > Decimal::ZERO && old_position < Decimal::ZERO {
                let closed = quantity.min(old_abs);
                let average_price = state.average_price;
                state.realized_pnl += (average_price - price) * closed;
                if new_position == Decimal::ZERO {
                    state.average_price = Decimal::ZERO;
                }
            }
        }

        state.current_position = new_position;
        state.total_filled += 1;
        state.total_volume += price * quantity.abs();
    }
}
