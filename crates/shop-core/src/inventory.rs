//! # Inventory Operations
//!
//! Admin-facing stock adjustment and transfer. Each operation is one
//! atomic unit of work: a validation failure leaves every entry
//! untouched.

use crate::catalog::StockEntry;
use crate::error::{ShopError, ShopResult};
use crate::store::ShopStore;
use tracing::info;
use uuid::Uuid;

impl ShopStore {
    /// Add `delta` (may be negative) to a stock entry's quantity.
    /// Fails with `NegativeStock` if the result would be negative.
    pub fn adjust_stock(&self, entry_id: Uuid, delta: i64) -> ShopResult<StockEntry> {
        self.transaction(|data| {
            let entry = data
                .stock_entry_mut(entry_id)
                .ok_or(ShopError::StockEntryNotFound { entry_id })?;
            let next = entry.quantity as i64 + delta;
            if next < 0 {
                return Err(ShopError::NegativeStock { entry_id });
            }
            entry.quantity = next as u32;
            let entry = entry.clone();
            info!(
                entry_id = %entry.id,
                delta,
                quantity = entry.quantity,
                "stock adjusted"
            );
            Ok(entry)
        })
    }

    /// Move `quantity` units of a product from one store to another.
    /// The destination entry is created at zero if it does not exist.
    /// Fails with `InsufficientStock` (no mutation) if the source holds
    /// less than `quantity`.
    pub fn transfer_stock(
        &self,
        product_id: Uuid,
        from_store_id: Uuid,
        to_store_id: Uuid,
        quantity: u32,
    ) -> ShopResult<()> {
        self.transaction(|data| {
            let available = data
                .entry_for(product_id, from_store_id)
                .map(|e| e.quantity)
                .unwrap_or(0);
            if available < quantity {
                return Err(ShopError::InsufficientStock {
                    requested: quantity,
                    available,
                });
            }

            if let Some(source) = data
                .stock
                .iter_mut()
                .find(|s| s.product_id == product_id && s.store_id == from_store_id)
            {
                source.quantity -= quantity;
            }

            match data
                .stock
                .iter_mut()
                .find(|s| s.product_id == product_id && s.store_id == to_store_id)
            {
                Some(dest) => dest.quantity += quantity,
                None => data
                    .stock
                    .push(StockEntry::new(product_id, to_store_id, quantity)),
            }

            info!(
                %product_id,
                from = %from_store_id,
                to = %to_store_id,
                quantity,
                "stock transferred"
            );
            Ok(())
        })
    }
}
