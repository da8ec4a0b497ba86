//! # Shop Store
//!
//! In-memory persistent store for the whole shop. Tables are plain
//! `Vec`s, so enumeration order is insertion order — the stock
//! decrement scan in checkout depends on this being deterministic.
//!
//! Writes go through [`ShopStore::transaction`], a copy-commit unit of
//! work: the closure mutates a working copy and the copy replaces the
//! live data only on `Ok`. The lock is held for the whole closure, so a
//! check-then-act sequence (e.g. the empty-cart idempotency test before
//! checkout materialization) is atomic relative to other callers.

use crate::account::UserAccount;
use crate::cart::{Cart, CartItem, CartLine, CartRef, CartSnapshot};
use crate::catalog::{Product, StockEntry, Store};
use crate::contact::ContactMessage;
use crate::error::{ShopError, ShopResult};
use crate::money::Price;
use crate::order::{Order, OrderItem, OrderLine, OrderSnapshot};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// All shop tables. Cloneable so a transaction can work on a copy.
#[derive(Debug, Clone, Default)]
pub struct ShopData {
    pub products: Vec<Product>,
    pub stores: Vec<Store>,
    pub stock: Vec<StockEntry>,
    pub carts: Vec<Cart>,
    pub cart_items: Vec<CartItem>,
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
    pub users: Vec<UserAccount>,
    pub messages: Vec<ContactMessage>,
}

impl ShopData {
    // -------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------

    /// Insert a product; SKUs are unique
    pub fn add_product(&mut self, product: Product) -> ShopResult<Uuid> {
        if self.products.iter().any(|p| p.sku == product.sku) {
            return Err(ShopError::DuplicateSku { sku: product.sku });
        }
        let id = product.id;
        self.products.push(product);
        Ok(id)
    }

    pub fn product(&self, product_id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn product_mut(&mut self, product_id: Uuid) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == product_id)
    }

    pub fn product_by_sku(&self, sku: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.sku == sku)
    }

    /// Delete a product. Refused while any order line references it.
    pub fn remove_product(&mut self, product_id: Uuid) -> ShopResult<()> {
        if self.product(product_id).is_none() {
            return Err(ShopError::ProductNotFound { product_id });
        }
        if self.order_items.iter().any(|i| i.product_id == product_id) {
            return Err(ShopError::ProductReferenced { product_id });
        }
        self.products.retain(|p| p.id != product_id);
        self.stock.retain(|s| s.product_id != product_id);
        self.cart_items.retain(|i| i.product_id != product_id);
        Ok(())
    }

    /// Distinct product categories, in first-seen order
    pub fn categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for product in &self.products {
            if !seen.contains(&product.category) {
                seen.push(product.category.clone());
            }
        }
        seen
    }

    pub fn add_store(&mut self, store: Store) -> Uuid {
        let id = store.id;
        self.stores.push(store);
        id
    }

    pub fn shop_store(&self, store_id: Uuid) -> Option<&Store> {
        self.stores.iter().find(|s| s.id == store_id)
    }

    // -------------------------------------------------------------
    // Stock
    // -------------------------------------------------------------

    /// Insert a stock entry; the (product, store) pair is unique
    pub fn add_stock_entry(&mut self, entry: StockEntry) -> ShopResult<Uuid> {
        if self.product(entry.product_id).is_none() {
            return Err(ShopError::ProductNotFound {
                product_id: entry.product_id,
            });
        }
        if self.shop_store(entry.store_id).is_none() {
            return Err(ShopError::StoreNotFound {
                store_id: entry.store_id,
            });
        }
        if self
            .stock
            .iter()
            .any(|s| s.product_id == entry.product_id && s.store_id == entry.store_id)
        {
            return Err(ShopError::InvalidRequest(format!(
                "stock entry already exists for product {} at store {}",
                entry.product_id, entry.store_id
            )));
        }
        let id = entry.id;
        self.stock.push(entry);
        Ok(id)
    }

    pub fn stock_entry(&self, entry_id: Uuid) -> Option<&StockEntry> {
        self.stock.iter().find(|s| s.id == entry_id)
    }

    pub fn stock_entry_mut(&mut self, entry_id: Uuid) -> Option<&mut StockEntry> {
        self.stock.iter_mut().find(|s| s.id == entry_id)
    }

    /// Stock entries for a product, in insertion order
    pub fn stock_for_product(&self, product_id: Uuid) -> impl Iterator<Item = &StockEntry> {
        self.stock.iter().filter(move |s| s.product_id == product_id)
    }

    pub fn entry_for(&self, product_id: Uuid, store_id: Uuid) -> Option<&StockEntry> {
        self.stock
            .iter()
            .find(|s| s.product_id == product_id && s.store_id == store_id)
    }

    // -------------------------------------------------------------
    // Carts
    // -------------------------------------------------------------

    pub fn cart(&self, cart_id: Uuid) -> Option<&Cart> {
        self.carts.iter().find(|c| c.id == cart_id)
    }

    /// Resolve a cart reference: a user's single cart, or a guest cart
    /// by its own id (guest carts must have no owner)
    pub fn cart_for(&self, cart_ref: CartRef) -> Option<&Cart> {
        match cart_ref {
            CartRef::User(user_id) => self.carts.iter().find(|c| c.user_id == Some(user_id)),
            CartRef::Guest(cart_id) => self
                .carts
                .iter()
                .find(|c| c.id == cart_id && c.user_id.is_none()),
        }
    }

    /// Get or lazily create the cart for an add-item call. A guest
    /// without a cart id gets a fresh cart.
    pub fn ensure_cart(&mut self, user_id: Option<Uuid>, guest_cart_id: Option<Uuid>) -> Uuid {
        if let Some(user_id) = user_id {
            if let Some(cart) = self.cart_for(CartRef::User(user_id)) {
                return cart.id;
            }
            let cart = Cart::new(Some(user_id));
            let id = cart.id;
            self.carts.push(cart);
            return id;
        }
        if let Some(cart_id) = guest_cart_id {
            match self.cart(cart_id) {
                Some(cart) if cart.user_id.is_none() => return cart_id,
                // The id is taken by a user-owned cart. Ids are unique,
                // so the guest gets a fresh cart instead of an alias.
                Some(_) => {}
                None => {
                    self.carts.push(Cart::guest_with_id(cart_id));
                    return cart_id;
                }
            }
        }
        let cart = Cart::new(None);
        let id = cart.id;
        self.carts.push(cart);
        id
    }

    pub fn cart_items_of(&self, cart_id: Uuid) -> Vec<&CartItem> {
        self.cart_items
            .iter()
            .filter(|i| i.cart_id == cart_id)
            .collect()
    }

    pub fn cart_item(&self, item_id: Uuid) -> Option<&CartItem> {
        self.cart_items.iter().find(|i| i.id == item_id)
    }

    /// Add a product to a cart. A repeat add for the same product
    /// increments the existing line instead of creating a second one.
    pub fn add_cart_item(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: u32,
    ) -> ShopResult<CartItem> {
        if quantity == 0 {
            return Err(ShopError::InvalidRequest(
                "quantity must be at least 1".to_string(),
            ));
        }
        if self.product(product_id).is_none() {
            return Err(ShopError::ProductNotFound { product_id });
        }
        self.touch_cart(cart_id);
        if let Some(item) = self
            .cart_items
            .iter_mut()
            .find(|i| i.cart_id == cart_id && i.product_id == product_id)
        {
            item.quantity += quantity;
            return Ok(item.clone());
        }
        let item = CartItem::new(cart_id, product_id, quantity);
        self.cart_items.push(item.clone());
        Ok(item)
    }

    /// Reassign a cart line's quantity
    pub fn set_cart_item_quantity(&mut self, item_id: Uuid, quantity: u32) -> ShopResult<CartItem> {
        if quantity == 0 {
            return Err(ShopError::InvalidRequest(
                "quantity must be at least 1".to_string(),
            ));
        }
        let item = self
            .cart_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(ShopError::CartItemNotFound { item_id })?;
        item.quantity = quantity;
        let item = item.clone();
        self.touch_cart(item.cart_id);
        Ok(item)
    }

    pub fn remove_cart_item(&mut self, item_id: Uuid) -> ShopResult<()> {
        if self.cart_item(item_id).is_none() {
            return Err(ShopError::CartItemNotFound { item_id });
        }
        self.cart_items.retain(|i| i.id != item_id);
        Ok(())
    }

    /// Delete every item in a cart; the cart row itself survives
    pub fn clear_cart(&mut self, cart_id: Uuid) {
        self.cart_items.retain(|i| i.cart_id != cart_id);
        self.touch_cart(cart_id);
    }

    fn touch_cart(&mut self, cart_id: Uuid) {
        if let Some(cart) = self.carts.iter_mut().find(|c| c.id == cart_id) {
            cart.updated_at = Utc::now();
        }
    }

    /// Cart view with product data and totals joined in
    pub fn cart_snapshot(&self, cart_ref: CartRef) -> ShopResult<CartSnapshot> {
        let Some(cart) = self.cart_for(cart_ref) else {
            return Ok(CartSnapshot::empty());
        };
        let mut items = Vec::new();
        let mut total = 0i64;
        let mut currency = Default::default();
        for item in self.cart_items_of(cart.id) {
            let product = self
                .product(item.product_id)
                .ok_or(ShopError::ProductNotFound {
                    product_id: item.product_id,
                })?;
            let subtotal = product.price.times(item.quantity);
            total += subtotal.amount;
            currency = product.price.currency;
            items.push(CartLine {
                item_id: item.id,
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price: product.price.clone(),
                quantity: item.quantity,
                subtotal,
            });
        }
        Ok(CartSnapshot {
            cart_id: Some(cart.id),
            user_id: cart.user_id,
            items,
            total: Price::from_minor(total, currency),
        })
    }

    // -------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------

    pub fn order(&self, order_id: Uuid) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub fn order_by_payment(&self, payment_id: &str) -> Option<&Order> {
        self.orders
            .iter()
            .find(|o| o.payment_id.as_deref() == Some(payment_id))
    }

    pub fn orders_of_user(&self, user_id: Uuid) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| o.user_id == Some(user_id))
            .collect()
    }

    pub fn order_items_of(&self, order_id: Uuid) -> Vec<&OrderItem> {
        self.order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .collect()
    }

    /// Order view with product names joined in
    pub fn order_snapshot(&self, order_id: Uuid) -> ShopResult<OrderSnapshot> {
        let order = self.order(order_id).ok_or(ShopError::OrderNotFound)?;
        let items = self
            .order_items_of(order_id)
            .into_iter()
            .map(|item| OrderLine {
                product_id: item.product_id,
                product_name: self
                    .product(item.product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                quantity: item.quantity,
                unit_price: item.unit_price.clone(),
                subtotal: item.subtotal(),
            })
            .collect();
        Ok(OrderSnapshot {
            order_id: order.id,
            user_id: order.user_id,
            status: order.status,
            total: order.total.clone(),
            name: order.name.clone(),
            email: order.email.clone(),
            phone: order.phone.clone(),
            address: order.address.clone(),
            city: order.city.clone(),
            postal_code: order.postal_code.clone(),
            payment_method: order.payment_method.clone(),
            payment_id: order.payment_id.clone(),
            items,
            created_at: order.created_at,
        })
    }

    // -------------------------------------------------------------
    // Users & contact inbox
    // -------------------------------------------------------------

    pub fn add_user(&mut self, user: UserAccount) -> ShopResult<Uuid> {
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(ShopError::InvalidRequest(format!(
                "email already registered: {}",
                user.email
            )));
        }
        let id = user.id;
        self.users.push(user);
        Ok(id)
    }

    pub fn user(&self, user_id: Uuid) -> Option<&UserAccount> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn add_message(&mut self, message: ContactMessage) -> Uuid {
        let id = message.id;
        self.messages.push(message);
        id
    }
}

/// Handle to the shared shop data. Cheap to clone; all clones see the
/// same tables.
#[derive(Clone, Default)]
pub struct ShopStore {
    inner: Arc<Mutex<ShopData>>,
}

impl ShopStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with data (seeding, tests)
    pub fn with_data(data: ShopData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(data)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ShopData> {
        // A poisoned lock means a panic mid-read; the data itself is
        // still the last committed state, so recover it.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run a read-only query against the current committed state
    pub fn read<T>(&self, f: impl FnOnce(&ShopData) -> T) -> T {
        f(&self.lock())
    }

    /// Atomic unit of work: the closure mutates a working copy which
    /// replaces the committed state only if it returns `Ok`. On `Err`
    /// the copy is discarded and nothing is applied.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&mut ShopData) -> ShopResult<T>,
    ) -> ShopResult<T> {
        let mut guard = self.lock();
        let mut work = guard.clone();
        let out = f(&mut work)?;
        *guard = work;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Price};

    fn product(sku: &str, price: f64) -> Product {
        Product::new(sku, format!("Product {sku}"), Price::new(price, Currency::CLP), "tools")
    }

    #[test]
    fn test_duplicate_sku_rejected() {
        let mut data = ShopData::default();
        data.add_product(product("A-1", 1000.0)).unwrap();
        let err = data.add_product(product("A-1", 2000.0)).unwrap_err();
        assert!(matches!(err, ShopError::DuplicateSku { .. }));
    }

    #[test]
    fn test_repeat_add_increments_line() {
        let mut data = ShopData::default();
        let pid = data.add_product(product("A-1", 1000.0)).unwrap();
        let cart_id = data.ensure_cart(None, None);

        data.add_cart_item(cart_id, pid, 2).unwrap();
        let item = data.add_cart_item(cart_id, pid, 3).unwrap();

        assert_eq!(item.quantity, 5);
        assert_eq!(data.cart_items_of(cart_id).len(), 1);
    }

    #[test]
    fn test_user_cart_is_singular() {
        let mut data = ShopData::default();
        let user_id = Uuid::new_v4();

        let first = data.ensure_cart(Some(user_id), None);
        let second = data.ensure_cart(Some(user_id), None);

        assert_eq!(first, second);
        assert_eq!(data.carts.len(), 1);
    }

    #[test]
    fn test_guest_cart_by_id() {
        let mut data = ShopData::default();
        let guest_id = Uuid::new_v4();

        let cart_id = data.ensure_cart(None, Some(guest_id));
        assert_eq!(cart_id, guest_id);
        assert!(data.cart_for(CartRef::Guest(guest_id)).is_some());
        // A user id never resolves a guest cart
        assert!(data.cart_for(CartRef::User(guest_id)).is_none());
    }

    #[test]
    fn test_guest_cannot_claim_a_user_cart_id() {
        let mut data = ShopData::default();
        let pid = data.add_product(product("A-1", 1000.0)).unwrap();
        let user_id = Uuid::new_v4();

        let user_cart = data.ensure_cart(Some(user_id), None);
        data.add_cart_item(user_cart, pid, 2).unwrap();

        // A guest presenting the user's cart id gets a fresh cart, not
        // an alias onto the user's
        let guest_cart = data.ensure_cart(None, Some(user_cart));
        assert_ne!(guest_cart, user_cart);
        assert_eq!(data.carts.iter().filter(|c| c.id == user_cart).count(), 1);

        data.add_cart_item(guest_cart, pid, 1).unwrap();
        assert_eq!(data.cart_items_of(user_cart).len(), 1);
        assert_eq!(data.cart_items_of(user_cart)[0].quantity, 2);
        assert_eq!(data.cart_items_of(guest_cart).len(), 1);
    }

    #[test]
    fn test_product_referenced_by_order_is_protected() {
        let mut data = ShopData::default();
        let pid = data.add_product(product("A-1", 1000.0)).unwrap();
        data.order_items.push(OrderItem::new(
            Uuid::new_v4(),
            pid,
            1,
            Price::new(1000.0, Currency::CLP),
        ));

        let err = data.remove_product(pid).unwrap_err();
        assert!(matches!(err, ShopError::ProductReferenced { .. }));
        assert!(data.product(pid).is_some());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let store = ShopStore::new();
        store
            .transaction(|data| data.add_product(product("A-1", 1000.0)))
            .unwrap();

        let result: ShopResult<()> = store.transaction(|data| {
            data.add_product(product("B-2", 500.0))?;
            Err(ShopError::Processing("forced failure".into()))
        });

        assert!(result.is_err());
        store.read(|data| {
            assert_eq!(data.products.len(), 1);
            assert!(data.product_by_sku("B-2").is_none());
        });
    }

    #[test]
    fn test_cart_snapshot_totals() {
        let mut data = ShopData::default();
        let a = data.add_product(product("A-1", 1000.0)).unwrap();
        let b = data.add_product(product("B-2", 500.0)).unwrap();
        let cart_id = data.ensure_cart(None, None);
        data.add_cart_item(cart_id, a, 2).unwrap();
        data.add_cart_item(cart_id, b, 1).unwrap();

        let snapshot = data.cart_snapshot(CartRef::Guest(cart_id)).unwrap();
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.total.amount, 2500);
    }

    #[test]
    fn test_categories_distinct() {
        let mut data = ShopData::default();
        data.add_product(Product::new("A", "A", Price::new(1.0, Currency::CLP), "tools"))
            .unwrap();
        data.add_product(Product::new("B", "B", Price::new(1.0, Currency::CLP), "paint"))
            .unwrap();
        data.add_product(Product::new("C", "C", Price::new(1.0, Currency::CLP), "tools"))
            .unwrap();

        assert_eq!(data.categories(), vec!["tools", "paint"]);
    }
}
