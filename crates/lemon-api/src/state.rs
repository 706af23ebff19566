//! # Application State
//!
//! Shared state for the Axum application: configuration, the in-memory
//! stores, and the optional database pool.
//!
//! ## Storage model
//!
//! The in-memory stores are authoritative for request handling. When
//! `DATABASE_URL` is configured, every write is pushed through to
//! Postgres and the stores are hydrated from it at startup; without a
//! database the API runs in-memory only (development and tests). The
//! cart store additionally owns the critical sections that make
//! duplicate detection and order conversion race-free.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

use lemon_auth::{Role, RoleSet};
use lemon_core::{CartLineId, CategoryId, MenuItemId, OrderId, UserId, Username};
use lemon_orders::{CartError, CartLine, OrderRecord};

use crate::auth::SecretString;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A principal known to the service, with resolved role memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: UserId,
    /// Username as forwarded by the authentication gateway.
    pub username: Username,
    /// Role memberships. May be empty.
    pub roles: RoleSet,
    /// When the user was first seen.
    pub created_at: DateTime<Utc>,
}

/// A menu category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryRecord {
    /// Unique category identifier.
    pub id: CategoryId,
    /// URL-safe unique slug.
    pub slug: String,
    /// Display title.
    pub title: String,
}

/// A menu item in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MenuItemRecord {
    /// Unique menu item identifier.
    pub id: MenuItemId,
    /// Display title.
    pub title: String,
    /// Current price. Snapshotted into cart lines at add time.
    #[schema(value_type = String)]
    pub price: Decimal,
    /// Whether the item is featured.
    pub featured: bool,
    /// The category this item belongs to.
    pub category_id: CategoryId,
}

// ---------------------------------------------------------------------------
// Generic keyed store
// ---------------------------------------------------------------------------

/// A keyed in-memory store guarded by a read-write lock.
///
/// Values are cloned out; handlers never hold the lock across an await
/// point.
#[derive(Debug, Clone)]
pub struct Store<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Default for Store<K, V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    /// Fetch a value by key.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    /// Insert or replace a value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    /// Remove a value by key.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.write().remove(key)
    }

    /// Apply a mutation to the value under the write lock, if present.
    pub fn update<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.inner.write().get_mut(key).map(f)
    }

    /// Snapshot all values.
    pub fn list(&self) -> Vec<V> {
        self.inner.read().values().cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

// ---------------------------------------------------------------------------
// User store (username-indexed)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct UserMaps {
    by_id: HashMap<UserId, UserRecord>,
    by_name: HashMap<Username, UserId>,
}

/// The user registry, indexed by id and by username.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    inner: Arc<RwLock<UserMaps>>,
}

impl UserStore {
    /// Fetch a user by id.
    pub fn get(&self, id: &UserId) -> Option<UserRecord> {
        self.inner.read().by_id.get(id).cloned()
    }

    /// Fetch a user by username.
    pub fn get_by_username(&self, username: &Username) -> Option<UserRecord> {
        let maps = self.inner.read();
        maps.by_name
            .get(username)
            .and_then(|id| maps.by_id.get(id))
            .cloned()
    }

    /// Insert or replace a user record.
    pub fn insert(&self, record: UserRecord) {
        let mut maps = self.inner.write();
        maps.by_name.insert(record.username.clone(), record.id);
        maps.by_id.insert(record.id, record);
    }

    /// Fetch the user for `username`, inserting `make()` if absent.
    ///
    /// The lookup and insert happen under one write lock so two
    /// concurrent first requests for the same username provision a
    /// single record.
    pub fn get_or_insert_with(
        &self,
        username: &Username,
        make: impl FnOnce() -> UserRecord,
    ) -> (UserRecord, bool) {
        let mut maps = self.inner.write();
        if let Some(id) = maps.by_name.get(username) {
            if let Some(existing) = maps.by_id.get(id) {
                return (existing.clone(), false);
            }
        }
        let record = make();
        maps.by_name.insert(record.username.clone(), record.id);
        maps.by_id.insert(record.id, record.clone());
        (record, true)
    }

    /// Apply a role-set mutation to a user, returning the updated record.
    pub fn update_roles(
        &self,
        username: &Username,
        f: impl FnOnce(&mut RoleSet),
    ) -> Option<UserRecord> {
        let mut maps = self.inner.write();
        let id = *maps.by_name.get(username)?;
        let record = maps.by_id.get_mut(&id)?;
        f(&mut record.roles);
        Some(record.clone())
    }

    /// All users holding `role`, sorted by username.
    pub fn list_with_role(&self, role: Role) -> Vec<UserRecord> {
        let maps = self.inner.read();
        let mut users: Vec<UserRecord> = maps
            .by_id
            .values()
            .filter(|u| u.roles.contains(role))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().by_id.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Cart store
// ---------------------------------------------------------------------------

/// The cart ledger: pending lines grouped by owning customer.
///
/// All multi-step invariants live behind this store's write lock:
/// duplicate detection on add, and the atomic take that feeds order
/// conversion.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    inner: Arc<RwLock<HashMap<UserId, Vec<CartLine>>>>,
}

impl CartStore {
    /// Snapshot a customer's cart lines, oldest first.
    pub fn list(&self, user_id: &UserId) -> Vec<CartLine> {
        self.inner.read().get(user_id).cloned().unwrap_or_default()
    }

    /// Add a line, rejecting a second line for the same menu item.
    ///
    /// The duplicate check and the insert happen under one write lock,
    /// so two concurrent adds of the same item cannot both pass.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::DuplicateItem`] if the customer already has
    /// a line for the item.
    pub fn add(&self, line: CartLine) -> Result<CartLine, CartError> {
        let mut carts = self.inner.write();
        let lines = carts.entry(line.user_id).or_default();
        if lines.iter().any(|l| l.menu_item_id == line.menu_item_id) {
            return Err(CartError::DuplicateItem {
                menu_item_id: line.menu_item_id,
            });
        }
        lines.push(line.clone());
        Ok(line)
    }

    /// Atomically remove and return all of a customer's lines.
    ///
    /// Feeds both cart clearing and order conversion. A second
    /// concurrent take observes an empty cart — a cart line is consumed
    /// exactly once.
    pub fn take_all(&self, user_id: &UserId) -> Vec<CartLine> {
        self.inner.write().remove(user_id).unwrap_or_default()
    }

    /// Put lines back after a failed downstream persist.
    ///
    /// Lines added concurrently since the take are preserved; restored
    /// lines are appended next to them.
    pub fn restore(&self, user_id: UserId, lines: Vec<CartLine>) {
        if lines.is_empty() {
            return;
        }
        self.inner.write().entry(user_id).or_default().extend(lines);
    }

    /// Remove a specific line from a customer's cart.
    pub fn remove_line(&self, user_id: &UserId, line_id: &CartLineId) -> Option<CartLine> {
        let mut carts = self.inner.write();
        let lines = carts.get_mut(user_id)?;
        let idx = lines.iter().position(|l| &l.id == line_id)?;
        let removed = lines.remove(idx);
        if lines.is_empty() {
            carts.remove(user_id);
        }
        Some(removed)
    }

    /// Drop every line referencing `menu_item_id` (catalog deletion).
    pub fn remove_item_lines(&self, menu_item_id: &MenuItemId) -> usize {
        let mut carts = self.inner.write();
        let mut removed = 0;
        carts.retain(|_, lines| {
            let before = lines.len();
            lines.retain(|l| &l.menu_item_id != menu_item_id);
            removed += before - lines.len();
            !lines.is_empty()
        });
        removed
    }

    /// Total pending lines across all carts.
    pub fn total_lines(&self) -> usize {
        self.inner.read().values().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Service configuration, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// TCP port to bind (`LEMON_PORT`, default 8080).
    pub port: u16,
    /// Optional service bearer token required on every `/api` request
    /// (`LEMON_AUTH_TOKEN`). When unset, only the forwarded principal
    /// header is required.
    pub auth_token: Option<SecretString>,
    /// Username granted the Manager role at startup
    /// (`LEMON_BOOTSTRAP_MANAGER`).
    pub bootstrap_manager: Option<Username>,
}

impl AppConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let port = std::env::var("LEMON_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let auth_token = std::env::var("LEMON_AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretString::new);

        let bootstrap_manager = match std::env::var("LEMON_BOOTSTRAP_MANAGER") {
            Ok(raw) if !raw.is_empty() => match Username::new(raw) {
                Ok(name) => Some(name),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed LEMON_BOOTSTRAP_MANAGER");
                    None
                }
            },
            _ => None,
        };

        Self {
            port,
            auth_token,
            bootstrap_manager,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Arc<AppConfig>,
    /// User registry (the role registry's backing store).
    pub users: UserStore,
    /// Menu categories.
    pub categories: Store<CategoryId, CategoryRecord>,
    /// Menu items.
    pub menu_items: Store<MenuItemId, MenuItemRecord>,
    /// Cart ledger.
    pub carts: CartStore,
    /// Placed orders with embedded item snapshots.
    pub orders: Store<OrderId, OrderRecord>,
    /// Database pool for write-through persistence, when configured.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// In-memory-only state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// State with explicit configuration and an optional database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            config: Arc::new(config),
            users: UserStore::default(),
            categories: Store::default(),
            menu_items: Store::default(),
            carts: CartStore::default(),
            orders: Store::default(),
            db_pool,
        }
    }

    /// Load every store from the database. Called once at startup.
    pub async fn hydrate(&self) -> Result<(), sqlx::Error> {
        let Some(pool) = &self.db_pool else {
            return Ok(());
        };

        for user in crate::db::users::load_all(pool).await? {
            self.users.insert(user);
        }
        for category in crate::db::catalog::load_all_categories(pool).await? {
            self.categories.insert(category.id, category);
        }
        for item in crate::db::catalog::load_all_menu_items(pool).await? {
            self.menu_items.insert(item.id, item);
        }
        for line in crate::db::cart::load_all(pool).await? {
            if let Err(e) = self.carts.add(line) {
                tracing::warn!(error = %e, "skipping conflicting cart line during hydration");
            }
        }
        for order in crate::db::orders::load_all(pool).await? {
            if !order.total_matches_items() {
                tracing::warn!(order_id = %order.id, "hydrated order total does not match its items");
            }
            self.orders.insert(order.id, order);
        }

        tracing::info!(
            users = self.users.len(),
            menu_items = self.menu_items.len(),
            cart_lines = self.carts.total_lines(),
            orders = self.orders.len(),
            "state hydrated from database"
        );
        Ok(())
    }

    /// Grant the Manager role to the configured bootstrap user,
    /// provisioning the user record if it does not exist yet.
    pub async fn apply_bootstrap_manager(&self) -> Result<(), sqlx::Error> {
        let Some(username) = self.config.bootstrap_manager.clone() else {
            return Ok(());
        };

        let (mut record, created) = self.users.get_or_insert_with(&username, || UserRecord {
            id: UserId::new(),
            username: username.clone(),
            roles: RoleSet::empty(),
            created_at: Utc::now(),
        });
        if !record.roles.contains(Role::Manager) {
            record = self
                .users
                .update_roles(&username, |roles| roles.insert(Role::Manager))
                .unwrap_or(record);
        }

        if let Some(pool) = &self.db_pool {
            crate::db::users::upsert(pool, &record).await?;
        }
        tracing::info!(username = %username, created, "bootstrap manager applied");
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
