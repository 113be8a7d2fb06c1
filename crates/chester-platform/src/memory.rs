//! In-memory backend for offline use and demos.
//! Nothing survives a page reload.
//!
//! Implements both the data gateway and auth. Row semantics follow the
//! hosted backend closely enough for the core to behave identically:
//! ids are generated server-side, `created_at` defaults to now, updates
//! and deletes need a filter, and `increment_supports` is an atomic bump.

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use chester_core::ports::{procedures, tables, AuthPort, DataPort, Row};
use chester_core::query::{Filter, Query};
use chester_types::{ChesterError, Result, user::UserIdentity};

struct Account {
    password: String,
    user: UserIdentity,
}

pub struct MemoryGateway {
    tables: RefCell<HashMap<String, Vec<Row>>>,
    accounts: RefCell<HashMap<String, Account>>,
    current: RefCell<Option<UserIdentity>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            tables: RefCell::new(HashMap::new()),
            accounts: RefCell::new(HashMap::new()),
            current: RefCell::new(None),
        }
    }

    /// Start with `user` already signed in.
    pub fn with_user(user: UserIdentity) -> Self {
        let gateway = Self::new();
        gateway.set_current_user(Some(user));
        gateway
    }

    pub fn set_current_user(&self, user: Option<UserIdentity>) {
        *self.current.borrow_mut() = user;
    }

    /// Rows of a table as stored, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.borrow().get(table).cloned().unwrap_or_default()
    }

    fn require_filter(op: &str, table: &str, filter: &Filter) -> Result<()> {
        if filter.is_empty() {
            return Err(ChesterError::Validation(format!(
                "refusing unfiltered {} on {}",
                op, table
            )));
        }
        Ok(())
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl DataPort for MemoryGateway {
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>> {
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut obj) = row else {
                return Err(ChesterError::Validation(format!("{} rows must be objects", table)));
            };
            obj.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
            obj.entry("created_at").or_insert_with(|| json!(Utc::now()));
            stored.push(Value::Object(obj));
        }
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(&self, table: &str, patch: Row, filter: &Filter) -> Result<Vec<Row>> {
        Self::require_filter("update", table, filter)?;
        let Value::Object(patch) = patch else {
            return Err(ChesterError::Validation("patch must be an object".to_string()));
        };
        let mut store = self.tables.borrow_mut();
        let mut affected = Vec::new();
        for row in store.entry(table.to_string()).or_default() {
            if !filter.matches(row) {
                continue;
            }
            if let Value::Object(obj) = &mut *row {
                for (k, v) in &patch {
                    obj.insert(k.clone(), v.clone());
                }
            }
            affected.push(row.clone());
        }
        Ok(affected)
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
        Ok(query.apply(self.tables.borrow().get(table).into_iter().flatten()))
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        Self::require_filter("delete", table, filter)?;
        if let Some(rows) = self.tables.borrow_mut().get_mut(table) {
            rows.retain(|r| !filter.matches(r));
        }
        Ok(())
    }

    async fn rpc(&self, procedure: &str, args: Value) -> Result<Value> {
        if procedure != procedures::INCREMENT_SUPPORTS {
            return Err(ChesterError::Gateway(format!("unknown procedure {}", procedure)));
        }
        let post = Filter::new().eq("id", args["post_id"].clone());
        let mut store = self.tables.borrow_mut();
        let row = store
            .get_mut(tables::COMMUNITY_ENTRIES)
            .and_then(|rows| rows.iter_mut().find(|r| post.matches(r)))
            .ok_or_else(|| ChesterError::NotFound(format!("community entry {}", args["post_id"])))?;
        let supports = row["supports"].as_i64().unwrap_or(0) + 1;
        row["supports"] = json!(supports);
        Ok(Value::Null)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[async_trait(?Send)]
impl AuthPort for MemoryGateway {
    async fn current_user(&self) -> Result<Option<UserIdentity>> {
        Ok(self.current.borrow().clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let user = match self.accounts.borrow().get(email.trim()) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(ChesterError::Unauthenticated),
        };
        self.set_current_user(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ChesterError::Validation(
                "email and password are required".to_string(),
            ));
        }
        let mut accounts = self.accounts.borrow_mut();
        if accounts.contains_key(email) {
            return Err(ChesterError::Validation(format!("{} is already registered", email)));
        }
        let user = UserIdentity::new(Uuid::new_v4().to_string(), Some(email.to_string()));
        accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        drop(accounts);
        self.set_current_user(Some(user.clone()));
        log::info!("Registered {} in memory", email);
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.set_current_user(None);
        Ok(())
    }
}
