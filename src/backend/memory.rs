//! In-memory Backend
//!
//! Tables, views and accounts held in process. Every call is recorded so
//! tests can assert exactly which requests a view-model issued, and any
//! table/operation pair can be told to fail with a given message.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{Backend, BackendError, BackendResult, Filter, Select};
use crate::session::{Session, SignUpRequest, SignUpResponse, User};

/// Kind of request, used for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SignIn,
    SignUp,
    SignOut,
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
}

/// One recorded request
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SignIn { email: String },
    SignUp { email: String },
    SignOut,
    Select { table: String, filters: Vec<Filter> },
    Insert { table: String, row: Value },
    Update { table: String, filter: Filter, patch: Value },
    Delete { table: String, filter: Filter },
    Upsert { table: String, row: Value },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::SignIn { .. } => Operation::SignIn,
            Call::SignUp { .. } => Operation::SignUp,
            Call::SignOut => Operation::SignOut,
            Call::Select { .. } => Operation::Select,
            Call::Insert { .. } => Operation::Insert,
            Call::Update { .. } => Operation::Update,
            Call::Delete { .. } => Operation::Delete,
            Call::Upsert { .. } => Operation::Upsert,
        }
    }

    /// Table touched by a data call
    pub fn table(&self) -> Option<&str> {
        match self {
            Call::Select { table, .. }
            | Call::Insert { table, .. }
            | Call::Update { table, .. }
            | Call::Delete { table, .. }
            | Call::Upsert { table, .. } => Some(table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: User,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    serial_keys: HashMap<String, String>,
    next_serial: i64,
    ticks: i64,
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    require_confirmation: bool,
    failures: HashMap<(String, Operation), String>,
    calls: Vec<Call>,
}

/// In-process implementation of [`Backend`]
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Empty backend. `sales_orders` rows get a serial `order_number`,
    /// every other table a uuid `id`.
    pub fn new() -> Self {
        let mut serial_keys = HashMap::new();
        serial_keys.insert("sales_orders".to_string(), "order_number".to_string());

        Self {
            state: Mutex::new(State {
                serial_keys,
                next_serial: 1000,
                ..State::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an account that can sign in
    pub fn with_account(self, email: &str, password: &str) -> Self {
        {
            let mut state = self.state();
            let user = User::new(Uuid::new_v4(), email);
            state.accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    user,
                },
            );
        }
        self
    }

    /// Start with this session already established
    pub fn with_session(self, session: Session) -> Self {
        self.state().session = Some(session);
        self
    }

    /// Sign-ups return no session until the address is confirmed
    pub fn require_confirmation(self, required: bool) -> Self {
        self.state().require_confirmation = required;
        self
    }

    /// Seed rows directly, bypassing the call log
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut state = self.state();
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Make the next and all later `operation` calls on `table` fail
    pub fn fail(&self, table: &str, operation: Operation, message: &str) {
        self.state()
            .failures
            .insert((table.to_string(), operation), message.to_string());
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Current contents of a table
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Number of recorded calls of one kind, optionally on one table
    pub fn count(&self, operation: Operation, table: Option<&str>) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .filter(|c| table.map_or(true, |t| c.table() == Some(t)))
            .count()
    }

    /// The user id registered for an email
    pub fn user_id(&self, email: &str) -> Option<Uuid> {
        self.state().accounts.get(email).map(|a| a.user.id)
    }
}

impl State {
    fn check_failure(&self, table: &str, operation: Operation) -> BackendResult<()> {
        match self.failures.get(&(table.to_string(), operation)) {
            Some(message) => Err(BackendError::Api {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Logical clock so `created_at` strictly increases between inserts
    fn tick(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        let base = Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        base + Duration::seconds(self.ticks)
    }

    fn session_for(&mut self, user: User) -> Session {
        self.ticks += 1;
        Session {
            access_token: format!("memory-token-{}", self.ticks),
            refresh_token: Some(format!("memory-refresh-{}", self.ticks)),
            expires_at: None,
            user,
        }
    }

    /// Fill in generated columns the way the database defaults would
    fn with_defaults(&mut self, table: &str, row: Value) -> BackendResult<Map<String, Value>> {
        let Value::Object(mut object) = row else {
            return Err(BackendError::Api {
                status: 400,
                message: "row must be a JSON object".to_string(),
            });
        };

        match self.serial_keys.get(table).cloned() {
            Some(column) => {
                if !object.contains_key(&column) {
                    self.next_serial += 1;
                    object.insert(column, Value::from(self.next_serial));
                }
            }
            None => {
                if !object.contains_key("id") {
                    object.insert("id".to_string(), Value::from(Uuid::new_v4().to_string()));
                }
            }
        }

        if !object.contains_key("created_at") {
            let now = self.tick().to_rfc3339();
            object.insert("created_at".to_string(), Value::from(now));
        }

        Ok(object)
    }
}

/// How a cell compares against an equality filter
fn filter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    row.get(&filter.column)
        .map(|cell| filter_text(cell) == filter.value)
        .unwrap_or(false)
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        // Nulls and missing cells sort last
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn project(row: &Value, columns: &str) -> Value {
    if columns.trim() == "*" {
        return row.clone();
    }
    let mut projected = Map::new();
    for column in columns.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if let Some(cell) = row.get(column) {
            projected.insert(column.to_string(), cell.clone());
        }
    }
    Value::Object(projected)
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        let mut state = self.state();
        state.calls.push(Call::SignIn {
            email: email.to_string(),
        });
        state.check_failure("auth", Operation::SignIn)?;

        let account = state
            .accounts
            .get(email)
            .filter(|a| a.password == password)
            .cloned()
            .ok_or_else(|| BackendError::Auth("Invalid login credentials".to_string()))?;

        let session = state.session_for(account.user);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> BackendResult<SignUpResponse> {
        let mut state = self.state();
        state.calls.push(Call::SignUp {
            email: request.email.clone(),
        });
        state.check_failure("auth", Operation::SignUp)?;

        if state.accounts.contains_key(&request.email) {
            return Err(BackendError::Auth("User already registered".to_string()));
        }

        let mut user = User::new(Uuid::new_v4(), request.email.clone());
        user.user_metadata = request
            .data
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect();
        state.accounts.insert(
            request.email.clone(),
            Account {
                password: request.password.clone(),
                user: user.clone(),
            },
        );

        let session = if state.require_confirmation {
            None
        } else {
            let session = state.session_for(user.clone());
            state.session = Some(session.clone());
            Some(session)
        };

        Ok(SignUpResponse {
            user: Some(user),
            session,
        })
    }

    async fn sign_out(&self) -> BackendResult<()> {
        let mut state = self.state();
        state.calls.push(Call::SignOut);
        state.session = None;
        state.check_failure("auth", Operation::SignOut)
    }

    async fn session(&self) -> BackendResult<Option<Session>> {
        Ok(self.state().session.clone())
    }

    async fn select(&self, query: &Select) -> BackendResult<Vec<Value>> {
        let mut state = self.state();
        state.calls.push(Call::Select {
            table: query.table.clone(),
            filters: query.filters.clone(),
        });
        state.check_failure(&query.table, Operation::Select)?;

        let mut rows: Vec<Value> = state
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_cells(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows.iter().map(|row| project(row, &query.columns)).collect())
    }

    async fn insert(&self, table: &str, row: Value) -> BackendResult<Vec<Value>> {
        let mut state = self.state();
        state.calls.push(Call::Insert {
            table: table.to_string(),
            row: row.clone(),
        });
        state.check_failure(table, Operation::Insert)?;

        let stored = Value::Object(state.with_defaults(table, row)?);
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());
        Ok(vec![stored])
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> BackendResult<Vec<Value>> {
        let mut state = self.state();
        state.calls.push(Call::Update {
            table: table.to_string(),
            filter: filter.clone(),
            patch: patch.clone(),
        });
        state.check_failure(table, Operation::Update)?;

        let Value::Object(fields) = patch else {
            return Err(BackendError::Api {
                status: 400,
                message: "patch must be a JSON object".to_string(),
            });
        };

        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches(row, filter)) {
                if let Value::Object(object) = row {
                    for (k, v) in &fields {
                        object.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> BackendResult<()> {
        let mut state = self.state();
        state.calls.push(Call::Delete {
            table: table.to_string(),
            filter: filter.clone(),
        });
        state.check_failure(table, Operation::Delete)?;

        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|row| !matches(row, filter));
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, row: Value) -> BackendResult<Vec<Value>> {
        let mut state = self.state();
        state.calls.push(Call::Upsert {
            table: table.to_string(),
            row: row.clone(),
        });
        state.check_failure(table, Operation::Upsert)?;

        let position = row.get("id").map(filter_text).and_then(|id| {
            let filter = Filter::eq("id", id);
            state
                .tables
                .get(table)
                .and_then(|rows| rows.iter().position(|r| matches(r, &filter)))
        });

        if let (Some(index), Value::Object(fields)) = (position, &row) {
            let existing = state
                .tables
                .get_mut(table)
                .and_then(|rows| rows.get_mut(index));
            if let Some(Value::Object(object)) = existing {
                for (k, v) in fields {
                    object.insert(k.clone(), v.clone());
                }
                return Ok(vec![Value::Object(object.clone())]);
            }
        }

        let stored = Value::Object(state.with_defaults(table, row)?);
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());
        Ok(vec![stored])
    }
}
