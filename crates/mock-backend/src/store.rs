//! In-memory data store.
//!
//! Tables are vectors of JSON rows keyed by table name, evaluated against a
//! small subset of PostgREST query syntax: `col=eq.value`, `col=ilike.*term*`,
//! `order=col.asc|desc`, `limit=n`, and `select` with embedded resources
//! (`author:profiles(full_name,avatar_url)`). Base columns are always
//! returned whole; `select` only controls embeds.

use std::collections::HashMap;

use serde_json::{Map, Value};

use kollabx_models::UserId;

use crate::error::ApiError;

/// Tables the REST surface exposes.
pub const TABLES: &[&str] = &[
    "profiles",
    "projects",
    "applications",
    "team_members",
    "channels",
    "messages",
    "notifications",
];

// ---------------------------------------------------------------------------
// Query model
// ---------------------------------------------------------------------------

/// One row filter.
#[derive(Debug, Clone)]
pub enum Filter {
    /// `col=eq.value`
    Eq(String, String),
    /// `col=ilike.*term*`
    ILike(String, String),
}

/// An embedded resource requested via `select`.
#[derive(Debug, Clone)]
pub struct Embed {
    /// Key the joined object is inserted under.
    pub alias: String,
    /// Foreign table name.
    pub table: String,
    /// Columns to copy from the foreign row; empty means all.
    pub columns: Vec<String>,
}

/// A parsed table query.
#[derive(Debug, Clone, Default)]
pub struct TableQuery {
    pub filters: Vec<Filter>,
    pub embeds: Vec<Embed>,
    /// `(column, ascending)`.
    pub order: Option<(String, bool)>,
    pub limit: Option<usize>,
}

impl TableQuery {
    /// Parse from decoded query-string pairs.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        let mut query = Self::default();

        for (key, value) in pairs {
            match key.as_str() {
                "select" => query.embeds = parse_embeds(value)?,
                "order" => {
                    let (col, dir) = value
                        .rsplit_once('.')
                        .ok_or_else(|| ApiError::BadRequest(format!("bad order: {value}")))?;
                    let ascending = match dir {
                        "asc" => true,
                        "desc" => false,
                        other => {
                            return Err(ApiError::BadRequest(format!(
                                "bad order direction: {other}"
                            )))
                        }
                    };
                    query.order = Some((col.to_string(), ascending));
                }
                "limit" => {
                    let n = value
                        .parse()
                        .map_err(|_| ApiError::BadRequest(format!("bad limit: {value}")))?;
                    query.limit = Some(n);
                }
                col => {
                    if let Some(needle) = value.strip_prefix("eq.") {
                        query
                            .filters
                            .push(Filter::Eq(col.to_string(), needle.to_string()));
                    } else if let Some(pattern) = value.strip_prefix("ilike.") {
                        query
                            .filters
                            .push(Filter::ILike(col.to_string(), pattern.to_string()));
                    } else {
                        return Err(ApiError::BadRequest(format!(
                            "unsupported operator in {col}={value}"
                        )));
                    }
                }
            }
        }

        Ok(query)
    }
}

/// Parse the embed list out of a `select` value, ignoring base columns.
fn parse_embeds(select: &str) -> Result<Vec<Embed>, ApiError> {
    let mut embeds = Vec::new();
    let mut rest = select;

    while !rest.is_empty() {
        // Embeds contain a parenthesized column list, so they cannot be
        // split on commas naively.
        if let Some(paren) = rest.find('(') {
            let comma = rest.find(',');
            if comma.is_none() || comma.unwrap() > paren {
                let close = rest
                    .find(')')
                    .ok_or_else(|| ApiError::BadRequest(format!("bad select: {select}")))?;
                let head = &rest[..paren];
                let (alias, table) = match head.split_once(':') {
                    Some((a, t)) => (a.to_string(), t.to_string()),
                    None => (head.to_string(), head.to_string()),
                };
                let columns = rest[paren + 1..close]
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty() && *c != "*")
                    .map(String::from)
                    .collect();
                embeds.push(Embed { alias, table, columns });
                rest = rest[close + 1..].trim_start_matches(',');
                continue;
            }
        }
        match rest.split_once(',') {
            Some((_, tail)) => rest = tail,
            None => break,
        }
    }

    Ok(embeds)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// A registered user account.
#[derive(Debug, Clone)]
struct Account {
    email: String,
    password: String,
    user_id: UserId,
}

/// All backend state. Kept behind a mutex by the router.
#[derive(Debug)]
pub struct Store {
    tables: HashMap<String, Vec<Value>>,
    accounts: Vec<Account>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        let tables = TABLES
            .iter()
            .map(|name| ((*name).to_string(), Vec::new()))
            .collect();
        Self {
            tables,
            accounts: Vec::new(),
        }
    }

    // -- accounts -----------------------------------------------------------

    /// Register a new account. Emails are unique.
    pub fn create_account(
        &mut self,
        email: &str,
        password: &str,
        user_id: UserId,
    ) -> Result<(), ApiError> {
        if self.accounts.iter().any(|a| a.email == email) {
            return Err(ApiError::Conflict(format!("email already registered: {email}")));
        }
        self.accounts.push(Account {
            email: email.to_string(),
            password: password.to_string(),
            user_id,
        });
        Ok(())
    }

    /// Check credentials, returning the account's user id on success.
    pub fn verify_credentials(&self, email: &str, password: &str) -> Option<UserId> {
        self.accounts
            .iter()
            .find(|a| a.email == email && a.password == password)
            .map(|a| a.user_id)
    }

    // -- rows ---------------------------------------------------------------

    fn table(&self, name: &str) -> Result<&Vec<Value>, ApiError> {
        self.tables
            .get(name)
            .ok_or_else(|| ApiError::NotFound(format!("no such table: {name}")))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Vec<Value>, ApiError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| ApiError::NotFound(format!("no such table: {name}")))
    }

    /// Run a query against a table.
    pub fn select(&self, table: &str, query: &TableQuery) -> Result<Vec<Value>, ApiError> {
        let rows = self.table(table)?;
        let mut out: Vec<Value> = rows
            .iter()
            .filter(|row| matches_all(row, &query.filters))
            .cloned()
            .collect();

        if let Some((col, ascending)) = &query.order {
            out.sort_by(|a, b| {
                let ord = compare_values(&a[col.as_str()], &b[col.as_str()]);
                if *ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        if let Some(limit) = query.limit {
            out.truncate(limit);
        }

        for row in &mut out {
            self.apply_embeds(row, &query.embeds);
        }

        Ok(out)
    }

    /// Append a row. The caller supplies defaults and ids.
    pub fn insert(&mut self, table: &str, row: Value) -> Result<Value, ApiError> {
        self.table_mut(table)?.push(row.clone());
        Ok(row)
    }

    /// Patch all rows matching the filters, returning the updated rows.
    pub fn update(
        &mut self,
        table: &str,
        filters: &[Filter],
        patch: &Map<String, Value>,
    ) -> Result<Vec<Value>, ApiError> {
        let rows = self.table_mut(table)?;
        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if matches_all(row, filters) {
                if let Some(obj) = row.as_object_mut() {
                    for (key, value) in patch {
                        obj.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    /// Delete all rows matching the filters, returning how many were removed.
    pub fn delete(&mut self, table: &str, filters: &[Filter]) -> Result<usize, ApiError> {
        let rows = self.table_mut(table)?;
        let before = rows.len();
        rows.retain(|row| !matches_all(row, filters));
        Ok(before - rows.len())
    }

    /// Find a single row by its `id` column.
    pub fn find_by_id(&self, table: &str, id: &str) -> Result<Option<Value>, ApiError> {
        let rows = self.table(table)?;
        Ok(rows
            .iter()
            .find(|row| row["id"].as_str() == Some(id))
            .cloned())
    }

    // -- embeds -------------------------------------------------------------

    fn apply_embeds(&self, row: &mut Value, embeds: &[Embed]) {
        for embed in embeds {
            // The embed alias decides which local column carries the key.
            let (fk_column, foreign_key) = match embed.table.as_str() {
                "profiles" => ("user_id", "id"),
                "projects" => ("project_id", "id"),
                _ => continue,
            };

            let key = row[fk_column].clone();
            let joined = self
                .tables
                .get(&embed.table)
                .and_then(|rows| rows.iter().find(|r| r[foreign_key] == key));

            let value = match joined {
                Some(foreign) if embed.columns.is_empty() => foreign.clone(),
                Some(foreign) => {
                    let mut picked = Map::new();
                    for col in &embed.columns {
                        picked.insert(col.clone(), foreign[col.as_str()].clone());
                    }
                    Value::Object(picked)
                }
                None => Value::Null,
            };

            if let Some(obj) = row.as_object_mut() {
                obj.insert(embed.alias.clone(), value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Matching and ordering
// ---------------------------------------------------------------------------

fn matches_all(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq(col, needle) => value_eq(&row[col.as_str()], needle),
        Filter::ILike(col, pattern) => value_ilike(&row[col.as_str()], pattern),
    })
}

fn value_eq(field: &Value, needle: &str) -> bool {
    match field {
        Value::String(s) => s == needle,
        Value::Bool(b) => b.to_string() == needle,
        Value::Number(n) => n.to_string() == needle,
        _ => false,
    }
}

fn value_ilike(field: &Value, pattern: &str) -> bool {
    let Some(text) = field.as_str() else {
        return false;
    };
    let text = text.to_lowercase();
    let needle = pattern.trim_matches('*').to_lowercase();
    if pattern.starts_with('*') || pattern.ends_with('*') {
        text.contains(&needle)
    } else {
        text == needle
    }
}

fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        // RFC 3339 timestamps sort correctly as strings.
        _ => a
            .as_str()
            .unwrap_or_default()
            .cmp(b.as_str().unwrap_or_default()),
    }
}
