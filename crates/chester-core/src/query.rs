//! Backend-neutral query model.
//!
//! The core describes which rows it wants; adapters translate this into
//! their own dialect (PostgREST query strings, in-memory scans).

use std::cmp::Ordering;

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::ports::Row;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`
    Eq(String, Value),
    /// `column IS NULL OR column = ''`
    IsBlank(String),
    /// `column IN (values)`
    In(String, Vec<Value>),
}

impl Condition {
    pub fn column(&self) -> &str {
        match self {
            Condition::Eq(c, _) | Condition::IsBlank(c) | Condition::In(c, _) => c,
        }
    }

    fn matches(&self, row: &Row) -> bool {
        let field = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Condition::Eq(_, value) => loose_eq(field, value),
            Condition::IsBlank(_) => match field {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                _ => false,
            },
            Condition::In(_, values) => values.iter().any(|v| loose_eq(field, v)),
        }
    }
}

/// A conjunction of conditions. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    pub fn is_blank(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsBlank(column.to_string()));
        self
    }

    pub fn one_of<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.conditions.push(Condition::In(column.to_string(), values));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: true,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// `None` selects every column
    pub columns: Option<Vec<String>>,
    pub filter: Filter,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Run this query over an in-memory table.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> Vec<Row> {
        let mut matched: Vec<Row> = rows
            .into_iter()
            .filter(|r| self.filter.matches(r))
            .cloned()
            .collect();
        sort_rows(&mut matched, &self.order);
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched.into_iter().map(|r| self.project(r)).collect()
    }

    fn project(&self, row: Row) -> Row {
        let Some(columns) = &self.columns else {
            return row;
        };
        match row {
            Value::Object(mut obj) => {
                let mut out = Map::new();
                for c in columns {
                    if let Some(v) = obj.remove(c) {
                        out.insert(c.clone(), v);
                    }
                }
                Value::Object(out)
            }
            other => other,
        }
    }
}

/// Stable sort by each order key in turn.
pub fn sort_rows(rows: &mut [Row], order: &[Order]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for o in order {
            let av = a.get(&o.column).unwrap_or(&Value::Null);
            let bv = b.get(&o.column).unwrap_or(&Value::Null);
            let ord = compare_values(av, bv);
            let ord = if o.ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Timestamps compare chronologically (their text form varies in
/// fractional precision), numbers numerically, NULL before everything.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Ids are strings in the client but may be numbers in the row.
fn loose_eq(field: &Value, value: &Value) -> bool {
    match (field, value) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => field == value,
    }
}
