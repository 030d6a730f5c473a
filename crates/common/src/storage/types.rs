//! Query description types for row stores
//!
//! A [`RowQuery`] fully describes a read against a remote table. It is
//! serializable so that its JSON form can serve as a deterministic cache key:
//! two queries produce the same key exactly when table, filters (in order),
//! ordering and limit are equal.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row as returned by a row store: column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

/// Comparison operator of a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    /// Equal
    Eq,
    /// Not equal
    Neq,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
}

impl FilterOp {
    /// PostgREST operator token (`eq`, `gte`, ...)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

/// Column predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Column name
    pub column: String,
    /// Operator
    pub op: FilterOp,
    /// Operand
    pub value: Value,
}

impl Filter {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { column: column.into(), op: FilterOp::Eq, value: value.into() }
    }

    /// Arbitrary comparison
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self { column: column.into(), op, value: value.into() }
    }

    /// Evaluate the predicate against a row. Missing columns never match.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(&self.column) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Neq => actual != &self.value,
            op => match compare_values(actual, &self.value) {
                Some(ord) => match op {
                    FilterOp::Gt => ord == Ordering::Greater,
                    FilterOp::Gte => ord != Ordering::Less,
                    FilterOp::Lt => ord == Ordering::Less,
                    FilterOp::Lte => ord != Ordering::Greater,
                    FilterOp::Eq | FilterOp::Neq => false,
                },
                None => false,
            },
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column to sort by
    pub column: String,
    /// Ascending when `true`
    pub ascending: bool,
}

/// Full description of a row-store read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowQuery {
    /// Table name
    pub table: String,
    /// Conjunction of predicates, evaluated in order
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Optional ordering
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    /// Optional maximum number of rows
    #[serde(default)]
    pub limit: Option<usize>,
}

impl RowQuery {
    /// Select every row of `table`
    pub fn table(table: impl Into<String>) -> Self {
        Self { table: table.into(), filters: Vec::new(), order_by: None, limit: None }
    }

    /// Add a predicate
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Shorthand for an equality predicate
    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    /// Set ordering
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order_by = Some(OrderBy { column: column.into(), ascending });
        self
    }

    /// Set row limit
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Deterministic cache key derived from the whole description.
    pub fn cache_key(&self) -> String {
        // Serializing plain data with string keys cannot fail.
        let encoded = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        format!("query:{encoded}")
    }

    /// Apply filters, ordering and limit to an in-memory row set.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<Row>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut selected: Vec<Row> = rows
            .into_iter()
            .filter(|row| self.filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();

        if let Some(order) = &self.order_by {
            selected.sort_by(|a, b| {
                let ord = match (a.get(&order.column), b.get(&order.column)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
