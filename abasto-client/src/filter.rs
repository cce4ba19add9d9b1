//! Wire filter grammar for the PostgREST-style store protocol
//!
//! Pure encoding of typed comparisons, ordering and pagination into the
//! store's query-string tokens. Column names are passed through untouched:
//! the store is the authority on schema, no client-side validation.

use std::fmt::Display;

/// Comparison operators supported by the wire grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
}

impl Op {
    pub fn token(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::Ilike => "ilike",
            Self::Is => "is",
        }
    }
}

/// Sort direction for the `order` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn token(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Encode a comparison into the store's `op.value` token
pub fn comparison(op: Op, value: impl Display) -> String {
    format!("{}.{}", op.token(), value)
}

/// Encode set membership as a parenthesized comma list: `in.(1,2,3)`
pub fn membership<T: Display>(values: &[T]) -> String {
    let list = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({list})")
}

/// Encode ordering: `column.asc` / `column.desc`
pub fn ordering(column: &str, dir: SortDir) -> String {
    format!("{}.{}", column, dir.token())
}

/// Encode an inclusive, zero-based row window for the `Range` header
pub fn range_header(start: u64, end: u64) -> String {
    format!("{start}-{end}")
}
