//! Fluent, single-use query builder
//!
//! One builder composes exactly one request: an operation verb plus any
//! number of filters and modifiers, finalized by the terminal [`execute`]
//! call. Every method takes `self` by value, so a finalized builder cannot
//! be reused; the "already executed" guard is enforced at compile time.
//!
//! [`execute`]: QueryBuilder::execute

use std::fmt::Display;

use http::Method;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::executor::{Executor, WireRequest};
use crate::filter::{self, Op, SortDir};
use crate::response::{SINGLE_OBJECT_ACCEPT, StoreResponse};

/// Operation verb, set by the first builder call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Select,
    Insert,
    Update,
    Upsert,
    Delete,
}

impl Verb {
    fn method(self) -> Method {
        match self {
            Self::Select => Method::GET,
            Self::Insert | Self::Upsert => Method::POST,
            Self::Update => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }
}

/// Single-use builder for one store request
pub struct QueryBuilder {
    executor: Executor,
    table: String,
    verb: Verb,
    headers: Vec<(String, String)>,
    params: Vec<(String, String)>,
    body: Option<Value>,
    single: bool,
    /// First builder misuse, reported by `execute`
    defect: Option<String>,
}

impl QueryBuilder {
    pub(crate) fn new(executor: Executor, base_headers: &[(String, String)], table: &str) -> Self {
        Self {
            executor,
            table: table.to_string(),
            verb: Verb::Select,
            headers: base_headers.to_vec(),
            params: Vec::new(),
            body: None,
            single: false,
            defect: None,
        }
    }

    // ========== Operation verbs ==========

    /// Read rows, projecting the given columns (`*` for all)
    pub fn select(mut self, columns: &str) -> Self {
        self.verb = Verb::Select;
        self.param("select", columns);
        self
    }

    /// Insert one row (object) or several (array), returning the representation
    pub fn insert(mut self, data: Value) -> Self {
        self.verb = Verb::Insert;
        self.body = Some(data);
        self.header("Prefer", "return=representation");
        self
    }

    /// Update rows matched by the attached filters
    pub fn update(mut self, data: Value) -> Self {
        self.verb = Verb::Update;
        self.body = Some(data);
        self.header("Prefer", "return=representation");
        self
    }

    /// Insert-or-merge on the given conflict-target column list
    ///
    /// The conflict target is mandatory: without it the store would fall
    /// back to plain-insert semantics, which is never what an upsert
    /// caller wants. An empty target is a caller error surfaced by
    /// `execute`.
    pub fn upsert(mut self, data: Value, on_conflict: &str) -> Self {
        self.verb = Verb::Upsert;
        self.body = Some(data);
        self.header("Prefer", "return=representation,resolution=merge-duplicates");
        if on_conflict.trim().is_empty() {
            self.set_defect("upsert requires an explicit conflict-target column list");
        } else {
            self.param("on_conflict", on_conflict);
        }
        self
    }

    /// Delete rows matched by the attached filters
    pub fn delete(mut self) -> Self {
        self.verb = Verb::Delete;
        self.header("Prefer", "return=representation");
        self
    }

    // ========== Filters (valid for every verb) ==========

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.comparison(column, Op::Eq, value)
    }

    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.comparison(column, Op::Neq, value)
    }

    pub fn gt(self, column: &str, value: impl Display) -> Self {
        self.comparison(column, Op::Gt, value)
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.comparison(column, Op::Gte, value)
    }

    pub fn lt(self, column: &str, value: impl Display) -> Self {
        self.comparison(column, Op::Lt, value)
    }

    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.comparison(column, Op::Lte, value)
    }

    /// Case-sensitive pattern match (`%` wildcards)
    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.comparison(column, Op::Like, pattern)
    }

    /// Case-insensitive pattern match (`%` wildcards)
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.comparison(column, Op::Ilike, pattern)
    }

    /// Set membership: `column=in.(a,b,c)`
    pub fn in_list<T: Display>(mut self, column: &str, values: &[T]) -> Self {
        let token = filter::membership(values);
        self.param(column, &token);
        self
    }

    /// Null/boolean test: `column=is.null`, `column=is.true`
    pub fn is(self, column: &str, value: &str) -> Self {
        self.comparison(column, Op::Is, value)
    }

    // ========== Modifiers ==========

    pub fn order(mut self, column: &str, dir: SortDir) -> Self {
        let token = filter::ordering(column, dir);
        self.param("order", &token);
        self
    }

    /// Row-count pagination
    pub fn limit(mut self, n: u64) -> Self {
        self.param("limit", &n.to_string());
        self
    }

    /// Offset pagination: inclusive, zero-based `Range` header
    pub fn range(mut self, start: u64, end: u64) -> Self {
        let window = filter::range_header(start, end);
        self.header("Range", &window);
        self
    }

    /// Expect exactly one row; zero matches resolve to a distinct
    /// not-found payload rather than an error or an empty list
    pub fn single(mut self) -> Self {
        self.single = true;
        self.header("Accept", SINGLE_OBJECT_ACCEPT);
        self
    }

    // ========== Finalization ==========

    /// Assemble the wire request without sending it
    pub fn build(self) -> StoreResult<WireRequest> {
        if let Some(defect) = self.defect {
            return Err(StoreError::InvalidQuery(defect));
        }
        Ok(WireRequest {
            method: self.verb.method(),
            table: self.table,
            headers: self.headers,
            params: self.params,
            body: self.body,
            single: self.single,
        })
    }

    /// Terminal call: issue the request and return the uniform envelope
    pub async fn execute(self) -> StoreResult<StoreResponse> {
        let executor = self.executor.clone();
        let request = self.build()?;
        executor.execute(request).await
    }

    // ========== Internal ==========

    fn comparison(mut self, column: &str, op: Op, value: impl Display) -> Self {
        let token = filter::comparison(op, value);
        self.param(column, &token);
        self
    }

    fn param(&mut self, name: &str, value: &str) {
        // Last write wins, matching the store's one-value-per-key grammar
        self.params.retain(|(n, _)| n != name);
        self.params.push((name.to_string(), value.to_string()));
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn set_defect(&mut self, message: &str) {
        if self.defect.is_none() {
            self.defect = Some(message.to_string());
        }
    }
}
