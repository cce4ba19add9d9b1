//! REST surface: a small PostgREST-compatible subset over [`MockStore`]
//!
//! Covers what the client crate actually speaks: comparison/membership
//! filters, `order`/`limit`/`Range` shaping, single-object mode with the
//! 406 zero-row rejection, representation-returning writes and
//! merge-duplicates upsert.

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use serde_json::{Value, json};

use crate::matcher::{Filter, sort_rows};
use crate::store::MockStore;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

pub fn router(store: MockStore) -> Router {
    Router::new()
        .route("/rest/v1/{table}", any(dispatch))
        .with_state(store)
}

struct Query {
    filters: Vec<Filter>,
    order: Option<String>,
    limit: Option<usize>,
    conflict_columns: Vec<String>,
}

fn parse_query(raw: Option<&str>) -> Query {
    let pairs: Vec<(String, String)> = match raw {
        Some(raw) => decode_pairs(raw),
        None => Vec::new(),
    };

    let mut query = Query {
        filters: Vec::new(),
        order: None,
        limit: None,
        conflict_columns: Vec::new(),
    };
    for (name, value) in pairs {
        match name.as_str() {
            "select" => {}
            "order" => query.order = Some(value),
            "limit" => {
                query.limit = value.parse().ok();
            }
            "on_conflict" => {
                query.conflict_columns =
                    value.split(',').map(|c| c.trim().to_string()).collect();
            }
            _ => {
                if let Some(filter) = Filter::parse(&name, &value) {
                    query.filters.push(filter);
                }
            }
        }
    }
    query
}

fn decode_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            let (name, value) = piece.split_once('=').unwrap_or((piece, ""));
            (percent_decode(name), percent_decode(value))
        })
        .collect()
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = &input[i + 1..i + 3];
                match u8::from_str_radix(hex, 16) {
                    Ok(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    Err(_) => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).to_string()
}

fn error_response(status: StatusCode, message: &str, code: &str) -> Response {
    (status, Json(json!({"message": message, "code": code}))).into_response()
}

/// Parse an inclusive `Range: start-end` header
fn parse_range(headers: &HeaderMap) -> Option<(usize, usize)> {
    let raw = headers.get("Range")?.to_str().ok()?;
    let (start, end) = raw.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}

fn wants_single(headers: &HeaderMap) -> bool {
    headers
        .get("Accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains(SINGLE_OBJECT))
}

fn prefers_merge(headers: &HeaderMap) -> bool {
    headers
        .get("Prefer")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|prefer| prefer.contains("resolution=merge-duplicates"))
}

fn body_rows(body: Option<Value>) -> Result<Vec<Value>, Response> {
    match body {
        Some(Value::Array(rows)) => Ok(rows),
        Some(obj @ Value::Object(_)) => Ok(vec![obj]),
        _ => Err(error_response(
            StatusCode::BAD_REQUEST,
            "request body must be a JSON object or array",
            "PGRST102",
        )),
    }
}

fn finish(rows: Vec<Value>, single: bool) -> Response {
    if single {
        if rows.len() == 1 {
            let row = rows.into_iter().next().unwrap_or(Value::Null);
            return (StatusCode::OK, Json(row)).into_response();
        }
        return error_response(
            StatusCode::NOT_ACCEPTABLE,
            "JSON object requested, multiple (or no) rows returned",
            "PGRST116",
        );
    }
    (StatusCode::OK, Json(Value::Array(rows))).into_response()
}

async fn dispatch(
    State(store): State<MockStore>,
    Path(table): Path<String>,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
    method: http::Method,
    body: axum::body::Bytes,
) -> Response {
    let query = parse_query(raw.as_deref());
    let single = wants_single(&headers);
    let body: Option<Value> = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(err) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("Failed to parse the request body as JSON: {err}"),
                    "PGRST102",
                );
            }
        }
    };

    if method != http::Method::GET && store.write_should_fail(&table) {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "injected write failure",
            "XX000",
        );
    }

    match method.as_str() {
        "GET" => {
            let mut rows = store.with_table(&table, |rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect::<Vec<_>>()
            });
            if let Some(order) = &query.order {
                sort_rows(&mut rows, order);
            }
            if let Some((start, end)) = parse_range(&headers) {
                rows = rows
                    .into_iter()
                    .skip(start)
                    .take(end.saturating_sub(start) + 1)
                    .collect();
            }
            if let Some(limit) = query.limit {
                rows.truncate(limit);
            }
            finish(rows, single)
        }
        "POST" => {
            let rows = match body_rows(body) {
                Ok(rows) => rows,
                Err(resp) => return resp,
            };
            let stored = if prefers_merge(&headers) && !query.conflict_columns.is_empty() {
                store.upsert_rows(&table, rows, &query.conflict_columns)
            } else {
                store.insert_rows(&table, rows)
            };
            (StatusCode::CREATED, Json(Value::Array(stored))).into_response()
        }
        "PATCH" => {
            let Some(Value::Object(changes)) = body else {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "update body must be a JSON object",
                    "PGRST102",
                );
            };
            let updated = store.with_table(&table, |rows| {
                let mut updated = Vec::new();
                for row in rows.iter_mut() {
                    if query.filters.iter().all(|f| f.matches(row)) {
                        if let Value::Object(target) = row {
                            for (key, value) in &changes {
                                target.insert(key.clone(), value.clone());
                            }
                        }
                        updated.push(row.clone());
                    }
                }
                updated
            });
            finish(updated, single)
        }
        "DELETE" => {
            let removed = store.with_table(&table, |rows| {
                let mut removed = Vec::new();
                rows.retain(|row| {
                    if query.filters.iter().all(|f| f.matches(row)) {
                        removed.push(row.clone());
                        false
                    } else {
                        true
                    }
                });
                removed
            });
            finish(removed, single)
        }
        _ => error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "unsupported method",
            "PGRST105",
        ),
    }
}
