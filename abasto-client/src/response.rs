//! Uniform response envelope
//!
//! Every executed query resolves to a [`StoreResponse`], never a raised
//! error, as long as the transport itself succeeded. The envelope carries
//! one of three outcomes: rows, a single row (or its explicit absence in
//! single mode) or a preserved store-side failure payload.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ErrorPayload, StoreError, StoreResult};

/// Parsed body of a request
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// 2xx with a JSON array body
    Rows(Vec<Value>),
    /// 2xx in single-row mode with an object body
    Single(Value),
    /// Single-row mode matched zero rows, a distinct outcome rather than an error
    Missing,
    /// 2xx with no usable body (e.g. 204 No Content)
    Empty,
}

/// Envelope for one executed query
#[derive(Debug, Clone)]
pub struct StoreResponse {
    pub status: u16,
    pub payload: Payload,
    pub error: Option<ErrorPayload>,
}

/// Media type the store answers with in single-row mode
pub const SINGLE_OBJECT_ACCEPT: &str = "application/vnd.pgrst.object+json";

impl StoreResponse {
    /// Build the envelope from a raw status/body pair
    ///
    /// `single` reflects the builder's single-row mode: it turns the
    /// store's zero-row rejection (406) into [`Payload::Missing`] and
    /// parses 2xx bodies as objects rather than arrays.
    pub fn from_wire(status: u16, body: &str, single: bool) -> Self {
        if (200..300).contains(&status) {
            let payload = match serde_json::from_str::<Value>(body) {
                Ok(Value::Array(rows)) => {
                    if single {
                        // Lenient stores may answer single mode with an array
                        match rows.into_iter().next() {
                            Some(row) => Payload::Single(row),
                            None => Payload::Missing,
                        }
                    } else {
                        Payload::Rows(rows)
                    }
                }
                Ok(Value::Null) => {
                    if single {
                        Payload::Missing
                    } else {
                        Payload::Empty
                    }
                }
                Ok(obj @ Value::Object(_)) => Payload::Single(obj),
                Ok(other) => Payload::Rows(vec![other]),
                Err(_) if body.trim().is_empty() => {
                    if single {
                        Payload::Missing
                    } else {
                        Payload::Empty
                    }
                }
                Err(_) => Payload::Empty,
            };
            return Self {
                status,
                payload,
                error: None,
            };
        }

        // The store rejects single-mode requests matching zero rows with
        // 406; that is the protocol's "no such row", not a failure.
        if single && status == 406 {
            return Self {
                status,
                payload: Payload::Missing,
                error: None,
            };
        }

        Self {
            status,
            payload: Payload::Empty,
            error: Some(ErrorPayload::from_body(status, body)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Promote a failure envelope into an error, passing success through
    pub fn into_result(self) -> StoreResult<Self> {
        match self.error {
            Some(payload) => Err(StoreError::upstream(self.status, payload)),
            None => Ok(self),
        }
    }

    /// Deserialize a row-list response
    pub fn rows<T: DeserializeOwned>(self) -> StoreResult<Vec<T>> {
        let ok = self.into_result()?;
        match ok.payload {
            Payload::Rows(rows) => rows
                .into_iter()
                .map(|row| serde_json::from_value(row).map_err(StoreError::from))
                .collect(),
            Payload::Empty => Ok(Vec::new()),
            Payload::Single(_) | Payload::Missing => Err(StoreError::InvalidResponse(
                "expected a row list, got a single-row response".into(),
            )),
        }
    }

    /// Deserialize a single-mode response; `Ok(None)` when nothing matched
    pub fn single<T: DeserializeOwned>(self) -> StoreResult<Option<T>> {
        let ok = self.into_result()?;
        match ok.payload {
            Payload::Single(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(StoreError::from),
            Payload::Missing | Payload::Empty => Ok(None),
            Payload::Rows(_) => Err(StoreError::InvalidResponse(
                "expected a single row, got a row list".into(),
            )),
        }
    }

    /// First row of a representation-returning write (insert/update)
    pub fn first<T: DeserializeOwned>(self) -> StoreResult<Option<T>> {
        let ok = self.into_result()?;
        match ok.payload {
            Payload::Rows(rows) => match rows.into_iter().next() {
                Some(row) => serde_json::from_value(row)
                    .map(Some)
                    .map_err(StoreError::from),
                None => Ok(None),
            },
            Payload::Single(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(StoreError::from),
            Payload::Missing | Payload::Empty => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_from_array_body() {
        let resp = StoreResponse::from_wire(200, r#"[{"id":1},{"id":2}]"#, false);
        assert!(resp.is_ok());
        let rows: Vec<Value> = resp.rows().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_single_mode_object_body() {
        let resp = StoreResponse::from_wire(200, r#"{"id":7}"#, true);
        assert_eq!(
            resp.single::<Value>().unwrap().unwrap()["id"],
            Value::from(7)
        );
    }

    #[test]
    fn test_single_mode_zero_rows_is_missing_not_error() {
        let resp = StoreResponse::from_wire(406, r#"{"message":"0 rows"}"#, true);
        assert!(resp.is_ok(), "zero-row single is not a failure");
        assert_eq!(resp.payload, Payload::Missing);
        assert_eq!(resp.single::<Value>().unwrap(), None);
    }

    #[test]
    fn test_single_mode_empty_array_is_missing() {
        let resp = StoreResponse::from_wire(200, "[]", true);
        assert_eq!(resp.payload, Payload::Missing);
    }

    #[test]
    fn test_failure_preserves_payload() {
        let resp = StoreResponse::from_wire(400, r#"{"message":"bad filter","code":"22P02"}"#, false);
        assert!(!resp.is_ok());
        let err = resp.into_result().unwrap_err();
        match err {
            StoreError::Upstream { status, payload } => {
                assert_eq!(status, 400);
                assert_eq!(payload.message, "bad filter");
                assert_eq!(payload.code.as_deref(), Some("22P02"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_failure_kept_as_raw_message() {
        let resp = StoreResponse::from_wire(503, "service unavailable", false);
        let err = resp.into_result().unwrap_err();
        match err {
            StoreError::Upstream { payload, .. } => {
                assert_eq!(payload.message, "service unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_content_is_empty_rows() {
        let resp = StoreResponse::from_wire(204, "", false);
        let rows: Vec<Value> = resp.rows().unwrap();
        assert!(rows.is_empty());
    }
}
