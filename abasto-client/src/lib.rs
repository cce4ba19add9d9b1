//! Typed client for the PostgREST-style REST data store
//!
//! Layers, bottom-up:
//! - [`filter`]: pure wire-grammar encoding (operators, ordering, ranges)
//! - [`executor`]: transport seam, pooled HTTP or in-process router
//! - [`response`]: uniform envelope over rows / single-row / failure
//! - [`query`]: fluent single-use builder, the only way to compose requests
//! - [`client`]: configuration, auth headers, entry point

pub mod client;
pub mod error;
pub mod executor;
pub mod filter;
pub mod query;
pub mod response;

pub use client::{StoreClient, StoreConfig};
pub use error::{ErrorPayload, StoreError, StoreResult};
pub use executor::{Executor, HttpTransport, RouterTransport, Transport, WireRequest, WireResponse};
pub use filter::{Op, SortDir};
pub use query::QueryBuilder;
pub use response::{Payload, StoreResponse, SINGLE_OBJECT_ACCEPT};
