//! In-memory stand-in for the REST data store, used by integration tests
//!
//! Speaks the same wire subset the client encodes, over plain JSON rows
//! with auto-incrementing ids. No auth: the `apikey`/`Authorization`
//! headers are accepted and ignored. Write fault injection lets tests
//! exercise mid-batch failure and rollback paths deterministically.

mod matcher;
mod routes;
mod store;

pub use routes::router;
pub use store::MockStore;

/// Convenience: a fresh store plus its router
pub fn in_memory_store() -> (MockStore, axum::Router) {
    let store = MockStore::new();
    let router = router(store.clone());
    (store, router)
}
