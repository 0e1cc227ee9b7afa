//! Cached Fetch Module
//!
//! Read-through caching in front of a remote JSON endpoint. Only plain reads
//! (GET) are looked up in and stored to the cache; every other method goes
//! straight to the transport.

mod cached;
mod request;
mod transport;

pub use cached::CachedFetcher;
pub use request::FetchRequest;
pub use transport::{HttpTransport, Transport};
