//! Fetch services built on the response cache and a transport

mod fetch_client;
mod fetch_coordinator;
mod fetch_handle;

pub use fetch_client::FetchClient;
pub use fetch_coordinator::FetchCoordinator;
pub use fetch_handle::{FetchCanceller, FetchHandle};
