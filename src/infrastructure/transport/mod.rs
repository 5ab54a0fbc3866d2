//! Network transport implementations

mod http_client;

pub use http_client::HttpTransport;

#[cfg(test)]
pub use http_client::mock::MockTransport;
