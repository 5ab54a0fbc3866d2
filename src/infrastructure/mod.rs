//! Infrastructure layer - tier implementations, transport and fetch services

pub mod cache;
pub mod logging;
pub mod observability;
pub mod services;
pub mod transport;
