//! Fetch domain - strategies, requests and outcomes

mod outcome;
mod request;
mod strategy;

pub use outcome::FetchOutcome;
pub use request::FetchRequest;
pub use strategy::{FetchMode, Strategy};
