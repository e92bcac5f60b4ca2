//! market-hex: livestock marketplace core (application services) and its
//! inbound HTTP adapter.

pub mod config;
pub mod errors;

pub mod application;

pub use market_types::{domain, ports};

pub mod inbound; // HTTP adapter (router, extractors, handlers)
