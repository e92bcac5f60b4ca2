//! market-types: domain model and repository ports shared by the adapters.

pub mod domain;
pub mod ports;
