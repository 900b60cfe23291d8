//! Transport bindings over the application services

pub mod http;
