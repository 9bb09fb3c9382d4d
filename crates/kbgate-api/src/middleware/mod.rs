//! HTTP middleware layers
//!
//! Author: hephaex@gmail.com

pub mod cors;

pub use cors::cors_layer;
