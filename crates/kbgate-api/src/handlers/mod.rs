//! API handlers
//!
//! Author: hephaex@gmail.com

pub mod health;
pub mod rag;
pub mod retrieve;
