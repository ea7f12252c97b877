//! API handlers module

pub mod authority;
pub mod citations;
pub mod health;
