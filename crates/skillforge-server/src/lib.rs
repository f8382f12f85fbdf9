//! SkillForge Server - SpacetimeDB Module
//!
//! Persists players, queues, catalog rows and item balances. Every rule lives
//! in skillforge-logic; reducers load rows, call into it, and write back.

mod adapters;
mod reducers;
mod tables;

pub use reducers::*;
pub use tables::*;
