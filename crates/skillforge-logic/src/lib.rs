//! Pure progression logic for SkillForge.
//!
//! This crate contains every rule of the idle-progression engine and nothing
//! that depends on a database or runtime. Functions take plain data and
//! return results, so the same code runs inside the SpacetimeDB module, in
//! the headless harness, and in clients predicting their own progress.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`accrual`] | Pure elapsed-time accrual: XP, item deltas, queue transitions |
//! | [`catalog`] | Read-only action, choice and item definitions |
//! | [`commit`] | Start/process entry points that apply accrual exactly once |
//! | [`config`] | Queue limits and affinity bonuses, loadable from JSON |
//! | [`constants`] | Rate multipliers, start XP, queue and input limits |
//! | [`error`] | `EngineError` and the reason codes it carries |
//! | [`ledger`] | Item balance seam and the in-memory ledger |
//! | [`persistence`] | Versioned bincode snapshots of the world |
//! | [`player`] | Player state and the in-progress action record |
//! | [`queue`] | Queue entries and the merge policy |
//! | [`skills`] | Skills, saturating XP counters |
//! | [`validation`] | Ordered validation gate and batch probe |
//! | [`world`] | In-memory players, active designations, authorization |

pub mod accrual;
pub mod catalog;
pub mod commit;
pub mod config;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod persistence;
pub mod player;
pub mod queue;
pub mod skills;
pub mod validation;
pub mod world;

pub use accrual::{accrue, AccrualResult, EntryOutcome, EntryStatus};
pub use catalog::{Catalog, InMemoryCatalog};
pub use commit::GameState;
pub use config::EngineConfig;
pub use error::{EngineError, Reason};
pub use ledger::{InMemoryLedger, ResourceLedger};
pub use player::{Player, PlayerId};
pub use queue::{MergeMode, QueuedAction, QueuedActionInput};
pub use skills::{Skill, StartSkills};
pub use world::World;
