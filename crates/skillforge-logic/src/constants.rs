//! Game-wide constants shared by the engine, the server module and the harness.
//!
//! Rates in the catalog are stored as scaled integers so accrual never
//! touches floating point. Use these constants to convert.

/// Seconds in one hour; every catalog rate is expressed per hour.
pub const SECONDS_PER_HOUR: u32 = 3600;

/// Scale of `ActionChoice::rate` and `Action::food_rate` (1000 = one unit per hour).
pub const RATE_MUL: u32 = 1000;

/// Scale of guaranteed reward rates (10 = one item per hour).
pub const GUAR_MUL: u32 = 10;

/// XP granted at creation, split across the avatar's start skills.
pub const START_XP: u32 = 374;

/// Default cap on the total remaining time in a queue (one day).
pub const MAX_TIME: u32 = 86_400;

/// Default cap on the number of queued entries.
pub const MAX_QUEUE_DEPTH: usize = 3;

/// Maximum number of (skill, xp) pairs reported for one entry.
pub const MAX_SKILLS_PER_ENTRY: usize = 3;

/// Maximum distinct input items per action choice.
pub const MAX_INPUTS_PER_CHOICE: usize = 2;

