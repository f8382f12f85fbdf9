//! Player state: experience, queue, and the in-progress action record.

use serde::{Deserialize, Serialize};

use crate::catalog::AreaId;
use crate::config::EngineConfig;
use crate::constants::MAX_SKILLS_PER_ENTRY;
use crate::error::EngineError;
use crate::ledger::OwnerId;
use crate::queue::QueuedAction;
use crate::skills::{Skill, SkillXp, StartSkills};

pub type PlayerId = u64;

/// What has already been credited for the in-progress head of the queue.
///
/// Lets a later abort distinguish credit already folded into the player's
/// totals from credit still pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentActionProgress {
    /// When the head entry started running (0 when the queue is empty).
    pub start_time: u64,
    /// Up to three (skill, xp credited so far) pairs.
    pub skills: Vec<(Skill, u32)>,
    /// Units of choice inputs consumed so far.
    pub base_inputs_consumed: u32,
    pub food_consumed: u32,
}

impl CurrentActionProgress {
    /// Progress for an entry starting at `start_time` with nothing credited yet.
    pub fn starting_at(start_time: u64) -> Self {
        Self {
            start_time,
            ..Self::default()
        }
    }

    /// Fold in more XP for `skill`, keeping at most three skills.
    pub fn add_xp(&mut self, skill: Skill, xp: u32) {
        if xp == 0 {
            return;
        }
        if let Some(entry) = self.skills.iter_mut().find(|(s, _)| *s == skill) {
            entry.1 = entry.1.saturating_add(xp);
        } else if self.skills.len() < MAX_SKILLS_PER_ENTRY {
            self.skills.push((skill, xp));
        }
    }

    pub fn xp_for(&self, skill: Skill) -> u32 {
        self.skills
            .iter()
            .find(|(s, _)| *s == skill)
            .map_or(0, |(_, xp)| *xp)
    }
}

/// A player and everything the engine persists for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub owner: OwnerId,
    pub start_skills: StartSkills,
    pub xp: SkillXp,
    pub total_xp: u64,
    pub progress: CurrentActionProgress,
    pub queue: Vec<QueuedAction>,
    /// Timestamp (seconds) up to which the queue has been accrued.
    pub last_processed_time: u64,
    /// World area the player is in.
    #[serde(default)]
    pub location: AreaId,
}

impl Player {
    /// Create a player and grant the configured start XP to its start skills.
    pub fn new(
        id: PlayerId,
        owner: OwnerId,
        start_skills: StartSkills,
        config: &EngineConfig,
        now: u64,
    ) -> Self {
        let mut xp = SkillXp::new();
        let mut total_xp = 0u64;
        for (skill, amount) in start_skills.initial_xp(config.start_xp) {
            total_xp += xp.add(skill, amount) as u64;
        }
        Self {
            id,
            owner,
            start_skills,
            xp,
            total_xp,
            progress: CurrentActionProgress::default(),
            queue: Vec::new(),
            last_processed_time: now,
            location: 0,
        }
    }

    pub fn xp(&self, skill: Skill) -> u32 {
        self.xp.get(skill)
    }

    pub fn has_queued_actions(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Credit XP, saturating per skill. Returns the amount actually added.
    pub fn grant_xp(&mut self, skill: Skill, amount: u32) -> u32 {
        let added = self.xp.add(skill, amount);
        self.total_xp = self.total_xp.saturating_add(added as u64);
        added
    }

    /// Debug XP edit: raise `skill` to at least `xp`. Only allowed on an idle player.
    pub fn raise_xp(&mut self, skill: Skill, xp: u32) -> Result<u32, EngineError> {
        if self.has_queued_actions() {
            return Err(EngineError::HasQueuedActions);
        }
        let added = self.xp.raise_to(skill, xp);
        self.total_xp = self.total_xp.saturating_add(added as u64);
        Ok(added)
    }
}
