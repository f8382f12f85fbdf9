//! Skills, experience counters and progression maths.
//!
//! Every player carries one experience counter per [`Skill`]. Counters are
//! `u32` and saturate at `u32::MAX` instead of wrapping, so granting huge
//! amounts repeatedly always converges on the maximum.
//!
//! ```
//! use skillforge_logic::skills::{Skill, SkillXp};
//!
//! let mut xp = SkillXp::default();
//! xp.add(Skill::Woodcutting, u32::MAX);
//! xp.add(Skill::Woodcutting, 10);
//! assert_eq!(xp.get(Skill::Woodcutting), u32::MAX);
//! ```
//!
//! # Affinity bonus
//!
//! Avatars start with one or two innate skills. Training a start skill earns
//! a flat percentage bonus on the base XP rate: the full single-skill bonus
//! when the avatar has exactly one start skill, the smaller dual-skill bonus
//! when it has two distinct ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::constants::SECONDS_PER_HOUR;

/// All trainable skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skill {
    Combat,
    Melee,
    Ranged,
    Magic,
    Defence,
    Health,
    Mining,
    Smithing,
    Woodcutting,
    Firemaking,
    Fishing,
    Cooking,
    Crafting,
    Thieving,
    Agility,
}

impl Skill {
    /// All skills in storage order.
    pub const ALL: [Skill; 15] = [
        Skill::Combat,
        Skill::Melee,
        Skill::Ranged,
        Skill::Magic,
        Skill::Defence,
        Skill::Health,
        Skill::Mining,
        Skill::Smithing,
        Skill::Woodcutting,
        Skill::Firemaking,
        Skill::Fishing,
        Skill::Cooking,
        Skill::Crafting,
        Skill::Thieving,
        Skill::Agility,
    ];

    /// Storage id (1-based; 0 is reserved for "no skill").
    pub fn to_u8(self) -> u8 {
        Skill::ALL
            .iter()
            .position(|s| *s == self)
            .map_or(0, |i| i as u8 + 1)
    }

    /// Inverse of [`Skill::to_u8`]. Returns `None` for 0 and unknown ids.
    pub fn from_u8(val: u8) -> Option<Skill> {
        match val {
            0 => None,
            v => Skill::ALL.get(v as usize - 1).copied(),
        }
    }

    /// Whether XP in this skill comes from fighting.
    pub fn is_combat(self) -> bool {
        matches!(
            self,
            Skill::Combat
                | Skill::Melee
                | Skill::Ranged
                | Skill::Magic
                | Skill::Defence
                | Skill::Health
        )
    }
}

/// Per-skill experience counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillXp {
    counters: BTreeMap<Skill, u32>,
}

impl SkillXp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current XP in `skill` (0 if never trained).
    pub fn get(&self, skill: Skill) -> u32 {
        self.counters.get(&skill).copied().unwrap_or(0)
    }

    /// Add XP, saturating at `u32::MAX`. Returns the amount actually added.
    pub fn add(&mut self, skill: Skill, amount: u32) -> u32 {
        let current = self.get(skill);
        let next = current.saturating_add(amount);
        if next != current {
            self.counters.insert(skill, next);
        }
        next - current
    }

    /// Raise `skill` to at least `xp`. Returns the amount added (0 if already above).
    pub fn raise_to(&mut self, skill: Skill, xp: u32) -> u32 {
        let current = self.get(skill);
        if xp <= current {
            return 0;
        }
        self.counters.insert(skill, xp);
        xp - current
    }

    /// Iterate trained skills in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Skill, u32)> + '_ {
        self.counters.iter().map(|(s, xp)| (*s, *xp))
    }
}

/// The innate skills an avatar starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSkills {
    pub first: Skill,
    pub second: Option<Skill>,
}

impl StartSkills {
    /// Build a start-skill pair; a duplicated second skill collapses to one.
    pub fn new(first: Skill, second: Option<Skill>) -> Self {
        let second = second.filter(|s| *s != first);
        Self { first, second }
    }

    pub fn single(first: Skill) -> Self {
        Self::new(first, None)
    }

    pub fn contains(&self, skill: Skill) -> bool {
        self.first == skill || self.second == Some(skill)
    }

    /// How `start_xp` is split between the start skills.
    ///
    /// A single skill gets everything; two skills share it evenly with any
    /// odd remainder going to the first.
    pub fn initial_xp(&self, start_xp: u32) -> Vec<(Skill, u32)> {
        match self.second {
            None => vec![(self.first, start_xp)],
            Some(second) => {
                let half = start_xp / 2;
                vec![(self.first, start_xp - half), (second, half)]
            }
        }
    }

    /// Additive bonus percentage for training `skill`.
    pub fn affinity_bonus_percent(&self, skill: Skill, config: &EngineConfig) -> u32 {
        if !self.contains(skill) {
            return 0;
        }
        match self.second {
            None => config.single_start_skill_bonus_percent,
            Some(_) => config.dual_start_skill_bonus_percent,
        }
    }
}

/// XP earned for `seconds` of work at `xp_per_hour`, with an additive bonus.
///
/// Computed as `floor(seconds * xp_per_hour * (100 + bonus) / (3600 * 100))`
/// in wide integers so there is no rounding beyond the single floor.
pub fn xp_for_elapsed(seconds: u32, xp_per_hour: u32, bonus_percent: u32) -> u64 {
    let numerator = seconds as u128 * xp_per_hour as u128 * (100 + bonus_percent as u128);
    let xp = numerator / (SECONDS_PER_HOUR as u128 * 100);
    xp.min(u64::MAX as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_ids_roundtrip_and_zero_is_none() {
        for skill in Skill::ALL {
            assert_eq!(Skill::from_u8(skill.to_u8()), Some(skill));
        }
        assert_eq!(Skill::from_u8(0), None);
        assert_eq!(Skill::from_u8(200), None);
    }

    #[test]
    fn xp_saturates_instead_of_wrapping() {
        let mut xp = SkillXp::new();
        for _ in 0..300 {
            xp.add(Skill::Woodcutting, 16_000_000 * 24);
        }
        assert_eq!(xp.get(Skill::Woodcutting), u32::MAX);
        assert_eq!(xp.add(Skill::Woodcutting, 5), 0);
    }

    #[test]
    fn raise_to_never_lowers() {
        let mut xp = SkillXp::new();
        xp.add(Skill::Mining, 500);
        assert_eq!(xp.raise_to(Skill::Mining, 100), 0);
        assert_eq!(xp.get(Skill::Mining), 500);
        assert_eq!(xp.raise_to(Skill::Mining, 700), 200);
        assert_eq!(xp.get(Skill::Mining), 700);
    }

    #[test]
    fn start_xp_single_and_split() {
        let single = StartSkills::single(Skill::Firemaking);
        assert_eq!(single.initial_xp(374), vec![(Skill::Firemaking, 374)]);

        let dual = StartSkills::new(Skill::Firemaking, Some(Skill::Health));
        assert_eq!(
            dual.initial_xp(374),
            vec![(Skill::Firemaking, 187), (Skill::Health, 187)]
        );
    }

    #[test]
    fn duplicate_start_skill_collapses() {
        let s = StartSkills::new(Skill::Fishing, Some(Skill::Fishing));
        assert_eq!(s.second, None);
    }

    #[test]
    fn affinity_bonus_rules() {
        let config = EngineConfig::default();
        let single = StartSkills::single(Skill::Woodcutting);
        assert_eq!(single.affinity_bonus_percent(Skill::Woodcutting, &config), 10);
        assert_eq!(single.affinity_bonus_percent(Skill::Fishing, &config), 0);

        let dual = StartSkills::new(Skill::Thieving, Some(Skill::Woodcutting));
        assert_eq!(dual.affinity_bonus_percent(Skill::Woodcutting, &config), 5);
        assert_eq!(dual.affinity_bonus_percent(Skill::Thieving, &config), 5);
        assert_eq!(dual.affinity_bonus_percent(Skill::Mining, &config), 0);
    }

    #[test]
    fn xp_is_floored_once() {
        // 361 seconds at 3600 xp/h is 361 xp exactly; at 3590 xp/h it floors.
        assert_eq!(xp_for_elapsed(361, 3600, 0), 361);
        assert_eq!(xp_for_elapsed(361, 3590, 0), 359);
        assert_eq!(xp_for_elapsed(3600, 3600, 10), 3960);
        assert_eq!(xp_for_elapsed(3600, 3600, 5), 3780);
    }
}
