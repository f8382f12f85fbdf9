//! Elapsed-time accrual: turns wall-clock time into XP, item deltas and
//! queue transitions without touching any state.
//!
//! Both the preview path and the commit path call [`accrue`]; the commit
//! path then applies the returned deltas. Because the computation is shared
//! the two can never disagree.
//!
//! # Cumulative crediting
//!
//! Every quantity credited for an entry is a function of the seconds it has
//! run in total. A slice from `before` to `after` is credited
//! `f(after) - f(before)`, so many short runs add up to exactly one long run.
//!
//! When an action produces whole units (a choice with a rate, or guaranteed
//! rewards), XP is credited only for the time covered by completed units:
//! at 100 logs per hour, 361 seconds yields 10 logs and 360 seconds of XP.
//!
//! # Starvation
//!
//! Held equipment must stay in the owner's balance and inputs or food must
//! be affordable. An entry that runs short is credited up to the last point
//! it could pay for, then it and every entry behind it leave the queue.
//!
//! # Areas
//!
//! Actions belong to a world area. An entry for another area than the one
//! the player is in runs out its time without earning or consuming
//! anything. A travel entry that completes moves the player, so entries
//! behind it run in the new area.
//!
//! # Threshold rewards
//!
//! When the XP granted in a run lifts the player's total past one or more
//! catalog thresholds, their rewards join the run's item deltas.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::{ActionId, AreaId, Catalog, ChoiceId, ItemAmount, ItemId};
use crate::config::EngineConfig;
use crate::constants::{GUAR_MUL, RATE_MUL, SECONDS_PER_HOUR};
use crate::error::EngineError;
use crate::ledger::{ItemDelta, PendingBalances, ResourceLedger};
use crate::player::{CurrentActionProgress, Player};
use crate::queue::{CombatStyle, QueueId, QueuedAction};
use crate::skills::{xp_for_elapsed, Skill, SkillXp};

/// How one queue entry fared during an accrual run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Ran to the end of its timespan.
    Completed,
    /// Still running when the elapsed time ran out.
    PartiallyConsumed,
    /// Ran short of equipment, inputs or food.
    AbortedForResources,
}

/// Effects credited to one entry in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOutcome {
    pub queue_id: QueueId,
    pub action_id: ActionId,
    pub choice_id: Option<ChoiceId>,
    /// Seconds credited in this run.
    pub time_consumed: u32,
    /// Up to three (skill, xp) pairs, after saturation.
    pub xp: Vec<(Skill, u32)>,
    pub consumed: Vec<ItemAmount>,
    pub produced: Vec<ItemAmount>,
    pub food_consumed: u32,
    /// XP credited to this entry by earlier commits (in-progress head only).
    pub previously_credited: Vec<(Skill, u32)>,
    pub status: EntryStatus,
}

/// Everything advancing a player's queue to `now` would change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualResult {
    pub now: u64,
    /// Seconds since the last processed time.
    pub elapsed: u64,
    /// Elapsed seconds the queue could not absorb.
    pub unused_time: u64,
    /// Entries that received time, in queue order.
    pub entries: Vec<EntryOutcome>,
    /// XP per skill, summed across entries and clipped to headroom.
    pub xp_deltas: Vec<(Skill, u32)>,
    /// Net item changes for the owner, sorted by item.
    pub item_deltas: Vec<ItemDelta>,
    /// The live queue after this run.
    pub remaining_queue: Vec<QueuedAction>,
    /// Entries removed by starvation.
    pub dropped: Vec<QueueId>,
    /// Progress record for the head of `remaining_queue`.
    pub progress: CurrentActionProgress,
    /// Items granted for total-XP thresholds crossed in this run.
    /// Already included in `item_deltas`.
    pub threshold_rewards: Vec<ItemAmount>,
    /// Area the player is in after this run.
    pub location: AreaId,
}

impl AccrualResult {
    pub fn total_xp(&self) -> u64 {
        self.xp_deltas.iter().map(|(_, xp)| *xp as u64).sum()
    }

    pub fn starved(&self) -> bool {
        !self.dropped.is_empty()
    }

    pub fn xp_for(&self, skill: Skill) -> u32 {
        self.xp_deltas
            .iter()
            .find(|(s, _)| *s == skill)
            .map_or(0, |(_, xp)| *xp)
    }

    pub fn item_delta(&self, item: ItemId) -> i64 {
        self.item_deltas
            .iter()
            .find(|d| d.item == item)
            .map_or(0, |d| d.amount)
    }
}

/// Whole units completed after `t` seconds at `rate` per hour, scaled by `mul`.
#[derive(Debug, Clone, Copy)]
struct UnitClock {
    rate: u128,
    per: u128,
}

impl UnitClock {
    fn new(rate: u32, mul: u32) -> Option<Self> {
        (rate > 0).then(|| Self {
            rate: rate as u128,
            per: SECONDS_PER_HOUR as u128 * mul as u128,
        })
    }

    fn count(&self, t: u32) -> u64 {
        (t as u128 * self.rate / self.per) as u64
    }

    /// Second at which unit `n` completes.
    fn completion_time(&self, n: u64) -> u32 {
        let t = (n as u128 * self.per).div_ceil(self.rate);
        t.min(u32::MAX as u128) as u32
    }

    /// Latest time in `[from, to]` by which at most `budget` more units complete.
    fn last_affordable(&self, from: u32, to: u32, budget: u64) -> u32 {
        let allowed = self.count(from) as u128 + budget as u128 + 1;
        let first_over = (allowed * self.per).div_ceil(self.rate);
        first_over
            .saturating_sub(1)
            .min(to as u128)
            .max(from as u128) as u32
    }
}

/// Items produced `per_unit` at a time on a clock.
#[derive(Debug, Clone, Copy)]
struct Yield {
    item: ItemId,
    per_unit: u32,
    clock: UnitClock,
}

/// Rates and routing for one entry, resolved from the catalog.
struct EntryPlan {
    skill: Skill,
    xp_per_hour: u32,
    bonus_percent: u32,
    /// Combat XP also trains Health at a third of the rate.
    health_share: bool,
    /// Clock whose completed units quantize XP and drive inputs.
    units: Option<UnitClock>,
    inputs: Vec<ItemAmount>,
    yields: Vec<Yield>,
    success_percent: u32,
    food: Option<(ItemId, UnitClock)>,
    held: Vec<ItemId>,
    /// Area the entry must run in to have any effect.
    area: AreaId,
    /// Where a completed travel entry leaves the player.
    destination: Option<AreaId>,
}

impl EntryPlan {
    fn resolve(
        entry: &QueuedAction,
        player: &Player,
        catalog: &dyn Catalog,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let action = catalog.action(entry.input.action_id)?;
        let choice = match entry.input.choice_id {
            Some(id) => Some(catalog.action_choice(id)?),
            None => None,
        };

        let trained = choice.as_ref().map_or(action.skill, |c| c.skill);
        let skill = if action.is_combat() && entry.input.combat_style == CombatStyle::Defence {
            Skill::Defence
        } else {
            trained
        };
        let xp_per_hour = choice
            .as_ref()
            .map(|c| c.xp_per_hour)
            .filter(|xp| *xp > 0)
            .unwrap_or(action.xp_per_hour);

        let mut yields = Vec::new();
        let mut inputs = Vec::new();
        let mut units = None;
        if let Some(choice) = &choice {
            if let Some(clock) = UnitClock::new(choice.rate, RATE_MUL) {
                units = Some(clock);
                inputs = choice.inputs.iter().copied().filter(|i| i.amount > 0).collect();
                if let Some(output) = choice.output {
                    yields.push(Yield {
                        item: output.item,
                        per_unit: output.amount,
                        clock,
                    });
                }
            }
        }
        for reward in &action.guaranteed_rewards {
            if let Some(clock) = UnitClock::new(reward.rate, GUAR_MUL) {
                units.get_or_insert(clock);
                yields.push(Yield {
                    item: reward.item,
                    per_unit: 1,
                    clock,
                });
            }
        }

        let (area, destination) = match choice.as_ref().and_then(|c| c.travel) {
            Some(travel) => (travel.from, Some(travel.to)),
            None => (action.world_location, None),
        };

        let food = match entry.input.regenerate {
            Some(item) if action.is_combat() => {
                UnitClock::new(action.food_rate, RATE_MUL).map(|clock| (item, clock))
            }
            _ => None,
        };

        Ok(Self {
            skill,
            xp_per_hour,
            bonus_percent: player
                .start_skills
                .affinity_bonus_percent(skill, config),
            health_share: action.is_combat(),
            units,
            inputs,
            yields,
            success_percent: action.success_percent.min(100) as u32,
            food,
            held: entry.input.held_items(),
            area,
            destination,
        })
    }

    /// Seconds of work backed by completed units.
    fn credited_time(&self, t: u32) -> u32 {
        match self.units {
            Some(clock) => clock.completion_time(clock.count(t)),
            None => t,
        }
    }

    fn xp_at(&self, t: u32) -> u64 {
        xp_for_elapsed(self.credited_time(t), self.xp_per_hour, self.bonus_percent)
    }

    /// Last second in `[from, to]` the owner can pay for.
    fn affordable_end(&self, from: u32, to: u32, view: &PendingBalances<'_>) -> u32 {
        if self.held.iter().any(|item| view.balance(*item) == 0) {
            return from;
        }
        let mut end = to;
        if let Some(clock) = self.units {
            let budget = self
                .inputs
                .iter()
                .map(|i| view.balance(i.item) / i.amount as u64)
                .min();
            if let Some(budget) = budget {
                end = clock.last_affordable(from, end, budget);
            }
        }
        if let Some((item, clock)) = self.food {
            end = clock.last_affordable(from, end, view.balance(item));
        }
        end
    }
}

/// Amounts credited for running an entry from `from` to `to` seconds.
#[derive(Default)]
struct Slice {
    xp: Vec<(Skill, u64)>,
    consumed: Vec<ItemAmount>,
    produced: Vec<ItemAmount>,
    input_units: u64,
    food: u64,
}

fn credit_slice(plan: &EntryPlan, from: u32, to: u32) -> Slice {
    let mut xp = Vec::with_capacity(2);
    let (xp_from, xp_to) = (plan.xp_at(from), plan.xp_at(to));
    xp.push((plan.skill, xp_to - xp_from));
    if plan.health_share {
        xp.push((Skill::Health, xp_to / 3 - xp_from / 3));
    }

    let input_units = plan
        .units
        .map_or(0, |clock| clock.count(to) - clock.count(from));
    let consumed = plan
        .inputs
        .iter()
        .map(|i| ItemAmount {
            item: i.item,
            amount: input_units
                .saturating_mul(i.amount as u64)
                .min(u32::MAX as u64) as u32,
        })
        .filter(|i| i.amount > 0)
        .collect();

    let produced_at = |y: &Yield, t: u32| {
        y.clock
            .count(t)
            .saturating_mul(y.per_unit as u64)
            .saturating_mul(plan.success_percent as u64)
            / 100
    };
    let produced = plan
        .yields
        .iter()
        .map(|y| ItemAmount {
            item: y.item,
            amount: (produced_at(y, to) - produced_at(y, from)).min(u32::MAX as u64) as u32,
        })
        .filter(|y| y.amount > 0)
        .collect();

    let food = plan
        .food
        .map_or(0, |(_, clock)| clock.count(to) - clock.count(from));

    Slice {
        xp,
        consumed,
        produced,
        input_units,
        food,
    }
}

/// Compute the effects of advancing `player`'s queue to `now`.
///
/// Pure and deterministic: the same player, catalog and balances always give
/// the same result. A `now` at or before the last processed time accrues
/// nothing.
pub fn accrue(
    player: &Player,
    now: u64,
    catalog: &dyn Catalog,
    ledger: &dyn ResourceLedger,
    config: &EngineConfig,
) -> Result<AccrualResult, EngineError> {
    let elapsed = now.saturating_sub(player.last_processed_time);
    let mut time_left = elapsed;
    let mut clock = player.last_processed_time;

    let mut view = PendingBalances::new(ledger, player.owner);
    let mut xp_after: SkillXp = player.xp.clone();
    let mut location = player.location;
    let mut xp_totals: BTreeMap<Skill, u32> = BTreeMap::new();

    let mut entries = Vec::new();
    let mut remaining_queue = Vec::new();
    let mut dropped = Vec::new();
    let mut progress: Option<CurrentActionProgress> = None;
    let mut starved = false;

    for (index, entry) in player.queue.iter().enumerate() {
        if starved {
            dropped.push(entry.queue_id);
            continue;
        }
        if time_left == 0 {
            if progress.is_none() {
                progress = Some(if index == 0 {
                    player.progress.clone()
                } else {
                    CurrentActionProgress::starting_at(clock)
                });
            }
            remaining_queue.push(entry.clone());
            continue;
        }

        let plan = EntryPlan::resolve(entry, player, catalog, config)?;
        let from = entry.consumed.unwrap_or(0);
        let slice_len = (entry.remaining() as u64).min(time_left) as u32;
        let target = from + slice_len;
        let entry_start = clock.saturating_sub(from as u64);

        let here = plan.area == location;
        if !here {
            debug!(
                "queue entry {} is for area {} but the player is in area {}; idling",
                entry.queue_id, plan.area, location
            );
        }
        let (end, slice) = if here {
            let end = plan.affordable_end(from, target, &view);
            (end, credit_slice(&plan, from, end))
        } else {
            (target, Slice::default())
        };
        for item in &slice.consumed {
            view.record(item.item, -(item.amount as i64));
        }
        for item in &slice.produced {
            view.record(item.item, item.amount as i64);
        }
        if let Some((food_item, _)) = plan.food {
            view.record(food_item, -(slice.food as i64));
        }

        let mut xp = Vec::with_capacity(slice.xp.len());
        for (skill, raw) in &slice.xp {
            let granted = xp_after.add(*skill, (*raw).min(u32::MAX as u64) as u32);
            if granted > 0 {
                *xp_totals.entry(*skill).or_insert(0) += granted;
                xp.push((*skill, granted));
            }
        }

        let continuing = index == 0 && entry.is_in_progress();
        let previously_credited = if continuing {
            player.progress.skills.clone()
        } else {
            Vec::new()
        };

        let status = if end < target {
            EntryStatus::AbortedForResources
        } else if end >= entry.input.timespan {
            EntryStatus::Completed
        } else {
            EntryStatus::PartiallyConsumed
        };

        debug!(
            "queue entry {} (action {}): {}s credited, status {:?}",
            entry.queue_id,
            entry.input.action_id,
            end - from,
            status
        );

        match status {
            EntryStatus::AbortedForResources => {
                warn!(
                    "queue entry {} starved after {}s; dropping it and {} behind it",
                    entry.queue_id,
                    end,
                    player.queue.len() - index - 1
                );
                starved = true;
                dropped.push(entry.queue_id);
            }
            EntryStatus::PartiallyConsumed => {
                let mut head = if continuing {
                    player.progress.clone()
                } else {
                    CurrentActionProgress::starting_at(entry_start)
                };
                for (skill, granted) in &xp {
                    head.add_xp(*skill, *granted);
                }
                head.base_inputs_consumed = head
                    .base_inputs_consumed
                    .saturating_add(slice.input_units.min(u32::MAX as u64) as u32);
                head.food_consumed = head
                    .food_consumed
                    .saturating_add(slice.food.min(u32::MAX as u64) as u32);
                progress = Some(head);
                remaining_queue.push(QueuedAction {
                    queue_id: entry.queue_id,
                    input: entry.input.clone(),
                    consumed: Some(end),
                });
            }
            EntryStatus::Completed => {
                if let Some(to) = plan.destination.filter(|_| here) {
                    debug!("queue entry {} arrived in area {}", entry.queue_id, to);
                    location = to;
                }
            }
        }

        entries.push(EntryOutcome {
            queue_id: entry.queue_id,
            action_id: entry.input.action_id,
            choice_id: entry.input.choice_id,
            time_consumed: end - from,
            xp,
            consumed: slice.consumed,
            produced: slice.produced,
            food_consumed: slice.food.min(u32::MAX as u64) as u32,
            previously_credited,
            status,
        });

        time_left -= slice_len as u64;
        clock += slice_len as u64;
    }

    let credited: u64 = entries.iter().map(|e| e.time_consumed as u64).sum();
    let unused_time = elapsed - credited;

    let gained: u64 = xp_totals.values().map(|xp| *xp as u64).sum();
    let threshold_rewards =
        crossed_thresholds(catalog, player.total_xp, player.total_xp.saturating_add(gained));
    for reward in &threshold_rewards {
        view.record(reward.item, reward.amount as i64);
    }

    Ok(AccrualResult {
        now,
        elapsed,
        unused_time,
        entries,
        xp_deltas: xp_totals.into_iter().collect(),
        item_deltas: view.into_deltas(),
        remaining_queue,
        dropped,
        progress: progress.unwrap_or_default(),
        threshold_rewards,
        location,
    })
}

/// Rewards for every threshold in `(before, after]`, in threshold order.
fn crossed_thresholds(catalog: &dyn Catalog, before: u64, after: u64) -> Vec<ItemAmount> {
    if after <= before {
        return Vec::new();
    }
    let mut rewards = Vec::new();
    for reward in catalog.xp_threshold_rewards() {
        if reward.threshold > before && reward.threshold <= after {
            info!("total XP passed {}", reward.threshold);
            rewards.extend(reward.rewards.into_iter().filter(|r| r.amount > 0));
        }
    }
    rewards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_clock_counts_and_completion() {
        // 100 per hour at GUAR_MUL scale.
        let clock = UnitClock::new(1000, GUAR_MUL).unwrap();
        assert_eq!(clock.count(35), 0);
        assert_eq!(clock.count(36), 1);
        assert_eq!(clock.count(361), 10);
        assert_eq!(clock.completion_time(10), 360);
        assert_eq!(clock.completion_time(0), 0);
    }

    #[test]
    fn last_affordable_stops_before_unpaid_unit() {
        let clock = UnitClock::new(1000, GUAR_MUL).unwrap();
        assert_eq!(clock.last_affordable(0, 3600, 0), 35);
        assert_eq!(clock.last_affordable(0, 3600, 3), 143);
        assert_eq!(clock.count(143), 3);
        assert_eq!(clock.last_affordable(0, 100, 50), 100);
        assert_eq!(clock.last_affordable(100, 3600, 0), 107);
        assert_eq!(clock.last_affordable(50, 60, u64::MAX), 60);
    }

    #[test]
    fn thresholds_cross_once_each() {
        use crate::catalog::{InMemoryCatalog, XpThresholdReward};

        let mut catalog = InMemoryCatalog::new();
        for (threshold, item) in [(500, 1), (1000, 2), (2500, 3)] {
            catalog
                .add_xp_threshold_reward(XpThresholdReward {
                    threshold,
                    rewards: vec![ItemAmount { item, amount: 1 }],
                })
                .unwrap();
        }
        let items = |before, after| -> Vec<ItemId> {
            crossed_thresholds(&catalog, before, after)
                .iter()
                .map(|r| r.item)
                .collect()
        };
        assert_eq!(items(374, 499), Vec::<ItemId>::new());
        assert_eq!(items(374, 500), vec![1]);
        assert_eq!(items(500, 1000), vec![2]);
        assert_eq!(items(0, 10_000), vec![1, 2, 3]);
        assert_eq!(items(1000, 1000), Vec::<ItemId>::new());
    }

    #[test]
    fn zero_rate_has_no_clock() {
        assert!(UnitClock::new(0, RATE_MUL).is_none());
    }
}
