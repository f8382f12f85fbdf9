//! Queued actions and the merge policy combining a live queue with new submissions.
//!
//! A queue is an ordered list of [`QueuedAction`]s. Only the head may be in
//! progress; it carries `consumed = Some(seconds)` once accrual has credited
//! it time. Every other entry is pending and untouched.
//!
//! # Merge modes
//!
//! | Mode | Keeps from existing queue | Then |
//! |------|---------------------------|------|
//! | [`MergeMode::Replace`] | nothing | new actions |
//! | [`MergeMode::Append`] | everything, unchanged | new actions |
//! | [`MergeMode::KeepInProgressOnly`] | the in-progress head only | new actions |
//!
//! New actions always receive fresh ids above every id already issued.

use serde::{Deserialize, Serialize};

use crate::catalog::{ActionId, ChoiceId, ItemId};
use crate::config::EngineConfig;
use crate::error::{EngineError, EquipSlot, InvalidInputKind};

pub type QueueId = u64;

/// Armour and jewellery worn for an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attire {
    pub head: Option<ItemId>,
    pub neck: Option<ItemId>,
    pub body: Option<ItemId>,
    pub arms: Option<ItemId>,
    pub legs: Option<ItemId>,
    pub feet: Option<ItemId>,
}

impl Attire {
    pub fn slots(&self) -> [(EquipSlot, Option<ItemId>); 6] {
        [
            (EquipSlot::Head, self.head),
            (EquipSlot::Neck, self.neck),
            (EquipSlot::Body, self.body),
            (EquipSlot::Arms, self.arms),
            (EquipSlot::Legs, self.legs),
            (EquipSlot::Feet, self.feet),
        ]
    }
}

/// Fighting stance; only meaningful for combat actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatStyle {
    #[default]
    None,
    Attack,
    Defence,
}

/// An action as submitted by a caller, before it has a queue id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedActionInput {
    pub action_id: ActionId,
    pub choice_id: Option<ChoiceId>,
    /// Requested duration in seconds.
    pub timespan: u32,
    pub attire: Attire,
    pub right_hand: Option<ItemId>,
    pub left_hand: Option<ItemId>,
    /// Food eaten during combat.
    pub regenerate: Option<ItemId>,
    pub combat_style: CombatStyle,
}

impl QueuedActionInput {
    pub fn new(action_id: ActionId, timespan: u32) -> Self {
        Self {
            action_id,
            choice_id: None,
            timespan,
            attire: Attire::default(),
            right_hand: None,
            left_hand: None,
            regenerate: None,
            combat_style: CombatStyle::None,
        }
    }

    pub fn with_choice(mut self, choice_id: ChoiceId) -> Self {
        self.choice_id = Some(choice_id);
        self
    }

    pub fn with_right_hand(mut self, item: ItemId) -> Self {
        self.right_hand = Some(item);
        self
    }

    pub fn with_left_hand(mut self, item: ItemId) -> Self {
        self.left_hand = Some(item);
        self
    }

    pub fn with_attire(mut self, attire: Attire) -> Self {
        self.attire = attire;
        self
    }

    pub fn with_food(mut self, item: ItemId) -> Self {
        self.regenerate = Some(item);
        self
    }

    pub fn with_combat_style(mut self, style: CombatStyle) -> Self {
        self.combat_style = style;
        self
    }

    /// Every filled slot in check order: attire, then hands, then food.
    pub fn equipped(&self) -> Vec<(EquipSlot, ItemId)> {
        let mut slots: Vec<(EquipSlot, ItemId)> = self
            .attire
            .slots()
            .into_iter()
            .filter_map(|(slot, item)| item.map(|i| (slot, i)))
            .collect();
        if let Some(item) = self.right_hand {
            slots.push((EquipSlot::RightHand, item));
        }
        if let Some(item) = self.left_hand {
            slots.push((EquipSlot::LeftHand, item));
        }
        if let Some(item) = self.regenerate {
            slots.push((EquipSlot::Food, item));
        }
        slots
    }

    /// Items that must stay in the owner's ledger while the action runs.
    pub fn held_items(&self) -> Vec<ItemId> {
        self.equipped()
            .into_iter()
            .filter(|(slot, _)| *slot != EquipSlot::Food)
            .map(|(_, item)| item)
            .collect()
    }
}

/// One entry of a player's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedAction {
    pub queue_id: QueueId,
    pub input: QueuedActionInput,
    /// Seconds already credited. `None` while pending.
    pub consumed: Option<u32>,
}

impl QueuedAction {
    pub fn pending(queue_id: QueueId, input: QueuedActionInput) -> Self {
        Self {
            queue_id,
            input,
            consumed: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.consumed.is_some()
    }

    /// Seconds left to run.
    pub fn remaining(&self) -> u32 {
        self.input
            .timespan
            .saturating_sub(self.consumed.unwrap_or(0))
    }
}

/// How new actions combine with the existing queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMode {
    Replace,
    Append,
    KeepInProgressOnly,
}

impl MergeMode {
    pub fn to_u8(self) -> u8 {
        match self {
            MergeMode::Replace => 0,
            MergeMode::Append => 1,
            MergeMode::KeepInProgressOnly => 2,
        }
    }

    pub fn from_u8(val: u8) -> Option<MergeMode> {
        match val {
            0 => Some(MergeMode::Replace),
            1 => Some(MergeMode::Append),
            2 => Some(MergeMode::KeepInProgressOnly),
            _ => None,
        }
    }
}

/// A merged queue and the id counter value to store if it is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub queue: Vec<QueuedAction>,
    pub next_queue_id: QueueId,
}

/// Combine the accrued remainder of a queue with new actions.
///
/// Pure: ids are drawn from `next_queue_id` but the counter is only returned,
/// so a rejected merge leaves no trace. Fails when the result exceeds the
/// configured depth or total time.
pub fn merge(
    remainder: Vec<QueuedAction>,
    new_actions: &[QueuedActionInput],
    mode: MergeMode,
    next_queue_id: QueueId,
    config: &EngineConfig,
) -> Result<MergeOutcome, EngineError> {
    let mut queue: Vec<QueuedAction> = match mode {
        MergeMode::Replace => Vec::new(),
        MergeMode::Append => remainder,
        MergeMode::KeepInProgressOnly => remainder
            .into_iter()
            .take(1)
            .filter(QueuedAction::is_in_progress)
            .collect(),
    };

    let len = queue.len() + new_actions.len();
    if len > config.max_queue_depth {
        return Err(InvalidInputKind::QueueTooLong {
            len,
            max: config.max_queue_depth,
        }
        .into());
    }

    let mut next_id = next_queue_id;
    for input in new_actions {
        queue.push(QueuedAction::pending(next_id, input.clone()));
        next_id += 1;
    }

    let total: u64 = queue.iter().map(|q| q.remaining() as u64).sum();
    if total > config.max_queue_time as u64 {
        return Err(InvalidInputKind::QueueTimeExceeded {
            total,
            max: config.max_queue_time,
        }
        .into());
    }

    Ok(MergeOutcome {
        queue,
        next_queue_id: next_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(timespan: u32) -> QueuedActionInput {
        QueuedActionInput::new(1, timespan)
    }

    /// Head in progress with 1800s consumed, one pending entry behind it.
    fn live_queue() -> Vec<QueuedAction> {
        vec![
            QueuedAction {
                queue_id: 1,
                input: input(3600),
                consumed: Some(1800),
            },
            QueuedAction::pending(2, input(3600)),
        ]
    }

    #[test]
    fn replace_discards_everything() {
        let config = EngineConfig::default();
        let out = merge(live_queue(), &[input(600)], MergeMode::Replace, 3, &config).unwrap();
        assert_eq!(out.queue.len(), 1);
        assert_eq!(out.queue[0].queue_id, 3);
        assert_eq!(out.queue[0].remaining(), 600);
        assert_eq!(out.next_queue_id, 4);
    }

    #[test]
    fn replace_with_nothing_empties_queue() {
        let config = EngineConfig::default();
        let out = merge(live_queue(), &[], MergeMode::Replace, 3, &config).unwrap();
        assert!(out.queue.is_empty());
        assert_eq!(out.next_queue_id, 3);
    }

    #[test]
    fn append_keeps_order_and_entries() {
        let config = EngineConfig::default();
        let existing = live_queue();
        let out = merge(existing.clone(), &[input(600)], MergeMode::Append, 3, &config).unwrap();
        assert_eq!(&out.queue[..2], &existing[..]);
        assert_eq!(out.queue[2].queue_id, 3);
        assert!(!out.queue[2].is_in_progress());
    }

    #[test]
    fn keep_in_progress_drops_pending() {
        let config = EngineConfig::default();
        let out = merge(live_queue(), &[], MergeMode::KeepInProgressOnly, 3, &config).unwrap();
        assert_eq!(out.queue.len(), 1);
        assert_eq!(out.queue[0].queue_id, 1);
        assert_eq!(out.queue[0].remaining(), 1800);
    }

    #[test]
    fn keep_in_progress_without_progress_keeps_nothing() {
        let config = EngineConfig::default();
        let pending_only = vec![QueuedAction::pending(1, input(3600))];
        let out = merge(
            pending_only,
            &[input(60)],
            MergeMode::KeepInProgressOnly,
            2,
            &config,
        )
        .unwrap();
        assert_eq!(out.queue.len(), 1);
        assert_eq!(out.queue[0].queue_id, 2);
    }

    #[test]
    fn depth_limit_rejects() {
        let config = EngineConfig::default();
        let err = merge(
            live_queue(),
            &[input(60), input(60)],
            MergeMode::Append,
            3,
            &config,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidInput(InvalidInputKind::QueueTooLong { len: 4, max: 3 })
        ));
    }

    #[test]
    fn time_limit_rejects() {
        let config = EngineConfig {
            max_queue_time: 7200,
            ..EngineConfig::default()
        };
        // 1800 remaining + 3600 pending + 3600 new > 7200
        let err = merge(live_queue(), &[input(3600)], MergeMode::Append, 3, &config).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidInput(InvalidInputKind::QueueTimeExceeded { total: 9000, .. })
        ));
    }

    #[test]
    fn equipped_lists_slots_in_check_order() {
        let action = input(60)
            .with_attire(Attire {
                arms: Some(5),
                ..Attire::default()
            })
            .with_right_hand(300)
            .with_food(900);
        assert_eq!(
            action.equipped(),
            vec![
                (EquipSlot::Arms, 5),
                (EquipSlot::RightHand, 300),
                (EquipSlot::Food, 900),
            ]
        );
        assert_eq!(action.held_items(), vec![5, 300]);
    }
}
