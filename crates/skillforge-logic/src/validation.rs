//! Validation gate for submitted actions.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. timespan is non-zero, the action exists and is available
//! 2. a choice id is supplied exactly when the action requires one, and a
//!    travel choice is queued for exactly one trip
//! 3. every equipped item sits in a slot matching its equip position
//! 4. hand items fall inside the action's hand range
//! 5. minimum XP for the action, the choice, each worn or held item, then food
//! 6. the owner holds enough of every equipped item to fill each slot it is in
//!
//! Nothing here mutates; the same player snapshot can be probed repeatedly.

use std::collections::BTreeMap;

use crate::catalog::{Catalog, Item, ItemId};
use crate::error::{EngineError, EquipSlot, InvalidInputKind, Reason, XpGate};
use crate::ledger::ResourceLedger;
use crate::player::Player;
use crate::queue::QueuedActionInput;
use crate::skills::Skill;

fn require_xp(
    player: &Player,
    gate: XpGate,
    skill: Skill,
    required: u32,
) -> Result<(), Reason> {
    let actual = player.xp(skill);
    if actual < required {
        return Err(EngineError::MinimumXpNotReached {
            gate,
            skill,
            required,
            actual,
        });
    }
    Ok(())
}

/// Validate one candidate action for `player`.
pub fn validate(
    player: &Player,
    input: &QueuedActionInput,
    catalog: &dyn Catalog,
    ledger: &dyn ResourceLedger,
) -> Result<(), Reason> {
    if input.timespan == 0 {
        return Err(InvalidInputKind::EmptyTimespan.into());
    }
    let action = catalog.action(input.action_id)?;
    if !action.is_available {
        return Err(InvalidInputKind::ActionUnavailable.into());
    }

    let choice = match (action.action_choice_required, input.choice_id) {
        (true, None) => return Err(InvalidInputKind::ActionChoiceIdRequired.into()),
        (false, Some(_)) => return Err(InvalidInputKind::ActionChoiceIdNotRequired.into()),
        (true, Some(id)) => Some(catalog.action_choice(id)?),
        (false, None) => None,
    };
    if let Some(expected) = choice.as_ref().and_then(|c| c.travel_timespan()) {
        if input.timespan as u64 != expected {
            return Err(InvalidInputKind::InvalidTravellingTimespan {
                expected,
                actual: input.timespan,
            }
            .into());
        }
    }

    let mut equipped: Vec<(EquipSlot, Item)> = Vec::new();
    for (slot, item_id) in input.equipped() {
        let item = catalog.item(item_id)?;
        let expected = slot.expected_position();
        if item.equip_position != expected {
            return Err(EngineError::EquipPositionMismatch {
                slot,
                item: item_id,
                expected,
                actual: item.equip_position,
            });
        }
        equipped.push((slot, item));
    }

    if let Some((min, max)) = action.hand_item_range {
        if input.right_hand.is_none() {
            return Err(InvalidInputKind::HandItemRequired.into());
        }
        for hand in [input.right_hand, input.left_hand].into_iter().flatten() {
            if !(min..=max).contains(&hand) {
                return Err(InvalidInputKind::HandItemOutOfRange(hand).into());
            }
        }
    }

    require_xp(player, XpGate::Action, action.skill, action.min_xp)?;
    if let Some(choice) = &choice {
        require_xp(player, XpGate::ActionChoice, choice.skill, choice.min_xp)?;
    }

    // Worn and held items first, food last.
    for (slot, item) in equipped.iter().filter(|(slot, _)| *slot != EquipSlot::Food) {
        if let Some(skill) = item.skill {
            let gate = if slot.is_attire() {
                XpGate::Attire
            } else {
                XpGate::Item
            };
            require_xp(player, gate, skill, item.min_xp)?;
        }
    }
    for (_, item) in equipped.iter().filter(|(slot, _)| *slot == EquipSlot::Food) {
        if let Some(skill) = item.skill {
            require_xp(player, XpGate::Consumable, skill, item.min_xp)?;
        }
    }

    // The same item in two slots needs two of it.
    let mut needed: BTreeMap<ItemId, u64> = BTreeMap::new();
    for (_, item) in &equipped {
        *needed.entry(item.id).or_default() += 1;
    }
    for (_, item) in &equipped {
        if ledger.balance_of(player.owner, item.id) < needed[&item.id] {
            return Err(EngineError::NoItemBalance { item: item.id });
        }
    }

    Ok(())
}

/// Probe every candidate independently; one failure never stops the rest.
pub fn validate_all(
    player: &Player,
    inputs: &[QueuedActionInput],
    catalog: &dyn Catalog,
    ledger: &dyn ResourceLedger,
) -> Vec<(bool, Option<Reason>)> {
    inputs
        .iter()
        .map(|input| match validate(player, input, catalog, ledger) {
            Ok(()) => (true, None),
            Err(reason) => (false, Some(reason)),
        })
        .collect()
}
