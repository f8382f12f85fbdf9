use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogError, EquipPosition, ItemId};
use crate::ledger::InsufficientBalance;
use crate::player::PlayerId;
use crate::skills::Skill;

/// Which structural rule a submission broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum InvalidInputKind {
    #[error("timespan must be greater than zero")]
    EmptyTimespan,
    #[error("action requires a choice id")]
    ActionChoiceIdRequired,
    #[error("action does not take a choice id")]
    ActionChoiceIdNotRequired,
    #[error("action is not available")]
    ActionUnavailable,
    #[error("action requires a hand item")]
    HandItemRequired,
    #[error("hand item {0} cannot be used for this action")]
    HandItemOutOfRange(ItemId),
    #[error("travel timespan must be {expected}s, got {actual}s")]
    InvalidTravellingTimespan { expected: u64, actual: u32 },
    #[error("queue would hold {len} entries, maximum is {max}")]
    QueueTooLong { len: usize, max: usize },
    #[error("queue would hold {total}s of actions, maximum is {max}s")]
    QueueTimeExceeded { total: u64, max: u32 },
}

/// Which minimum-XP gate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XpGate {
    Action,
    ActionChoice,
    Item,
    Attire,
    Consumable,
}

/// A slot a queued action can fill with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipSlot {
    Head,
    Neck,
    Body,
    Arms,
    Legs,
    Feet,
    RightHand,
    LeftHand,
    Food,
}

impl EquipSlot {
    /// The item equip position this slot accepts.
    pub fn expected_position(self) -> EquipPosition {
        match self {
            EquipSlot::Head => EquipPosition::Head,
            EquipSlot::Neck => EquipPosition::Neck,
            EquipSlot::Body => EquipPosition::Body,
            EquipSlot::Arms => EquipPosition::Arms,
            EquipSlot::Legs => EquipPosition::Legs,
            EquipSlot::Feet => EquipPosition::Feet,
            EquipSlot::RightHand | EquipSlot::LeftHand => EquipPosition::Hand,
            EquipSlot::Food => EquipPosition::Food,
        }
    }

    pub fn is_attire(self) -> bool {
        !matches!(
            self,
            EquipSlot::RightHand | EquipSlot::LeftHand | EquipSlot::Food
        )
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(InvalidInputKind),

    #[error("item {item} cannot go in the {slot:?} slot: expected {expected:?}, item is {actual:?}")]
    EquipPositionMismatch {
        slot: EquipSlot,
        item: ItemId,
        expected: EquipPosition,
        actual: EquipPosition,
    },

    #[error("{gate:?} minimum XP not reached: {skill:?} needs {required}, player has {actual}")]
    MinimumXpNotReached {
        gate: XpGate,
        skill: Skill,
        required: u32,
        actual: u32,
    },

    #[error("no balance of equipped item {item}")]
    NoItemBalance { item: ItemId },

    #[error("game is paused")]
    GamePaused,

    #[error("caller is not the owner of the active player")]
    CallerNotAuthorized,

    #[error("player is already active")]
    PlayerAlreadyActive,

    #[error("player has queued actions")]
    HasQueuedActions,

    #[error("player not found: {0}")]
    UnknownPlayer(PlayerId),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Ledger(#[from] InsufficientBalance),

    #[error("unsupported save version {found} (expected {expected})")]
    SaveVersion { found: u32, expected: u32 },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}

impl From<InvalidInputKind> for EngineError {
    fn from(kind: InvalidInputKind) -> Self {
        EngineError::InvalidInput(kind)
    }
}

/// Why a candidate action failed validation.
pub type Reason = EngineError;

pub type Result<T> = std::result::Result<T, EngineError>;
