//! Commit path: the only code that mutates a player.
//!
//! [`start_actions`] and [`process_actions`] share one sequence:
//!
//! 1. refuse while paused
//! 2. validate new actions, failing fast
//! 3. accrue the existing queue up to `now`
//! 4. merge the remainder with the new actions
//! 5. apply item deltas and threshold rewards, then XP, then the new queue
//!    and location, all at once
//!
//! Steps 2 to 4 are pure, so any error leaves the player and the ledger
//! untouched. [`preview`] stops after step 3 and skips the pause check.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::accrual::{accrue, AccrualResult};
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ledger::{OwnerId, ResourceLedger};
use crate::player::{CurrentActionProgress, Player};
use crate::queue::{merge, MergeMode, QueueId, QueuedAction, QueuedActionInput};
use crate::validation::validate;

/// Process-wide state shared by every mutating entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub config: EngineConfig,
    pub paused: bool,
    /// Next queue id to hand out. Never reused.
    pub next_queue_id: QueueId,
    /// Owner allowed to pause the game and edit XP.
    pub admin: OwnerId,
}

impl GameState {
    pub fn new(config: EngineConfig, admin: OwnerId) -> Self {
        Self {
            config,
            paused: false,
            next_queue_id: 1,
            admin,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(EngineConfig::default(), 0)
    }
}

fn ensure_running(state: &GameState) -> Result<(), EngineError> {
    if state.paused {
        return Err(EngineError::GamePaused);
    }
    Ok(())
}

/// Apply an accrual and a new queue to `player` and the ledger.
fn commit(
    player: &mut Player,
    accrual: &AccrualResult,
    queue: Vec<QueuedAction>,
    ledger: &mut dyn ResourceLedger,
) -> Result<(), EngineError> {
    ledger.apply_deltas(player.owner, &accrual.item_deltas)?;

    for (skill, xp) in &accrual.xp_deltas {
        player.grant_xp(*skill, *xp);
    }

    let same_head = queue.first().map(|q| q.queue_id)
        == accrual.remaining_queue.first().map(|q| q.queue_id);
    player.progress = match queue.first() {
        None => CurrentActionProgress::default(),
        Some(_) if same_head => accrual.progress.clone(),
        Some(_) => CurrentActionProgress::starting_at(accrual.now),
    };
    player.queue = queue;
    player.location = accrual.location;
    player.last_processed_time = player.last_processed_time.max(accrual.now);
    Ok(())
}

/// Realize elapsed time and replace or extend the queue.
pub fn start_actions(
    state: &mut GameState,
    player: &mut Player,
    new_actions: &[QueuedActionInput],
    mode: MergeMode,
    now: u64,
    catalog: &dyn Catalog,
    ledger: &mut dyn ResourceLedger,
) -> Result<AccrualResult, EngineError> {
    ensure_running(state)?;

    for (i, input) in new_actions.iter().enumerate() {
        if let Err(e) = validate(player, input, catalog, &*ledger) {
            warn!(
                "player {}: rejected action {} (index {}): {}",
                player.id, input.action_id, i, e
            );
            return Err(e);
        }
    }

    let accrual = accrue(player, now, catalog, &*ledger, &state.config)?;
    let merged = merge(
        accrual.remaining_queue.clone(),
        new_actions,
        mode,
        state.next_queue_id,
        &state.config,
    )?;

    commit(player, &accrual, merged.queue, ledger)?;
    state.next_queue_id = merged.next_queue_id;

    info!(
        "player {}: started {} action(s) ({:?}), {} xp over {}s, queue now {}",
        player.id,
        new_actions.len(),
        mode,
        accrual.total_xp(),
        accrual.elapsed,
        player.queue.len()
    );
    Ok(accrual)
}

/// Realize elapsed time without changing what is queued.
pub fn process_actions(
    state: &GameState,
    player: &mut Player,
    now: u64,
    catalog: &dyn Catalog,
    ledger: &mut dyn ResourceLedger,
) -> Result<AccrualResult, EngineError> {
    ensure_running(state)?;

    let accrual = accrue(player, now, catalog, &*ledger, &state.config)?;
    commit(player, &accrual, accrual.remaining_queue.clone(), ledger)?;

    info!(
        "player {}: processed {}s, {} xp, {} entries left",
        player.id,
        accrual.elapsed,
        accrual.total_xp(),
        player.queue.len()
    );
    Ok(accrual)
}

/// What [`process_actions`] would commit at `now`. Allowed while paused.
pub fn preview(
    state: &GameState,
    player: &Player,
    now: u64,
    catalog: &dyn Catalog,
    ledger: &dyn ResourceLedger,
) -> Result<AccrualResult, EngineError> {
    accrue(player, now, catalog, ledger, &state.config)
}

/// The queue as it stands at `now`, with live remaining times.
pub fn live_queue(
    state: &GameState,
    player: &Player,
    now: u64,
    catalog: &dyn Catalog,
    ledger: &dyn ResourceLedger,
) -> Result<Vec<QueuedAction>, EngineError> {
    Ok(preview(state, player, now, catalog, ledger)?.remaining_queue)
}
