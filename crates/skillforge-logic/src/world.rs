//! In-memory world: players, active-player designations and the shared
//! game state, with caller authorization in front of the commit path.
//!
//! The catalog and the resource ledger stay outside the world and are passed
//! in per call, the same way the server hands in its table adapters.

use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::accrual::AccrualResult;
use crate::catalog::Catalog;
use crate::commit::{self, GameState};
use crate::config::EngineConfig;
use crate::error::{EngineError, Reason};
use crate::ledger::{OwnerId, ResourceLedger};
use crate::player::{Player, PlayerId};
use crate::queue::{MergeMode, QueuedAction, QueuedActionInput};
use crate::skills::{Skill, StartSkills};
use crate::validation::validate_all;

/// Mutable access for a caller acting through its active player.
fn authorize<'a>(
    players: &'a mut BTreeMap<PlayerId, Player>,
    active_players: &BTreeMap<OwnerId, PlayerId>,
    caller: OwnerId,
    id: PlayerId,
) -> Result<&'a mut Player, EngineError> {
    let player = players.get_mut(&id).ok_or(EngineError::UnknownPlayer(id))?;
    if player.owner != caller || active_players.get(&caller) != Some(&id) {
        return Err(EngineError::CallerNotAuthorized);
    }
    Ok(player)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub state: GameState,
    next_player_id: PlayerId,
    players: BTreeMap<PlayerId, Player>,
    /// Owner -> the one player it currently acts through.
    active_players: BTreeMap<OwnerId, PlayerId>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(EngineConfig::default(), 0)
    }
}

impl World {
    /// An empty world administered by `admin`.
    pub fn new(config: EngineConfig, admin: OwnerId) -> Self {
        Self {
            state: GameState::new(config, admin),
            next_player_id: 1,
            players: BTreeMap::new(),
            active_players: BTreeMap::new(),
        }
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, EngineError> {
        self.players.get(&id).ok_or(EngineError::UnknownPlayer(id))
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn active_player(&self, owner: OwnerId) -> Option<PlayerId> {
        self.active_players.get(&owner).copied()
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Mint a new player for `owner`, optionally making it the active one.
    pub fn create_player(
        &mut self,
        owner: OwnerId,
        start_skills: StartSkills,
        make_active: bool,
        now: u64,
    ) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        self.players.insert(
            id,
            Player::new(id, owner, start_skills, &self.state.config, now),
        );
        if make_active {
            self.active_players.insert(owner, id);
        }
        info!("player {id} created for owner {owner}");
        id
    }

    pub fn set_active_player(&mut self, caller: OwnerId, id: PlayerId) -> Result<(), EngineError> {
        if self.player(id)?.owner != caller {
            return Err(EngineError::CallerNotAuthorized);
        }
        if self.active_player(caller) == Some(id) {
            return Err(EngineError::PlayerAlreadyActive);
        }
        self.active_players.insert(caller, id);
        Ok(())
    }

    /// Hand a player to a new owner. The old owner loses it as active player.
    pub fn transfer_player(&mut self, id: PlayerId, new_owner: OwnerId) -> Result<(), EngineError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(EngineError::UnknownPlayer(id))?;
        let old_owner = player.owner;
        player.owner = new_owner;
        if self.active_players.get(&old_owner) == Some(&id) {
            self.active_players.remove(&old_owner);
        }
        Ok(())
    }

    fn require_admin(&self, caller: OwnerId) -> Result<(), EngineError> {
        if caller != self.state.admin {
            return Err(EngineError::CallerNotAuthorized);
        }
        Ok(())
    }

    /// Privileged switch gating every mutating entry point.
    pub fn pause(&mut self, caller: OwnerId, paused: bool) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.state.paused = paused;
        info!("game {}", if paused { "paused" } else { "unpaused" });
        Ok(())
    }

    pub fn xp(&self, id: PlayerId, skill: Skill) -> Result<u32, EngineError> {
        Ok(self.player(id)?.xp(skill))
    }

    /// Admin tool: raise a player's skill to at least `xp`. Only allowed
    /// with an empty queue.
    pub fn modify_xp(
        &mut self,
        caller: OwnerId,
        id: PlayerId,
        skill: Skill,
        xp: u32,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        let player = self
            .players
            .get_mut(&id)
            .ok_or(EngineError::UnknownPlayer(id))?;
        let added = player.raise_xp(skill, xp)?;
        info!("admin raised player {id} {skill:?} by {added}");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn start_actions(
        &mut self,
        caller: OwnerId,
        id: PlayerId,
        actions: &[QueuedActionInput],
        mode: MergeMode,
        now: u64,
        catalog: &dyn Catalog,
        ledger: &mut dyn ResourceLedger,
    ) -> Result<AccrualResult, EngineError> {
        if self.state.paused {
            return Err(EngineError::GamePaused);
        }
        let player = authorize(&mut self.players, &self.active_players, caller, id)?;
        commit::start_actions(&mut self.state, player, actions, mode, now, catalog, ledger)
    }

    pub fn process_actions(
        &mut self,
        caller: OwnerId,
        id: PlayerId,
        now: u64,
        catalog: &dyn Catalog,
        ledger: &mut dyn ResourceLedger,
    ) -> Result<AccrualResult, EngineError> {
        if self.state.paused {
            return Err(EngineError::GamePaused);
        }
        let player = authorize(&mut self.players, &self.active_players, caller, id)?;
        commit::process_actions(&self.state, player, now, catalog, ledger)
    }

    pub fn preview(
        &self,
        id: PlayerId,
        now: u64,
        catalog: &dyn Catalog,
        ledger: &dyn ResourceLedger,
    ) -> Result<AccrualResult, EngineError> {
        commit::preview(&self.state, self.player(id)?, now, catalog, ledger)
    }

    pub fn get_queue(
        &self,
        id: PlayerId,
        now: u64,
        catalog: &dyn Catalog,
        ledger: &dyn ResourceLedger,
    ) -> Result<Vec<QueuedAction>, EngineError> {
        commit::live_queue(&self.state, self.player(id)?, now, catalog, ledger)
    }

    pub fn validate_actions(
        &self,
        id: PlayerId,
        actions: &[QueuedActionInput],
        catalog: &dyn Catalog,
        ledger: &dyn ResourceLedger,
    ) -> Result<Vec<(bool, Option<Reason>)>, EngineError> {
        Ok(validate_all(self.player(id)?, actions, catalog, ledger))
    }
}
