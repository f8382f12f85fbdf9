//! Save/load of the in-memory world.
//!
//! Uses bincode for a compact binary snapshot of every player, the shared
//! game state and the in-memory ledger. A version header guards against
//! loading snapshots written by an incompatible build.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::ledger::InMemoryLedger;
use crate::world::World;

/// Version number for the snapshot format (increment when the layout changes)
const SAVE_VERSION: u32 = 2;

/// Serializable snapshot of a world and its balances
#[derive(Serialize, Deserialize)]
struct SaveData {
    version: u32,
    /// Timestamp the snapshot was taken at
    saved_at: u64,
    world: World,
    ledger: InMemoryLedger,
}

/// A world restored from a snapshot
pub struct LoadedWorld {
    pub world: World,
    pub ledger: InMemoryLedger,
    pub saved_at: u64,
}

/// Save the world and its ledger to a writer
pub fn save_world<W: Write>(
    writer: W,
    world: &World,
    ledger: &InMemoryLedger,
    saved_at: u64,
) -> Result<(), EngineError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        saved_at,
        world: world.clone(),
        ledger: ledger.clone(),
    };
    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a world from a reader
pub fn load_world<R: Read>(reader: R) -> Result<LoadedWorld, EngineError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(EngineError::SaveVersion {
            found: save_data.version,
            expected: SAVE_VERSION,
        });
    }

    Ok(LoadedWorld {
        world: save_data.world,
        ledger: save_data.ledger,
        saved_at: save_data.saved_at,
    })
}
