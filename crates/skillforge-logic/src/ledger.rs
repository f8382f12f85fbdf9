//! Resource ledger seam: item balances per owner.
//!
//! The engine only reads balances while computing accrual and issues one
//! batch of signed deltas per commit. [`InMemoryLedger`] backs tests and the
//! harness; the server implements [`ResourceLedger`] over its balance table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ItemId;

/// Account that holds items. Players act on behalf of their owner.
pub type OwnerId = u64;

/// A signed change to one item balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDelta {
    pub item: ItemId,
    pub amount: i64,
}

/// A debit larger than the held balance.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("owner {owner} holds {available} of item {item} but {required} are needed")]
pub struct InsufficientBalance {
    pub owner: OwnerId,
    pub item: ItemId,
    pub available: u64,
    pub required: u64,
}

/// Item balances by owner.
pub trait ResourceLedger {
    fn balance_of(&self, owner: OwnerId, item: ItemId) -> u64;

    /// Apply every delta or none of them.
    fn apply_deltas(&mut self, owner: OwnerId, deltas: &[ItemDelta])
        -> Result<(), InsufficientBalance>;
}

/// Sum deltas per item, dropping items whose net change is zero.
pub fn net_deltas(deltas: &[ItemDelta]) -> Vec<ItemDelta> {
    let mut net: BTreeMap<ItemId, i64> = BTreeMap::new();
    for d in deltas {
        *net.entry(d.item).or_insert(0) += d.amount;
    }
    net.into_iter()
        .filter(|(_, amount)| *amount != 0)
        .map(|(item, amount)| ItemDelta { item, amount })
        .collect()
}

/// Check a batch against current balances without applying it.
pub fn check_deltas(
    ledger: &dyn ResourceLedger,
    owner: OwnerId,
    deltas: &[ItemDelta],
) -> Result<(), InsufficientBalance> {
    for d in net_deltas(deltas) {
        if d.amount < 0 {
            let available = ledger.balance_of(owner, d.item);
            let required = d.amount.unsigned_abs();
            if available < required {
                return Err(InsufficientBalance {
                    owner,
                    item: d.item,
                    available,
                    required,
                });
            }
        }
    }
    Ok(())
}

/// Read-only view of an owner's balances with uncommitted deltas layered on top.
///
/// Accrual walks several entries in one run; later entries must see what
/// earlier ones consumed and produced before anything is committed.
pub struct PendingBalances<'a> {
    ledger: &'a dyn ResourceLedger,
    owner: OwnerId,
    pending: BTreeMap<ItemId, i64>,
}

impl<'a> PendingBalances<'a> {
    pub fn new(ledger: &'a dyn ResourceLedger, owner: OwnerId) -> Self {
        Self {
            ledger,
            owner,
            pending: BTreeMap::new(),
        }
    }

    /// Balance including pending deltas, floored at zero.
    pub fn balance(&self, item: ItemId) -> u64 {
        let base = self.ledger.balance_of(self.owner, item) as i128;
        let pending = self.pending.get(&item).copied().unwrap_or(0) as i128;
        (base + pending).max(0) as u64
    }

    pub fn record(&mut self, item: ItemId, amount: i64) {
        if amount != 0 {
            *self.pending.entry(item).or_insert(0) += amount;
        }
    }

    /// Net pending deltas, sorted by item id.
    pub fn into_deltas(self) -> Vec<ItemDelta> {
        self.pending
            .into_iter()
            .filter(|(_, amount)| *amount != 0)
            .map(|(item, amount)| ItemDelta { item, amount })
            .collect()
    }
}

/// Balances held in a map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: BTreeMap<(OwnerId, ItemId), u64>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `item` to `owner`.
    pub fn mint(&mut self, owner: OwnerId, item: ItemId, amount: u64) {
        let balance = self.balances.entry((owner, item)).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Move items between owners.
    pub fn transfer(
        &mut self,
        from: OwnerId,
        to: OwnerId,
        item: ItemId,
        amount: u64,
    ) -> Result<(), InsufficientBalance> {
        let available = self.balance_of(from, item);
        if available < amount {
            return Err(InsufficientBalance {
                owner: from,
                item,
                available,
                required: amount,
            });
        }
        self.set(from, item, available - amount);
        self.mint(to, item, amount);
        Ok(())
    }

    fn set(&mut self, owner: OwnerId, item: ItemId, amount: u64) {
        if amount == 0 {
            self.balances.remove(&(owner, item));
        } else {
            self.balances.insert((owner, item), amount);
        }
    }
}

impl ResourceLedger for InMemoryLedger {
    fn balance_of(&self, owner: OwnerId, item: ItemId) -> u64 {
        self.balances.get(&(owner, item)).copied().unwrap_or(0)
    }

    fn apply_deltas(
        &mut self,
        owner: OwnerId,
        deltas: &[ItemDelta],
    ) -> Result<(), InsufficientBalance> {
        check_deltas(&*self, owner, deltas)?;
        for d in net_deltas(deltas) {
            let current = self.balance_of(owner, d.item);
            let next = if d.amount < 0 {
                current - d.amount.unsigned_abs()
            } else {
                current.saturating_add(d.amount as u64)
            };
            self.set(owner, d.item, next);
        }
        Ok(())
    }
}
