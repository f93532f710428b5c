//! Local-first sale ledger.
//!
//! The ledger owns the in-memory list of sales and mirrors every mutation to
//! the durable store before returning. Mutations are staged on a copy of the
//! list, so a failed write leaves memory and store in agreement.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::RaffleRules;
use crate::db::{keys, KeyValueStore};
use crate::error::{Error, Result};
use crate::events::Notification;
use crate::models::{
    BuyerInfo, DuplicateTicket, ManualSale, Sale, SaleId, SaleStats, SaleStatus,
};

/// In-memory sale list backed by a durable key-value store
pub struct Ledger<S> {
    store: Arc<S>,
    rules: RaffleRules,
    sales: Vec<Sale>,
}

impl<S: KeyValueStore> Ledger<S> {
    /// Load the ledger from `store`; a missing sales key means an empty ledger
    pub fn open(store: Arc<S>, rules: RaffleRules) -> Result<Self> {
        let sales = read_sales(store.as_ref())?;
        tracing::debug!("Loaded {} sales from local store", sales.len());
        Ok(Self {
            store,
            rules,
            sales,
        })
    }

    /// Re-read the sales list written by another context
    pub fn reload(&mut self) -> Result<()> {
        self.sales = read_sales(self.store.as_ref())?;
        Ok(())
    }

    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub const fn rules(&self) -> RaffleRules {
        self.rules
    }

    /// All sales in insertion order
    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn get(&self, id: &SaleId) -> Option<&Sale> {
        self.sales.iter().find(|sale| &sale.id == id)
    }

    pub fn sales_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Sale> + 'a {
        self.sales.iter().filter(move |sale| sale.group == group)
    }

    /// Distinct group names, sorted
    pub fn groups(&self) -> Vec<String> {
        self.sales
            .iter()
            .map(|sale| sale.group.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// True iff a non-cancelled sale holds `number` in `group`
    pub fn is_sold(&self, group: &str, number: u32) -> bool {
        self.sales
            .iter()
            .any(|sale| sale.is_active() && sale.same_ticket(group, number))
    }

    /// Ticket numbers of `group` not held by any non-cancelled sale, ascending
    pub fn available_numbers(&self, group: &str) -> Vec<u32> {
        let sold = self
            .sales_in_group(group)
            .filter(|sale| sale.is_active())
            .map(|sale| sale.number)
            .collect::<HashSet<_>>();

        (1..=self.rules.max_ticket)
            .filter(|number| !sold.contains(number))
            .collect()
    }

    /// Reserve `number` in `group` for a buyer
    pub fn reserve(&mut self, group: &str, number: u32, buyer: BuyerInfo) -> Result<Sale> {
        let sale = Sale::new(normalize_group(group)?, number, buyer, SaleStatus::Reserved);
        self.insert(sale)
    }

    /// Admin entry; status defaults to paid and the sale is flagged manual
    pub fn add_manual(&mut self, data: ManualSale) -> Result<Sale> {
        let status = data.status.unwrap_or(SaleStatus::Paid);
        let mut sale = Sale::new(normalize_group(&data.group)?, data.number, data.buyer, status);
        sale.manual = true;
        self.insert(sale)
    }

    fn insert(&mut self, mut sale: Sale) -> Result<Sale> {
        if !self.rules.contains(sale.number) {
            return Err(Error::InvalidInput(format!(
                "ticket number {} is outside 1..={}",
                sale.number, self.rules.max_ticket
            )));
        }
        if sale.is_active() && self.is_sold(&sale.group, sale.number) {
            return Err(Error::AlreadySold {
                group: sale.group,
                number: sale.number,
            });
        }

        // Re-selling a cancelled ticket within the same millisecond would reuse the id.
        while self.get(&sale.id).is_some() {
            sale.created_at += Duration::milliseconds(1);
            sale.id = SaleId::derive(&sale.group, sale.number, sale.created_at);
        }

        let mut next = self.sales.clone();
        next.push(sale.clone());
        self.commit(next)?;

        tracing::info!(
            "Recorded sale {} ({} #{}, {})",
            sale.id,
            sale.group,
            sale.number,
            sale.status
        );
        Ok(sale)
    }

    /// Delete a sale; returns false when no sale had this id
    pub fn remove(&mut self, id: &SaleId) -> Result<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }

        let next = self
            .sales
            .iter()
            .filter(|sale| &sale.id != id)
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Change a sale's status; the sale must be pushed again afterwards
    pub fn update_status(&mut self, id: &SaleId, status: SaleStatus) -> Result<Sale> {
        let mut next = self.sales.clone();
        let sale = next
            .iter_mut()
            .find(|sale| &sale.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if status.holds_ticket() && !sale.is_active() && self.is_sold(&sale.group, sale.number) {
            return Err(Error::AlreadySold {
                group: sale.group.clone(),
                number: sale.number,
            });
        }

        sale.status = status;
        sale.synced = false;
        let updated = sale.clone();
        self.commit(next)?;
        Ok(updated)
    }

    /// Replace every remote-imported sale with a fresh remote snapshot.
    ///
    /// Local sales survive; when two sales share a ticket the later one wins,
    /// except that a cancelled sale never displaces an active one. The result
    /// is ordered by creation time so reapplying a snapshot is a no-op.
    pub fn merge_from_remote(&mut self, remote: Vec<Sale>) -> Result<()> {
        let locals = self.sales.iter().filter(|sale| !sale.from_remote).cloned();
        let remotes = remote.into_iter().map(|mut sale| {
            sale.from_remote = true;
            sale.synced = true;
            sale
        });

        let mut merged: Vec<Sale> = Vec::new();
        let mut by_ticket: HashMap<(String, u32), usize> = HashMap::new();

        for sale in locals.chain(remotes) {
            let key = (sale.group.clone(), sale.number);
            if let Some(&position) = by_ticket.get(&key) {
                if merged[position].is_active() && !sale.is_active() {
                    continue;
                }
                merged[position] = sale;
            } else {
                by_ticket.insert(key, merged.len());
                merged.push(sale);
            }
        }

        merged.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let imported = merged.iter().filter(|sale| sale.from_remote).count();
        self.commit(merged)?;
        tracing::info!("Merged {imported} sales from remote store");
        Ok(())
    }

    /// Merge sales announced by another context.
    ///
    /// A sale is taken only if its id is new and no active sale already holds
    /// its ticket (first writer wins). Returns how many sales were added.
    pub fn merge_incoming(&mut self, incoming: &[Sale]) -> Result<usize> {
        let mut next = self.sales.clone();
        let mut added = 0;

        for sale in incoming {
            let known_id = next.iter().any(|existing| existing.id == sale.id);
            let taken = next
                .iter()
                .any(|existing| existing.is_active() && existing.same_ticket(&sale.group, sale.number));
            if known_id || taken {
                continue;
            }
            next.push(sale.clone());
            added += 1;
        }

        if added > 0 {
            self.commit(next)?;
            tracing::debug!("Merged {added} sales from another context");
        }
        Ok(added)
    }

    /// Apply a cross-context notification
    pub fn apply(&mut self, notification: Notification) -> Result<usize> {
        match notification {
            Notification::NumberSold(sale) => self.merge_incoming(std::slice::from_ref(&sale)),
            Notification::RecordsChanged(sales) => self.merge_incoming(&sales),
        }
    }

    /// Ids of every sale still waiting for a successful push
    pub fn unsynced_ids(&self) -> Vec<SaleId> {
        self.sales
            .iter()
            .filter(|sale| !sale.synced)
            .map(|sale| sale.id.clone())
            .collect()
    }

    /// Mark a pushed sale as synced; returns false if it no longer exists
    pub fn mark_synced(&mut self, id: &SaleId) -> Result<bool> {
        let mut next = self.sales.clone();
        let Some(sale) = next.iter_mut().find(|sale| &sale.id == id) else {
            return Ok(false);
        };
        if sale.synced {
            return Ok(true);
        }
        sale.synced = true;
        self.commit(next)?;
        Ok(true)
    }

    /// Time of the last successful push, if any
    pub fn last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(keys::LAST_SYNC)? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|at| Some(at.with_timezone(&Utc)))
            .map_err(|error| Error::InvalidInput(format!("invalid last sync timestamp: {error}")))
    }

    pub fn record_sync_time(&self, at: DateTime<Utc>) -> Result<()> {
        self.store.set(keys::LAST_SYNC, &at.to_rfc3339())
    }

    pub fn stats(&self) -> SaleStats {
        SaleStats::collect(&self.sales, self.rules.unit_price_cents)
    }

    /// Tickets held by more than one active sale, left for manual cleanup
    pub fn duplicates(&self) -> Vec<DuplicateTicket> {
        let mut holders: BTreeMap<(String, u32), Vec<SaleId>> = BTreeMap::new();
        for sale in self.sales.iter().filter(|sale| sale.is_active()) {
            holders
                .entry((sale.group.clone(), sale.number))
                .or_default()
                .push(sale.id.clone());
        }

        holders
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|((group, number), ids)| DuplicateTicket { group, number, ids })
            .collect()
    }

    fn commit(&mut self, next: Vec<Sale>) -> Result<()> {
        let payload = serde_json::to_string(&next)?;
        self.store.set(keys::SALES, &payload)?;
        self.sales = next;
        Ok(())
    }
}

fn read_sales(store: &impl KeyValueStore) -> Result<Vec<Sale>> {
    match store.get(keys::SALES)? {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
        _ => Ok(Vec::new()),
    }
}

fn normalize_group(group: &str) -> Result<String> {
    let group = group.trim();
    if group.is_empty() {
        return Err(Error::InvalidInput("group name cannot be empty".to_string()));
    }
    Ok(group.to_string())
}
