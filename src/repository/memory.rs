//! In-memory repositories backed by an id-ordered map.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{ApiError, Result};
use crate::models::{Sort, SortDirection, Trade, TradeInput, User, UserInput};
use crate::repository::{TradeRepository, UserRepository};

/// Field-wise ordering used by `fetch_page`.
trait SortKey {
    /// `None` when `field` is not sortable for this entity.
    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering>;
}

impl SortKey for User {
    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering> {
        match field {
            "id" => Some(self.id.cmp(&other.id)),
            "name" => Some(self.name.cmp(&other.name)),
            _ => None,
        }
    }
}

impl SortKey for Trade {
    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering> {
        let ordering = match field {
            "id" => self.id.cmp(&other.id),
            "symbol" => self.symbol.cmp(&other.symbol),
            "quantity" => self.quantity.cmp(&other.quantity),
            "price" => self.price.total_cmp(&other.price),
            "tradeDate" => self.trade_date.cmp(&other.trade_date),
            "settlementDate" => self.settlement_date.cmp(&other.settlement_date),
            "status" => self.status.cmp(&other.status),
            "counterparty" => self.counterparty.cmp(&other.counterparty),
            _ => return None,
        };
        Some(ordering)
    }
}

// == Table ==
/// Rows keyed by id with a monotonically increasing id sequence.
struct Table<T> {
    rows: RwLock<BTreeMap<u64, T>>,
    next_id: AtomicU64,
}

impl<T: Clone + SortKey> Table<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<u64, T>>> {
        self.rows
            .read()
            .map_err(|_| ApiError::Internal("repository lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<u64, T>>> {
        self.rows
            .write()
            .map_err(|_| ApiError::Internal("repository lock poisoned".to_string()))
    }

    fn find_by_id(&self, id: u64) -> Result<Option<T>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn find_all(&self) -> Result<Vec<T>> {
        Ok(self.read()?.values().cloned().collect())
    }

    /// Without a sortable field the rows are ordered by id, still honoring the
    /// requested direction.
    fn fetch_page(&self, offset: u64, limit: u32, sort: &Sort) -> Result<Vec<T>> {
        let mut rows: Vec<T> = self.read()?.values().cloned().collect();

        let field = sort
            .field
            .as_deref()
            .filter(|field| rows.first().is_some_and(|row| row.compare_by(row, field).is_some()))
            .unwrap_or("id");
        // Stable sort: ties stay in ascending id order
        rows.sort_by(|a, b| {
            let ordering = a.compare_by(b, field).unwrap_or(Ordering::Equal);
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(limit as usize).collect())
    }

    fn count(&self) -> Result<u64> {
        Ok(self.read()?.len() as u64)
    }

    fn insert_with(&self, build: impl FnOnce(u64) -> T) -> Result<T> {
        let mut rows = self.write()?;
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        let row = build(id);
        rows.insert(id, row.clone());
        Ok(row)
    }

    fn update_with(&self, id: u64, build: impl FnOnce(u64) -> T) -> Result<Option<T>> {
        let mut rows = self.write()?;
        match rows.get_mut(&id) {
            Some(slot) => {
                *slot = build(id);
                Ok(Some(slot.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, id: u64) -> Result<bool> {
        Ok(self.write()?.remove(&id).is_some())
    }
}

// == Users ==
pub struct InMemoryUserRepository {
    table: Table<User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_id(&self, id: u64) -> Result<Option<User>> {
        self.table.find_by_id(id)
    }

    fn find_all(&self) -> Result<Vec<User>> {
        self.table.find_all()
    }

    fn fetch_page(&self, offset: u64, limit: u32, sort: &Sort) -> Result<Vec<User>> {
        self.table.fetch_page(offset, limit, sort)
    }

    fn count(&self) -> Result<u64> {
        self.table.count()
    }

    fn insert(&self, input: UserInput) -> Result<User> {
        self.table.insert_with(|id| input.into_user(id))
    }

    fn update(&self, id: u64, input: UserInput) -> Result<Option<User>> {
        self.table.update_with(id, |id| input.into_user(id))
    }

    fn delete(&self, id: u64) -> Result<bool> {
        self.table.delete(id)
    }
}

// == Trades ==
pub struct InMemoryTradeRepository {
    table: Table<Trade>,
}

impl InMemoryTradeRepository {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }
}

impl Default for InMemoryTradeRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeRepository for InMemoryTradeRepository {
    fn find_by_id(&self, id: u64) -> Result<Option<Trade>> {
        self.table.find_by_id(id)
    }

    fn find_all(&self) -> Result<Vec<Trade>> {
        self.table.find_all()
    }

    fn fetch_page(&self, offset: u64, limit: u32, sort: &Sort) -> Result<Vec<Trade>> {
        self.table.fetch_page(offset, limit, sort)
    }

    fn count(&self) -> Result<u64> {
        self.table.count()
    }

    fn insert(&self, input: TradeInput) -> Result<Trade> {
        self.table.insert_with(|id| input.into_trade(id))
    }

    fn update(&self, id: u64, input: TradeInput) -> Result<Option<Trade>> {
        self.table.update_with(id, |id| input.into_trade(id))
    }

    fn delete(&self, id: u64) -> Result<bool> {
        self.table.delete(id)
    }
}
