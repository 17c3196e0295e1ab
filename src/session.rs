//! Session state shared between synchronization and the analysis tools.
//!
//! Holds the current aligned deals and work-order tables. Synchronization is
//! the only writer and always replaces both tables together; every tool call
//! receives the state by shared reference.

use crate::models::Table;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    deals: Option<Table>,
    orders: Option<Table>,
    synced_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Creates an unsynchronized session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both tables at once.
    pub fn replace(&mut self, deals: Table, orders: Table) {
        self.deals = Some(deals);
        self.orders = Some(orders);
        self.synced_at = Some(Utc::now());
    }

    pub fn deals(&self) -> Option<&Table> {
        self.deals.as_ref()
    }

    pub fn orders(&self) -> Option<&Table> {
        self.orders.as_ref()
    }

    /// Time of the last successful synchronization.
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }
}
