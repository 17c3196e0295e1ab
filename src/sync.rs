//! Board synchronization.
//!
//! Fetches the Deals and Work Orders boards, normalizes and aligns them,
//! and swaps both into the session together. A sync that yields an empty
//! board leaves the previous session state in place.

use crate::align::align;
use crate::models::Table;
use crate::monday::MondayClient;
use crate::normalize::{normalize, KeywordRules};
use crate::session::SessionState;
use serde::Serialize;
use tracing::{debug, info};

/// Display name of the Deals board.
pub const DEALS_BOARD: &str = "Deals";

/// Display name of the Work Orders board.
pub const ORDERS_BOARD: &str = "Work Orders";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("no data returned for the {0} board")]
    EmptyBoard(&'static str),

    #[error("no data returned for either board")]
    BothEmpty,
}

/// Shape of the tables produced by one synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub deal_rows: usize,
    pub deal_columns: usize,
    pub order_rows: usize,
    pub order_columns: usize,
}

/// Normalized and aligned tables ready to be stored.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub deals: Table,
    pub orders: Table,
    pub report: SyncReport,
}

/// Normalize and align two raw board tables.
///
/// Fails when either raw table is empty.
pub fn reconcile(
    deals_raw: &Table,
    orders_raw: &Table,
    rules: &KeywordRules,
) -> Result<Reconciled, SyncError> {
    match (deals_raw.is_empty(), orders_raw.is_empty()) {
        (true, true) => return Err(SyncError::BothEmpty),
        (true, false) => return Err(SyncError::EmptyBoard(DEALS_BOARD)),
        (false, true) => return Err(SyncError::EmptyBoard(ORDERS_BOARD)),
        (false, false) => {}
    }

    let deals = normalize(deals_raw, rules);
    let orders = normalize(orders_raw, rules);
    debug!(
        "Normalized deals {}x{} and orders {}x{}",
        deals.num_rows(),
        deals.num_columns(),
        orders.num_rows(),
        orders.num_columns()
    );

    let (deals, orders) = align(&deals, &orders);

    let report = SyncReport {
        deal_rows: deals.num_rows(),
        deal_columns: deals.num_columns(),
        order_rows: orders.num_rows(),
        order_columns: orders.num_columns(),
    };

    Ok(Reconciled {
        deals,
        orders,
        report,
    })
}

/// Fetch both boards concurrently and replace the session tables.
pub async fn synchronize(
    client: &MondayClient,
    deals_board_id: &str,
    orders_board_id: &str,
    rules: &KeywordRules,
    state: &mut SessionState,
) -> Result<SyncReport, SyncError> {
    let (deals_raw, orders_raw) = futures::future::join(
        client.fetch_board(deals_board_id),
        client.fetch_board(orders_board_id),
    )
    .await;

    let reconciled = reconcile(&deals_raw, &orders_raw, rules)?;
    state.replace(reconciled.deals, reconciled.orders);

    info!(
        "Synced {} deals and {} work orders",
        reconciled.report.deal_rows, reconciled.report.order_rows
    );
    Ok(reconciled.report)
}
