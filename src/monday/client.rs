//! GraphQL client for the monday.com API.
//!
//! Fetches every item on a board, following `items_page` cursors, and turns
//! the items into a raw text [`Table`]: one row per item, `item_name` holding
//! the item's name and one column per board column title.

use crate::config::MondayConfig;
use crate::models::{Table, ITEM_NAME};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const ITEM_FIELDS: &str = "cursor items { name column_values { text column { title } } }";

/// Errors raised while fetching a board.
#[derive(Debug, thiserror::Error)]
pub enum MondayError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("monday.com returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("GraphQL errors: {0}")]
    Api(String),

    #[error("board {0} not found or not accessible")]
    BoardNotFound(String),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct BoardsData {
    #[serde(default)]
    boards: Vec<Board>,
}

#[derive(Debug, Deserialize)]
struct Board {
    #[serde(default)]
    name: Option<String>,
    items_page: ItemsPage,
}

#[derive(Debug, Deserialize)]
struct NextPageData {
    next_items_page: ItemsPage,
}

/// One page of board items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemsPage {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub column_values: Vec<ColumnValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnValue {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub column: Option<ColumnRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnRef {
    pub title: String,
}

pub struct MondayClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    api_version: String,
    page_limit: u32,
    max_pages: usize,
}

impl MondayClient {
    pub fn new(api_key: &str, config: &MondayConfig) -> Result<Self, MondayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: api_key.to_string(),
            api_version: config.api_version.clone(),
            page_limit: config.page_limit,
            max_pages: config.max_pages.max(1),
        })
    }

    /// Fetch a board as a raw table. Any failure is logged and yields an
    /// empty table.
    pub async fn fetch_board(&self, board_id: &str) -> Table {
        match self.try_fetch_board(board_id).await {
            Ok(table) => {
                info!(
                    "Fetched board {}: {} rows, {} columns",
                    board_id,
                    table.num_rows(),
                    table.num_columns()
                );
                table
            }
            Err(e) => {
                error!("Failed to fetch board {}: {}", board_id, e);
                Table::new()
            }
        }
    }

    /// Fetch every page of a board, up to the configured page cap.
    pub async fn try_fetch_board(&self, board_id: &str) -> Result<Table, MondayError> {
        let query = format!(
            "query ($board: [ID!], $limit: Int!) {{ boards(ids: $board) {{ name items_page(limit: $limit) {{ {} }} }} }}",
            ITEM_FIELDS
        );
        let body = self
            .post(&query, json!({ "board": [board_id], "limit": self.page_limit }))
            .await?;
        let (board_name, first) = parse_board_page(&body, board_id)?;
        debug!(
            "Board {} ({}) first page: {} items",
            board_id,
            board_name.as_deref().unwrap_or("unnamed"),
            first.items.len()
        );

        let mut items = first.items;
        let mut cursor = first.cursor;
        let mut pages = 1;

        while let Some(next) = cursor.take() {
            if pages >= self.max_pages {
                warn!(
                    "Board {} has more items than {} pages; remaining items skipped",
                    board_id, self.max_pages
                );
                break;
            }

            let query = format!(
                "query ($cursor: String!, $limit: Int!) {{ next_items_page(cursor: $cursor, limit: $limit) {{ {} }} }}",
                ITEM_FIELDS
            );
            let body = self
                .post(&query, json!({ "cursor": next, "limit": self.page_limit }))
                .await?;
            let page = parse_next_page(&body)?;
            debug!("Board {} page {}: {} items", board_id, pages + 1, page.items.len());

            items.extend(page.items);
            cursor = page.cursor;
            pages += 1;
        }

        Ok(items_to_table(&items))
    }

    async fn post(&self, query: &str, variables: serde_json::Value) -> Result<String, MondayError> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Authorization", &self.api_key)
            .header("API-Version", &self.api_version)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MondayError::Status { status, body });
        }
        Ok(body)
    }
}

fn parse_response<T: DeserializeOwned>(body: &str) -> Result<T, MondayError> {
    let response: GraphqlResponse<T> = serde_json::from_str(body)?;

    if !response.errors.is_empty() {
        let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(MondayError::Api(messages.join("; ")));
    }
    if let Some(message) = response.error_message {
        return Err(MondayError::Api(message));
    }

    response
        .data
        .ok_or_else(|| MondayError::Api("response carried no data".to_string()))
}

/// Parse the response to the first-page query into the board name and page.
pub fn parse_board_page(
    body: &str,
    board_id: &str,
) -> Result<(Option<String>, ItemsPage), MondayError> {
    let data: BoardsData = parse_response(body)?;
    let board = data
        .boards
        .into_iter()
        .next()
        .ok_or_else(|| MondayError::BoardNotFound(board_id.to_string()))?;
    Ok((board.name, board.items_page))
}

/// Parse the response to a `next_items_page` query.
pub fn parse_next_page(body: &str) -> Result<ItemsPage, MondayError> {
    let data: NextPageData = parse_response(body)?;
    Ok(data.next_items_page)
}

/// Build a raw table from board items. Null or blank text is absent.
pub fn items_to_table(items: &[Item]) -> Table {
    Table::from_records(items.iter().map(|item| {
        std::iter::once((ITEM_NAME.to_string(), Some(item.name.clone()))).chain(
            item.column_values.iter().filter_map(|value| {
                let title = value.column.as_ref()?.title.clone();
                let text = value
                    .text
                    .as_ref()
                    .filter(|t| !t.trim().is_empty())
                    .cloned();
                Some((title, text))
            }),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    const BOARD_PAGE: &str = include_str!("../../fixtures/monday_board_page.json");
    const NEXT_PAGE: &str = include_str!("../../fixtures/monday_next_page.json");
    const ERRORS: &str = include_str!("../../fixtures/monday_errors.json");

    #[test]
    fn test_parse_board_page() {
        let (name, page) = parse_board_page(BOARD_PAGE, "5026839123").unwrap();
        assert_eq!(name.as_deref(), Some("Deal funnel Data"));
        assert_eq!(page.items.len(), 2);
        assert!(page.cursor.is_some());
        assert_eq!(page.items[0].name, "Sakura");
    }

    #[test]
    fn test_items_to_table() {
        let (_, page) = parse_board_page(BOARD_PAGE, "1").unwrap();
        let table = items_to_table(&page.items);

        let names: Vec<_> = table.column_names().collect();
        assert_eq!(
            names,
            vec![
                "item_name",
                "Sector/service",
                "Masked Deal value",
                "Deal Stage",
                "Tentative Close Date"
            ]
        );
        assert_eq!(table.num_rows(), 2);

        let value = &table.column("Masked Deal value").unwrap().values;
        assert_eq!(value.get(0), Cell::Text("₹1,20,000"));
        assert!(value.is_null(1));
        assert!(table.column("Deal Stage").unwrap().values.is_null(1));
    }

    #[test]
    fn test_pages_concatenate_with_new_columns() {
        let (_, first) = parse_board_page(BOARD_PAGE, "1").unwrap();
        let next = parse_next_page(NEXT_PAGE).unwrap();
        assert!(next.cursor.is_none());

        let mut items = first.items;
        items.extend(next.items);
        let table = items_to_table(&items);

        assert_eq!(table.num_rows(), 3);
        let owner = &table.column("Deal Owner").unwrap().values;
        assert!(owner.is_null(0));
        assert_eq!(owner.get(2), Cell::Text("Owner unknown"));
        assert!(table.column("Deal Stage").unwrap().values.is_null(2));
    }

    #[test]
    fn test_graphql_errors() {
        let err = parse_board_page(ERRORS, "1").unwrap_err();
        assert!(matches!(err, MondayError::Api(ref m) if m.contains("unauthorized")));
    }

    #[test]
    fn test_missing_board() {
        let err = parse_board_page(r#"{"data": {"boards": []}}"#, "999").unwrap_err();
        assert!(matches!(err, MondayError::BoardNotFound(ref id) if id == "999"));
    }

    #[test]
    fn test_top_level_error_message() {
        let body = r#"{"error_message": "Rate limit exceeded", "status_code": 429}"#;
        assert!(matches!(parse_next_page(body), Err(MondayError::Api(_))));
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            parse_board_page("not json", "1"),
            Err(MondayError::Decode(_))
        ));
    }

    #[test]
    fn test_fetch_failure_yields_empty_table() {
        let config = MondayConfig {
            api_url: "http://127.0.0.1:9/v2".to_string(),
            timeout_seconds: 2,
            ..MondayConfig::default()
        };
        let client = MondayClient::new("token", &config).unwrap();

        let table = tokio_test::block_on(client.fetch_board("1"));
        assert!(table.is_empty());
    }
}
