//! Queries against the Goldsky Arweave search index.

use serde::{Deserialize, Serialize};

use super::types::IndexedTransaction;
use crate::platform::ClientError;

/// Sort order used for incoming messages: newest ingestion first.
pub const SORT_INGESTED_AT_DESC: &str = "INGESTED_AT_DESC";

const MESSAGE_FIELDS: &str = r#"
fragment MessageFields on Transaction {
  id
  ingested_at
  recipient
  block {
    timestamp
    height
  }
  tags {
    name
    value
  }
  data {
    size
    type
  }
  owner {
    address
  }
}
"#;

/// Single transaction by id.
pub fn transaction_query() -> String {
    format!(
        r#"query ($id: ID!) {{
  transaction(id: $id) {{
    ...MessageFields
  }}
}}
{}"#,
        MESSAGE_FIELDS
    )
}

/// Paginated transactions addressed to an entity.
pub fn transactions_query() -> String {
    format!(
        r#"query ($entityId: String!, $limit: Int!, $sortOrder: SortOrder!, $cursor: String) {{
  transactions(
    sort: $sortOrder
    first: $limit
    after: $cursor
    recipients: [$entityId]
  ) {{
    count
    pageInfo {{
      hasNextPage
    }}
    edges {{
      cursor
      node {{
        ...MessageFields
      }}
    }}
  }}
}}
{}"#,
        MESSAGE_FIELDS
    )
}

/// Request body posted to the index.
#[derive(Debug, Clone, Serialize)]
pub struct GraphqlRequest<V> {
    pub query: String,
    pub variables: V,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionVariables {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsVariables {
    pub cursor: String,
    pub entity_id: String,
    pub limit: usize,
    pub sort_order: String,
}

impl TransactionsVariables {
    /// Newest-first listing for `entity_id`.
    pub fn incoming(entity_id: &str, limit: usize, cursor: &str) -> Self {
        Self {
            cursor: cursor.to_string(),
            entity_id: entity_id.to_string(),
            limit,
            sort_order: SORT_INGESTED_AT_DESC.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<D> {
    pub data: Option<D>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,
}

impl<D> GraphqlResponse<D> {
    /// Unwrap `data`, turning GraphQL-level errors into parse errors.
    pub fn into_data(self) -> Result<D, ClientError> {
        if !self.errors.is_empty() {
            let messages: Vec<_> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(ClientError::parse(format!(
                "GraphQL errors: {}",
                messages.join("; ")
            )));
        }
        self.data
            .ok_or_else(|| ClientError::parse("GraphQL response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionData {
    pub transaction: Option<IndexedTransaction>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsData {
    pub transactions: TransactionConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionConnection {
    #[serde(default)]
    pub page_info: Option<PageInfo>,
    #[serde(default)]
    pub edges: Vec<TransactionEdge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct TransactionEdge {
    #[serde(default)]
    pub cursor: Option<String>,
    pub node: IndexedTransaction,
}

/// Listing result before bodies are attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPage {
    pub transactions: Vec<IndexedTransaction>,
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
}

impl From<TransactionConnection> for TransactionPage {
    fn from(connection: TransactionConnection) -> Self {
        let next_cursor = connection.edges.last().and_then(|e| e.cursor.clone());
        Self {
            has_next_page: connection
                .page_info
                .map(|p| p.has_next_page)
                .unwrap_or(false),
            next_cursor,
            transactions: connection.edges.into_iter().map(|e| e.node).collect(),
        }
    }
}
