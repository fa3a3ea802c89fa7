//! Seams to the external AO services.
//!
//! `AoClient` only talks to these traits. The reqwest implementations live in
//! [`super::http`]; tests substitute in-memory fakes.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::graphql::TransactionPage;
use super::types::{IndexedTransaction, Tag};
use crate::platform::ClientError;

/// Searchable metadata over AO transactions.
#[async_trait]
pub trait MessageIndex: Send + Sync {
    /// Look up one transaction. `Ok(None)` when the index has no such id.
    async fn transaction(&self, id: &str) -> Result<Option<IndexedTransaction>, ClientError>;

    /// List transactions addressed to `entity_id`, newest ingestion first.
    async fn incoming(
        &self,
        entity_id: &str,
        limit: usize,
        cursor: &str,
    ) -> Result<TransactionPage, ClientError>;
}

/// Raw transaction bodies addressed by id.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<String, ClientError>;
}

/// A data item signed and ready for the messenger unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDataItem {
    pub id: String,
    pub raw: Vec<u8>,
}

/// Authorizes outgoing messages. Built from a wallet secret by a
/// [`SignerFactory`]; key handling is the implementor's concern.
#[async_trait]
pub trait DataItemSigner: Send + Sync {
    async fn sign(
        &self,
        target: &str,
        tags: &[Tag],
        data: &str,
    ) -> Result<SignedDataItem, ClientError>;
}

/// Turns the configured wallet secret into a signer.
pub trait SignerFactory: Send + Sync {
    fn create(&self, wallet: &str) -> Result<Arc<dyn DataItemSigner>, ClientError>;
}

/// Message to submit to a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRequest {
    pub process: String,
    pub tags: Vec<Tag>,
    pub data: String,
}

/// Read-only evaluation of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunRequest {
    pub process: String,
    pub tags: Vec<Tag>,
    pub data: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DryRunResult {
    #[serde(default)]
    pub messages: Vec<DryRunMessage>,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DryRunMessage {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// AO write and dry-run primitives.
#[async_trait]
pub trait AoMessenger: Send + Sync {
    /// Sign and submit `request`, returning the message id.
    async fn message(
        &self,
        request: MessageRequest,
        signer: &dyn DataItemSigner,
    ) -> Result<String, ClientError>;

    /// Evaluate `request` without changing process state.
    async fn dryrun(&self, request: DryRunRequest) -> Result<DryRunResult, ClientError>;
}
