//! AO message adapter.
//!
//! Combines the search index (metadata) with the content gateway (bodies) to
//! produce complete [`NodeType`] records, and writes through the messenger unit
//! once a signer is connected.

use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use super::http::{AoConnect, ArweaveGateway, GoldskyIndex};
use super::transport::{
    AoMessenger, ContentStore, DataItemSigner, DryRunRequest, MessageIndex, MessageRequest,
    SignerFactory,
};
use super::types::{AoProfile, MessagePage, NodeType, Tag};
use crate::config::AoNetworkConfig;
use crate::platform::{ClientError, SocialClient};

/// Body fetches in flight at once when listing messages.
pub const MAX_CONCURRENT_BODY_FETCHES: usize = 8;

const SEND_MESSAGE_ACTION: &str = "Send-Message";
const INFO_ACTION: &str = "Info";
const DRY_RUN_DATA: &str = "1984";

/// Tags attached to an outgoing reply to message `id`.
pub fn send_message_tags(id: &str) -> Vec<Tag> {
    vec![
        Tag::new("Action", SEND_MESSAGE_ACTION),
        Tag::new("Message-Id", id),
    ]
}

/// The external services an [`AoClient`] composes.
#[derive(Clone)]
pub struct AoServices {
    pub index: Arc<dyn MessageIndex>,
    pub content: Arc<dyn ContentStore>,
    pub messenger: Arc<dyn AoMessenger>,
}

impl AoServices {
    /// HTTP services at the configured endpoints.
    pub fn from_network(network: &AoNetworkConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::new();
        Ok(Self {
            index: Arc::new(GoldskyIndex::with_client(
                client.clone(),
                &network.graphql_url,
            )?),
            content: Arc::new(ArweaveGateway::with_client(
                client.clone(),
                &network.gateway_url,
            )?),
            messenger: Arc::new(AoConnect::with_client(
                client,
                &network.mu_url,
                &network.cu_url,
            )?),
        })
    }
}

/// Message adapter for one agent profile process.
///
/// Starts disconnected: reads and dry runs work, writes fail with
/// `NotConnected` until [`AoClient::connect`] succeeds. There is no way back to
/// disconnected.
pub struct AoClient {
    profile_contract_id: String,
    message_protocol_id: Option<String>,
    wallet: String,
    services: AoServices,
    signer_factory: Option<Arc<dyn SignerFactory>>,
    signer: OnceLock<Arc<dyn DataItemSigner>>,
}

impl AoClient {
    pub fn new(profile_contract_id: impl Into<String>, services: AoServices) -> Self {
        Self {
            profile_contract_id: profile_contract_id.into(),
            message_protocol_id: None,
            wallet: String::new(),
            services,
            signer_factory: None,
            signer: OnceLock::new(),
        }
    }

    /// Client wired to the HTTP services in `network`.
    pub fn from_network(
        profile_contract_id: impl Into<String>,
        network: &AoNetworkConfig,
    ) -> Result<Self, ClientError> {
        let services = AoServices::from_network(network)?;
        let mut client = Self::new(profile_contract_id, services);
        client.message_protocol_id = network.message_protocol_id.clone();
        Ok(client)
    }

    /// Wallet secret and the factory that turns it into a signer on `connect`.
    pub fn with_wallet(
        mut self,
        wallet: impl Into<String>,
        signer_factory: Arc<dyn SignerFactory>,
    ) -> Self {
        self.wallet = wallet.into();
        self.signer_factory = Some(signer_factory);
        self
    }

    /// Process that receives outgoing messages.
    pub fn with_message_protocol(mut self, process_id: impl Into<String>) -> Self {
        self.message_protocol_id = Some(process_id.into());
        self
    }

    pub fn profile_contract_id(&self) -> &str {
        &self.profile_contract_id
    }

    pub fn is_connected(&self) -> bool {
        self.signer.get().is_some()
    }

    /// Build the signer from the wallet secret. Calling again keeps the first
    /// signer.
    pub fn connect(&self) -> Result<(), ClientError> {
        if self.is_connected() {
            return Ok(());
        }
        let factory = self
            .signer_factory
            .as_ref()
            .ok_or_else(|| ClientError::config("No signer factory configured for AO client"))?;
        if self.wallet.is_empty() {
            return Err(ClientError::config("AO wallet is empty"));
        }

        let signer = factory.create(&self.wallet)?;
        // A concurrent connect may have won; either signer is equivalent.
        let _ = self.signer.set(signer);
        info!("AO client connected for {}", self.profile_contract_id);
        Ok(())
    }

    /// Metadata for `message_id` with its body attached.
    pub async fn get_message(&self, message_id: &str) -> Result<NodeType, ClientError> {
        debug!("AO get_message {}", message_id);
        let transaction = self
            .services
            .index
            .transaction(message_id)
            .await?
            .ok_or_else(|| {
                ClientError::not_found(format!("Transaction {} not found in index", message_id))
            })?;

        let body = self.get_message_data(message_id).await?;
        Ok(transaction.with_body(body))
    }

    /// Raw body of `message_id`.
    pub async fn get_message_data(&self, message_id: &str) -> Result<String, ClientError> {
        self.services.content.fetch(message_id).await
    }

    /// Up to `count` messages addressed to the profile, newest first.
    pub async fn fetch_incoming_messages(&self, count: usize) -> Result<Vec<NodeType>, ClientError> {
        Ok(self.fetch_incoming_page(count, "").await?.messages)
    }

    /// One page of incoming messages starting after `cursor` (`""` for the
    /// newest page). Every returned message has its body resolved.
    pub async fn fetch_incoming_page(
        &self,
        count: usize,
        cursor: &str,
    ) -> Result<MessagePage, ClientError> {
        if count == 0 {
            return Ok(MessagePage::default());
        }
        debug!(
            "AO fetch_incoming_page for {} (count={})",
            self.profile_contract_id, count
        );

        let page = self
            .services
            .index
            .incoming(&self.profile_contract_id, count, cursor)
            .await?;

        let content = &self.services.content;
        let messages: Vec<NodeType> = stream::iter(page.transactions.into_iter().take(count))
            .map(|transaction| async move {
                let body = content.fetch(&transaction.id).await?;
                Ok::<_, ClientError>(transaction.with_body(body))
            })
            .buffered(MAX_CONCURRENT_BODY_FETCHES)
            .try_collect()
            .await?;

        Ok(MessagePage {
            messages,
            next_cursor: page.next_cursor,
            has_next_page: page.has_next_page,
        })
    }

    /// Reply to message `id` with `content` on the message protocol process.
    pub async fn send_ao_message(&self, content: &str, id: &str) -> Result<String, ClientError> {
        let signer = self
            .signer
            .get()
            .ok_or_else(|| ClientError::not_connected("send_ao_message"))?;
        let process = self
            .message_protocol_id
            .clone()
            .ok_or_else(|| ClientError::config("AO_MESSAGE_PROTOCOL_ID is not set"))?;

        let request = MessageRequest {
            process,
            tags: send_message_tags(id),
            data: content.to_string(),
        };
        let message_id = self
            .services
            .messenger
            .message(request, signer.as_ref())
            .await?;
        info!("AO message {} sent in reply to {}", message_id, id);
        Ok(message_id)
    }

    /// Profile record of process `username`, read through a dry run.
    pub async fn get_profile(&self, username: &str) -> Result<AoProfile, ClientError> {
        let result = self
            .services
            .messenger
            .dryrun(DryRunRequest {
                process: username.to_string(),
                tags: vec![Tag::new("Action", INFO_ACTION)],
                data: DRY_RUN_DATA.to_string(),
            })
            .await?;

        let message = result.messages.into_iter().next().ok_or_else(|| {
            ClientError::not_found(format!("Dry run for {} returned no messages", username))
        })?;
        let profile: AoProfile = serde_json::from_str(&message.data).map_err(|e| {
            ClientError::parse(format!("Invalid profile data for {}: {}", username, e))
        })?;
        debug!("Profile for {}: {}", username, profile.profile.user_name);
        Ok(profile)
    }
}

#[async_trait]
impl SocialClient for AoClient {
    fn id(&self) -> &str {
        "ao"
    }

    fn name(&self) -> &str {
        "AO"
    }

    async fn get_message(&self, id: &str) -> Result<NodeType, ClientError> {
        AoClient::get_message(self, id).await
    }

    async fn fetch_incoming_messages(&self, count: usize) -> Result<Vec<NodeType>, ClientError> {
        AoClient::fetch_incoming_messages(self, count).await
    }

    async fn send_message(&self, content: &str, id: &str) -> Result<String, ClientError> {
        self.send_ao_message(content, id).await
    }
}
