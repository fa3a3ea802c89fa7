//! Records exchanged with the AO network.

use serde::{Deserialize, Serialize};

/// A name/value tag on an AO message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Data descriptor as the search index reports it (no body).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DataDescriptor {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default, rename = "type")]
    pub content_type: Option<String>,
}

/// Transaction metadata from the search index, before its body is attached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexedTransaction {
    pub id: String,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub data: DataDescriptor,
    #[serde(default)]
    pub block: Option<Block>,
    #[serde(default)]
    pub ingested_at: Option<u64>,
}

impl IndexedTransaction {
    /// Attach the raw body fetched from the content store.
    pub fn with_body(self, value: String) -> NodeType {
        NodeType {
            id: self.id,
            recipient: self.recipient,
            owner: self.owner,
            tags: self.tags,
            data: MessageData {
                size: self.data.size,
                content_type: self.data.content_type,
                value,
            },
            block: self.block,
            ingested_at: self.ingested_at,
        }
    }
}

/// Message body plus the descriptor fields the index reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Raw body from the content store.
    pub value: String,
}

/// A fully populated AO message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub data: MessageData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<u64>,
}

impl NodeType {
    /// Sender wallet address.
    pub fn sender(&self) -> Option<&str> {
        self.owner.address.as_deref()
    }

    /// First tag value named `name`.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }

    /// Block timestamp, or ingestion time for messages not yet in a block.
    pub fn timestamp(&self) -> Option<u64> {
        self.block
            .and_then(|b| b.timestamp)
            .or(self.ingested_at)
    }
}

/// One page of incoming messages, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub messages: Vec<NodeType>,
    /// Cursor of the last edge, for resuming.
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Result of an `Info` dry run against a profile process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AoProfile {
    #[serde(default)]
    pub assets: Vec<serde_json::Value>,
    pub owner: String,
    #[serde(default)]
    pub collections: Vec<serde_json::Value>,
    pub profile: ProfileInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProfileInfo {
    pub version: String,
    pub profile_image: String,
    pub user_name: String,
    pub cover_image: String,
    pub description: String,
    pub date_updated: u64,
    pub display_name: String,
    pub date_created: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indexed_transaction_tolerates_sparse_nodes() {
        let tx: IndexedTransaction =
            serde_json::from_value(json!({ "id": "abc123", "data": {} })).unwrap();
        let node = tx.with_body("hello world".to_string());
        assert_eq!(node.id, "abc123");
        assert_eq!(node.data.value, "hello world");
        assert_eq!(node.sender(), None);
        assert_eq!(node.timestamp(), None);
    }

    #[test]
    fn node_accessors() {
        let tx: IndexedTransaction = serde_json::from_value(json!({
            "id": "m1",
            "recipient": "proc",
            "owner": { "address": "sender-addr" },
            "tags": [
                { "name": "Action", "value": "Send-Message" },
                { "name": "Message-Id", "value": "42" }
            ],
            "data": { "size": "11", "type": "text/plain" },
            "block": null,
            "ingested_at": 1700000000
        }))
        .unwrap();
        let node = tx.with_body("hello world".to_string());
        assert_eq!(node.sender(), Some("sender-addr"));
        assert_eq!(node.tag("Message-Id"), Some("42"));
        assert_eq!(node.tag("Missing"), None);
        assert_eq!(node.timestamp(), Some(1700000000));
        assert_eq!(node.data.content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn profile_uses_pascal_case_keys() {
        let profile: AoProfile = serde_json::from_value(json!({
            "Assets": ["asset-1"],
            "Owner": "owner-addr",
            "Collections": [],
            "Profile": {
                "Version": "1",
                "ProfileImage": "img-tx",
                "UserName": "clara",
                "CoverImage": "cover-tx",
                "Description": "agent",
                "DateUpdated": 1717000000000u64,
                "DisplayName": "Clara",
                "DateCreated": 1716000000000u64
            }
        }))
        .unwrap();
        assert_eq!(profile.owner, "owner-addr");
        assert_eq!(profile.profile.user_name, "clara");
        assert_eq!(profile.profile.date_created, 1716000000000);
    }
}
