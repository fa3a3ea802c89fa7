//! Capability interface shared by the social platform clients.
//!
//! Every client implements the core (read one message, list incoming, send).
//! The rest of the surface is optional: the provided methods answer with
//! [`ClientErrorKind::Unsupported`] so callers can tell "not offered" apart from
//! "no data", and [`SocialClient::capabilities`] lets them check up front.

mod error;

pub use error::{classify_http_status, ClientError, ClientErrorKind, StatusClass};

use async_trait::async_trait;

use crate::ao::NodeType;

/// Optional features a client offers beyond the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub search: bool,
    pub following_timeline: bool,
    pub user_messages: bool,
    pub notes: bool,
    pub engagement: bool,
    pub session_cookies: bool,
}

/// Search ordering, for clients that support search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Top,
    Latest,
    Photos,
    Videos,
    Users,
}

#[async_trait]
pub trait SocialClient: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    async fn get_message(&self, id: &str) -> Result<NodeType, ClientError>;

    /// Up to `count` messages addressed to this agent, newest first.
    async fn fetch_incoming_messages(&self, count: usize) -> Result<Vec<NodeType>, ClientError>;

    /// Post `content` in reply to message `id`, returning the new message id.
    async fn send_message(&self, content: &str, id: &str) -> Result<String, ClientError>;

    async fn fetch_search_messages(
        &self,
        _query: &str,
        _max_messages: usize,
        _mode: SearchMode,
        _cursor: Option<&str>,
    ) -> Result<Vec<NodeType>, ClientError> {
        Err(ClientError::unsupported("fetch_search_messages"))
    }

    async fn fetch_following_timeline(
        &self,
        _count: usize,
        _seen_ids: &[String],
    ) -> Result<Vec<NodeType>, ClientError> {
        Err(ClientError::unsupported("fetch_following_timeline"))
    }

    async fn get_user_messages(
        &self,
        _user_id: &str,
        _count: usize,
    ) -> Result<Vec<NodeType>, ClientError> {
        Err(ClientError::unsupported("get_user_messages"))
    }

    async fn send_note_tweet(
        &self,
        _content: &str,
        _reply_to: Option<&str>,
    ) -> Result<String, ClientError> {
        Err(ClientError::unsupported("send_note_tweet"))
    }

    async fn like_tweet(&self, _id: &str) -> Result<(), ClientError> {
        Err(ClientError::unsupported("like_tweet"))
    }

    async fn retweet(&self, _id: &str) -> Result<(), ClientError> {
        Err(ClientError::unsupported("retweet"))
    }

    async fn send_quote_tweet(
        &self,
        _content: &str,
        _quoted_id: &str,
    ) -> Result<String, ClientError> {
        Err(ClientError::unsupported("send_quote_tweet"))
    }

    async fn set_cookies(&self, _cookies: &[String]) -> Result<(), ClientError> {
        Err(ClientError::unsupported("set_cookies"))
    }
}
