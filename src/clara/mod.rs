//! Clara task marketplace.
//!
//! The marketplace protocol itself lives behind [`MarketplaceSdk`]; this module
//! only decides when an agent needs registering and keeps the resulting
//! profile handle.

mod market;

pub use market::{ClaraMarket, MarketError, DEFAULT_PROFILES_DIR};

use async_trait::async_trait;
use serde::Serialize;

/// Fee, in the market's smallest unit, an agent asks per task.
pub const DEFAULT_AGENT_FEE: u64 = 10_000_000;
pub const TWEET_TOPIC: &str = "tweet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentMetadata {
    pub description: String,
}

/// Payload for registering an agent profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRegistration {
    pub metadata: AgentMetadata,
    pub topic: String,
    pub fee: u64,
    pub agent_id: String,
}

impl AgentRegistration {
    /// Registration for a tweeting agent identified by `profile_id`.
    pub fn tweet_agent(profile_id: &str) -> Self {
        Self {
            metadata: AgentMetadata {
                description: profile_id.to_string(),
            },
            topic: TWEET_TOPIC.to_string(),
            fee: DEFAULT_AGENT_FEE,
            agent_id: profile_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingStrategy {
    Cheapest,
    Random,
    Leastoccupied,
}

/// A task posted by a requesting agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub topic: String,
    /// Reward in wei.
    pub reward: u128,
    pub matching_strategy: MatchingStrategy,
    pub payload: String,
}

impl TaskRequest {
    pub fn tweet(payload: impl Into<String>, reward: u128) -> Self {
        Self {
            topic: TWEET_TOPIC.to_string(),
            reward,
            matching_strategy: MatchingStrategy::Cheapest,
            payload: payload.into(),
        }
    }
}

/// The marketplace SDK operations the adapter consumes.
#[async_trait]
pub trait MarketplaceSdk: Send + Sync {
    type Profile: Send + Sync;

    /// Register a new agent profile owned by `wallet`.
    async fn register_agent(
        &self,
        wallet: &str,
        registration: &AgentRegistration,
    ) -> anyhow::Result<Self::Profile>;

    /// Rebuild the handle of an already registered profile.
    fn load_profile(&self, wallet: &str, market_id: &str) -> anyhow::Result<Self::Profile>;

    /// Post a task from `profile`, returning the SDK's receipt.
    async fn register_task(
        &self,
        profile: &Self::Profile,
        task: &TaskRequest,
    ) -> anyhow::Result<serde_json::Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registration_wire_shape() {
        let registration = AgentRegistration::tweet_agent("agent-7");
        assert_eq!(
            serde_json::to_value(&registration).unwrap(),
            json!({
                "metadata": { "description": "agent-7" },
                "topic": "tweet",
                "fee": 10000000,
                "agentId": "agent-7"
            })
        );
    }

    #[test]
    fn task_defaults_to_cheapest() {
        let task = TaskRequest::tweet("post tweet about moon", 10_000_000);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["matchingStrategy"], "cheapest");
        assert_eq!(value["topic"], "tweet");
    }
}
