//! Configuration for the AO and Clara adapters.
//!
//! Values come from a [`SettingsSource`] (agent runtime first, then the process
//! environment). Validation collects every failing field before returning, so a
//! misconfigured agent sees the whole list at startup.
//!
//! Clara on AO:
//! - `AO_USERNAME`, `AO_WALLET`, `AO_WALLET_ID`, `AO_MARKET_ID` - Required.
//! - `AO_POLL_INTERVAL` - Optional. Seconds between polls. Defaults to `120`.
//!
//! Clara on Story:
//! - `STORY_USERNAME`, `STORY_WALLET`, `STORY_WALLET_ID`, `STORY_MARKET_ID` - Required.
//! - `AO_POLL_INTERVAL` - Optional, shared with the AO variant.
//!
//! Full AO client schema ([`AoConfig`]) additionally requires `AO_RETRY_LIMIT`,
//! `AO_POLL_INTERVAL`, `AO_MESSAGE_INTERVAL_MIN`, `AO_MESSAGE_INTERVAL_MAX` and
//! `AO_MESSAGE_IMMEDIATELY`; `AO_MAX_MESSAGE_LENGTH` defaults to `280`.
//!
//! Network endpoints ([`AoNetworkConfig`]) are optional overrides:
//! `AO_GRAPHQL_URL`, `AO_GATEWAY_URL`, `AO_MU_URL`, `AO_CU_URL`,
//! `AO_MESSAGE_PROTOCOL_ID`.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::settings::{parse_boolean_from_text, SettingsSource};

pub const DEFAULT_MAX_MESSAGE_LENGTH: u32 = 280;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;

pub const DEFAULT_GRAPHQL_URL: &str = "https://arweave-search.goldsky.com/graphql";
pub const DEFAULT_GATEWAY_URL: &str = "https://arweave.net";
pub const DEFAULT_MU_URL: &str = "https://mu.ao-testnet.xyz";
pub const DEFAULT_CU_URL: &str = "https://cu.ao-testnet.xyz";

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Field path in the validated record, e.g. `CLARA_USERNAME`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("X/AO configuration validation failed:\n{}", format_issues(.issues))]
    Validation { issues: Vec<ConfigIssue> },
}

impl ConfigError {
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            ConfigError::Validation { issues } => issues,
        }
    }
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Which marketplace implementation a [`ClaraConfig`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaraImpl {
    Ao,
    Story,
}

impl ClaraImpl {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaraImpl::Ao => "ao",
            ClaraImpl::Story => "story",
        }
    }
}

impl fmt::Display for ClaraImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated Clara marketplace configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ClaraConfig {
    pub username: String,
    /// Wallet secret. Never logged.
    pub wallet: String,
    pub wallet_id: String,
    pub market_id: String,
    /// Seconds between incoming-message polls.
    pub poll_interval: u64,
    pub implementation: ClaraImpl,
}

impl ClaraConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

impl fmt::Debug for ClaraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaraConfig")
            .field("username", &self.username)
            .field("wallet", &"<redacted>")
            .field("wallet_id", &self.wallet_id)
            .field("market_id", &self.market_id)
            .field("poll_interval", &self.poll_interval)
            .field("implementation", &self.implementation)
            .finish()
    }
}

/// Validate Clara settings read from the `AO_*` keys.
pub fn validate_ao_config(source: &dyn SettingsSource) -> Result<ClaraConfig, ConfigError> {
    validate_clara(source, "AO", ClaraImpl::Ao)
}

/// Validate Clara settings read from the `STORY_*` keys.
pub fn validate_story_config(source: &dyn SettingsSource) -> Result<ClaraConfig, ConfigError> {
    validate_clara(source, "STORY", ClaraImpl::Story)
}

fn validate_clara(
    source: &dyn SettingsSource,
    prefix: &str,
    implementation: ClaraImpl,
) -> Result<ClaraConfig, ConfigError> {
    let mut v = Validator::new(source);
    let key = |suffix: &str| format!("{}_{}", prefix, suffix);

    let username = v.required_string(
        "CLARA_USERNAME",
        &key("USERNAME"),
        "CLARA username is required",
    );
    let wallet = v.required_string("CLARA_WALLET", &key("WALLET"), "CLARA wallet is required");
    let wallet_id = v.required_string(
        "CLARA_WALLET_ID",
        &key("WALLET_ID"),
        "CLARA wallet id is required",
    );
    let market_id = v.required_string(
        "CLARA_MARKET_ID",
        &key("MARKET_ID"),
        "CLARA market protocol id is required",
    );
    // Both variants share the AO poll interval.
    let poll_interval = safe_parse_interval(
        source.get_setting("AO_POLL_INTERVAL").as_deref(),
        DEFAULT_POLL_INTERVAL_SECS,
    );

    v.finish(ClaraConfig {
        username,
        wallet,
        wallet_id,
        market_id,
        poll_interval,
        implementation,
    })
}

/// Parse a positive interval from the leading integer of `value` (`"30s"` reads
/// as 30), falling back to `default` when there is none. Parsed values are
/// clamped to at least 1.
pub fn safe_parse_interval(value: Option<&str>, default: u64) -> u64 {
    match value.and_then(leading_integer) {
        Some(parsed) => parsed.max(1) as u64,
        None => default,
    }
}

fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let sign_len = usize::from(raw.starts_with(['+', '-']));
    let digits = raw[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len() - sign_len);
    if digits == 0 {
        return None;
    }
    let number = &raw[..sign_len + digits];
    match number.parse::<i64>() {
        Ok(n) => Some(n),
        // Digit runs too long for i64 saturate.
        Err(_) if number.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

/// The full AO client schema.
#[derive(Clone, PartialEq, Eq)]
pub struct AoConfig {
    pub username: String,
    pub wallet: String,
    pub wallet_id: String,
    pub market_id: String,
    pub max_message_length: u32,
    pub retry_limit: u32,
    pub poll_interval: u64,
    pub message_interval_min: u64,
    pub message_interval_max: u64,
    pub message_immediately: bool,
}

impl AoConfig {
    pub fn from_settings(source: &dyn SettingsSource) -> Result<Self, ConfigError> {
        let mut v = Validator::new(source);

        let username = v.required_string("AO_USERNAME", "AO_USERNAME", "AO username is required");
        let wallet = v.required_string("AO_WALLET", "AO_WALLET", "AO wallet is required");
        let wallet_id =
            v.required_string("AO_WALLET_ID", "AO_WALLET_ID", "AO wallet id is required");
        let market_id = v.required_string(
            "AO_MARKET_ID",
            "AO_MARKET_ID",
            "AO market protocol id is required",
        );
        let max_message_length =
            v.unsigned_u32("AO_MAX_MESSAGE_LENGTH", Some(DEFAULT_MAX_MESSAGE_LENGTH));
        let retry_limit = v.unsigned_u32("AO_RETRY_LIMIT", None);
        let poll_interval = v.integer("AO_POLL_INTERVAL", None, 1, u64::MAX);
        let message_interval_min = v.integer("AO_MESSAGE_INTERVAL_MIN", None, 0, u64::MAX);
        let message_interval_max = v.integer("AO_MESSAGE_INTERVAL_MAX", None, 0, u64::MAX);
        let message_immediately = v.boolean("AO_MESSAGE_IMMEDIATELY");

        v.finish(Self {
            username,
            wallet,
            wallet_id,
            market_id,
            max_message_length,
            retry_limit,
            poll_interval,
            message_interval_min,
            message_interval_max,
            message_immediately,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

impl fmt::Debug for AoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AoConfig")
            .field("username", &self.username)
            .field("wallet", &"<redacted>")
            .field("wallet_id", &self.wallet_id)
            .field("market_id", &self.market_id)
            .field("max_message_length", &self.max_message_length)
            .field("retry_limit", &self.retry_limit)
            .field("poll_interval", &self.poll_interval)
            .field("message_interval_min", &self.message_interval_min)
            .field("message_interval_max", &self.message_interval_max)
            .field("message_immediately", &self.message_immediately)
            .finish()
    }
}

/// Endpoints of the AO network services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AoNetworkConfig {
    /// GraphQL search index.
    pub graphql_url: String,
    /// Content gateway serving raw transaction data by id.
    pub gateway_url: String,
    /// Messenger unit accepting signed data items.
    pub mu_url: String,
    /// Compute unit answering dry runs.
    pub cu_url: String,
    /// Process that receives outgoing messages. Only needed for sending.
    pub message_protocol_id: Option<String>,
}

impl Default for AoNetworkConfig {
    fn default() -> Self {
        Self {
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            mu_url: DEFAULT_MU_URL.to_string(),
            cu_url: DEFAULT_CU_URL.to_string(),
            message_protocol_id: None,
        }
    }
}

impl AoNetworkConfig {
    pub fn from_settings(source: &dyn SettingsSource) -> Self {
        let get = |key: &str, default: &str| {
            source
                .get_setting(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            graphql_url: get("AO_GRAPHQL_URL", DEFAULT_GRAPHQL_URL),
            gateway_url: get("AO_GATEWAY_URL", DEFAULT_GATEWAY_URL),
            mu_url: get("AO_MU_URL", DEFAULT_MU_URL),
            cu_url: get("AO_CU_URL", DEFAULT_CU_URL),
            message_protocol_id: source
                .get_setting("AO_MESSAGE_PROTOCOL_ID")
                .filter(|v| !v.is_empty()),
        }
    }
}

/// Collects issues across fields so validation reports all of them at once.
struct Validator<'a> {
    source: &'a dyn SettingsSource,
    issues: Vec<ConfigIssue>,
}

impl<'a> Validator<'a> {
    fn new(source: &'a dyn SettingsSource) -> Self {
        Self {
            source,
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, path: &str, key: &str, message: impl Into<String>) {
        let message = message.into();
        let message = if path == key {
            message
        } else {
            format!("{} (set {})", message, key)
        };
        self.issues.push(ConfigIssue {
            path: path.to_string(),
            message,
        });
    }

    fn required_string(&mut self, path: &str, key: &str, message: &str) -> String {
        match self.source.get_setting(key).filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => {
                self.issue(path, key, message);
                String::new()
            }
        }
    }

    /// Integer in `min..=max`. Anything else is recorded as an issue.
    fn integer(&mut self, key: &str, default: Option<u64>, min: u64, max: u64) -> u64 {
        let raw = self
            .source
            .get_setting(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let raw = match (raw, default) {
            (None, Some(default)) => return default,
            (None, None) => {
                self.issue(key, key, "Required");
                return min;
            }
            (Some(raw), _) => raw,
        };
        match raw.parse::<i128>() {
            Ok(n) if n < i128::from(min) => {
                self.issue(
                    key,
                    key,
                    format!("Number must be greater than or equal to {}", min),
                );
                min
            }
            Ok(n) if n > i128::from(max) => {
                self.issue(
                    key,
                    key,
                    format!("Number must be less than or equal to {}", max),
                );
                min
            }
            Ok(n) => n as u64,
            Err(_) => {
                self.issue(key, key, format!("Expected integer, received \"{}\"", raw));
                min
            }
        }
    }

    fn unsigned_u32(&mut self, key: &str, default: Option<u32>) -> u32 {
        let value = self.integer(key, default.map(u64::from), 0, u64::from(u32::MAX));
        u32::try_from(value).unwrap_or_default()
    }

    fn boolean(&mut self, key: &str) -> bool {
        match self.source.get_setting(key).filter(|v| !v.is_empty()) {
            None => {
                self.issue(key, key, "Required");
                false
            }
            Some(raw) => match parse_boolean_from_text(&raw) {
                Some(b) => b,
                None => {
                    self.issue(key, key, format!("Expected boolean, received \"{}\"", raw));
                    false
                }
            },
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ConfigError> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(ConfigError::Validation {
                issues: self.issues,
            })
        }
    }
}
