//! # clara-ao
//!
//! Client adapters that let an autonomous agent read and post messages on the
//! AO network and take part in the Clara task marketplace.
//!
//! ## Architecture
//!
//! ```text
//!   agent runtime ── SettingsSource ──► config (ClaraConfig / AoConfig)
//!         │
//!         ├──► AoClient (SocialClient) ──► search index / gateway / MU / CU
//!         │        ▲
//!         │        └── MessagePoller (interval + caller-side retries)
//!         │
//!         └──► ClaraMarket ──► MarketplaceSdk (external)
//! ```
//!
//! ## Modules
//! - `settings`: runtime settings lookup with environment fallback
//! - `config`: validated configuration records
//! - `platform`: capability interface and error taxonomy shared by clients
//! - `ao`: AO message adapter, HTTP services, poller
//! - `clara`: marketplace profile registration

pub mod ao;
pub mod clara;
pub mod config;
pub mod platform;
pub mod settings;

pub use ao::AoClient;
pub use config::{AoConfig, AoNetworkConfig, ClaraConfig, ConfigError};
pub use platform::{Capabilities, ClientError, ClientErrorKind, SocialClient};
pub use settings::{EnvSettings, MapSettings, SettingsSource};
