//! Arweave/AO messaging backend.
//!
//! ```text
//!   AoClient ──► MessageIndex   (GraphQL search: metadata, listings)
//!      │    ──► ContentStore   (gateway: raw bodies by id)
//!      │    ──► AoMessenger    (MU: signed writes, CU: dry runs)
//!      ▼
//!   NodeType with data.value resolved
//! ```

pub mod client;
pub mod graphql;
pub mod http;
pub mod poller;
pub mod transport;
pub mod types;

pub use client::{send_message_tags, AoClient, AoServices, MAX_CONCURRENT_BODY_FETCHES};
pub use http::{AoConnect, ArweaveGateway, GoldskyIndex};
pub use poller::{MessagePoller, PollerConfig, SeenIds};
pub use transport::{
    AoMessenger, ContentStore, DataItemSigner, DryRunMessage, DryRunRequest, DryRunResult,
    MessageIndex, MessageRequest, SignedDataItem, SignerFactory,
};
pub use types::{
    AoProfile, Block, IndexedTransaction, MessageData, MessagePage, NodeType, Owner, ProfileInfo,
    Tag,
};
