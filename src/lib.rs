// ABOUTME: Public library API for the Granola webhook relay
// ABOUTME: Re-exports core modules for the binary and integration tests

pub mod api;
pub mod cli;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod lock;
pub mod model;
pub mod payload;
pub mod retry;
pub mod state;
pub mod storage;
pub mod sync;
pub mod token;
pub mod util;
pub mod webhook;

pub use error::{Error, Result};
pub use model::{
    AccessToken, Credential, DeliveryPayload, DocumentSummary, PayloadSegment, Segment, SyncState,
    TokenResponse,
};
