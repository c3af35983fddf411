//! Core contracts for topcoint.
//!
//! This crate contains:
//! - The cached asset directory and its immutable snapshots
//! - Pure symbol resolution (exact match or ranked suggestions)
//! - The CoinDesk upstream client and combined detail fetch
//! - The request broker that serializes all client traffic into one
//!   ordered upstream pipeline
//! - Client-facing wire messages and structured errors

pub mod broker;
pub mod detail;
pub mod directory;
pub mod error;
pub mod http;
pub mod query;
pub mod resolver;
pub mod upstream;
pub mod wire;

pub use broker::{BrokerClosed, ClientRequest, RequestBroker};
pub use detail::{format_epoch, AssetDetail, DetailFetcher};
pub use directory::{AssetDirectory, AssetRecord};
pub use error::{UpstreamError, ValidationError};
pub use http::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use query::Query;
pub use resolver::{resolve, Resolution};
pub use upstream::CoinDeskClient;
pub use wire::{ClientMessage, DetailPayload, Response};
