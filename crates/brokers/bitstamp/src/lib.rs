//! Bitstamp exchange adapter.
//!
//! Every call goes through one executor: look up the endpoint descriptor,
//! sign it if it is private, send it, reject `error` payloads, then run the
//! endpoint's normalizer. [`BitstampApi`] is the facade the rest of the
//! process talks to.

pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod endpoints;
pub mod normalize;
pub mod signer;

pub use api::BitstampApi;
pub use client::{ApiClient, Params};
pub use config::BitstampConfig;
pub use credentials::Credentials;
pub use endpoints::{Endpoint, Method, Visibility};
