//! # Passbolt
//!
//! Passbolt vault client.
//!
//! - `api.rs` - Wire types and the [`PassboltApi`] seam
//! - `http.rs` - `reqwest` implementation of the GPGAuth login and resource endpoints
//! - `gpg.rs` - `gpg` subprocess keyring used to answer challenges and decrypt secrets
//! - `client.rs` - Session handling, metering and the name/ID cache refresh
//! - `record.rs` - The resolved record handed to the rendering engine

mod api;
mod client;
mod error;
mod gpg;
mod http;
mod record;

pub use api::{PassboltApi, Resource, Session};
pub use client::VaultClient;
pub use error::VaultError;
pub use gpg::{GpgKeyring, MessageCrypto};
pub use http::PassboltHttpApi;
pub use record::ResolvedSecret;
