//! Shared types and backend gateways for songshare.
//!
//! The TUI talks to three managed services: an identity provider, a GraphQL
//! data API and a blob store. Each is reached through a trait in [`gateway`]
//! so the controller can be driven by in-memory fakes in tests.

pub mod auth;
pub mod blob;
pub mod config;
pub mod error;
pub mod gateway;
pub mod graphql;
pub mod platform;
pub mod song;

pub use error::GatewayError;
pub use song::{Song, SongDraft, SongInput};
