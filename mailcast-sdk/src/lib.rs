//! Shared wire types for mailcast.
//!
//! The server speaks three payload families: the SNS/SES notification it
//! ingests on `POST /publish`, the frames it pushes to WebSocket subscribers,
//! and the tiny ping/pong health probe. All of them live in [`objects`].
//! Enable the `client` feature for typed HTTP/WebSocket clients.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
