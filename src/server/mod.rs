//! TCP transport adapter
//!
//! Accepts connections and translates between the socket (newline-delimited
//! JSON frames) and the transport-agnostic dispatch core. One connection per
//! party; the party says who it is with a `provider:register` or
//! `user:register` event.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::DispatchServer;
