//! Client core for the chirp feed: session gating, the post composer, the
//! feed, and the keyed query cache they share.
//!
//! Nothing in here talks to a network or draws pixels. The posts service,
//! the identity provider and the notification sink are capabilities handed
//! in by the host, and every component produces a view tree that can be
//! rendered to markup.

pub mod api;
pub mod composer;
pub mod config;
pub mod feed;
pub mod loading;
pub mod memory;
pub mod notify;
pub mod page;
pub mod query;
pub mod session;
pub mod view;
