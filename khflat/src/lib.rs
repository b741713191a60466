//! khflat - client-side decoder for the Google Earth "flatfile" tile protocol
//!
//! This library reconstructs, from the encrypted position-addressed byte
//! stream served by the imagery service, the availability and versioning
//! metadata needed to fetch individual image tiles, plus the per-tile
//! imagery-date timelines of the historical variant.
//!
//! # Architecture
//!
//! ```text
//! (x, y, z) ──► quad ──► packet address ──► cache/fetch ──► crypt ──► qtree
//!                                                                      │
//!                       tile version / history layers ◄── coverage map ┘
//! ```
//!
//! The [`engine::TileEngine`] composes the pieces; each layer below it is a
//! pure function over bytes and can be used standalone.

pub mod cache;
pub mod crypt;
pub mod dbroot;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod history;
pub mod qtree;
pub mod quad;

pub use dbroot::KeyBundle;
pub use engine::TileEngine;
pub use error::DecodeError;
pub use quad::QuadKey;
