//! Mugshots domain - public maker profiles
//!
//! A mugshot is the one-per-user identity card a maker creates to join the
//! wall. Its existence is one of the three inputs to the access decision
//! (identity, profile, payment).

pub mod cache;
pub mod models;
pub mod store;

pub use cache::MugshotListingCache;
pub use models::{Badge, CreateMugshot, Mugshot, UpdateMugshot};
pub use store::{MemoryMugshotStore, MugshotStore, PostgresMugshotStore};
