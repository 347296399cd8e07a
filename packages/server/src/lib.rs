// FoundersWall - community directory backend
//
// This crate provides the backend API for the maker directory: mugshot
// profiles, one-time lifetime-access payments, and the access-control
// workflow that gates member-only features behind login, profile creation,
// and payment.

pub mod config;
pub mod domains;
pub mod server;

pub use config::*;
