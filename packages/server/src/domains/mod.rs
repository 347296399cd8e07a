pub mod access;
pub mod identity;
pub mod mugshots;
pub mod payments;
