//! Access domain - the decision engine behind every gated feature
//!
//! Combines identity, profile existence, and payment status into a single
//! four-way verdict, checked strictly in that order so a denial always
//! names the next step the user can actually take.

pub mod engine;
pub mod errors;
pub mod verdict;

pub use engine::{decide, AccessEngine, GateRequirements};
pub use errors::AccessError;
pub use verdict::Verdict;
