//! Round-ending rules.
//!
//! Pure functions over a level configuration and the round counters, kept
//! apart from the session so they can be tested in isolation.

pub mod loss;
pub mod win;

pub use loss::{effective_turn_cap, turns_exhausted};
pub use win::{earns_perfect_bonus_life, is_perfect, is_won};
