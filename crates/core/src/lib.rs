//! Domain logic for learner progress and CEFR level advancement.
//!
//! This crate has no database or HTTP dependencies. Callers load learner and
//! module state and pass it in; everything here is deterministic given its
//! inputs and the supplied [`clock::Clock`].

pub mod activity;
pub mod advancement;
pub mod cefr;
pub mod clock;
pub mod error;
pub mod modules;
pub mod progress;
pub mod types;
