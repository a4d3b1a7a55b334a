//! # Gameplay Integration
//!
//! The seam between the deterministic tick and game-specific rules.
//! The scheduler owns *when* rules run; the integrator owns *what* they do.

mod traits;

pub use traits::{circles_overlap, GameplayRules, NoopRules};
