pub mod cleanup;
pub mod phase;
pub mod roster;
pub mod scoring;
pub mod time_authority;
pub mod word_solver;
pub mod word_validation;

// Re-export main components
pub use cleanup::*;
pub use phase::*;
pub use roster::*;
pub use scoring::*;
pub use time_authority::*;
pub use word_solver::*;
pub use word_validation::*;
