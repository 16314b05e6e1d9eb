//! Subcommands that move between branches.

mod moves;
pub use moves::{NextCmd, PrevCmd, TopCmd};

mod update;
pub use update::UpdateCmd;
