pub mod archive;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod fsops;
pub mod manifest;
pub mod matcher;
pub mod normalize;
pub mod progress;
pub mod roster;

pub use config::AppConfig;
pub use engine::{OrganizeEngine, RunStatistics};
pub use error::Error;
pub use matcher::{MatchMethod, MatchOptions, Matcher, RosterMatch};
pub use progress::{ProgressReporter, SilentReporter};
pub use roster::{Roster, RosterRecord};
