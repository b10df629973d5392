pub mod config;
pub mod prefs;
pub mod tag;
pub mod task;

pub use config::*;
pub use prefs::*;
pub use tag::*;
pub use task::*;
