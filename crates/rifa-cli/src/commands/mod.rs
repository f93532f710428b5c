pub mod add;
pub mod admin;
pub mod available;
pub mod common;
pub mod completions;
pub mod export;
pub mod list;
pub mod remove;
pub mod reserve;
pub mod stats;
pub mod status;
pub mod sync;
pub mod watch;
