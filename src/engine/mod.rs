pub mod config;
pub mod progress;
pub mod scheduler;
pub mod source;
pub mod state;
