pub mod analyze;
pub mod chunk;
pub mod config;
pub mod outline;
pub mod prompt;
pub mod providers;
pub mod templates;
