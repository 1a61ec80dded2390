pub mod audio;
pub mod config;
pub mod error;
pub mod handlers;
pub mod kernel;
pub mod mocks;
pub mod outputs;
pub mod services;

pub use config::AssistantConfig;
pub use kernel::dispatcher::{CycleOutcome, Dispatcher, DispatcherSettings};
