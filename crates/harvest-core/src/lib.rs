pub mod config;
pub mod logging;
pub mod notify;
pub mod progress;
pub mod retry;
pub mod session;
