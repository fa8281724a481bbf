//! CLI command handlers. Each command is in its own file.

mod config;
mod drain;
mod login;
mod logout;
mod notify;
mod watch;

pub use config::run_config;
pub use login::run_login;
pub use logout::run_logout;
pub use notify::run_notify;
pub use watch::run_watch;
