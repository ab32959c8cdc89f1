//! Command implementations.

pub mod check;
pub mod config;
pub mod run;
pub mod tasks;

pub use self::check::execute_check;
pub use self::config::execute_config;
pub use self::run::execute_run;
pub use self::tasks::execute_tasks;
