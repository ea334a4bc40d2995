pub mod config;
pub mod csv;
pub mod daily_log;
pub mod format;
pub mod logger;
pub mod report;
pub mod scheduler;
pub mod system;
