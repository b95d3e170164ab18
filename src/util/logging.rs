//! Standardized logging utility for Tenaya
//!
//! This module provides the `dlog!` macro which ensures all protocol-path
//! logs follow the `YYYY-MM-DD HH:MM:SS [MODULE] Message` format.

#[macro_export]
macro_rules! dlog {
    ($module:expr, $($arg:tt)*) => {{
        let now = chrono::Local::now();
        eprintln!("{} [{}] {}",
            now.format("%Y-%m-%d %H:%M:%S"),
            $module,
            format!($($arg)*)
        );
    }};
}

/// Standardized module identifiers
pub const SESSION: &str = "SESSION";
pub const FRAME: &str = "FRAME";
pub const BUFFER: &str = "BUFFER";
pub const POSITIONER: &str = "POSITIONER";
pub const POPUP: &str = "POPUP";
pub const COMMIT: &str = "COMMIT";
pub const PLUGIN: &str = "PLUGIN";
