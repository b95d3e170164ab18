//! Common imports and types used throughout Tenaya.

pub use std::collections::{HashMap, VecDeque};
pub use std::sync::{Arc, Mutex};

// Add common internal types here
pub type Result<T> = std::result::Result<T, crate::core::errors::DecorError>;
