pub mod buffer;
pub mod commit;
pub mod context;
pub mod errors;
pub mod events;
pub mod frame;
pub mod plugin;
pub mod popup;
pub mod positioner;

// Re-export key types
pub use context::DecorContext;
pub use errors::{DecorError, Result};
pub use events::{CompositorEvent, EngineEvent, EventSource};
pub use frame::{Configuration, Frame, WindowState};
pub use plugin::{BarePlugin, BorderSize, DecorPlugin};

/// Registry identifiers. The registries are the single authoritative
/// owners; everything else refers to frames, popups and buffers by id and
/// looks them up at use time.
pub type FrameId = u32;
pub type PopupId = u32;
pub type BufferId = u32;
pub type SubwindowId = u32;
