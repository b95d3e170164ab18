//! Protocol event model.
//!
//! The display transport is owned by the embedder. Incoming compositor
//! events are explicit enum values dispatched through
//! `DecorContext::handle_event`, looked up by frame id so a late event for a
//! dead frame is a logged no-op instead of a dangling callback. Everything
//! the engine wants sent back out, protocol requests and application
//! notifications alike, is pushed in order onto one outbound queue the
//! embedder drains after each dispatch cycle.

use std::time::Duration;

use crate::core::errors::Result;
use crate::core::frame::WindowState;
use crate::core::positioner::PositionerRequest;
use crate::core::{BufferId, FrameId, PopupId, SubwindowId};
use crate::util::geometry::Rect;

/// An event received from the compositor, scoped to one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositorEvent {
    /// New geometry/state proposal. `size == None` means the compositor has
    /// not decided yet; `window_state == None` leaves the previously
    /// negotiated state in force.
    Configure {
        serial: u32,
        size: Option<(i32, i32)>,
        window_state: Option<WindowState>,
    },
    /// The user pressed the close affordance.
    Close,
    /// The compositor's preferred decoration mode changed.
    PreferredDecorationMode { server_side: bool },
    /// Final placement for a popup, parent-relative.
    PopupConfigure {
        popup: PopupId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    /// The compositor dismissed the popup. Authoritative: the popup is gone
    /// whether or not the application agrees.
    PopupDone { popup: PopupId },
    /// The compositor stopped reading a buffer.
    BufferReleased { buffer: BufferId },
    /// Previous content was consumed; a new commit may proceed without
    /// tearing.
    FrameReady,
    /// The output scale changed under the frame.
    ScaleChanged { scale: i32 },
    /// A seat holding a popup grab disappeared.
    SeatLeft { seat: String },
}

/// One entry in the outbound queue: either a protocol request the embedder
/// forwards to the compositor, or a notification for the application layer.
/// Queue order is the order the engine produced them in; in particular a
/// resize notification always precedes the outward commit it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    // Protocol requests
    AckConfigure { frame: FrameId, serial: u32 },
    SetMinSize { frame: FrameId, width: i32, height: i32 },
    SetMaxSize { frame: FrameId, width: i32, height: i32 },
    SetMaximized { frame: FrameId },
    UnsetMaximized { frame: FrameId },
    SetFullscreen { frame: FrameId, output: Option<u32> },
    UnsetFullscreen { frame: FrameId },
    SetMinimized { frame: FrameId },
    CreatePopup {
        popup: PopupId,
        parent_frame: FrameId,
        request: PositionerRequest,
    },
    DestroyPopup { popup: PopupId },
    AttachBuffer { frame: FrameId, buffer: BufferId },
    SetSubwindowGeometry {
        frame: FrameId,
        subwindow: SubwindowId,
        rect: Rect,
    },
    CommitSurface { frame: FrameId },
    RequestFrameCallback { frame: FrameId },

    // Application notifications
    ResizeNotify { frame: FrameId, width: i32, height: i32 },
    CloseRequested { frame: FrameId },
    DecorationModeChanged { frame: FrameId, server_side: bool },
    LimitsRejected { frame: FrameId },
}

/// Seam to the embedder's file-descriptor event loop.
///
/// `poll` may block for at most `timeout`; the engine never blocks anywhere
/// else, so the caller's own loop stays cancelable between iterations.
pub trait EventSource {
    fn poll(&mut self, timeout: Duration) -> Result<Vec<(FrameId, CompositorEvent)>>;
}
