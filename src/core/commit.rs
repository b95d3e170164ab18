//! Commit and resize serialization.
//!
//! Size-affecting operations on a toplevel are serialized against the
//! compositor's frame-ready callback: while one commit's content has not
//! been consumed, further resize requests coalesce (last request wins) and
//! subwindow geometry is batched to apply with the parent's next commit.
//! A compositor that never delivers the callback must not hang the client:
//! after a bounded number of protocol round-trips the pending geometry is
//! force-applied.

use crate::core::SubwindowId;
use crate::util::geometry::Rect;
use crate::util::logging;

/// Round-trips a pending resize may wait on a frame-ready callback before
/// the coordinator applies it anyway.
pub const MAX_STALLED_ROUND_TRIPS: u32 = 4;

/// Deferred geometry for one subwindow embedded in a toplevel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubwindowGeometry {
    pub subwindow: SubwindowId,
    pub rect: Rect,
}

/// Per-toplevel resize serialization state.
#[derive(Debug, Default)]
pub struct ResizeCoordinator {
    awaiting_frame_ready: bool,
    pending: Option<(i32, i32)>,
    deferred_subwindows: Vec<SubwindowGeometry>,
    stalled_round_trips: u32,
}

impl ResizeCoordinator {
    /// Request a resize. Returns the geometry to apply now, or `None` if a
    /// commit is in flight and the request was queued (replacing any
    /// previously queued geometry).
    pub fn request(&mut self, width: i32, height: i32) -> Option<(i32, i32)> {
        if self.awaiting_frame_ready {
            if let Some(old) = self.pending.replace((width, height)) {
                tracing::trace!(
                    "Coalesced pending resize {:?} into {}x{}",
                    old,
                    width,
                    height
                );
            }
            None
        } else {
            Some((width, height))
        }
    }

    /// Request a subwindow geometry change. Returns it for immediate
    /// application when no commit is in flight, otherwise defers it to the
    /// parent's next commit (one entry per subwindow, last request wins).
    pub fn defer_subwindow(&mut self, geometry: SubwindowGeometry) -> Option<SubwindowGeometry> {
        if self.awaiting_frame_ready {
            self.deferred_subwindows
                .retain(|g| g.subwindow != geometry.subwindow);
            self.deferred_subwindows.push(geometry);
            None
        } else {
            Some(geometry)
        }
    }

    /// A commit went out; hold further size changes until frame-ready.
    pub fn arm(&mut self) {
        self.awaiting_frame_ready = true;
        self.stalled_round_trips = 0;
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting_frame_ready
    }

    /// Frame-ready callback: release whatever was held back.
    pub fn on_frame_ready(&mut self) -> (Option<(i32, i32)>, Vec<SubwindowGeometry>) {
        self.awaiting_frame_ready = false;
        self.stalled_round_trips = 0;
        (
            self.pending.take(),
            std::mem::take(&mut self.deferred_subwindows),
        )
    }

    /// Note one protocol round-trip while a commit is outstanding. Returns
    /// true when the wait has exceeded its bound and the pending geometry
    /// must be applied on the fallback path.
    pub fn note_round_trip(&mut self) -> bool {
        if !self.awaiting_frame_ready {
            return false;
        }
        self.stalled_round_trips += 1;
        if self.stalled_round_trips >= MAX_STALLED_ROUND_TRIPS {
            crate::dlog!(
                logging::COMMIT,
                "no frame-ready after {} round-trips; applying pending geometry",
                self.stalled_round_trips
            );
            self.awaiting_frame_ready = false;
            self.stalled_round_trips = 0;
            true
        } else {
            false
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some() || !self.deferred_subwindows.is_empty()
    }
}
