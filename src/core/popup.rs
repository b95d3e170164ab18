//! Popup lifecycle.
//!
//! A popup has exactly one parent (a frame or another popup) forming a
//! chain rooted at a frame. Teardown from the application side and from a
//! compositor `popup_done` converge on the same routine; whichever fires
//! first wins and the other is a no-op.

use crate::core::positioner::{PositionStrategy, PositionerRequest, TallPopup};
use crate::core::{FrameId, PopupId};
use crate::util::geometry::Rect;

/// The immediate parent of a popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupParent {
    Frame(FrameId),
    Popup(PopupId),
}

/// One transient menu/tooltip surface.
#[derive(Debug)]
pub struct Popup {
    pub id: PopupId,
    pub parent: PopupParent,
    /// The frame at the root of the parent chain.
    pub root_frame: FrameId,
    /// The placement request submitted at creation. Immutable for the
    /// lifetime of this popup; repositioning means a new popup.
    pub request: PositionerRequest,
    pub strategy: PositionStrategy,
    /// Last placement reported by the compositor, parent-relative.
    pub geometry: Option<Rect>,
    /// Scroll bookkeeping, present for oversized popups.
    pub tall: Option<TallPopup>,
    /// Seats currently holding a grab for this popup.
    pub grabs: Vec<String>,
    /// Popups parented on this one.
    pub live_children: usize,
    /// Set by the first teardown path to win the race against the second.
    pub destroyed: bool,
}

impl Popup {
    pub fn new(
        id: PopupId,
        parent: PopupParent,
        root_frame: FrameId,
        request: PositionerRequest,
        strategy: PositionStrategy,
    ) -> Self {
        let tall = match strategy {
            PositionStrategy::ConstrainedDiscovery { .. } => Some(TallPopup::default()),
            _ => None,
        };
        Self {
            id,
            parent,
            root_frame,
            request,
            strategy,
            geometry: None,
            tall,
            grabs: Vec::new(),
            live_children: 0,
            destroyed: false,
        }
    }

    /// Apply a configure reply. For a popup in discovery mode the reported
    /// vertical position completes the two-phase negotiation: the delta to
    /// what we asked for becomes the standing correction.
    pub fn on_configure(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.geometry = Some(Rect::new(x, y, width.max(0) as u32, height.max(0) as u32));

        if let PositionStrategy::ConstrainedDiscovery { requested_y, .. } = self.strategy {
            let tall = self.tall.get_or_insert_with(TallPopup::default);
            let offset = tall.on_configured(requested_y, y);
            self.strategy = PositionStrategy::Corrected { offset };
        }
    }

    pub fn has_grab_on(&self, seat: &str) -> bool {
        self.grabs.iter().any(|s| s == seat)
    }
}
