//! Oversized-popup negotiation.
//!
//! A menu taller than the usable display area is requested twice: the first
//! request is deliberately permissive so the compositor reveals where it
//! actually slid the popup, and the reported offset-from-request becomes a
//! standing correction applied to all item-scroll calculations afterwards.
//! Which families can then scroll by sliding the draw offset, and which must
//! tear the popup down and recreate it, comes from the session quirk table.

use crate::config::{Quirks, TallPopupMode};
use crate::core::FrameId;
use crate::util::geometry::Rect;

/// How a popup's position was, or is being, negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStrategy {
    /// Fits on screen; one request, no follow-up.
    Direct,
    /// Taller than the display; the first configure reply reveals the
    /// compositor's slide.
    ConstrainedDiscovery {
        parent: FrameId,
        anchor: Rect,
        requested_y: i32,
    },
    /// Discovery completed; `offset` corrects item-scroll calculations.
    Corrected { offset: i32 },
}

/// Scroll bookkeeping for one oversized popup.
#[derive(Debug, Clone, Copy, Default)]
pub struct TallPopup {
    /// `actual_y - requested_y` as reported by the compositor.
    pub correction: i32,
    /// Current draw offset applied to the popup content.
    pub scroll_offset: i32,
}

impl TallPopup {
    /// Record the compositor's answer to the discovery request. Returns the
    /// correction so the caller can switch the strategy to `Corrected`.
    pub fn on_configured(&mut self, requested_y: i32, actual_y: i32) -> i32 {
        self.correction = actual_y - requested_y;
        tracing::debug!(
            "Tall popup configured: requested_y={} actual_y={} correction={}",
            requested_y,
            actual_y,
            self.correction
        );
        self.correction
    }

    /// Index of the first item fully visible at the current offsets.
    pub fn first_visible_item(&self, item_height: i32) -> usize {
        if item_height <= 0 {
            return 0;
        }
        let hidden = -(self.correction + self.scroll_offset);
        if hidden <= 0 {
            0
        } else {
            ((hidden + item_height - 1) / item_height) as usize
        }
    }

    /// Draw offset that brings `item` into view, without recreating the
    /// popup. Items above the viewport scroll down, items below scroll up.
    pub fn offset_for_item(&self, item: usize, item_height: i32, viewport_height: i32) -> i32 {
        let item_top = item as i32 * item_height;
        let item_bottom = item_top + item_height;
        let view_top = -(self.correction + self.scroll_offset);
        let view_bottom = view_top + viewport_height;

        if item_top < view_top {
            self.scroll_offset + (view_top - item_top)
        } else if item_bottom > view_bottom {
            self.scroll_offset - (item_bottom - view_bottom)
        } else {
            self.scroll_offset
        }
    }

    /// Whether bringing an item into view requires destroying and
    /// recreating the popup instead of sliding the draw offset.
    pub fn needs_recreate(&self, quirks: &Quirks, new_offset: i32) -> bool {
        quirks.tall_popup_mode == TallPopupMode::Recreate && new_offset != self.scroll_offset
    }
}
