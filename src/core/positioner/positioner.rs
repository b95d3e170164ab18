//! Popup placement requests.
//!
//! Builds anchor-rectangle-relative placement for menus and tooltips. All of
//! this is pure computation over the inputs; nothing here mutates frame
//! state. The compositor's configure reply is always authoritative; the
//! local resolution exists for discovery estimates and tests.

use bitflags::bitflags;

use crate::config::SessionConfig;
use crate::core::errors::{DecorError, Result};
use crate::core::positioner::tall::PositionStrategy;
use crate::core::FrameId;
use crate::util::geometry::Rect;

bitflags! {
    /// Constraint relaxations the compositor may apply when the requested
    /// position would leave the visible area.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ConstraintAdjustment: u32 {
        const SLIDE_X = 1 << 0;
        const SLIDE_Y = 1 << 1;
        const FLIP_X = 1 << 2;
        const FLIP_Y = 1 << 3;
    }
}

/// Edge or corner of the anchor rectangle the popup attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    BottomLeft,
    TopRight,
    BottomRight,
}

impl Anchor {
    /// The anchor point inside the anchor rectangle.
    pub fn point_in(self, rect: Rect) -> (i32, i32) {
        let (w, h) = (rect.width as i32, rect.height as i32);
        let x = match self {
            Anchor::Left | Anchor::TopLeft | Anchor::BottomLeft => rect.x,
            Anchor::Right | Anchor::TopRight | Anchor::BottomRight => rect.x + w,
            _ => rect.x + w / 2,
        };
        let y = match self {
            Anchor::Top | Anchor::TopLeft | Anchor::TopRight => rect.y,
            Anchor::Bottom | Anchor::BottomLeft | Anchor::BottomRight => rect.y + h,
            _ => rect.y + h / 2,
        };
        (x, y)
    }
}

/// Direction the popup extends away from the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    BottomLeft,
    TopRight,
    BottomRight,
}

impl Gravity {
    /// Top-left corner of a popup of `size` placed at `point` under this
    /// gravity.
    pub fn place(self, point: (i32, i32), size: (i32, i32)) -> (i32, i32) {
        let x = match self {
            Gravity::Left | Gravity::TopLeft | Gravity::BottomLeft => point.0 - size.0,
            Gravity::Right | Gravity::TopRight | Gravity::BottomRight => point.0,
            _ => point.0 - size.0 / 2,
        };
        let y = match self {
            Gravity::Top | Gravity::TopLeft | Gravity::TopRight => point.1 - size.1,
            Gravity::Bottom | Gravity::BottomLeft | Gravity::BottomRight => point.1,
            _ => point.1 - size.1 / 2,
        };
        (x, y)
    }
}

/// A complete placement request. Immutable once submitted for a popup; a
/// different placement means a new popup.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionerRequest {
    /// Anchor rectangle, parent-surface-relative.
    pub anchor_rect: Rect,
    pub size: (i32, i32),
    pub anchor: Anchor,
    pub gravity: Gravity,
    pub constraint_adjustment: ConstraintAdjustment,
    pub offset: (i32, i32),
}

impl PositionerRequest {
    /// The position the request asks for before any constraint adjustment.
    pub fn unconstrained_position(&self) -> (i32, i32) {
        let (ax, ay) = self.anchor.point_in(self.anchor_rect);
        self.gravity
            .place((ax + self.offset.0, ay + self.offset.1), self.size)
    }

    /// Resolve the request against a bounding area the way a well-behaved
    /// compositor would: anchor point, gravity, then flip before slide on
    /// each axis.
    pub fn resolve(&self, bounds: Rect) -> (i32, i32) {
        let (ax, ay) = self.anchor.point_in(self.anchor_rect);
        let (mut x, mut y) = self.unconstrained_position();
        let (w, h) = self.size;
        let adjust = self.constraint_adjustment;

        // Horizontal
        if x < bounds.x || x + w > bounds.right() {
            if adjust.contains(ConstraintAdjustment::FLIP_X) {
                let flipped = 2 * ax - x - w;
                if flipped >= bounds.x && flipped + w <= bounds.right() {
                    x = flipped;
                }
            }
            if adjust.contains(ConstraintAdjustment::SLIDE_X) {
                if x + w > bounds.right() {
                    x = bounds.right() - w;
                }
                if x < bounds.x {
                    x = bounds.x;
                }
            }
        }

        // Vertical
        if y < bounds.y || y + h > bounds.bottom() {
            if adjust.contains(ConstraintAdjustment::FLIP_Y) {
                let flipped = 2 * ay - y - h;
                if flipped >= bounds.y && flipped + h <= bounds.bottom() {
                    y = flipped;
                }
            }
            if adjust.contains(ConstraintAdjustment::SLIDE_Y) {
                if y + h > bounds.bottom() {
                    y = bounds.bottom() - h;
                }
                if y < bounds.y {
                    y = bounds.y;
                }
            }
        }

        (x, y)
    }
}

/// One candidate anchor rectangle, e.g. a single menu-bar item.
#[derive(Debug, Clone, Copy)]
pub struct AnchorCandidate {
    pub rect: Rect,
    /// Monotonic activation stamp; `None` means never activated.
    pub activated_at: Option<u64>,
    /// Monotonic creation stamp.
    pub created_at: u64,
}

/// Pick the anchor among several candidates: the most recently activated one
/// wins; ties (including "none ever activated") fall back to insertion
/// order, earliest created first, so the choice is deterministic.
pub fn select_anchor(candidates: &[AnchorCandidate]) -> Option<&AnchorCandidate> {
    candidates.iter().fold(None, |best: Option<&AnchorCandidate>, cand| {
        match best {
            None => Some(cand),
            Some(b) => {
                if cand.activated_at > b.activated_at
                    || (cand.activated_at == b.activated_at && cand.created_at < b.created_at)
                {
                    Some(cand)
                } else {
                    Some(b)
                }
            }
        }
    })
}

/// Builds placement requests for one session.
///
/// Holds the resolved session configuration by value; constructed once and
/// shared by reference, never read from globals.
#[derive(Debug, Clone)]
pub struct PositionerEngine {
    usable_height: u32,
}

impl PositionerEngine {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            usable_height: config.usable_height(),
        }
    }

    pub fn usable_height(&self) -> u32 {
        self.usable_height
    }

    /// Build the placement request for a popup.
    ///
    /// `parent_bounds` is the parent surface extent in its own coordinate
    /// space; the anchor rectangle must touch or overlap it. The protocol
    /// requires the popup itself to keep contact with its immediate parent,
    /// and an anchor inside the parent guarantees that under every
    /// constraint adjustment.
    ///
    /// A popup taller than the usable display area (or one whose anchor
    /// pushes its bottom past it) switches to discovery mode: the request
    /// is made deliberately permissive (slide only, bottom gravity) so the
    /// compositor reveals where it actually put the popup, and the reported
    /// offset becomes the correction term for item-scroll math.
    pub fn place_popup(
        &self,
        parent: FrameId,
        parent_bounds: Rect,
        anchor_rect: Rect,
        popup_size: (i32, i32),
        gravity: Gravity,
        constraints: ConstraintAdjustment,
    ) -> Result<(PositionerRequest, PositionStrategy)> {
        if !anchor_rect.touches(&parent_bounds) {
            return Err(DecorError::protocol(format!(
                "popup anchor {:?} does not touch its parent surface {:?}",
                anchor_rect, parent_bounds
            )));
        }

        let usable = self.usable_height as i32;
        let oversized = popup_size.1 >= usable || anchor_rect.y.max(0) + popup_size.1 > usable;

        if oversized {
            let request = PositionerRequest {
                anchor_rect,
                size: popup_size,
                anchor: Anchor::TopLeft,
                gravity: Gravity::BottomRight,
                // Permissive on purpose: let the compositor slide the popup
                // to its own most convenient position and tell us about it.
                constraint_adjustment: ConstraintAdjustment::SLIDE_Y,
                offset: (0, 0),
            };
            let (_, requested_y) = request.unconstrained_position();
            let strategy = PositionStrategy::ConstrainedDiscovery {
                parent,
                anchor: anchor_rect,
                requested_y,
            };
            tracing::debug!(
                "Popup of height {} exceeds usable height {}; entering discovery mode",
                popup_size.1,
                self.usable_height
            );
            Ok((request, strategy))
        } else {
            let request = PositionerRequest {
                anchor_rect,
                size: popup_size,
                anchor: Anchor::BottomLeft,
                gravity,
                constraint_adjustment: constraints,
                offset: (0, 0),
            };
            Ok((request, PositionStrategy::Direct))
        }
    }
}
