//! Popup lifecycle through the registry.
//!
//! Creation builds the positioner request, teardown is one idempotent
//! routine shared by application dismissal, compositor `popup_done` and
//! seat departure; whichever path fires first wins. The registry keeps the
//! popup-before-parent destruction order: a frame with live popups defers
//! its own destroy until the count reaches zero.

use super::DecorContext;
use crate::config::TallPopupMode;
use crate::core::errors::{DecorError, Result};
use crate::core::events::EngineEvent;
use crate::core::popup::{Popup, PopupParent};
use crate::core::positioner::{ConstraintAdjustment, Gravity, PositionStrategy, PositionerRequest, TallPopup};
use crate::core::{FrameId, PopupId};
use crate::util::geometry::Rect;
use crate::util::logging;

/// Result of asking a tall popup to bring an item into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Already visible, or the popup is not oversized.
    Unchanged,
    /// New draw offset for the popup content; the popup stays mapped.
    Slid { offset: i32 },
    /// This compositor family cannot slide; the popup was torn down and a
    /// replacement created at the new offset.
    Recreated { popup: PopupId, offset: i32 },
}

impl DecorContext {
    /// Show a popup anchored inside its parent (a frame or another popup).
    /// The positioner request is immutable for the popup's lifetime.
    pub fn create_popup(
        &mut self,
        parent: PopupParent,
        anchor_rect: Rect,
        size: (i32, i32),
        gravity: Gravity,
        constraints: ConstraintAdjustment,
        grab_seat: Option<&str>,
    ) -> Result<PopupId> {
        let (root, parent_bounds) = self.resolve_parent(parent)?;
        let (request, strategy) =
            self.positioner
                .place_popup(root, parent_bounds, anchor_rect, size, gravity, constraints)?;
        let grabs = grab_seat.map(|s| vec![s.to_string()]).unwrap_or_default();
        self.register_popup(parent, root, request, strategy, grabs, None)
    }

    fn resolve_parent(&self, parent: PopupParent) -> Result<(FrameId, Rect)> {
        match parent {
            PopupParent::Frame(id) => {
                let frame = self.frames.get(&id).ok_or(DecorError::UnknownFrame(id))?;
                Ok((
                    id,
                    Rect::new(
                        0,
                        0,
                        frame.content_width.max(1) as u32,
                        frame.content_height.max(1) as u32,
                    ),
                ))
            }
            PopupParent::Popup(id) => {
                let popup = self.popups.get(&id).ok_or(DecorError::UnknownPopup(id))?;
                if popup.destroyed {
                    return Err(DecorError::protocol(format!(
                        "popup {} cannot parent a new popup, it is being destroyed",
                        id
                    )));
                }
                let bounds = popup
                    .geometry
                    .map(|g| Rect::new(0, 0, g.width, g.height))
                    .unwrap_or(Rect::new(
                        0,
                        0,
                        popup.request.size.0.max(1) as u32,
                        popup.request.size.1.max(1) as u32,
                    ));
                Ok((popup.root_frame, bounds))
            }
        }
    }

    fn register_popup(
        &mut self,
        parent: PopupParent,
        root: FrameId,
        request: PositionerRequest,
        strategy: PositionStrategy,
        grabs: Vec<String>,
        tall: Option<TallPopup>,
    ) -> Result<PopupId> {
        // The root frame must be checked before anything is registered so a
        // failure leaves no half-created popup behind.
        self.get_frame_mut(root)?;

        let id = self.alloc_popup_id();
        let mut popup = Popup::new(id, parent, root, request.clone(), strategy);
        if let Some(tall) = tall {
            popup.tall = Some(tall);
        }
        popup.grabs = grabs.clone();
        self.popups.insert(id, popup);

        if let Some(frame) = self.frames.get_mut(&root) {
            frame.live_popups += 1;
        }
        if let PopupParent::Popup(parent_id) = parent {
            if let Some(parent_popup) = self.popups.get_mut(&parent_id) {
                parent_popup.live_children += 1;
            }
        }

        self.outbound.push_back(EngineEvent::CreatePopup {
            popup: id,
            parent_frame: root,
            request,
        });
        for seat in &grabs {
            self.plugin.popup_grab(root, seat);
        }
        crate::dlog!(logging::POPUP, "popup {} created (strategy {:?})", id, strategy);
        Ok(id)
    }

    /// Application-side dismissal. A no-op if the compositor already
    /// reported the popup done.
    pub fn dismiss_popup(&mut self, popup: PopupId) -> Result<()> {
        self.teardown_popup(popup, "dismissed by application")
    }

    pub(crate) fn handle_popup_done(&mut self, popup: PopupId) -> Result<()> {
        // Authoritative dismissal; also a no-op if we tore it down first.
        self.teardown_popup(popup, "popup done from compositor")
    }

    fn teardown_popup(&mut self, popup_id: PopupId, reason: &str) -> Result<()> {
        let Some(popup) = self.popups.get_mut(&popup_id) else {
            tracing::trace!("Popup {} already destroyed ({})", popup_id, reason);
            return Ok(());
        };
        if popup.destroyed {
            return Ok(());
        }
        popup.destroyed = true;
        let root = popup.root_frame;
        let parent = popup.parent;
        let grabs = std::mem::take(&mut popup.grabs);

        // Children cannot outlive their parent; take them down first.
        let children: Vec<PopupId> = self
            .popups
            .values()
            .filter(|p| p.parent == PopupParent::Popup(popup_id) && !p.destroyed)
            .map(|p| p.id)
            .collect();
        for child in children {
            self.teardown_popup(child, "parent dismissed")?;
        }

        for seat in &grabs {
            self.plugin.popup_ungrab(root, seat);
        }
        self.outbound
            .push_back(EngineEvent::DestroyPopup { popup: popup_id });
        self.popups.remove(&popup_id);

        if let PopupParent::Popup(parent_id) = parent {
            if let Some(parent_popup) = self.popups.get_mut(&parent_id) {
                parent_popup.live_children = parent_popup.live_children.saturating_sub(1);
            }
        }

        crate::dlog!(logging::POPUP, "popup {} destroyed ({})", popup_id, reason);

        match self.frames.get_mut(&root) {
            Some(frame) => {
                frame.live_popups = frame.live_popups.saturating_sub(1);
                if frame.pending_destroy && frame.live_popups == 0 {
                    self.finish_destroy_frame(root);
                }
                Ok(())
            }
            None => Err(DecorError::DanglingPopupParent {
                popup: popup_id,
                parent: root,
            }),
        }
    }

    pub(crate) fn handle_popup_configure(
        &mut self,
        popup_id: PopupId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        let popup = self
            .popups
            .get_mut(&popup_id)
            .ok_or(DecorError::UnknownPopup(popup_id))?;
        if popup.destroyed {
            tracing::trace!("Popup {}: configure after teardown, ignoring", popup_id);
            return Ok(());
        }
        popup.on_configure(x, y, width, height);
        crate::dlog!(
            logging::POPUP,
            "popup {} configured at {},{} {}x{}",
            popup_id,
            x,
            y,
            width,
            height
        );
        Ok(())
    }

    pub(crate) fn handle_seat_left(&mut self, seat: &str) -> Result<()> {
        let doomed: Vec<PopupId> = self
            .popups
            .values()
            .filter(|p| !p.destroyed && p.has_grab_on(seat))
            .map(|p| p.id)
            .collect();
        for popup in doomed {
            self.teardown_popup(popup, "grab seat left")?;
        }
        Ok(())
    }

    /// Bring `item` of a tall popup into view.
    ///
    /// On families that slide, this only changes the draw offset and the
    /// popup stays mapped. On the family that cannot slide, the popup is
    /// destroyed and recreated with the new offset folded into the
    /// positioner request.
    pub fn scroll_popup_to_item(
        &mut self,
        popup_id: PopupId,
        item: usize,
        item_height: i32,
    ) -> Result<ScrollOutcome> {
        let quirks = self.config.quirks;
        let viewport = self.positioner.usable_height() as i32;

        let popup = self
            .popups
            .get_mut(&popup_id)
            .ok_or(DecorError::UnknownPopup(popup_id))?;
        let Some(tall) = popup.tall.as_mut() else {
            return Ok(ScrollOutcome::Unchanged);
        };
        let new_offset = tall.offset_for_item(item, item_height, viewport);
        if new_offset == tall.scroll_offset {
            return Ok(ScrollOutcome::Unchanged);
        }

        if quirks.tall_popup_mode == TallPopupMode::SlideOffset {
            tall.scroll_offset = new_offset;
            return Ok(ScrollOutcome::Slid { offset: new_offset });
        }

        // Recreate path: fold the scroll into the positioner offset.
        // TODO: carry the discovery correction across the recreate once
        // KWin's slide reporting for the replacement popup is confirmed.
        let delta = new_offset - tall.scroll_offset;
        let parent = popup.parent;
        let root = popup.root_frame;
        let strategy = popup.strategy;
        let grabs = popup.grabs.clone();
        let mut request = popup.request.clone();
        request.offset.1 -= delta;

        self.teardown_popup(popup_id, "recreated to scroll")?;
        let replacement = self.register_popup(
            parent,
            root,
            request,
            strategy,
            grabs,
            Some(TallPopup {
                correction: 0,
                scroll_offset: new_offset,
            }),
        )?;
        Ok(ScrollOutcome::Recreated {
            popup: replacement,
            offset: new_offset,
        })
    }
}
