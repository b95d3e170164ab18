//! Frame lifecycle and the configure/ack/commit cycle.
//!
//! Contains the `DecorContext` methods that create frames, run the
//! compositor's configure proposals through the state machine, and drive
//! the plugin/buffer pipeline for redraws.
//!
//! Side-effect order inside one applied configuration is load-bearing:
//! geometry is finalized first, the resize notification goes out next (so
//! an observer reading "current size" during the callback sees the new
//! size), then the acknowledgement, then the plugin commit, then the
//! buffer attach and outward surface commit.

use super::DecorContext;
use crate::core::errors::{DecorError, Result};
use crate::core::events::EngineEvent;
use crate::core::frame::{
    Configuration, ConfigureDisposition, ContentLimits, DecorVisibility, DecorationMode, Frame,
    FrameStatus,
};
use crate::core::plugin::BorderSize;
use crate::core::{FrameId, SubwindowId};
use crate::util::geometry::Rect;
use crate::util::logging;

impl DecorContext {
    /// Create a decorated frame. The bufferless commit pushed here kicks
    /// the compositor into sending the first configure.
    pub fn decorate(&mut self) -> FrameId {
        let id = self.alloc_frame_id();
        let mut frame = Frame::new(id);
        frame.status = FrameStatus::AwaitingConfigure;
        self.frames.insert(id, frame);
        self.plugin.new_frame(id);
        self.outbound
            .push_back(EngineEvent::CommitSurface { frame: id });
        crate::dlog!(logging::FRAME, "frame {} created, awaiting first configure", id);
        id
    }

    pub fn set_title(&mut self, id: FrameId, title: impl Into<String>) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        frame.title = title.into();
        self.plugin.property_changed(id);
        Ok(())
    }

    pub fn set_app_id(&mut self, id: FrameId, app_id: impl Into<String>) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        frame.app_id = app_id.into();
        self.plugin.property_changed(id);
        Ok(())
    }

    /// Store content-size limits and resizability.
    ///
    /// Unmapped frames keep the limits for the first configure. A mapped
    /// frame turning non-resizable is frozen at its current content size;
    /// turning resizable again restores the limits saved at freeze time.
    /// Inconsistent limits (min > max on a nonzero axis) are reported once
    /// and leave the frame at its previous limits.
    pub fn request_decoration(
        &mut self,
        id: FrameId,
        min: (i32, i32),
        max: (i32, i32),
        resizable: bool,
    ) -> Result<()> {
        let frame = self.get_frame_mut(id)?;

        let proposed = if frame.is_mapped() && !resizable {
            let size = frame.content_size();
            ContentLimits::new(size, size)
        } else if frame.is_mapped() && resizable {
            frame
                .saved_limits
                .take()
                .unwrap_or(ContentLimits::new(min, max))
        } else {
            ContentLimits::new(min, max)
        };

        if let Err(err) = proposed.validate() {
            if !frame.limits_error_reported {
                frame.limits_error_reported = true;
                tracing::warn!("Frame {}: rejecting inconsistent limits: {}", id, err);
                self.outbound
                    .push_back(EngineEvent::LimitsRejected { frame: id });
            }
            return Err(err);
        }
        frame.limits_error_reported = false;

        if !resizable && frame.resizable {
            frame.saved_limits = Some(frame.limits);
        }
        frame.resizable = resizable;
        frame.limits = proposed;

        self.outbound.push_back(EngineEvent::SetMinSize {
            frame: id,
            width: proposed.min.0,
            height: proposed.min.1,
        });
        self.outbound.push_back(EngineEvent::SetMaxSize {
            frame: id,
            width: proposed.max.0,
            height: proposed.max.1,
        });
        Ok(())
    }

    pub fn set_maximized(&mut self, id: FrameId) -> Result<()> {
        self.get_frame_mut(id)?;
        self.outbound
            .push_back(EngineEvent::SetMaximized { frame: id });
        Ok(())
    }

    pub fn unset_maximized(&mut self, id: FrameId) -> Result<()> {
        self.get_frame_mut(id)?;
        self.outbound
            .push_back(EngineEvent::UnsetMaximized { frame: id });
        Ok(())
    }

    pub fn set_fullscreen(&mut self, id: FrameId, output: Option<u32>) -> Result<()> {
        self.get_frame_mut(id)?;
        self.outbound
            .push_back(EngineEvent::SetFullscreen { frame: id, output });
        Ok(())
    }

    pub fn unset_fullscreen(&mut self, id: FrameId) -> Result<()> {
        self.get_frame_mut(id)?;
        self.outbound
            .push_back(EngineEvent::UnsetFullscreen { frame: id });
        Ok(())
    }

    pub fn minimize(&mut self, id: FrameId) -> Result<()> {
        self.get_frame_mut(id)?;
        self.outbound
            .push_back(EngineEvent::SetMinimized { frame: id });
        Ok(())
    }

    /// Application-driven (interactive) resize. Requests arriving while a
    /// commit is in flight coalesce, last request wins.
    pub fn resize(&mut self, id: FrameId, width: i32, height: i32) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        match frame.resize.request(width, height) {
            Some((w, h)) => self.apply_resize(id, w, h),
            None => {
                tracing::trace!("Frame {}: resize to {}x{} queued", id, width, height);
                Ok(())
            }
        }
    }

    /// Move/resize a subwindow embedded in the toplevel. Deferred until the
    /// toplevel's frame-ready when a commit is in flight, then applied with
    /// the parent's next commit.
    pub fn set_subwindow_geometry(
        &mut self,
        id: FrameId,
        subwindow: SubwindowId,
        rect: Rect,
    ) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        let geometry = crate::core::commit::SubwindowGeometry { subwindow, rect };
        if let Some(geometry) = frame.resize.defer_subwindow(geometry) {
            self.outbound.push_back(EngineEvent::SetSubwindowGeometry {
                frame: id,
                subwindow: geometry.subwindow,
                rect: geometry.rect,
            });
            self.outbound
                .push_back(EngineEvent::CommitSurface { frame: id });
        }
        Ok(())
    }

    /// Destroy a frame. Refused while popups still reference it as a
    /// positioner parent; the destroy completes when the last one goes.
    pub fn destroy_frame(&mut self, id: FrameId) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        if frame.live_popups > 0 {
            frame.pending_destroy = true;
            let live_popups = frame.live_popups;
            tracing::warn!(
                "Frame {}: destroy deferred, {} popups still live",
                id,
                live_popups
            );
            return Err(DecorError::FrameBusy {
                frame: id,
                live_popups,
            });
        }
        self.finish_destroy_frame(id);
        Ok(())
    }

    pub(crate) fn finish_destroy_frame(&mut self, id: FrameId) {
        if let Some(frame) = self.frames.remove(&id) {
            if let Some(buffer) = frame.buffer {
                if let Err(err) = self.pool.release_early(buffer) {
                    tracing::warn!("Frame {}: buffer teardown: {}", id, err);
                }
            }
            self.plugin.free_frame(id);
            crate::dlog!(logging::FRAME, "frame {} destroyed", id);
        }
    }

    // =========================================================================
    // Compositor event handlers
    // =========================================================================

    pub(crate) fn handle_configure(&mut self, id: FrameId, cfg: Configuration) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        match frame.classify_serial(cfg.serial) {
            ConfigureDisposition::Stale => {
                tracing::warn!(
                    "Frame {}: out-of-order configure serial {} (last applied {:?}), not applying",
                    id,
                    cfg.serial,
                    frame.last_applied_serial
                );
                self.outbound.push_back(EngineEvent::AckConfigure {
                    frame: id,
                    serial: cfg.serial,
                });
                Ok(())
            }
            ConfigureDisposition::Duplicate => {
                self.outbound.push_back(EngineEvent::AckConfigure {
                    frame: id,
                    serial: cfg.serial,
                });
                Ok(())
            }
            ConfigureDisposition::Apply => {
                frame.queue_configure(cfg);
                if frame.resize.is_awaiting() {
                    tracing::trace!(
                        "Frame {}: configure serial {} held, commit in flight",
                        id,
                        cfg.serial
                    );
                    Ok(())
                } else {
                    self.apply_pending_configure(id)
                }
            }
        }
    }

    /// Apply the frame's pending configuration end to end: exactly one ack,
    /// and exactly one plugin commit unless the configuration turns out to
    /// be a no-op fallback repeat.
    pub(crate) fn apply_pending_configure(&mut self, id: FrameId) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        let Some(cfg) = frame.pending.take() else {
            return Ok(());
        };

        let new_state = cfg.window_state.unwrap_or(frame.state);
        let delta = frame.apply_state(new_state);
        let was_mapped = frame.is_mapped();
        let visibility = frame.visibility;

        // Border recompute only when the visibility class changed (or we
        // have never asked); activation toggles reuse the cached answer.
        let border = if visibility == DecorVisibility::Hidden {
            BorderSize::default()
        } else if delta.visibility_changed || !was_mapped {
            self.plugin.border_size(id, Some(&cfg))
        } else {
            self.plugin.cached_border(id)
        };

        let frame = self.get_frame_mut(id)?;
        let (content, fallback_used) = match cfg.size {
            Some((w, h)) if w > 0 && h > 0 => {
                let cw = (w - border.horizontal()).max(1);
                let ch = (h - border.vertical()).max(1);
                (frame.limits.clamp(cw, ch), false)
            }
            _ => {
                let (w, h) = frame.fallback_content_size(new_state);
                (frame.limits.clamp(w, h), true)
            }
        };

        let changed = content != frame.content_size()
            || delta.visibility_changed
            || delta.repaint
            || !was_mapped;
        frame.last_applied_serial = Some(cfg.serial);

        if fallback_used && !changed {
            // Identical fallback repeat: acknowledge, no redundant commit.
            self.outbound.push_back(EngineEvent::AckConfigure {
                frame: id,
                serial: cfg.serial,
            });
            return Ok(());
        }

        frame.content_width = content.0;
        frame.content_height = content.1;
        if new_state.is_floating() {
            frame.floating_width = content.0;
            frame.floating_height = content.1;
        }
        frame.status = FrameStatus::Mapped;

        crate::dlog!(
            logging::FRAME,
            "frame {} configured: serial={} content={}x{} state={:?}",
            id,
            cfg.serial,
            content.0,
            content.1,
            new_state
        );

        // Geometry is final; tell the application before anything goes out.
        self.outbound.push_back(EngineEvent::ResizeNotify {
            frame: id,
            width: content.0,
            height: content.1,
        });
        self.outbound.push_back(EngineEvent::AckConfigure {
            frame: id,
            serial: cfg.serial,
        });
        self.plugin.commit(id, new_state, Some(&cfg));
        self.redraw_frame(id)
    }

    /// Apply an application resize: clamp, notify, repaint, commit.
    pub(crate) fn apply_resize(&mut self, id: FrameId, width: i32, height: i32) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        let (w, h) = frame.limits.clamp(width, height);
        frame.content_width = w;
        frame.content_height = h;
        if frame.state.is_floating() {
            frame.floating_width = w;
            frame.floating_height = h;
        }
        let state = frame.state;
        self.outbound.push_back(EngineEvent::ResizeNotify {
            frame: id,
            width: w,
            height: h,
        });
        self.plugin.commit(id, state, None);
        self.redraw_frame(id)
    }

    /// Acquire a buffer for the current geometry, attach it and commit.
    /// Allocation failure keeps the previous buffer and skips the redraw;
    /// the next configure retries.
    pub(crate) fn redraw_frame(&mut self, id: FrameId) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        let border = if frame.visibility == DecorVisibility::Hidden {
            BorderSize::default()
        } else {
            self.plugin.cached_border(id)
        };
        let frame = self.get_frame_mut(id)?;
        let width = frame.content_width + border.horizontal();
        let height = frame.content_height + border.vertical();
        let scale = frame.scale;
        let opaque = frame.visibility == DecorVisibility::Hidden;
        let previous = frame.buffer;

        let buffer = match self.pool.acquire(width, height, scale, opaque) {
            Ok(buffer) => buffer,
            Err(DecorError::ResourceExhaustion(reason)) => {
                tracing::warn!(
                    "Frame {}: buffer allocation failed ({}), keeping previous buffer",
                    id,
                    reason
                );
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        if let Some(previous) = previous {
            if previous != buffer && self.pool.get(previous).is_some() {
                self.pool.release_early(previous)?;
            }
        }
        self.pool.attach(buffer)?;

        let frame = self.get_frame_mut(id)?;
        frame.buffer = Some(buffer);
        frame.resize.arm();

        self.outbound
            .push_back(EngineEvent::AttachBuffer { frame: id, buffer });
        self.outbound
            .push_back(EngineEvent::CommitSurface { frame: id });
        self.outbound
            .push_back(EngineEvent::RequestFrameCallback { frame: id });
        Ok(())
    }

    pub(crate) fn handle_frame_ready(&mut self, id: FrameId) -> Result<()> {
        self.get_frame_mut(id)?;
        self.release_held(id)
    }

    /// Apply whatever was held back behind the frame-ready callback: a
    /// deferred configure, a coalesced resize, batched subwindow geometry.
    pub(crate) fn release_held(&mut self, id: FrameId) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        let had_configure = frame.pending.is_some();
        let (pending_resize, subwindows) = frame.resize.on_frame_ready();

        for geometry in &subwindows {
            self.outbound.push_back(EngineEvent::SetSubwindowGeometry {
                frame: id,
                subwindow: geometry.subwindow,
                rect: geometry.rect,
            });
        }

        if had_configure {
            self.apply_pending_configure(id)?;
            // A resize queued behind the configure stays queued for the
            // next frame-ready; the compositor's word wins this round.
            if let Some((w, h)) = pending_resize {
                let _ = self.get_frame_mut(id)?.resize.request(w, h);
            }
        } else if let Some((w, h)) = pending_resize {
            self.apply_resize(id, w, h)?;
        } else if !subwindows.is_empty() {
            self.outbound
                .push_back(EngineEvent::CommitSurface { frame: id });
            self.get_frame_mut(id)?.resize.arm();
        }
        Ok(())
    }

    pub(crate) fn handle_close(&mut self, id: FrameId) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        frame.status = FrameStatus::Closing;
        self.outbound
            .push_back(EngineEvent::CloseRequested { frame: id });
        Ok(())
    }

    pub(crate) fn handle_decoration_mode(&mut self, id: FrameId, server_side: bool) -> Result<()> {
        let mode = if server_side {
            DecorationMode::ServerSide
        } else {
            DecorationMode::ClientSide
        };
        let frame = self.get_frame_mut(id)?;
        let visibility_changed = frame.set_decoration_mode(mode);
        let mapped = frame.is_mapped();
        self.outbound.push_back(EngineEvent::DecorationModeChanged {
            frame: id,
            server_side,
        });
        if visibility_changed && mapped {
            if mode == DecorationMode::ClientSide {
                self.plugin.border_size(id, None);
            }
            self.redraw_frame(id)?;
        }
        Ok(())
    }

    pub(crate) fn handle_scale_changed(&mut self, id: FrameId, scale: i32) -> Result<()> {
        let frame = self.get_frame_mut(id)?;
        if frame.scale == scale {
            return Ok(());
        }
        frame.scale = scale;
        let mapped = frame.is_mapped();
        tracing::debug!("Frame {}: scale changed to {}", id, scale);
        if mapped {
            self.redraw_frame(id)?;
        }
        Ok(())
    }
}
