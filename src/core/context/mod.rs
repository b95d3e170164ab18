//! Session context.
//!
//! `DecorContext` is the single authoritative owner of every frame, popup
//! and buffer in the session. Compositor callbacks never hold pointers into
//! the engine: events arrive as enum values addressed by frame id, the
//! dispatcher looks the frame up, and a late event for a destroyed frame is
//! a logged no-op. All state lives here; the configuration is resolved once
//! at construction and never re-read from the environment.

mod frames;
mod popups;

use std::time::Duration;

pub use popups::ScrollOutcome;

use crate::config::{Capabilities, SessionConfig};
use crate::core::buffer::{BufferAllocator, BufferPool};
use crate::core::errors::{DecorError, Result};
use crate::core::events::{CompositorEvent, EngineEvent, EventSource};
use crate::core::frame::{Configuration, Frame};
use crate::core::plugin::{DecorPlugin, PluginAdapter, RedrawQueue};
use crate::core::popup::Popup;
use crate::core::positioner::PositionerEngine;
use crate::core::{FrameId, PopupId};
use crate::prelude::{HashMap, VecDeque};
use crate::util::logging;

pub struct DecorContext {
    pub(crate) config: SessionConfig,
    pub(crate) positioner: PositionerEngine,
    pub(crate) plugin: PluginAdapter,
    pub(crate) frames: HashMap<FrameId, Frame>,
    pub(crate) popups: HashMap<PopupId, Popup>,
    pub(crate) pool: BufferPool,
    pub(crate) outbound: VecDeque<EngineEvent>,
    next_frame_id: FrameId,
    next_popup_id: PopupId,
    clock: u64,
}

impl std::fmt::Debug for DecorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecorContext")
            .field("config", &self.config)
            .field("frames", &self.frames.len())
            .field("popups", &self.popups.len())
            .field("outbound", &self.outbound.len())
            .field("next_frame_id", &self.next_frame_id)
            .field("next_popup_id", &self.next_popup_id)
            .field("clock", &self.clock)
            .finish()
    }
}

impl DecorContext {
    /// Build a session. Missing required compositor capabilities are fatal
    /// here and nowhere else.
    pub fn new(
        config: SessionConfig,
        capabilities: &Capabilities,
        plugin: Box<dyn DecorPlugin>,
        allocator: Box<dyn BufferAllocator>,
    ) -> Result<Self> {
        config.validate(capabilities)?;
        crate::dlog!(
            logging::SESSION,
            "session started (family {:?}, output {}x{}@{})",
            config.family,
            config.output_width,
            config.output_height,
            config.output_scale
        );
        Ok(Self {
            positioner: PositionerEngine::new(&config),
            plugin: PluginAdapter::new(plugin),
            config,
            frames: HashMap::new(),
            popups: HashMap::new(),
            pool: BufferPool::new(allocator),
            outbound: VecDeque::new(),
            next_frame_id: 1,
            next_popup_id: 1,
            clock: 0,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Handle the plugin can use to request redraws mid-call.
    pub fn redraw_queue(&self) -> RedrawQueue {
        self.plugin.redraw_queue()
    }

    /// Monotonic stamp for anchor-candidate activation/creation ordering.
    pub fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Drive one poll cycle of the embedder's event loop. The poll is the
    /// only blocking call in the engine, bounded by `timeout`. Errors local
    /// to one frame are logged and never abort the cycle or touch sibling
    /// frames.
    pub fn dispatch(&mut self, source: &mut dyn EventSource, timeout: Duration) -> Result<usize> {
        let batch = source.poll(timeout)?;
        let count = batch.len();
        for (frame, event) in batch {
            if let Err(err) = self.handle_event(frame, event) {
                tracing::warn!("Event for frame {} not applied: {}", frame, err);
            }
        }
        self.note_round_trip();
        self.flush_plugin_redraws();
        Ok(count)
    }

    /// The single mutation entry point for compositor-driven state change.
    pub fn handle_event(&mut self, frame: FrameId, event: CompositorEvent) -> Result<()> {
        match event {
            CompositorEvent::Configure {
                serial,
                size,
                window_state,
            } => self.handle_configure(
                frame,
                Configuration {
                    serial,
                    size,
                    window_state,
                },
            ),
            CompositorEvent::Close => self.handle_close(frame),
            CompositorEvent::PreferredDecorationMode { server_side } => {
                self.handle_decoration_mode(frame, server_side)
            }
            CompositorEvent::PopupConfigure {
                popup,
                x,
                y,
                width,
                height,
            } => self.handle_popup_configure(popup, x, y, width, height),
            CompositorEvent::PopupDone { popup } => self.handle_popup_done(popup),
            CompositorEvent::BufferReleased { buffer } => self.pool.on_release(buffer),
            CompositorEvent::FrameReady => self.handle_frame_ready(frame),
            CompositorEvent::ScaleChanged { scale } => self.handle_scale_changed(frame, scale),
            CompositorEvent::SeatLeft { seat } => self.handle_seat_left(&seat),
        }
    }

    /// Hand the ordered outbound queue to the embedder.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.outbound.drain(..).collect()
    }

    pub fn pending_event_count(&self) -> usize {
        self.outbound.len()
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(&id)
    }

    pub fn popup(&self, id: PopupId) -> Option<&Popup> {
        self.popups.get(&id)
    }

    /// Buffer pool access, e.g. for painting content into a free buffer.
    pub fn buffers_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    pub(crate) fn get_frame_mut(&mut self, id: FrameId) -> Result<&mut Frame> {
        self.frames.get_mut(&id).ok_or(DecorError::UnknownFrame(id))
    }

    /// One protocol round-trip elapsed: give every stalled coordinator a
    /// chance to fall back rather than hang on a compositor that never
    /// delivers frame-ready.
    fn note_round_trip(&mut self) {
        let stalled: Vec<FrameId> = self
            .frames
            .iter_mut()
            .filter_map(|(id, frame)| frame.resize.note_round_trip().then_some(*id))
            .collect();
        for frame in stalled {
            if let Err(err) = self.release_held(frame) {
                tracing::warn!("Stall fallback for frame {} failed: {}", frame, err);
            }
        }
    }

    /// Service redraws the plugin requested mid-call.
    pub(crate) fn flush_plugin_redraws(&mut self) {
        for frame in self.plugin.drain_redraws() {
            if !self.frames.contains_key(&frame) {
                tracing::trace!("Dropping redraw request for dead frame {}", frame);
                continue;
            }
            if let Err(err) = self.redraw_frame(frame) {
                tracing::warn!("Plugin-requested redraw of frame {} failed: {}", frame, err);
            }
        }
    }

    pub(crate) fn alloc_frame_id(&mut self) -> FrameId {
        let id = self.next_frame_id;
        self.next_frame_id += 1;
        id
    }

    pub(crate) fn alloc_popup_id(&mut self) -> PopupId {
        let id = self.next_popup_id;
        self.next_popup_id += 1;
        id
    }
}
