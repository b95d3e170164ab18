//! Rendering plugin seam.
//!
//! The engine never paints pixels. A concrete plugin (cairo-based,
//! toolkit-based, or the bare fallback) implements `DecorPlugin`; the
//! engine drives it through `PluginAdapter`, which caches border answers
//! and degrades to the undecorated presentation when the plugin cannot
//! answer. All plugin calls are synchronous; the only re-entry a plugin is
//! allowed is requesting a redraw through its `RedrawQueue` handle, which
//! the engine drains after the call returns.

use crate::core::frame::{Configuration, WindowState};
use crate::core::FrameId;
use crate::prelude::{Arc, HashMap, Mutex, VecDeque};
use crate::util::logging;

/// Border thickness reported by the plugin, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BorderSize {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl BorderSize {
    pub fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> i32 {
        self.top + self.bottom
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Handle a plugin uses to request a redraw/commit mid-call. The engine
/// accepts these even while a plugin call is on the stack and services them
/// once it returns.
#[derive(Clone, Default)]
pub struct RedrawQueue {
    queue: Arc<Mutex<VecDeque<FrameId>>>,
}

impl RedrawQueue {
    pub fn request_redraw(&self, frame: FrameId) {
        self.queue.lock().expect("redraw queue poisoned").push_back(frame);
    }

    pub(crate) fn drain(&self) -> Vec<FrameId> {
        self.queue
            .lock()
            .expect("redraw queue poisoned")
            .drain(..)
            .collect()
    }
}

/// Contract implemented by the external rendering plugin.
pub trait DecorPlugin {
    fn frame_new(&mut self, frame: FrameId);
    fn frame_free(&mut self, frame: FrameId);
    /// Repaint the decoration for the given state. `configuration` is the
    /// proposal being applied, or `None` for repaints outside a configure
    /// cycle.
    fn frame_commit(
        &mut self,
        frame: FrameId,
        state: WindowState,
        configuration: Option<&Configuration>,
    );
    /// A pixel-relevant property (title, activation color) changed.
    fn frame_property_changed(&mut self, frame: FrameId);
    /// Border thickness for the given configuration; `None` means the
    /// plugin cannot decorate this frame.
    fn frame_get_border_size(
        &mut self,
        frame: FrameId,
        configuration: Option<&Configuration>,
    ) -> Option<BorderSize>;
    fn frame_popup_grab(&mut self, frame: FrameId, seat: &str);
    fn frame_popup_ungrab(&mut self, frame: FrameId, seat: &str);
}

/// Undecorated fallback presentation: zero borders, paints nothing. Used
/// when no richer plugin is supplied, and the degraded mode for frames the
/// active plugin refuses to decorate.
#[derive(Debug, Default)]
pub struct BarePlugin;

impl DecorPlugin for BarePlugin {
    fn frame_new(&mut self, frame: FrameId) {
        tracing::debug!("BarePlugin: new frame {}", frame);
    }

    fn frame_free(&mut self, _frame: FrameId) {}

    fn frame_commit(
        &mut self,
        _frame: FrameId,
        _state: WindowState,
        _configuration: Option<&Configuration>,
    ) {
    }

    fn frame_property_changed(&mut self, _frame: FrameId) {}

    fn frame_get_border_size(
        &mut self,
        _frame: FrameId,
        _configuration: Option<&Configuration>,
    ) -> Option<BorderSize> {
        Some(BorderSize::default())
    }

    fn frame_popup_grab(&mut self, _frame: FrameId, _seat: &str) {}

    fn frame_popup_ungrab(&mut self, _frame: FrameId, _seat: &str) {}
}

/// Uniform wrapper around the concrete plugin.
pub struct PluginAdapter {
    plugin: Box<dyn DecorPlugin>,
    redraw: RedrawQueue,
    borders: HashMap<FrameId, BorderSize>,
    undecorated: HashMap<FrameId, bool>,
}

impl PluginAdapter {
    pub fn new(plugin: Box<dyn DecorPlugin>) -> Self {
        Self {
            plugin,
            redraw: RedrawQueue::default(),
            borders: HashMap::new(),
            undecorated: HashMap::new(),
        }
    }

    /// Handle the plugin can use to request redraws mid-call.
    pub fn redraw_queue(&self) -> RedrawQueue {
        self.redraw.clone()
    }

    pub(crate) fn drain_redraws(&self) -> Vec<FrameId> {
        self.redraw.drain()
    }

    pub fn new_frame(&mut self, frame: FrameId) {
        self.plugin.frame_new(frame);
    }

    pub fn free_frame(&mut self, frame: FrameId) {
        self.plugin.frame_free(frame);
        self.borders.remove(&frame);
        self.undecorated.remove(&frame);
    }

    pub fn commit(
        &mut self,
        frame: FrameId,
        state: WindowState,
        configuration: Option<&Configuration>,
    ) {
        self.plugin.frame_commit(frame, state, configuration);
    }

    pub fn property_changed(&mut self, frame: FrameId) {
        self.plugin.frame_property_changed(frame);
    }

    /// Border size for the frame under the given configuration. A plugin
    /// that cannot answer demotes the frame to the undecorated
    /// presentation (zero borders), reported once, not per retry.
    pub fn border_size(
        &mut self,
        frame: FrameId,
        configuration: Option<&Configuration>,
    ) -> BorderSize {
        match self.plugin.frame_get_border_size(frame, configuration) {
            Some(size) => {
                self.undecorated.insert(frame, false);
                self.borders.insert(frame, size);
                size
            }
            None => {
                if self.undecorated.insert(frame, true) != Some(true) {
                    crate::dlog!(
                        logging::PLUGIN,
                        "plugin cannot decorate frame {}; presenting undecorated",
                        frame
                    );
                }
                let size = BorderSize::default();
                self.borders.insert(frame, size);
                size
            }
        }
    }

    /// Last border answer without a fresh plugin query.
    pub fn cached_border(&self, frame: FrameId) -> BorderSize {
        self.borders.get(&frame).copied().unwrap_or_default()
    }

    pub fn popup_grab(&mut self, frame: FrameId, seat: &str) {
        self.plugin.frame_popup_grab(frame, seat);
    }

    pub fn popup_ungrab(&mut self, frame: FrameId, seat: &str) {
        self.plugin.frame_popup_ungrab(frame, seat);
    }
}
