use bitflags::bitflags;

use crate::core::commit::ResizeCoordinator;
use crate::core::errors::{DecorError, Result};
use crate::core::frame::configure::Configuration;
use crate::core::{BufferId, FrameId};

/// Size a frame presents before the compositor has ever proposed one.
pub const DEFAULT_FLOATING_WIDTH: i32 = 800;
pub const DEFAULT_FLOATING_HEIGHT: i32 = 600;

bitflags! {
    /// Window-state flags negotiated with the compositor. The size-class
    /// flags (maximized/fullscreen/tiled) are mutually overlaid with the
    /// independent `ACTIVE`/`RESIZING`/`SUSPENDED` flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowState: u32 {
        const ACTIVE = 1 << 0;
        const MAXIMIZED = 1 << 1;
        const FULLSCREEN = 1 << 2;
        const TILED_LEFT = 1 << 3;
        const TILED_RIGHT = 1 << 4;
        const TILED_TOP = 1 << 5;
        const TILED_BOTTOM = 1 << 6;
        const RESIZING = 1 << 7;
        const SUSPENDED = 1 << 8;
    }
}

impl WindowState {
    pub fn is_tiled(self) -> bool {
        self.intersects(
            Self::TILED_LEFT | Self::TILED_RIGHT | Self::TILED_TOP | Self::TILED_BOTTOM,
        )
    }

    /// Floating: no size-class flag set.
    pub fn is_floating(self) -> bool {
        !self.contains(Self::MAXIMIZED) && !self.contains(Self::FULLSCREEN) && !self.is_tiled()
    }
}

/// Frame lifecycle. Size-class states are carried in `WindowState`;
/// this tracks the mapping progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStatus {
    #[default]
    Unmapped,
    AwaitingConfigure,
    Mapped,
    Closing,
}

/// Who draws the decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecorationMode {
    #[default]
    ClientSide,
    ServerSide,
}

/// What the decoration shows for the current state class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecorVisibility {
    /// Title bar, borders, shadow.
    #[default]
    Full,
    /// Title bar only; maximized/tiled windows lose borders and shadow.
    TitleOnly,
    /// Nothing; fullscreen, or the compositor draws instead.
    Hidden,
}

pub fn visibility_for(mode: DecorationMode, state: WindowState) -> DecorVisibility {
    if mode == DecorationMode::ServerSide {
        return DecorVisibility::Hidden;
    }
    if state.contains(WindowState::FULLSCREEN) {
        DecorVisibility::Hidden
    } else if state.contains(WindowState::MAXIMIZED) || state.is_tiled() {
        DecorVisibility::TitleOnly
    } else {
        DecorVisibility::Full
    }
}

/// Min/max content-size limits; zero means unconstrained on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentLimits {
    pub min: (i32, i32),
    pub max: (i32, i32),
}

impl ContentLimits {
    pub fn new(min: (i32, i32), max: (i32, i32)) -> Self {
        Self { min, max }
    }

    /// Min must not exceed max on an axis where both are set.
    pub fn validate(&self) -> Result<()> {
        let bad_x = self.max.0 != 0 && self.min.0 > self.max.0;
        let bad_y = self.max.1 != 0 && self.min.1 > self.max.1;
        if bad_x || bad_y {
            return Err(DecorError::InvalidLimits {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Clamp a proposed content size to the limits.
    pub fn clamp(&self, width: i32, height: i32) -> (i32, i32) {
        let mut w = width;
        let mut h = height;
        if self.min.0 > 0 {
            w = w.max(self.min.0);
        }
        if self.min.1 > 0 {
            h = h.max(self.min.1);
        }
        if self.max.0 > 0 {
            w = w.min(self.max.0);
        }
        if self.max.1 > 0 {
            h = h.min(self.max.1);
        }
        (w, h)
    }
}

/// What a state transition requires of the rendering plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateChange {
    /// The decoration-visibility class changed: border sizes must be
    /// recomputed and the decoration redrawn.
    pub visibility_changed: bool,
    /// Color-only change (activation); repaint without recomputing borders.
    pub repaint: bool,
}

/// The decoration-negotiation unit for one toplevel window.
#[derive(Debug)]
pub struct Frame {
    pub id: FrameId,
    pub title: String,
    pub app_id: String,
    pub status: FrameStatus,
    pub state: WindowState,
    /// Current negotiated content size.
    pub content_width: i32,
    pub content_height: i32,
    /// Last floating size, restored when returning to floating.
    pub floating_width: i32,
    pub floating_height: i32,
    pub limits: ContentLimits,
    /// Limits saved when a frame is frozen non-resizable, restored when
    /// resizability comes back.
    pub(crate) saved_limits: Option<ContentLimits>,
    pub resizable: bool,
    /// What the application asked for.
    pub requested_mode: DecorationMode,
    /// What the compositor negotiated.
    pub decoration_mode: DecorationMode,
    pub visibility: DecorVisibility,
    pub scale: i32,
    /// At most one pending configuration; replaced, never appended.
    pub(crate) pending: Option<Configuration>,
    pub(crate) last_applied_serial: Option<u32>,
    /// Occurrences of configures that arrived without a size.
    pub(crate) no_size_configures: u32,
    pub(crate) limits_error_reported: bool,
    pub(crate) live_popups: usize,
    pub(crate) pending_destroy: bool,
    pub(crate) resize: ResizeCoordinator,
    pub(crate) buffer: Option<BufferId>,
}

impl Frame {
    pub fn new(id: FrameId) -> Self {
        Self {
            id,
            title: String::new(),
            app_id: String::new(),
            status: FrameStatus::Unmapped,
            state: WindowState::empty(),
            content_width: 0,
            content_height: 0,
            floating_width: DEFAULT_FLOATING_WIDTH,
            floating_height: DEFAULT_FLOATING_HEIGHT,
            limits: ContentLimits::default(),
            saved_limits: None,
            resizable: true,
            requested_mode: DecorationMode::ClientSide,
            decoration_mode: DecorationMode::ClientSide,
            visibility: DecorVisibility::Full,
            scale: 1,
            pending: None,
            last_applied_serial: None,
            no_size_configures: 0,
            limits_error_reported: false,
            live_popups: 0,
            pending_destroy: false,
            resize: ResizeCoordinator::default(),
            buffer: None,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.status == FrameStatus::Mapped
    }

    pub fn content_size(&self) -> (i32, i32) {
        (self.content_width, self.content_height)
    }

    /// Apply a new window state, recomputing the decoration-visibility
    /// class. A state whose only difference is a pixel-irrelevant flag
    /// (resizing, suspended) requires nothing of the plugin.
    pub fn apply_state(&mut self, new_state: WindowState) -> StateChange {
        let old_state = self.state;
        let old_visibility = self.visibility;
        self.state = new_state;
        self.visibility = visibility_for(self.decoration_mode, new_state);

        StateChange {
            visibility_changed: self.visibility != old_visibility,
            repaint: old_state.contains(WindowState::ACTIVE)
                != new_state.contains(WindowState::ACTIVE),
        }
    }

    /// Update the negotiated decoration mode. Returns true when the
    /// visibility class changed as a result.
    pub fn set_decoration_mode(&mut self, mode: DecorationMode) -> bool {
        self.decoration_mode = mode;
        let old = self.visibility;
        self.visibility = visibility_for(mode, self.state);
        self.visibility != old
    }
}
