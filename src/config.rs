//! Session configuration.
//!
//! Everything environment-dependent is resolved exactly once, at session
//! start, and handed by reference into the engine constructors. After that
//! point no negotiation code reads the environment or any global state.
//!
//! Family detection only ever changes timing/workaround choices (the
//! `Quirks` table); it never changes protocol message shapes.

use crate::core::errors::{DecorError, Result};

/// Recognized compositor families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorFamily {
    Mutter,
    Kwin,
    Weston,
}

impl CompositorFamily {
    /// Detect the running family from the environment.
    ///
    /// `TENAYA_COMPOSITOR` overrides everything; otherwise
    /// `XDG_CURRENT_DESKTOP` then `DESKTOP_SESSION` are consulted. Weston is
    /// the conservative fallback for unrecognized environments.
    pub fn detect() -> Self {
        let override_var = std::env::var("TENAYA_COMPOSITOR").ok();
        let current_desktop = std::env::var("XDG_CURRENT_DESKTOP").ok();
        let session = std::env::var("DESKTOP_SESSION").ok();
        Self::from_env(
            override_var.as_deref(),
            current_desktop.as_deref(),
            session.as_deref(),
        )
    }

    /// Pure detection core, separated so tests can exercise the table
    /// without touching the process environment.
    pub fn from_env(
        override_var: Option<&str>,
        current_desktop: Option<&str>,
        session: Option<&str>,
    ) -> Self {
        if let Some(name) = override_var {
            if let Some(family) = Self::from_name(name) {
                return family;
            }
            tracing::warn!("TENAYA_COMPOSITOR={} not recognized, ignoring", name);
        }

        for hint in [current_desktop, session].into_iter().flatten() {
            // XDG_CURRENT_DESKTOP may hold a colon-separated list
            for part in hint.split(':') {
                if let Some(family) = Self::from_name(part) {
                    return family;
                }
            }
        }

        Self::Weston
    }

    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "gnome" | "mutter" | "gnome-shell" => Some(Self::Mutter),
            "kde" | "kwin" | "plasma" | "plasmawayland" => Some(Self::Kwin),
            "weston" | "wlroots" | "sway" => Some(Self::Weston),
            _ => None,
        }
    }
}

/// How a family handles an oversized popup that must scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallPopupMode {
    /// The popup stays mapped and the client slides its draw offset.
    SlideOffset,
    /// The popup must be destroyed and recreated at the new offset.
    Recreate,
}

/// Per-family workaround table, resolved once at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    pub tall_popup_mode: TallPopupMode,
    /// Whether fullscreen/resize capability bits carried in configure
    /// events are authoritative for this family.
    pub trusts_configure_capabilities: bool,
    /// Whether tiled edges arrive as distinct state flags, or must be
    /// inferred from a fixed-size non-maximized configure.
    pub reports_tiled_states: bool,
}

impl Quirks {
    pub fn for_family(family: CompositorFamily) -> Self {
        match family {
            CompositorFamily::Mutter => Self {
                tall_popup_mode: TallPopupMode::SlideOffset,
                trusts_configure_capabilities: true,
                reports_tiled_states: true,
            },
            CompositorFamily::Kwin => Self {
                tall_popup_mode: TallPopupMode::Recreate,
                trusts_configure_capabilities: true,
                reports_tiled_states: true,
            },
            CompositorFamily::Weston => Self {
                tall_popup_mode: TallPopupMode::SlideOffset,
                trusts_configure_capabilities: false,
                reports_tiled_states: false,
            },
        }
    }
}

/// Globals the embedder reports as bound at session start.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// The shell surface global. Required.
    pub shell: bool,
    /// The shared-memory buffer global. Required.
    pub shm: bool,
    /// Subsurface support; without it subwindow batching degrades.
    pub subsurfaces: bool,
    /// Cropping/scaling support; without it shadows are skipped.
    pub viewporter: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            shell: true,
            shm: true,
            subsurfaces: true,
            viewporter: true,
        }
    }
}

/// Configuration for one negotiation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub family: CompositorFamily,
    pub quirks: Quirks,
    /// Primary output size in logical pixels.
    pub output_width: u32,
    pub output_height: u32,
    pub output_scale: i32,
}

impl SessionConfig {
    pub fn new(family: CompositorFamily) -> Self {
        Self {
            family,
            quirks: Quirks::for_family(family),
            output_width: 1920,
            output_height: 1080,
            output_scale: 1,
        }
    }

    /// Build a config by detecting the compositor family from the
    /// environment.
    pub fn detect() -> Self {
        let family = CompositorFamily::detect();
        tracing::info!("Detected compositor family: {:?}", family);
        Self::new(family)
    }

    /// Validate required globals. Missing required capabilities are fatal
    /// here and only here; optional ones degrade with a warning.
    pub fn validate(&self, caps: &Capabilities) -> Result<()> {
        if !caps.shell {
            return Err(DecorError::CompositorIncompatible(
                "shell surface global is not available".into(),
            ));
        }
        if !caps.shm {
            return Err(DecorError::CompositorIncompatible(
                "shared-memory buffer global is not available".into(),
            ));
        }
        if !caps.subsurfaces {
            tracing::warn!("subsurfaces unavailable; subwindow geometry will apply unbatched");
        }
        if !caps.viewporter {
            tracing::warn!("viewporter unavailable; decorations will be drawn without shadows");
        }
        Ok(())
    }

    /// Vertical space a popup can actually occupy on the primary output.
    pub fn usable_height(&self) -> u32 {
        self.output_height
    }
}
