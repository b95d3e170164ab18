//! Configure-cycle bookkeeping.
//!
//! The compositor proposes geometry and state asynchronously; each proposal
//! carries a serial the client must acknowledge. A frame keeps at most one
//! unapplied proposal: a newer configure replaces the pending one rather
//! than queueing behind it, so application always acts on the compositor's
//! latest word.

use crate::core::frame::frame::{Frame, WindowState};

/// A compositor geometry/state proposal.
///
/// `size == None` means the compositor has not decided yet and the client
/// picks; `window_state == None` keeps the previously negotiated state in
/// force rather than resetting it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Configuration {
    pub serial: u32,
    pub size: Option<(i32, i32)>,
    pub window_state: Option<WindowState>,
}

impl Configuration {
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            size: None,
            window_state: None,
        }
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn with_state(mut self, state: WindowState) -> Self {
        self.window_state = Some(state);
        self
    }
}

/// How a configure serial relates to what the frame already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureDisposition {
    Apply,
    /// Precedes the last-applied serial: acknowledged but never applied.
    Stale,
    /// Redelivery of the applied serial: acknowledged, no second commit.
    Duplicate,
}

impl Frame {
    pub fn classify_serial(&self, serial: u32) -> ConfigureDisposition {
        match self.last_applied_serial {
            Some(last) if serial < last => ConfigureDisposition::Stale,
            Some(last) if serial == last => ConfigureDisposition::Duplicate,
            _ => ConfigureDisposition::Apply,
        }
    }

    /// Replace the pending configuration (last-write-wins until applied).
    pub fn queue_configure(&mut self, configuration: Configuration) {
        if let Some(old) = self.pending.replace(configuration) {
            tracing::trace!(
                "Frame {}: configure serial {} superseded by {}",
                self.id,
                old.serial,
                configuration.serial
            );
        }
    }

    /// Content size to use for a configure that carried no size.
    ///
    /// First occurrence answers the provisional floating size; from the
    /// second occurrence on, the last known content size. Returning to
    /// floating always restores the remembered floating size.
    pub(crate) fn fallback_content_size(&mut self, new_state: WindowState) -> (i32, i32) {
        self.no_size_configures += 1;
        let floating = (self.floating_width, self.floating_height);
        if new_state.is_floating() && !self.state.is_floating() {
            return floating;
        }
        if self.no_size_configures == 1 || self.content_width <= 0 {
            return floating;
        }
        (self.content_width, self.content_height)
    }
}
