//! End-to-end negotiation tests: a scripted compositor feeds events into
//! the context and the outbound queue plus a recording plugin verify the
//! ordering contracts.

use std::time::Duration;

use crate::config::{Capabilities, CompositorFamily, SessionConfig};
use crate::core::buffer::MemoryAllocator;
use crate::core::errors::DecorError;
use crate::core::events::{CompositorEvent, EngineEvent, EventSource};
use crate::core::frame::{DecorVisibility, FrameStatus, WindowState};
use crate::core::plugin::{BorderSize, DecorPlugin};
use crate::core::popup::PopupParent;
use crate::core::positioner::{ConstraintAdjustment, Gravity, PositionStrategy};
use crate::core::{DecorContext, FrameId};
use crate::prelude::{Arc, Mutex, VecDeque};
use crate::util::geometry::Rect;
use crate::ScrollOutcome;

/// Plugin that records every call and answers a fixed border.
struct RecordingPlugin {
    calls: Arc<Mutex<Vec<String>>>,
    border: Option<BorderSize>,
}

impl RecordingPlugin {
    fn new(border: Option<BorderSize>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: calls.clone(),
                border,
            },
            calls,
        )
    }
}

impl DecorPlugin for RecordingPlugin {
    fn frame_new(&mut self, frame: FrameId) {
        self.calls.lock().unwrap().push(format!("new {}", frame));
    }

    fn frame_free(&mut self, frame: FrameId) {
        self.calls.lock().unwrap().push(format!("free {}", frame));
    }

    fn frame_commit(
        &mut self,
        frame: FrameId,
        _state: WindowState,
        _configuration: Option<&crate::core::Configuration>,
    ) {
        self.calls.lock().unwrap().push(format!("commit {}", frame));
    }

    fn frame_property_changed(&mut self, frame: FrameId) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("property {}", frame));
    }

    fn frame_get_border_size(
        &mut self,
        frame: FrameId,
        _configuration: Option<&crate::core::Configuration>,
    ) -> Option<BorderSize> {
        self.calls.lock().unwrap().push(format!("border {}", frame));
        self.border
    }

    fn frame_popup_grab(&mut self, frame: FrameId, seat: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("grab {} {}", frame, seat));
    }

    fn frame_popup_ungrab(&mut self, frame: FrameId, seat: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("ungrab {} {}", frame, seat));
    }
}

/// Scripted event source: one batch per poll.
#[derive(Default)]
struct Script {
    batches: VecDeque<Vec<(FrameId, CompositorEvent)>>,
}

impl Script {
    fn push(&mut self, batch: Vec<(FrameId, CompositorEvent)>) {
        self.batches.push_back(batch);
    }
}

impl EventSource for Script {
    fn poll(
        &mut self,
        _timeout: Duration,
    ) -> crate::core::errors::Result<Vec<(FrameId, CompositorEvent)>> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}

fn context_with(
    family: CompositorFamily,
    border: Option<BorderSize>,
) -> (DecorContext, Arc<Mutex<Vec<String>>>) {
    let (plugin, calls) = RecordingPlugin::new(border);
    let ctx = DecorContext::new(
        SessionConfig::new(family),
        &Capabilities::default(),
        Box::new(plugin),
        Box::new(MemoryAllocator::new()),
    )
    .unwrap();
    (ctx, calls)
}

fn context() -> (DecorContext, Arc<Mutex<Vec<String>>>) {
    context_with(CompositorFamily::Weston, Some(BorderSize::default()))
}

fn count<F: Fn(&EngineEvent) -> bool>(events: &[EngineEvent], pred: F) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

fn commits(calls: &Arc<Mutex<Vec<String>>>) -> usize {
    calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with("commit"))
        .count()
}

#[test]
fn test_missing_capability_is_fatal() {
    let (plugin, _) = RecordingPlugin::new(None);
    let caps = Capabilities {
        shell: false,
        ..Capabilities::default()
    };
    let err = DecorContext::new(
        SessionConfig::new(CompositorFamily::Weston),
        &caps,
        Box::new(plugin),
        Box::new(MemoryAllocator::new()),
    )
    .unwrap_err();
    assert!(matches!(err, DecorError::CompositorIncompatible(_)));
}

// First configure with a size produces one ack, one buffer of matching
// size and one outward commit, with the resize notification ahead of the
// commit.
#[test]
fn test_first_configure_cycle() {
    let (mut ctx, calls) = context();
    let frame = ctx.decorate();
    // The creation kick is a bufferless commit
    let setup = ctx.drain_events();
    assert_eq!(setup, vec![EngineEvent::CommitSurface { frame }]);

    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();

    let events = ctx.drain_events();
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::AckConfigure { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::AttachBuffer { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::CommitSurface { .. })), 1);
    assert_eq!(commits(&calls), 1);

    // Notification order: resize before the outward commit
    let notify = events
        .iter()
        .position(|e| matches!(e, EngineEvent::ResizeNotify { width: 800, height: 600, .. }))
        .unwrap();
    let commit = events
        .iter()
        .position(|e| matches!(e, EngineEvent::CommitSurface { .. }))
        .unwrap();
    assert!(notify < commit);

    // The attached buffer matches the negotiated geometry
    let buffer = events
        .iter()
        .find_map(|e| match e {
            EngineEvent::AttachBuffer { buffer, .. } => Some(*buffer),
            _ => None,
        })
        .unwrap();
    assert_eq!(ctx.buffers_mut().get(buffer).unwrap().backing_size(), 800 * 600 * 4);

    let state = ctx.frame(frame).unwrap();
    assert_eq!(state.content_size(), (800, 600));
    assert_eq!(state.status, FrameStatus::Mapped);
    assert!(state.state.contains(WindowState::ACTIVE));
}

// Idempotence: redelivery of an applied serial acks again but never
// commits twice or changes state.
#[test]
fn test_duplicate_configure_is_idempotent() {
    let (mut ctx, calls) = context();
    let frame = ctx.decorate();
    let configure = CompositorEvent::Configure {
        serial: 7,
        size: Some((640, 480)),
        window_state: Some(WindowState::ACTIVE),
    };
    ctx.handle_event(frame, configure.clone()).unwrap();
    let first = ctx.drain_events();
    assert_eq!(count(&first, |e| matches!(e, EngineEvent::AckConfigure { .. })), 1);
    assert_eq!(commits(&calls), 1);

    ctx.handle_event(frame, configure).unwrap();
    let second = ctx.drain_events();
    assert_eq!(
        second,
        vec![EngineEvent::AckConfigure { frame, serial: 7 }]
    );
    assert_eq!(commits(&calls), 1);
    assert_eq!(ctx.frame(frame).unwrap().content_size(), (640, 480));
}

// Monotonic serials: a configure whose serial precedes the last applied
// one is acknowledged but never applied.
#[test]
fn test_stale_serial_rejected() {
    let (mut ctx, calls) = context();
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 10,
            size: Some((500, 500)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    ctx.drain_events();
    let commits_before = commits(&calls);

    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 3,
            size: Some((100, 100)),
            window_state: Some(WindowState::MAXIMIZED),
        },
    )
    .unwrap();
    let events = ctx.drain_events();
    assert_eq!(events, vec![EngineEvent::AckConfigure { frame, serial: 3 }]);
    assert_eq!(commits(&calls), commits_before);

    let state = ctx.frame(frame).unwrap();
    assert_eq!(state.content_size(), (500, 500));
    assert!(!state.state.contains(WindowState::MAXIMIZED));
}

// A configure without a window state keeps the previously negotiated
// state instead of resetting it.
#[test]
fn test_missing_state_retains_previous() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE | WindowState::MAXIMIZED),
        },
    )
    .unwrap();
    ctx.handle_event(frame, CompositorEvent::FrameReady).unwrap();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 2,
            size: Some((820, 620)),
            window_state: None,
        },
    )
    .unwrap();
    let state = ctx.frame(frame).unwrap();
    assert!(state.state.contains(WindowState::MAXIMIZED));
    assert_eq!(state.visibility, DecorVisibility::TitleOnly);
}

// Two interactive resizes before the frame-ready callback coalesce into
// the second; exactly one resize notification goes out.
#[test]
fn test_resize_coalescing() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    ctx.drain_events();

    // The configure's commit is still in flight: both resizes queue
    ctx.resize(frame, 900, 700).unwrap();
    ctx.resize(frame, 1000, 800).unwrap();
    assert!(ctx.drain_events().is_empty());
    assert_eq!(ctx.frame(frame).unwrap().content_size(), (800, 600));

    ctx.handle_event(frame, CompositorEvent::FrameReady).unwrap();
    let events = ctx.drain_events();
    let notifies: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::ResizeNotify { width, height, .. } => Some((*width, *height)),
            _ => None,
        })
        .collect();
    assert_eq!(notifies, vec![(1000, 800)]);
    assert_eq!(ctx.frame(frame).unwrap().content_size(), (1000, 800));
}

// A configure arriving mid-commit is held and applied on frame-ready,
// acked exactly once.
#[test]
fn test_configure_deferred_behind_commit() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    ctx.drain_events();

    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 2,
            size: Some((400, 300)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    // Held: no ack yet, size unchanged
    assert!(ctx.drain_events().is_empty());
    assert_eq!(ctx.frame(frame).unwrap().content_size(), (800, 600));

    ctx.handle_event(frame, CompositorEvent::FrameReady).unwrap();
    let events = ctx.drain_events();
    assert_eq!(
        count(&events, |e| matches!(e, EngineEvent::AckConfigure { serial: 2, .. })),
        1
    );
    assert_eq!(ctx.frame(frame).unwrap().content_size(), (400, 300));
}

// Limit consistency: inconsistent limits are never applied, and the
// rejection is reported once, not per retry.
#[test]
fn test_invalid_limits_rejected_once() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.request_decoration(frame, (100, 100), (400, 400), true)
        .unwrap();
    ctx.drain_events();

    let err = ctx
        .request_decoration(frame, (500, 100), (400, 400), true)
        .unwrap_err();
    assert!(matches!(err, DecorError::InvalidLimits { .. }));
    let events = ctx.drain_events();
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::LimitsRejected { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::SetMinSize { .. })), 0);

    // Retry with the same bad limits: surfaced again, reported silently
    let err = ctx
        .request_decoration(frame, (500, 100), (400, 400), true)
        .unwrap_err();
    assert!(matches!(err, DecorError::InvalidLimits { .. }));
    assert_eq!(count(&ctx.drain_events(), |e| matches!(e, EngineEvent::LimitsRejected { .. })), 0);

    // Limits are unchanged
    assert_eq!(ctx.frame(frame).unwrap().limits.min, (100, 100));
}

// A mapped non-resizable frame freezes at its current content size and
// recovers its saved limits when resizability returns.
#[test]
fn test_resizable_toggle_freezes_and_restores() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.request_decoration(frame, (200, 200), (1600, 1200), true)
        .unwrap();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    ctx.drain_events();

    ctx.request_decoration(frame, (0, 0), (0, 0), false).unwrap();
    let frozen = ctx.frame(frame).unwrap().limits;
    assert_eq!(frozen.min, (800, 600));
    assert_eq!(frozen.max, (800, 600));

    ctx.request_decoration(frame, (0, 0), (0, 0), true).unwrap();
    let restored = ctx.frame(frame).unwrap().limits;
    assert_eq!(restored.min, (200, 200));
    assert_eq!(restored.max, (1600, 1200));
}

// Popup destruction ordering: a frame with a live popup refuses to die
// until the popup is gone, then completes automatically.
#[test]
fn test_frame_destroy_deferred_behind_popups() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    let popup = ctx
        .create_popup(
            PopupParent::Frame(frame),
            Rect::new(10, 10, 100, 20),
            (200, 150),
            Gravity::BottomRight,
            ConstraintAdjustment::SLIDE_X,
            None,
        )
        .unwrap();

    let err = ctx.destroy_frame(frame).unwrap_err();
    assert!(matches!(err, DecorError::FrameBusy { live_popups: 1, .. }));
    assert!(ctx.frame(frame).is_some());

    ctx.dismiss_popup(popup).unwrap();
    assert!(ctx.popup(popup).is_none());
    // The deferred destroy completed with the last popup
    assert!(ctx.frame(frame).is_none());
}

// Compositor popup_done racing a local dismiss: one teardown, one
// DestroyPopup request, no error.
#[test]
fn test_popup_done_after_local_dismiss_is_noop() {
    let (mut ctx, calls) = context();
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    let popup = ctx
        .create_popup(
            PopupParent::Frame(frame),
            Rect::new(10, 10, 100, 20),
            (200, 150),
            Gravity::BottomRight,
            ConstraintAdjustment::empty(),
            Some("seat0"),
        )
        .unwrap();
    ctx.drain_events();

    ctx.dismiss_popup(popup).unwrap();
    ctx.handle_event(frame, CompositorEvent::PopupDone { popup })
        .unwrap();

    let events = ctx.drain_events();
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::DestroyPopup { .. })), 1);
    let ungrabs = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with("ungrab"))
        .count();
    assert_eq!(ungrabs, 1);
}

// A seat departure tears down the popups holding a grab on it.
#[test]
fn test_seat_left_dismisses_grabbed_popups() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    let popup = ctx
        .create_popup(
            PopupParent::Frame(frame),
            Rect::new(0, 0, 50, 20),
            (100, 100),
            Gravity::BottomRight,
            ConstraintAdjustment::empty(),
            Some("seat0"),
        )
        .unwrap();

    ctx.handle_event(
        frame,
        CompositorEvent::SeatLeft {
            seat: "seat0".into(),
        },
    )
    .unwrap();
    assert!(ctx.popup(popup).is_none());
}

// An oversized popup enters discovery mode and the configure reply
// records the correction.
#[test]
fn test_tall_popup_discovery_correction() {
    let (mut ctx, _) = {
        let (plugin, calls) = RecordingPlugin::new(Some(BorderSize::default()));
        let mut config = SessionConfig::new(CompositorFamily::Weston);
        config.output_height = 400;
        (
            DecorContext::new(
                config,
                &Capabilities::default(),
                Box::new(plugin),
                Box::new(MemoryAllocator::new()),
            )
            .unwrap(),
            calls,
        )
    };
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 400)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();

    let popup = ctx
        .create_popup(
            PopupParent::Frame(frame),
            Rect::new(100, 50, 20, 20),
            (150, 400),
            Gravity::BottomRight,
            ConstraintAdjustment::empty(),
            None,
        )
        .unwrap();
    assert!(matches!(
        ctx.popup(popup).unwrap().strategy,
        PositionStrategy::ConstrainedDiscovery { requested_y: 50, .. }
    ));

    ctx.handle_event(
        frame,
        CompositorEvent::PopupConfigure {
            popup,
            x: 100,
            y: 0,
            width: 150,
            height: 400,
        },
    )
    .unwrap();

    let state = ctx.popup(popup).unwrap();
    assert_eq!(state.strategy, PositionStrategy::Corrected { offset: -50 });
    assert_eq!(state.tall.unwrap().correction, -50);

    // Sliding family: scrolling keeps the popup mapped
    let outcome = ctx.scroll_popup_to_item(popup, 0, 25).unwrap();
    assert_eq!(outcome, ScrollOutcome::Slid { offset: 50 });
    assert!(ctx.popup(popup).is_some());
}

// The recreate family tears the popup down and builds a replacement at
// the new offset.
#[test]
fn test_tall_popup_recreate_on_kwin() {
    let (mut ctx, _) = {
        let (plugin, calls) = RecordingPlugin::new(Some(BorderSize::default()));
        let mut config = SessionConfig::new(CompositorFamily::Kwin);
        config.output_height = 400;
        (
            DecorContext::new(
                config,
                &Capabilities::default(),
                Box::new(plugin),
                Box::new(MemoryAllocator::new()),
            )
            .unwrap(),
            calls,
        )
    };
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 400)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    let popup = ctx
        .create_popup(
            PopupParent::Frame(frame),
            Rect::new(100, 50, 20, 20),
            (150, 400),
            Gravity::BottomRight,
            ConstraintAdjustment::empty(),
            None,
        )
        .unwrap();
    ctx.handle_event(
        frame,
        CompositorEvent::PopupConfigure {
            popup,
            x: 100,
            y: 0,
            width: 150,
            height: 400,
        },
    )
    .unwrap();
    ctx.drain_events();

    let outcome = ctx.scroll_popup_to_item(popup, 0, 25).unwrap();
    let replacement = match outcome {
        ScrollOutcome::Recreated { popup: p, offset } => {
            assert_eq!(offset, 50);
            p
        }
        other => panic!("expected recreate on KWin, got {:?}", other),
    };
    assert!(ctx.popup(popup).is_none());
    assert!(ctx.popup(replacement).is_some());

    let events = ctx.drain_events();
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::DestroyPopup { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::CreatePopup { .. })), 1);
}

// Stall fallback: a compositor that never sends frame-ready cannot hang a
// pending resize forever.
#[test]
fn test_stalled_frame_ready_falls_back() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    ctx.drain_events();
    ctx.resize(frame, 1024, 768).unwrap();
    assert!(ctx.drain_events().is_empty());

    // Empty polls stand in for protocol round-trips with no frame-ready
    let mut script = Script::default();
    for _ in 0..crate::core::commit::MAX_STALLED_ROUND_TRIPS {
        script.push(Vec::new());
    }
    for _ in 0..crate::core::commit::MAX_STALLED_ROUND_TRIPS {
        ctx.dispatch(&mut script, Duration::from_millis(1)).unwrap();
    }

    let events = ctx.drain_events();
    assert_eq!(
        count(&events, |e| matches!(e, EngineEvent::ResizeNotify { width: 1024, height: 768, .. })),
        1
    );
    assert_eq!(ctx.frame(frame).unwrap().content_size(), (1024, 768));
}

// Subwindow geometry is batched behind the parent's frame-ready and goes
// out with the next commit.
#[test]
fn test_subwindow_geometry_batched() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    ctx.drain_events();

    // Commit in flight: both changes defer, last one per subwindow wins
    ctx.set_subwindow_geometry(frame, 1, Rect::new(0, 0, 100, 100))
        .unwrap();
    ctx.set_subwindow_geometry(frame, 1, Rect::new(20, 20, 100, 100))
        .unwrap();
    assert!(ctx.drain_events().is_empty());

    ctx.handle_event(frame, CompositorEvent::FrameReady).unwrap();
    let events = ctx.drain_events();
    let geo = events
        .iter()
        .position(|e| {
            matches!(
                e,
                EngineEvent::SetSubwindowGeometry { subwindow: 1, rect, .. } if rect.x == 20
            )
        })
        .unwrap();
    let commit = events
        .iter()
        .position(|e| matches!(e, EngineEvent::CommitSurface { .. }))
        .unwrap();
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::SetSubwindowGeometry { .. })), 1);
    assert!(geo < commit);
}

// Close request from the compositor surfaces to the application and moves
// the frame to the closing state.
#[test]
fn test_close_request() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.handle_event(frame, CompositorEvent::Close).unwrap();
    let events = ctx.drain_events();
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::CloseRequested { .. })), 1);
    assert_eq!(ctx.frame(frame).unwrap().status, FrameStatus::Closing);
}

// A plugin that cannot decorate demotes the frame to the undecorated
// presentation instead of refusing to show it.
#[test]
fn test_undecoratable_frame_falls_back_bare() {
    let (mut ctx, _) = context_with(CompositorFamily::Weston, None);
    let frame = ctx.decorate();
    ctx.drain_events();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    let events = ctx.drain_events();
    // Still mapped, full window size, zero borders
    assert_eq!(count(&events, |e| matches!(e, EngineEvent::CommitSurface { .. })), 1);
    assert_eq!(ctx.frame(frame).unwrap().content_size(), (800, 600));
}

// Borders reported by the plugin shrink the content area.
#[test]
fn test_borders_subtracted_from_content() {
    let border = BorderSize {
        left: 4,
        right: 4,
        top: 24,
        bottom: 4,
    };
    let (mut ctx, _) = context_with(CompositorFamily::Weston, Some(border));
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    assert_eq!(ctx.frame(frame).unwrap().content_size(), (792, 572));
}

// Events for destroyed frames are warned no-ops, never panics.
#[test]
fn test_event_for_dead_frame_is_noop() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.destroy_frame(frame).unwrap();
    ctx.drain_events();

    let mut script = Script::default();
    script.push(vec![(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((100, 100)),
            window_state: None,
        },
    )]);
    // dispatch isolates the error; nothing leaks to siblings
    ctx.dispatch(&mut script, Duration::from_millis(1)).unwrap();
    assert!(ctx.drain_events().is_empty());
}

// Compositor decoration-mode switch hides client decorations.
#[test]
fn test_server_side_mode_hides_decorations() {
    let (mut ctx, _) = context();
    let frame = ctx.decorate();
    ctx.handle_event(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )
    .unwrap();
    ctx.drain_events();

    ctx.handle_event(frame, CompositorEvent::PreferredDecorationMode { server_side: true })
        .unwrap();
    let events = ctx.drain_events();
    assert_eq!(
        count(&events, |e| matches!(
            e,
            EngineEvent::DecorationModeChanged { server_side: true, .. }
        )),
        1
    );
    assert_eq!(ctx.frame(frame).unwrap().visibility, DecorVisibility::Hidden);
}
