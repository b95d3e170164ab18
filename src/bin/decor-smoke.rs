//! Scripted end-to-end negotiation session against an in-memory
//! compositor. Useful as a smoke test of the configure/ack/commit cycle
//! without a real display connection.

use std::time::Duration;

use anyhow::Result;

use tenaya::core::buffer::MemoryAllocator;
use tenaya::core::frame::WindowState;
use tenaya::core::popup::PopupParent;
use tenaya::core::positioner::{ConstraintAdjustment, Gravity};
use tenaya::core::{BarePlugin, FrameId};
use tenaya::util::geometry::Rect;
use tenaya::{Capabilities, CompositorEvent, DecorContext, EventSource, SessionConfig};

/// Plays back a canned compositor session, one batch per poll.
struct ScriptedCompositor {
    batches: Vec<Vec<(FrameId, CompositorEvent)>>,
    cursor: usize,
}

impl ScriptedCompositor {
    fn new(batches: Vec<Vec<(FrameId, CompositorEvent)>>) -> Self {
        Self { batches, cursor: 0 }
    }

    fn finished(&self) -> bool {
        self.cursor >= self.batches.len()
    }
}

impl EventSource for ScriptedCompositor {
    fn poll(
        &mut self,
        _timeout: Duration,
    ) -> tenaya::Result<Vec<(FrameId, CompositorEvent)>> {
        let batch = self.batches.get(self.cursor).cloned().unwrap_or_default();
        self.cursor += 1;
        Ok(batch)
    }
}

fn main() -> Result<()> {
    // Initialize logging with standardized format
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,tenaya=debug");
    }
    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(
            "%Y-%m-%d %H:%M:%S".to_string(),
        ))
        .with_ansi(false)
        .init();

    let config = SessionConfig::detect();
    let mut ctx = DecorContext::new(
        config,
        &Capabilities::default(),
        Box::new(BarePlugin),
        Box::new(MemoryAllocator::new()),
    )?;

    let frame = ctx.decorate();
    ctx.set_title(frame, "tenaya smoke")?;
    ctx.request_decoration(frame, (320, 240), (0, 0), true)?;

    // Map the frame first; a popup needs a parent surface to anchor into.
    let mut boot = ScriptedCompositor::new(vec![vec![(
        frame,
        CompositorEvent::Configure {
            serial: 1,
            size: Some((800, 600)),
            window_state: Some(WindowState::ACTIVE),
        },
    )]]);
    while !boot.finished() {
        ctx.dispatch(&mut boot, Duration::from_millis(10))?;
        for event in ctx.drain_events() {
            tracing::info!("outbound: {:?}", event);
        }
    }

    let popup = ctx.create_popup(
        PopupParent::Frame(frame),
        Rect::new(16, 16, 120, 24),
        (200, 180),
        Gravity::BottomRight,
        ConstraintAdjustment::SLIDE_X | ConstraintAdjustment::FLIP_Y,
        None,
    )?;

    let mut compositor = ScriptedCompositor::new(vec![
        vec![
            (frame, CompositorEvent::FrameReady),
            (
                frame,
                CompositorEvent::PopupConfigure {
                    popup,
                    x: 16,
                    y: 40,
                    width: 200,
                    height: 180,
                },
            ),
        ],
        vec![(
            frame,
            CompositorEvent::Configure {
                serial: 2,
                size: Some((1920, 1080)),
                window_state: Some(WindowState::ACTIVE | WindowState::MAXIMIZED),
            },
        )],
        vec![
            (frame, CompositorEvent::FrameReady),
            (frame, CompositorEvent::PopupDone { popup }),
        ],
        vec![(frame, CompositorEvent::Close)],
    ]);

    while !compositor.finished() {
        ctx.dispatch(&mut compositor, Duration::from_millis(10))?;
        for event in ctx.drain_events() {
            tracing::info!("outbound: {:?}", event);
        }
    }

    let state = ctx
        .frame(frame)
        .expect("frame vanished during smoke run");
    tracing::info!(
        "final frame state: {:?} content={}x{} states={:?}",
        state.status,
        state.content_width,
        state.content_height,
        state.state
    );
    Ok(())
}
