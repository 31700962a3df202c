//! src/orchestrator/monitor.rs
//!
//! Observer surface for a running evaluation.
//!
//! The polling loop talks to exactly one monitor: it reports the aggregate
//! completion fraction every iteration, asks whether to abort, and hands
//! over deep preview snapshots when the live tree grows. Snapshots are
//! immutable from the observer's point of view.

use crossbeam_channel::Sender;

use crate::preview::{Preview, PreviewTree};
use crate::worker::ShutdownFlag;

/// Receives progress and preview snapshots from a polling loop and decides
/// when the run should stop.
pub trait TaskMonitor<P: Preview>: Send {
    /// Called once per polling iteration with the mean completion fraction
    /// across all top-level workers. Successive values never decrease.
    fn report_progress(&mut self, fraction: f64);

    /// Polled once per iteration; returning `true` terminates the run with
    /// an absent result.
    fn should_abort(&self) -> bool;

    /// Whether the observer currently wants live preview snapshots. Nested
    /// sub-orchestrators publish regardless of this flag.
    fn preview_requested(&self) -> bool;

    /// Hands the observer an independent deep snapshot of the live tree.
    fn publish_preview(&mut self, snapshot: PreviewTree<P>);
}

/// Monitor that discards everything and never aborts. For fire-and-forget
/// runs where only the final result matters.
#[derive(Debug, Default)]
pub struct NullMonitor;

impl<P: Preview> TaskMonitor<P> for NullMonitor {
    fn report_progress(&mut self, _fraction: f64) {}

    fn should_abort(&self) -> bool {
        false
    }

    fn preview_requested(&self) -> bool {
        false
    }

    fn publish_preview(&mut self, _snapshot: PreviewTree<P>) {}
}

/// Event stream emitted by a `ChannelMonitor`.
#[derive(Debug)]
pub enum RunEvent<P> {
    /// Aggregate completion fraction moved forward.
    Progress(f64),
    /// The live preview tree grew; this is an independent snapshot of it.
    Preview(PreviewTree<P>),
}

/// Monitor that forwards progress and previews over a channel, with abort
/// driven by a shared `ShutdownFlag`.
///
/// Duplicate progress reports are suppressed so a fast polling loop does not
/// flood the channel with identical fractions. A disconnected receiver is
/// tolerated; events are simply dropped.
pub struct ChannelMonitor<P> {
    events: Sender<RunEvent<P>>,
    abort: ShutdownFlag,
    last_progress: f64,
}

impl<P: Preview> ChannelMonitor<P> {
    pub fn new(events: Sender<RunEvent<P>>, abort: ShutdownFlag) -> Self {
        Self {
            events,
            abort,
            last_progress: -1.0,
        }
    }
}

impl<P: Preview> TaskMonitor<P> for ChannelMonitor<P> {
    fn report_progress(&mut self, fraction: f64) {
        if fraction > self.last_progress {
            self.last_progress = fraction;
            let _ = self.events.send(RunEvent::Progress(fraction));
        }
    }

    fn should_abort(&self) -> bool {
        self.abort.is_requested()
    }

    fn preview_requested(&self) -> bool {
        true
    }

    fn publish_preview(&mut self, snapshot: PreviewTree<P>) {
        let _ = self.events.send(RunEvent::Preview(snapshot));
    }
}
