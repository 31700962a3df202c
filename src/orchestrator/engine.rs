//! src/orchestrator/engine.rs
//!
//! The polling/merge loop shared by the cross-validation root and every
//! per-fold sub-orchestrator.
//!
//! The loop owns the live preview tree exclusively; workers never touch it.
//! All cross-thread state it reads (completion flag, progress fraction,
//! latest preview) is published by each worker through its own cells, so the
//! loop needs no locking of its own beyond the snapshot reads.

use std::thread;
use std::time::Duration;

use tracing::debug;

use super::monitor::TaskMonitor;
use crate::preview::{Preview, PreviewTree};
use crate::worker::WorkerHandle;

/// Polls `workers` until all of them complete, merging their previews into
/// one tree, and returns the final tree. Returns `None` if the monitor
/// requested an abort, in which case no partial result is handed back.
///
/// Callers must have started every worker already; this function only reads.
///
/// Per iteration, in worker order:
/// - completion flags are ANDed and progress fractions summed across the
///   *entire* list, so the reported aggregate is always the mean of every
///   worker's own fraction and the loop can only end when all workers are
///   done. A worker that completes without ever publishing a preview can
///   therefore never terminate the run early or distort the mean.
/// - previews are merged at the worker's index, but merging stops at the
///   first worker with no usable preview yet. Published snapshots thus
///   always populate a contiguous index prefix: entry 3 never appears while
///   entry 2 is still missing, which keeps a live curve view from showing
///   gaps.
///
/// After the scan the mean fraction is reported, the abort flag is checked,
/// and, if the tree grew, a deep snapshot is published (always for nested
/// sub-orchestrators; gated on `preview_requested` at the top level).
pub fn run_polling_loop<W, P, M>(
    workers: &[W],
    tree_label: &str,
    monitor: &mut M,
    poll_interval: Duration,
    publish_unconditionally: bool,
) -> Option<PreviewTree<P>>
where
    W: WorkerHandle<Preview = P>,
    P: Preview,
    M: TaskMonitor<P> + ?Sized,
{
    let mut tree = PreviewTree::new(tree_label);
    if workers.is_empty() {
        return Some(tree);
    }

    loop {
        let mut all_complete = true;
        let mut completion_sum = 0.0;
        let prior_count = tree.entry_count();
        let mut merging = true;

        for (index, worker) in workers.iter().enumerate() {
            all_complete &= worker.is_complete();
            completion_sum += worker.fraction_complete();
            if !merging {
                continue;
            }
            match worker.latest_preview() {
                // Replacement is a safe merge: successive snapshots from the
                // same worker are informationally monotone.
                Some(preview) if preview.has_content() => tree.set_entry(index, preview),
                _ => merging = false,
            }
        }

        monitor.report_progress(completion_sum / workers.len() as f64);

        if monitor.should_abort() {
            debug!(label = tree_label, "abort requested, run terminated");
            return None;
        }

        if tree.entry_count() > prior_count
            && (publish_unconditionally || monitor.preview_requested())
        {
            monitor.publish_preview(tree.copy());
        }

        if all_complete {
            break;
        }
        if !poll_interval.is_zero() {
            thread::sleep(poll_interval);
        }
    }

    debug!(
        label = tree_label,
        entries = tree.entry_count(),
        "all workers complete"
    );
    Some(tree)
}
