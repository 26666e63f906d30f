use std::collections::BTreeMap;
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use image::RgbaImage;

use super::FrameRenderer;
use crate::program::{Instruction, Pc};
use crate::vm::CycleTrace;
use crate::{log_debug, log_info};

/// Frames dispatched ahead of the consumer, per worker.
const FRAMES_AHEAD_PER_WORKER: usize = 2;

/// Renders one frame per cycle of `trace` on `workers` threads and hands
/// them to `consume` in cycle order, whatever order the workers finish in.
///
/// Only a small window of frames past the one being consumed is rendered
/// ahead, so memory stays bounded for long runs. Returning from `consume`
/// early stops the workers.
pub fn render_frames<R, T, F>(
    renderer: &R,
    visible: &[&Instruction],
    trace: &CycleTrace,
    workers: usize,
    consume: F,
) -> T
where
    R: FrameRenderer + ?Sized,
    F: FnOnce(&mut dyn Iterator<Item = RgbaImage>) -> T,
{
    let workers = workers.clamp(1, trace.len().max(1));
    log_debug!("Rendering {} frames on {} workers", trace.len(), workers);

    let (job_tx, job_rx) = unbounded::<(usize, Pc)>();
    let (frame_tx, frame_rx) = unbounded::<(usize, RgbaImage)>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let jobs = job_rx.clone();
            let frames = frame_tx.clone();
            scope.spawn(move || {
                for (cycle, pc) in jobs.iter() {
                    let frame = renderer.render(visible, pc, cycle);
                    if frames.send((cycle, frame)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(frame_tx);

        let mut frames = OrderedFrames {
            cycles: trace.as_slice(),
            jobs: job_tx,
            frames: frame_rx,
            window: workers * FRAMES_AHEAD_PER_WORKER,
            dispatched: 0,
            next: 0,
            pending: BTreeMap::new(),
            progress: Progress::new(trace.len()),
        };
        let result = consume(&mut frames);
        // Closes the job queue so the workers return before the scope ends.
        drop(frames);
        result
    })
}

/// Yields rendered frames in cycle order, dispatching jobs as it goes.
struct OrderedFrames<'a> {
    cycles: &'a [Pc],
    jobs: Sender<(usize, Pc)>,
    frames: Receiver<(usize, RgbaImage)>,
    window: usize,
    dispatched: usize,
    next: usize,
    /// Frames that arrived before their turn.
    pending: BTreeMap<usize, RgbaImage>,
    progress: Progress,
}

impl OrderedFrames<'_> {
    fn dispatch(&mut self) {
        let limit = self.cycles.len().min(self.next + self.window);
        while self.dispatched < limit {
            let job = (self.dispatched, self.cycles[self.dispatched]);
            if self.jobs.send(job).is_err() {
                return;
            }
            self.dispatched += 1;
        }
    }
}

impl Iterator for OrderedFrames<'_> {
    type Item = RgbaImage;

    fn next(&mut self) -> Option<RgbaImage> {
        if self.next >= self.cycles.len() {
            return None;
        }
        self.dispatch();
        let frame = loop {
            if let Some(frame) = self.pending.remove(&self.next) {
                break frame;
            }
            // Fails only once every worker is gone.
            let (cycle, frame) = self.frames.recv().ok()?;
            self.pending.insert(cycle, frame);
        };
        self.next += 1;
        if self.progress.reports(self.next) {
            log_info!("Rendered {}/{} frames", self.next, self.progress.total);
        }
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.cycles.len() - self.next;
        (0, Some(left))
    }
}

/// Decides which frame counts are worth a log line: about every tenth of
/// the run, and the last frame.
#[derive(Debug, Clone, Copy)]
struct Progress {
    total: usize,
    step: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Progress {
            total,
            step: (total / 10).max(1),
        }
    }

    fn reports(&self, done: usize) -> bool {
        done == self.total || done % self.step == 0
    }
}
