use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::foundation::core::Fps;

/// Frames processed by all workers of a run.
#[derive(Clone, Debug, Default)]
pub struct FrameCounter(Arc<AtomicU64>);

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, frames: u64) {
        self.0.fetch_add(frames, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// `"<frames> frames - mm:ss"`, the video time those frames amount to at `fps`.
pub fn progress_line(frames: u64, fps: Fps) -> String {
    let total = fps.frames_to_secs(frames) as u64;
    format!("{frames} frames - {:02}:{:02}", total / 60, total % 60)
}

/// Background thread logging progress every `interval` until stopped.
#[derive(Debug)]
pub struct StatsPrinter {
    shutdown: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StatsPrinter {
    pub fn spawn(counter: FrameCounter, fps: Fps, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            loop {
                tracing::info!("{}", progress_line(counter.get(), fps));
                match rx.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            tracing::debug!("stats thread terminated");
        });
        Self {
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("stats thread panicked");
        }
    }
}

impl Drop for StatsPrinter {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
