//! Background frame driver for hosts without their own render loop.
//!
//! One named thread wakes at a fixed cadence and runs a frame callback
//! (normally `PlaybackController::tick` under the handle's mutex). The
//! controller computes positions from real elapsed time, so cadence jitter
//! only changes how often the position is sampled.
//!
//! When a frame returns [`TickFlow::Stop`] the thread parks on its wake
//! channel and takes no frames until a [`FrameWaker`] fires. Shutdown is a
//! dropped channel: the thread sees the disconnect in its `select!` and
//! exits before the next frame.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, never, select, tick};
use log::{trace, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use super::clock::TickFlow;

/// Resumes a parked driver. Cheap to clone; waking a running driver is a no-op.
#[derive(Clone, Debug)]
pub struct FrameWaker {
    tx: Sender<()>,
}

impl FrameWaker {
    pub fn wake(&self) {
        match self.tx.try_send(()) {
            // Full means a wake is already pending
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => trace!("FrameWaker: driver gone"),
        }
    }
}

/// Thread ticking a frame callback until shut down
pub struct FrameDriver {
    interval: Duration,
    shutdown: Option<Sender<()>>,
    waker: FrameWaker,
    parked: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FrameDriver {
    /// Spawn the driver thread.
    ///
    /// # Arguments
    ///
    /// * `name` - Thread name (shows up in debuggers and panics)
    /// * `interval` - Time between frames, must be non-zero
    /// * `on_frame` - Called once per frame on the driver thread; `Stop` parks the thread
    pub fn spawn<F>(name: &str, interval: Duration, mut on_frame: F) -> std::io::Result<Self>
    where
        F: FnMut() -> TickFlow + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let (wake_tx, wake_rx) = bounded::<()>(1);
        let parked = Arc::new(AtomicBool::new(false));
        let parked_flag = Arc::clone(&parked);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                trace!("FrameDriver started ({:?} per frame)", interval);
                let mut frames: Receiver<Instant> = tick(interval);
                loop {
                    select! {
                        recv(shutdown_rx) -> _ => break,
                        recv(frames) -> _ => {
                            if on_frame() == TickFlow::Stop {
                                trace!("FrameDriver parked");
                                parked_flag.store(true, Ordering::SeqCst);
                                frames = never();
                            }
                        }
                        recv(wake_rx) -> msg => {
                            if msg.is_err() {
                                break;
                            }
                            if parked_flag.swap(false, Ordering::SeqCst) {
                                trace!("FrameDriver woken");
                                frames = tick(interval);
                            }
                        }
                    }
                }
                trace!("FrameDriver stopped");
            })?;

        Ok(Self {
            interval,
            shutdown: Some(shutdown_tx),
            waker: FrameWaker { tx: wake_tx },
            parked,
            handle: Some(handle),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Handle for resuming the thread after it parked
    pub fn waker(&self) -> FrameWaker {
        self.waker.clone()
    }

    /// True while the thread waits for a wake instead of taking frames
    pub fn is_parked(&self) -> bool {
        self.parked.load(Ordering::SeqCst)
    }

    /// Stop the thread and wait for it. Idempotent.
    ///
    /// Must not be called while holding a lock the frame callback takes.
    pub fn shutdown(&mut self) {
        // Disconnect wakes the select! immediately
        self.shutdown.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("FrameDriver thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(flow: TickFlow) -> (Arc<AtomicUsize>, impl FnMut() -> TickFlow + Send + 'static) {
        let frames = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&frames);
        (frames, move || {
            f.fetch_add(1, Ordering::SeqCst);
            flow
        })
    }

    #[test]
    fn test_driver_calls_frames() {
        let (frames, on_frame) = counting(TickFlow::Continue);
        let mut driver = FrameDriver::spawn("test-frames", Duration::from_millis(2), on_frame).unwrap();
        assert_eq!(driver.interval(), Duration::from_millis(2));

        thread::sleep(Duration::from_millis(60));
        driver.shutdown();
        assert!(frames.load(Ordering::SeqCst) > 1);
        assert!(!driver.is_running());
    }

    #[test]
    fn test_no_frames_after_shutdown() {
        let (frames, on_frame) = counting(TickFlow::Continue);
        let mut driver = FrameDriver::spawn("test-frames", Duration::from_millis(1), on_frame).unwrap();

        thread::sleep(Duration::from_millis(20));
        driver.shutdown();
        let count = frames.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(frames.load(Ordering::SeqCst), count);

        // Second shutdown is a no-op
        driver.shutdown();
    }

    #[test]
    fn test_stop_parks_until_woken() {
        let (frames, on_frame) = counting(TickFlow::Stop);
        let mut driver = FrameDriver::spawn("test-frames", Duration::from_millis(2), on_frame).unwrap();

        thread::sleep(Duration::from_millis(40));
        assert_eq!(frames.load(Ordering::SeqCst), 1);
        assert!(driver.is_parked());

        driver.waker().wake();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(frames.load(Ordering::SeqCst), 2);
        assert!(driver.is_parked());

        driver.shutdown();
        // Waking a stopped driver is harmless
        driver.waker().wake();
    }
}
