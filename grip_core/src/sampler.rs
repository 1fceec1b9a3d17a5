//! Background force-sensor sampling.
//!
//! Spawns a thread that owns the `AnalogInput`, forwards each reading over a
//! bounded(1) channel (replacing an unread one). Freshness is judged by the
//! consumer on its own clock.
//!
//! Each `Sampler` owns exactly one thread, shut down and joined on drop.
use crate::error::GripError;
use crate::hw_error::map_sensor_error;
use crossbeam_channel as xch;
use grip_traits::AnalogInput;
use grip_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub type Sample = Result<f32, GripError>;

pub struct Sampler {
    rx: xch::Receiver<Sample>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    pub fn spawn<C: Clock + Send + 'static>(
        mut sensor: Box<dyn AnalogInput + Send>,
        period: Duration,
        clock: C,
    ) -> Self {
        let (tx, rx) = xch::bounded::<Sample>(1);
        // Producer-side receiver so a stale unread sample can be replaced.
        let drain = rx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }

                let mut msg = sensor.read().map_err(|e| map_sensor_error(e.as_ref()));
                loop {
                    match tx.try_send(msg) {
                        Ok(()) => break,
                        Err(xch::TrySendError::Full(m)) => {
                            let _ = drain.try_recv();
                            msg = m;
                        }
                        Err(xch::TrySendError::Disconnected(_)) => {
                            tracing::debug!("sampler consumer disconnected, exiting thread");
                            return;
                        }
                    }
                }
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Newest reading not yet consumed, if any.
    pub fn latest(&self) -> Option<Sample> {
        self.rx.try_iter().last()
    }

    /// Wait up to `timeout` for the next reading.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Sample> {
        self.latest().or_else(|| self.rx.recv_timeout(timeout).ok())
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // The thread exits after at most one read and never blocks on send.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("sampler thread joined"),
                Err(e) => tracing::warn!(?e, "sampler thread panicked during shutdown"),
            }
        }
    }
}
