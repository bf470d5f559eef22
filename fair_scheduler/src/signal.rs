//! Cancellation-aware waiting for background work

use log::error;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// One-shot shutdown signal
///
/// Background work waits on the signal with a timeout instead of
/// sleeping, so a shutdown is observed as soon as it is triggered.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    triggered: Mutex<bool>,
    cvar: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers the signal and wakes every waiter
    pub fn trigger(&self) {
        *self.triggered.lock() = true;
        self.cvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.triggered.lock()
    }

    /// Waits up to `timeout` for the signal
    ///
    /// Returns true if the signal was triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut triggered = self.triggered.lock();
        while !*triggered {
            if self.cvar.wait_until(&mut triggered, deadline).timed_out() {
                break;
            }
        }
        *triggered
    }
}

/// Periodic background thread stopped through a [`ShutdownSignal`]
pub struct BackgroundLoop {
    signal: Arc<ShutdownSignal>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundLoop {
    /// Spawns a thread running `body` every `interval` until stopped
    pub fn spawn<F>(name: &str, interval: Duration, mut body: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let signal = Arc::new(ShutdownSignal::new());
        let thread_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while !thread_signal.is_triggered() {
                    body();
                    if thread_signal.wait_timeout(interval) {
                        break;
                    }
                }
            })?;

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Signals the loop and waits for its thread to exit
    pub fn stop(&mut self) {
        self.signal.trigger();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("background loop panicked");
            }
        }
    }
}

impl Drop for BackgroundLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_wait_times_out_when_not_triggered() {
        let signal = ShutdownSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn test_trigger_wakes_waiter() {
        let signal = Arc::new(ShutdownSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                let start = Instant::now();
                let triggered = signal.wait_timeout(Duration::from_secs(30));
                (triggered, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(10));
        signal.trigger();
        let (triggered, waited) = waiter.join().unwrap();
        assert!(triggered);
        assert!(waited < Duration::from_secs(30));
    }

    #[test]
    fn test_loop_runs_until_stopped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut background = {
            let counter = Arc::clone(&counter);
            BackgroundLoop::spawn("test-loop", Duration::from_millis(1), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
        };

        while counter.load(Ordering::SeqCst) < 3 {
            thread::sleep(Duration::from_millis(1));
        }
        background.stop();
        let after_stop = counter.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_stop_is_prompt_with_long_interval() {
        let mut background =
            BackgroundLoop::spawn("slow-loop", Duration::from_secs(60), || {}).unwrap();
        let start = Instant::now();
        background.stop();
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
