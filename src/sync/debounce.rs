//! Debounced Channel
//!
//! A coalescing primitive: values sent within a quiet window supersede one
//! another and only the latest is emitted when the window closes. Urgent
//! values bypass the window entirely. This replaces ad hoc timer
//! bookkeeping with one independently testable abstraction.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

enum Msg<T> {
    Coalesce(T),
    Immediate(T),
}

/// Sender half of a debounced channel.
///
/// Dropping it stops the worker; any value still pending at that point may
/// be emitted or dropped, but sending after teardown never panics.
pub struct DebouncedSender<T> {
    tx: mpsc::UnboundedSender<Msg<T>>,
    worker: JoinHandle<()>,
}

impl<T: Send + 'static> DebouncedSender<T> {
    /// Spawn a debounced channel with the given quiet window. Emitted
    /// values arrive on the returned receiver.
    ///
    /// The window's deadline is fixed when its first value arrives;
    /// later sends supersede the pending value but never extend the
    /// deadline, so a steady stream emits once per window.
    pub fn new(window: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Msg<T>>();
        let (out_tx, out_rx) = mpsc::unbounded_channel::<T>();

        let worker = tokio::spawn(async move {
            // The window opens when the first value arrives and closes at a
            // fixed deadline, so a steady stream still emits regularly
            // instead of being starved by trailing-edge resets.
            let mut pending: Option<(T, Instant)> = None;

            loop {
                match pending.take() {
                    None => match rx.recv().await {
                        Some(Msg::Coalesce(value)) => {
                            pending = Some((value, Instant::now() + window));
                        }
                        Some(Msg::Immediate(value)) => {
                            let _ = out_tx.send(value);
                        }
                        None => break,
                    },
                    Some((value, deadline)) => {
                        tokio::select! {
                            msg = rx.recv() => match msg {
                                Some(Msg::Coalesce(newer)) => {
                                    // Superseded; the deadline stands.
                                    pending = Some((newer, deadline));
                                }
                                Some(Msg::Immediate(urgent)) => {
                                    let _ = out_tx.send(urgent);
                                    pending = Some((value, deadline));
                                }
                                None => break,
                            },
                            _ = sleep_until(deadline) => {
                                let _ = out_tx.send(value);
                            }
                        }
                    }
                }
            }
        });

        (Self { tx, worker }, out_rx)
    }

    /// Queue a value; it supersedes any value already waiting in the
    /// current window.
    pub fn send(&self, value: T) {
        let _ = self.tx.send(Msg::Coalesce(value));
    }

    /// Emit a value immediately, bypassing the window. Any pending
    /// coalesced value is left untouched.
    pub fn send_now(&self, value: T) {
        let _ = self.tx.send(Msg::Immediate(value));
    }

    /// Stop the worker without waiting for a pending window.
    pub fn shutdown(&self) {
        self.worker.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, Duration};

    const WINDOW: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn test_rapid_sends_coalesce_to_latest() {
        let (tx, mut rx) = DebouncedSender::new(WINDOW);

        for value in 1..=5u32 {
            tx.send(value);
        }
        advance(Duration::from_millis(301)).await;

        assert_eq!(rx.recv().await, Some(5));
        assert!(rx.try_recv().is_err(), "exactly one value is emitted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_values_across_windows_all_emit() {
        let (tx, mut rx) = DebouncedSender::new(WINDOW);

        tx.send(1u32);
        advance(Duration::from_millis(301)).await;
        assert_eq!(rx.recv().await, Some(1));

        tx.send(2);
        advance(Duration::from_millis(301)).await;
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_now_bypasses_window() {
        let (tx, mut rx) = DebouncedSender::new(WINDOW);

        tx.send(10u32);
        tx.send_now(99);

        // The urgent value arrives without any time passing.
        assert_eq!(rx.recv().await, Some(99));

        // The coalesced value still emits at its deadline.
        advance(Duration::from_millis(301)).await;
        assert_eq!(rx.recv().await, Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_stream_is_not_starved() {
        let (tx, mut rx) = DebouncedSender::new(WINDOW);

        // One value every 100ms for 900ms; deadlines are fixed at window
        // open, so roughly one emit per window, not zero.
        let mut emitted = 0;
        for value in 0..9u32 {
            tx.send(value);
            advance(Duration::from_millis(100)).await;
            while rx.try_recv().is_ok() {
                emitted += 1;
            }
        }
        advance(Duration::from_millis(301)).await;
        while rx.try_recv().is_ok() {
            emitted += 1;
        }

        assert!(emitted >= 3, "expected roughly one emit per window, got {emitted}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_shutdown_does_not_panic() {
        let (tx, _rx) = DebouncedSender::<u32>::new(WINDOW);
        tx.shutdown();

        tx.send(1);
        tx.send_now(2);
        tx.shutdown();
    }
}
