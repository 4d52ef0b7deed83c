use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// 1 Hz countdown tick source. Best-effort wall-clock ticks for a UI
/// countdown; no drift correction. The spawned task is aborted on `stop`
/// and on drop so a stale tick can never reach a disposed session.
pub struct CountdownTimer {
    handle: JoinHandle<()>,
    ticks: mpsc::Receiver<()>,
}

impl CountdownTimer {
    pub fn start() -> Self {
        let (tx, ticks) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first interval tick completes immediately; swallow it so
            // the first delivered tick lands one second after start.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        Self { handle, ticks }
    }

    /// Waits for the next tick. Returns `None` once the timer is stopped.
    pub async fn next_tick(&mut self) -> Option<()> {
        self.ticks.recv().await
    }

    pub fn stop(&mut self) {
        self.handle.abort();
        self.ticks.close();
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
