// src/services/tick_source.rs

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// One clock for every visible countdown: emits the current time once per period.
pub struct TickSource {
    sender: broadcast::Sender<DateTime<Utc>>,
    period: Duration,
}

impl TickSource {
    pub fn new(period: Duration) -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender, period }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DateTime<Utc>> {
        self.sender.subscribe()
    }

    /// Starts ticking on the runtime. Dropping every receiver does not stop the task;
    /// aborting the returned handle does.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                // No subscribers is fine.
                let _ = self.sender.send(Utc::now());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_ticks() {
        let source = TickSource::new(Duration::from_millis(5));
        let mut first = source.subscribe();
        let mut second = source.subscribe();
        let handle = source.spawn();

        let a = first.recv().await.unwrap();
        let b = second.recv().await.unwrap();
        assert_eq!(a, b);

        handle.abort();
    }
}
