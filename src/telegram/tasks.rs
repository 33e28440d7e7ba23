use std::future::Future;

use parking_lot::Mutex;
use tokio::task::{JoinError, JoinSet};

/// Per-message moderation runs, kept so shutdown can wait for scans still polling.
#[derive(Default)]
pub struct ModerationTasks {
    set: Mutex<JoinSet<()>>,
}

impl ModerationTasks {
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.set.lock();
        while let Some(result) = set.try_join_next() {
            log_join(result);
        }
        set.spawn(task);
    }

    /// Tasks spawned and not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.set.lock().len()
    }

    /// Waits for everything spawned so far. Dropping the returned future aborts what is left.
    pub async fn drain(&self) {
        let mut set = std::mem::take(&mut *self.set.lock());
        while let Some(result) = set.join_next().await {
            log_join(result);
        }
    }
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(err) = result {
        if err.is_panic() {
            tracing::error!(target: "moderation", error = %err, "moderation task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use super::*;

    #[tokio::test]
    async fn drain_waits_for_running_tasks() {
        let tasks = ModerationTasks::default();
        let done = Arc::new(AtomicUsize::new(0));
        for delay in [30u64, 10, 20] {
            let done = done.clone();
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(tasks.in_flight(), 3);

        tasks.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.in_flight(), 0);
    }

    #[tokio::test]
    async fn spawn_reaps_finished_tasks() {
        let tasks = ModerationTasks::default();
        tasks.spawn(async {});
        tokio::time::sleep(Duration::from_millis(20)).await;
        tasks.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        assert_eq!(tasks.in_flight(), 1);
    }

    #[tokio::test]
    async fn survives_a_panicking_task() {
        let tasks = ModerationTasks::default();
        tasks.spawn(async { panic!("boom") });
        tasks.drain().await;
        assert_eq!(tasks.in_flight(), 0);
    }
}
