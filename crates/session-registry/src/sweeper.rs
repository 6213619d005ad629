use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::registry::SessionRegistry;

/// Owner of the background sweep task.
///
/// Dropping the handle detaches the task; it then keeps sweeping until the
/// runtime shuts down.
pub struct SweeperHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweep loop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            warn!("Session sweeper exited abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<C> SessionRegistry<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// Spawn the periodic sweep on the current tokio runtime.
    pub fn spawn_sweeper(&self, every: Duration) -> SweeperHandle {
        let every = every.max(Duration::from_millis(1));
        let (stop, stopped) = watch::channel(false);
        let registry = self.clone();

        let task = tokio::spawn(async move {
            run(registry, every, stopped).await;
        });

        SweeperHandle { stop, task }
    }
}

async fn run<C>(registry: SessionRegistry<C>, every: Duration, mut stopped: watch::Receiver<bool>)
where
    C: Clone + Send + Sync + 'static,
{
    info!("Session sweeper started (interval={:?})", every);

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick fires immediately.
    ticker.tick().await;

    let mut detached = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = registry.sweep();
                if removed > 0 {
                    info!("Swept {} expired sessions ({} remaining)", removed, registry.len());
                } else {
                    debug!("Sweep found no expired sessions ({} active)", registry.len());
                }
            }
            changed = stopped.changed(), if !detached => match changed {
                Ok(()) if *stopped.borrow() => break,
                Ok(()) => {}
                Err(_) => detached = true,
            },
        }
    }

    info!("Session sweeper stopped");
}
