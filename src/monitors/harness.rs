use crate::error::BoxError;
use async_trait::async_trait;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// A periodic background monitor.
///
/// One `tick` is a full scan; all state is re-derived each tick, so a failed
/// or skipped tick is recovered by the next one.
#[async_trait]
pub trait Monitor: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Normal cadence between ticks
    fn interval(&self) -> Duration;

    /// Fixed delay applied after a failed tick, in place of the normal
    /// interval
    fn recovery_delay(&self) -> Duration;

    /// Run one scan cycle
    async fn tick(&self) -> Result<(), BoxError>;
}

/// Drive a monitor until the shutdown signal flips.
///
/// Errors never escape a tick: the loop logs them and sleeps the monitor's
/// recovery delay before resuming. The shutdown signal is observed at every
/// sleep point; an in-flight tick always runs to completion.
pub async fn run_monitor(monitor: Arc<dyn Monitor>, mut shutdown: watch::Receiver<bool>) {
    info!(
        "{} monitor started (interval {:?})",
        monitor.name(),
        monitor.interval()
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        let delay = match monitor.tick().await {
            Ok(()) => monitor.interval(),
            Err(e) => {
                error!(
                    "{} tick failed: {}; resuming in {:?}",
                    monitor.name(),
                    e,
                    monitor.recovery_delay()
                );
                monitor.recovery_delay()
            }
        };

        tokio::select! {
            _ = sleep(delay) => {}
            changed = shutdown.changed() => {
                // a dropped sender counts as shutdown
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("{} monitor stopped", monitor.name());
}

/// Supervises a set of monitor loops sharing one shutdown signal.
///
/// Stopping flips the signal and joins every loop rather than aborting it,
/// so partial writes from an interrupted tick cannot occur.
pub struct MonitorSet {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl MonitorSet {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// Spawn a monitor loop onto the runtime
    pub fn spawn(&mut self, monitor: Arc<dyn Monitor>) {
        let shutdown_rx = self.shutdown_tx.subscribe();
        self.handles
            .push(tokio::spawn(run_monitor(monitor, shutdown_rx)));
    }

    /// Number of supervised loops
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signal shutdown and wait for every loop to finish its current tick
    /// and exit
    pub async fn stop(self) {
        info!("stopping {} monitor loops", self.handles.len());
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

impl Default for MonitorSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingMonitor {
        ticks: AtomicU32,
        fail: bool,
    }

    impl CountingMonitor {
        fn new(fail: bool) -> Self {
            Self {
                ticks: AtomicU32::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl Monitor for CountingMonitor {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(10)
        }

        fn recovery_delay(&self) -> Duration {
            Duration::from_millis(50)
        }

        async fn tick(&self) -> Result<(), BoxError> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("tick failed".into())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_monitor_ticks_until_stopped() {
        let monitor = Arc::new(CountingMonitor::new(false));
        let mut set = MonitorSet::new();
        set.spawn(monitor.clone());
        assert_eq!(set.len(), 1);

        sleep(Duration::from_millis(100)).await;
        set.stop().await;

        let ticks = monitor.ticks.load(Ordering::SeqCst);
        assert!(ticks >= 2, "expected several ticks, got {}", ticks);
    }

    #[tokio::test]
    async fn test_failing_monitor_keeps_running_with_recovery_delay() {
        let monitor = Arc::new(CountingMonitor::new(true));
        let mut set = MonitorSet::new();
        set.spawn(monitor.clone());

        sleep(Duration::from_millis(120)).await;
        set.stop().await;

        // recovery delay (50ms) spaces failing ticks wider than the 10ms
        // interval would
        let ticks = monitor.ticks.load(Ordering::SeqCst);
        assert!(ticks >= 1, "failing monitor should keep ticking");
        assert!(ticks <= 5, "recovery delay not applied, got {} ticks", ticks);
    }

    #[tokio::test]
    async fn test_stop_wakes_sleeping_monitor() {
        struct SlowIntervalMonitor;

        #[async_trait]
        impl Monitor for SlowIntervalMonitor {
            fn name(&self) -> &'static str {
                "slow"
            }
            fn interval(&self) -> Duration {
                Duration::from_secs(3600)
            }
            fn recovery_delay(&self) -> Duration {
                Duration::from_secs(3600)
            }
            async fn tick(&self) -> Result<(), BoxError> {
                Ok(())
            }
        }

        let mut set = MonitorSet::new();
        set.spawn(Arc::new(SlowIntervalMonitor));

        // stop must return promptly even though the loop sleeps for an hour
        let stopped = tokio::time::timeout(Duration::from_secs(1), set.stop()).await;
        assert!(stopped.is_ok(), "stop() did not interrupt the sleep");
    }
}
