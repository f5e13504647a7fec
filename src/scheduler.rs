// src/scheduler.rs
//! Periodic trigger driver. Owns one tokio loop per registered job; cycles
//! run to completion inside their loop, so at most one execution per job
//! identity is ever in flight and stopping never interrupts a running cycle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::JobTiming;
use crate::error::CycleError;

/// A unit of schedulable work. `run_cycle` is one cycle; errors are logged
/// at this boundary and never stop future triggers.
#[async_trait::async_trait]
pub trait PollJob: Send + Sync {
    fn id(&self) -> &'static str;
    async fn run_cycle(&self) -> Result<(), CycleError>;
}

#[derive(Clone)]
struct Registered {
    job: Arc<dyn PollJob>,
    interval: Duration,
    misfire_grace: Duration,
    in_flight: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Default)]
struct Inner {
    jobs: Vec<Registered>,
    handles: Vec<JoinHandle<()>>,
    stop_tx: Option<watch::Sender<bool>>,
}

/// Owned scheduler instance with an explicit lifecycle: `register` jobs,
/// then `start` / `stop`. Both transitions are idempotent.
#[derive(Default)]
pub struct Scheduler {
    inner: Mutex<Inner>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job under its identity. Registering an identity that is
    /// already present is a no-op. Jobs registered while running are picked
    /// up on the next `start`.
    pub fn register(&self, job: Arc<dyn PollJob>, timing: JobTiming) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        if inner.jobs.iter().any(|r| r.job.id() == job.id()) {
            tracing::debug!(job = job.id(), "job already registered; ignoring");
            return;
        }
        inner.jobs.push(Registered {
            job,
            interval: Duration::from_secs(timing.interval_secs.max(1)),
            misfire_grace: Duration::from_secs(timing.misfire_grace_secs),
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
        });
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .lock()
            .expect("scheduler lock poisoned")
            .stop_tx
            .is_some()
    }

    /// Stopped → Running. Each registered job gets one immediate out-of-band
    /// execution, then its recurring interval. Calling `start` while already
    /// running is a no-op.
    pub fn start(&self) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        if inner.stop_tx.is_some() {
            tracing::debug!("scheduler already running");
            return;
        }
        let (tx, rx) = watch::channel(false);
        let handles = inner
            .jobs
            .iter()
            .cloned()
            .map(|reg| spawn_loop(reg, rx.clone()))
            .collect();
        inner.handles = handles;
        inner.stop_tx = Some(tx);
        tracing::info!(jobs = inner.jobs.len(), "scheduler started");
    }

    /// Running → Stopped. Prevents future triggers; an in-flight cycle runs
    /// to completion. Tolerates being called when already stopped.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        let Some(tx) = inner.stop_tx.take() else {
            tracing::debug!("scheduler already stopped");
            return;
        };
        let _ = tx.send(true);
        inner.handles.clear();
        tracing::info!("scheduler stopped");
    }

    /// Fire one out-of-band execution of `id` right now, subject to the same
    /// single-flight guard as scheduled ticks. Returns whether a cycle ran.
    pub async fn trigger(&self, id: &str) -> bool {
        let reg = {
            let inner = self.inner.lock().expect("scheduler lock poisoned");
            inner.jobs.iter().find(|r| r.job.id() == id).cloned()
        };
        match reg {
            Some(reg) => run_guarded(&reg).await,
            None => false,
        }
    }
}

/// Run one guarded cycle. A trigger arriving while the previous execution of
/// the same job is still in flight is dropped, never queued.
async fn run_guarded(reg: &Registered) -> bool {
    let Ok(_guard) = reg.in_flight.try_lock() else {
        tracing::debug!(job = reg.job.id(), "previous cycle still in flight; trigger dropped");
        return false;
    };
    if let Err(e) = reg.job.run_cycle().await {
        tracing::error!(error = %e, job = reg.job.id(), "cycle failed");
    }
    true
}

fn spawn_loop(reg: Registered, mut stop_rx: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_guarded(&reg).await;

        let mut next = Instant::now() + reg.interval;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(next) => {}
                res = stop_rx.changed() => {
                    // sender dropped counts as a stop
                    if res.is_err() || *stop_rx.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let now = Instant::now();
            let lateness = now.saturating_duration_since(next);
            // Re-anchor forward, coalescing any ticks missed while away.
            while next <= now {
                next += reg.interval;
            }
            if lateness > reg.misfire_grace {
                tracing::warn!(
                    job = reg.job.id(),
                    late_ms = lateness.as_millis() as u64,
                    "tick fired beyond misfire grace; skipped"
                );
                continue;
            }
            run_guarded(&reg).await;
        }
        tracing::debug!(job = reg.job.id(), "job loop exited");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: Arc<AtomicUsize>,
        cycle_len: Duration,
    }

    #[async_trait::async_trait]
    impl PollJob for CountingJob {
        fn id(&self) -> &'static str {
            "counting"
        }

        async fn run_cycle(&self) -> Result<(), CycleError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if !self.cycle_len.is_zero() {
                tokio::time::sleep(self.cycle_len).await;
            }
            Ok(())
        }
    }

    fn counting(cycle_len: Duration) -> (Arc<CountingJob>, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(CountingJob {
                runs: Arc::clone(&runs),
                cycle_len,
            }),
            runs,
        )
    }

    const TIMING: JobTiming = JobTiming {
        interval_secs: 10,
        misfire_grace_secs: 5,
    };

    #[tokio::test(start_paused = true)]
    async fn register_is_idempotent_per_id() {
        let sched = Scheduler::new();
        let (job, runs) = counting(Duration::ZERO);
        sched.register(Arc::clone(&job) as Arc<dyn PollJob>, TIMING);
        sched.register(job as Arc<dyn PollJob>, TIMING);

        sched.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        // one registration, one immediate run
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn start_runs_immediately_then_on_interval() {
        let sched = Scheduler::new();
        let (job, runs) = counting(Duration::ZERO);
        sched.register(job, TIMING);

        sched.start();
        sched.start(); // idempotent

        tokio::time::sleep(Duration::from_secs(25)).await;
        // immediate run + ticks at t=10 and t=20
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_future_triggers_and_is_idempotent() {
        let sched = Scheduler::new();
        let (job, runs) = counting(Duration::ZERO);
        sched.register(job, TIMING);

        sched.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(sched.is_running());

        sched.stop();
        sched.stop();
        assert!(!sched.is_running());

        let before = runs.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_is_single_flight() {
        let sched = Arc::new(Scheduler::new());
        let (job, runs) = counting(Duration::from_secs(5));
        sched.register(job, TIMING);

        let first = {
            let sched = Arc::clone(&sched);
            tokio::spawn(async move { sched.trigger("counting").await })
        };
        // let the first trigger take the in-flight guard
        tokio::task::yield_now().await;

        assert!(!sched.trigger("counting").await);
        assert!(first.await.unwrap());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overlong_cycles_skip_ticks_instead_of_stacking() {
        let sched = Scheduler::new();
        // cycle takes 3 intervals; grace is shorter than the overrun
        let (job, runs) = counting(Duration::from_secs(30));
        sched.register(
            job,
            JobTiming {
                interval_secs: 10,
                misfire_grace_secs: 2,
            },
        );

        sched.start();
        // immediate run spans t=0..30; the schedule re-anchors after it, so
        // the second run lands at t=40 and nothing stacks up in between
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_unknown_id_is_a_noop() {
        let sched = Scheduler::new();
        assert!(!sched.trigger("nope").await);
    }
}
