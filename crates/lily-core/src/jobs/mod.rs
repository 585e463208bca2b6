//! Periodic background work: the reconciliation sweep and the daily reminder.
//!
//! Jobs are host-agnostic. A host either drives them itself or hands them to
//! [`JobScheduler`], which runs each one on its own interval until shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{Error, Result};
use crate::remote::RemoteService;
use crate::sync::{SweepOutcome, SyncEngine};

/// A unit of periodic work
pub trait BackgroundJob: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Exponential backoff between attempts of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(30),
            multiplier: 2,
            max_backoff: Duration::from_secs(30 * 60),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug)]
pub enum JobOutcome {
    Succeeded { attempts: u32 },
    Failed { attempts: u32, last_error: Error },
}

impl JobOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Run a job until it succeeds, the policy is exhausted, or a fatal error occurs.
pub async fn run_with_retry<J: BackgroundJob + ?Sized>(
    job: &J,
    policy: &RetryPolicy,
) -> JobOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match job.run().await {
            Ok(()) => return JobOutcome::Succeeded { attempts: attempt },
            Err(error) if error.is_fatal() || attempt >= max_attempts => {
                return JobOutcome::Failed {
                    attempts: attempt,
                    last_error: error,
                };
            }
            Err(error) => {
                let delay = policy.backoff_for(attempt);
                tracing::warn!(
                    "Job '{}' attempt {attempt} failed: {error}; retrying in {}s",
                    job.name(),
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Retries every pending record
pub struct SyncPendingJob<R> {
    engine: Arc<SyncEngine<R>>,
}

impl<R> SyncPendingJob<R> {
    pub const fn new(engine: Arc<SyncEngine<R>>) -> Self {
        Self { engine }
    }
}

impl<R: RemoteService> BackgroundJob for SyncPendingJob<R> {
    fn name(&self) -> &'static str {
        "sync-pending"
    }

    async fn run(&self) -> Result<()> {
        if self.engine.sync_pending().await? == SweepOutcome::Skipped {
            tracing::debug!("Sync job coalesced into a running sweep");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderReason {
    /// The server says today's expenses are not submitted yet
    NotSubmitted,
    /// Today's status could not be read
    StatusUnknown,
}

/// Something that can put the daily reminder in front of the user
pub trait ReminderNotifier: Send + Sync {
    fn notify(&self, reason: ReminderReason);
}

pub const REMINDER_TITLE: &str = "Lily";
pub const REMINDER_BODY: &str = "Don't forget to log your expenses today";

/// Reminds the user to submit the day's expenses
pub struct ReminderJob<R, N> {
    engine: Arc<SyncEngine<R>>,
    notifier: N,
}

impl<R, N> ReminderJob<R, N> {
    pub const fn new(engine: Arc<SyncEngine<R>>, notifier: N) -> Self {
        Self { engine, notifier }
    }

    pub const fn notifier(&self) -> &N {
        &self.notifier
    }
}

impl<R: RemoteService, N: ReminderNotifier> BackgroundJob for ReminderJob<R, N> {
    fn name(&self) -> &'static str {
        "daily-reminder"
    }

    async fn run(&self) -> Result<()> {
        match self.engine.daily_status().await {
            Ok(status) if status.submitted => {
                tracing::debug!("Expenses for {} already submitted", status.date);
                Ok(())
            }
            Ok(_) => {
                self.notifier.notify(ReminderReason::NotSubmitted);
                Ok(())
            }
            Err(error) => {
                self.notifier.notify(ReminderReason::StatusUnknown);
                Err(error)
            }
        }
    }
}

/// Runs jobs on fixed intervals until shut down
pub struct JobScheduler {
    policy: RetryPolicy,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new(policy: RetryPolicy) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            policy,
            shutdown,
            handles: Vec::new(),
        }
    }

    /// Start running `job` every `every`; the first run happens immediately.
    pub fn schedule<J: BackgroundJob + 'static>(&mut self, job: J, every: Duration) {
        let policy = self.policy.clone();
        let mut shutdown = self.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!("Scheduled job '{}' every {}s", job.name(), every.as_secs());

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {}
                }

                tokio::select! {
                    _ = shutdown.changed() => break,
                    outcome = run_with_retry(&job, &policy) => match outcome {
                        JobOutcome::Succeeded { attempts } => {
                            tracing::debug!(
                                "Job '{}' succeeded after {attempts} attempt(s)",
                                job.name()
                            );
                        }
                        JobOutcome::Failed { attempts, last_error } => {
                            tracing::warn!(
                                "Job '{}' failed after {attempts} attempt(s): {last_error}",
                                job.name()
                            );
                        }
                    },
                }
            }
            tracing::debug!("Job '{}' stopped", job.name());
        });
        self.handles.push(handle);
    }

    pub fn job_count(&self) -> usize {
        self.handles.len()
    }

    /// Signal every job to stop and wait for them to finish
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        for handle in self.handles {
            if let Err(error) = handle.await {
                tracing::warn!("Background job task ended abnormally: {error}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Category, NewExpense};
    use crate::remote::fake::FakeRemote;
    use crate::services::DatabaseService;

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            multiplier: 2,
            max_backoff: Duration::from_millis(5),
        }
    }

    struct FlakyJob {
        failures_left: AtomicU32,
        runs: AtomicU32,
        fatal: bool,
    }

    impl FlakyJob {
        fn failing(times: u32) -> Self {
            Self {
                failures_left: AtomicU32::new(times),
                runs: AtomicU32::new(0),
                fatal: false,
            }
        }
    }

    impl BackgroundJob for FlakyJob {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn run(&self) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left == 0 {
                return Ok(());
            }
            self.failures_left.store(left - 1, Ordering::SeqCst);
            if self.fatal {
                Err(Error::LocalStorage("disk full".into()))
            } else {
                Err(Error::RemoteUnavailable("offline".into()))
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        reasons: Mutex<Vec<ReminderReason>>,
    }

    impl ReminderNotifier for RecordingNotifier {
        fn notify(&self, reason: ReminderReason) {
            self.reasons.lock().unwrap().push(reason);
        }
    }

    async fn engine(remote: FakeRemote) -> Arc<SyncEngine<FakeRemote>> {
        let db = DatabaseService::open_in_memory().await.unwrap();
        Arc::new(SyncEngine::new(db, remote))
    }

    #[test]
    fn default_backoff_doubles_from_thirty_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_secs(30));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(60));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(120));
        assert_eq!(policy.backoff_for(40), policy.max_backoff);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn retry_recovers_from_transient_failures() {
        let job = FlakyJob::failing(2);
        let outcome = run_with_retry(&job, &quick_policy()).await;

        assert!(matches!(outcome, JobOutcome::Succeeded { attempts: 3 }));
        assert_eq!(job.runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn retry_gives_up_after_max_attempts() {
        let job = FlakyJob::failing(10);
        let outcome = run_with_retry(&job, &quick_policy()).await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed {
                attempts: 3,
                last_error: Error::RemoteUnavailable(_)
            }
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fatal_error_is_not_retried() {
        let job = FlakyJob {
            fatal: true,
            ..FlakyJob::failing(5)
        };
        let outcome = run_with_retry(&job, &quick_policy()).await;

        assert!(matches!(outcome, JobOutcome::Failed { attempts: 1, .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_job_reconciles_pending_records() {
        let engine = engine(FakeRemote::offline()).await;
        engine
            .create_expense(NewExpense::new(
                "42.50".parse().unwrap(),
                Category::Food,
                None,
                "2024-03-01".parse().unwrap(),
            ))
            .await
            .unwrap();

        engine.remote().set_offline(false);
        let job = SyncPendingJob::new(Arc::clone(&engine));
        assert!(run_with_retry(&job, &quick_policy()).await.is_success());
        assert!(engine.pending_expenses().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reminder_fires_only_when_not_submitted() {
        let engine = engine(FakeRemote::online()).await;
        let job = ReminderJob::new(Arc::clone(&engine), RecordingNotifier::default());

        job.run().await.unwrap();
        engine.remote().set_submitted(true);
        job.run().await.unwrap();

        assert_eq!(
            *job.notifier().reasons.lock().unwrap(),
            vec![ReminderReason::NotSubmitted]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reminder_notifies_and_fails_when_status_unknown() {
        let engine = engine(FakeRemote::offline()).await;
        let job = ReminderJob::new(engine, RecordingNotifier::default());

        let error = job.run().await.unwrap_err();

        assert!(matches!(error, Error::RemoteUnavailable(_)));
        assert_eq!(
            *job.notifier().reasons.lock().unwrap(),
            vec![ReminderReason::StatusUnknown]
        );
    }

    struct CountingJob(Arc<AtomicU32>);

    impl BackgroundJob for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn run(&self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn scheduler_runs_jobs_until_shutdown() {
        let runs = Arc::new(AtomicU32::new(0));
        let mut scheduler = JobScheduler::new(quick_policy());
        scheduler.schedule(CountingJob(Arc::clone(&runs)), Duration::from_millis(10));
        assert_eq!(scheduler.job_count(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.shutdown().await;

        let after_shutdown = runs.load(Ordering::SeqCst);
        assert!(after_shutdown >= 2, "expected repeated runs, got {after_shutdown}");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_shutdown);
    }
}
