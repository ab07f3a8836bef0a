//! Test case execution
//!
//! Each case runs through `prepare → test → cleanup → compare`. The phases
//! of one case are strictly ordered: the test call is never issued when
//! prepare failed, and cleanup is attempted whenever prepare was. The first
//! failure decides the outcome's phase.
//!
//! Transport failures are recorded in the case's [`Outcome`]. Only errors
//! that break the runner's own contract abort the run (see
//! [`crate::common::Error::is_fatal`]).

use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use super::outcome::{Outcome, Phase};
use super::report::{Reporter, Tally};
use crate::cases::{CaseEntry, TestCase};
use crate::common::config::RunConfig;
use crate::common::Result;
use crate::compare::{CompareMode, Comparator};
use crate::http::Transport;

/// Reason recorded for cases not run because the run was cancelled
pub const CANCELLED: &str = "run cancelled";

/// Reason recorded for cases marked `ignore`
pub const IGNORED: &str = "ignored";

/// A phase that failed, with its diagnostic
#[derive(Debug)]
struct Failure {
    phase: Phase,
    message: String,
}

/// Runs test cases against a transport
pub struct CaseRunner<T: Transport> {
    transport: T,
    comparator: Comparator,
    retries: u32,
    max_parallel: usize,
}

impl<T: Transport> CaseRunner<T> {
    /// Sequential runner without retries
    pub fn new(transport: T, mode: CompareMode) -> Self {
        Self {
            transport,
            comparator: Comparator::new(mode),
            retries: 0,
            max_parallel: 1,
        }
    }

    pub fn from_config(transport: T, run: &RunConfig) -> Self {
        Self::new(transport, run.compare_mode)
            .with_retries(run.retries)
            .with_max_parallel(run.max_parallel)
    }

    /// Extra attempts for each call failing at the transport level
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Upper bound on isolated cases running at the same time
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one case through all of its phases
    ///
    /// Returns `Err` only for fatal errors; every other failure is part of
    /// the returned [`Outcome`].
    pub async fn run_case(&self, case: &TestCase) -> Result<Outcome> {
        let started = Instant::now();
        tracing::info!(case = %case.name, "test entry");

        let prepared = match case.prepare() {
            Some(query) => self.call(case, Phase::Prepare, query).await?.map(|_| ()),
            None => Ok(()),
        };

        let tested = match prepared {
            Ok(()) => self.call(case, Phase::Test, &case.input).await?,
            Err(failure) => Err(failure),
        };

        let cleanup_failure = match case.cleanup() {
            Some(query) => self.call(case, Phase::Cleanup, query).await?.err(),
            None => None,
        };
        if let Some(failure) = &cleanup_failure {
            tracing::warn!(case = %case.name, error = %failure.message, "Cleanup failed");
        }

        let outcome = self.judge(case, tested, cleanup_failure, started.elapsed());

        tracing::info!(
            case = %case.name,
            passed = outcome.passed,
            phase = ?outcome.phase_failed,
            duration_ms = outcome.duration.as_millis() as u64,
            "test exit"
        );

        Ok(outcome)
    }

    /// Decide the outcome once all calls are done
    fn judge(
        &self,
        case: &TestCase,
        tested: std::result::Result<String, Failure>,
        cleanup_failure: Option<Failure>,
        duration: Duration,
    ) -> Outcome {
        let response = match tested {
            Ok(response) => response,
            Err(failure) => {
                let mut diagnostic = failure.message;
                if let Some(cleanup) = cleanup_failure {
                    diagnostic.push_str(&format!("\ncleanup also failed: {}", cleanup.message));
                }
                return Outcome::fail(&case.name, failure.phase, diagnostic, None, duration);
            }
        };

        match self.comparator.equivalent(&case.expected_output, &response) {
            Ok(()) => match cleanup_failure {
                None => Outcome::pass(&case.name, response, duration),
                Some(cleanup) => Outcome::fail(
                    &case.name,
                    Phase::Cleanup,
                    cleanup.message,
                    Some(response),
                    duration,
                ),
            },
            Err(report) => {
                let mut diagnostic = report.to_string();
                if let Some(cleanup) = cleanup_failure {
                    diagnostic.push_str(&format!("\ncleanup also failed: {}", cleanup.message));
                }
                Outcome::fail(
                    &case.name,
                    Phase::Comparison,
                    diagnostic,
                    Some(response),
                    duration,
                )
            }
        }
    }

    /// Issue one call, retrying transport failures when configured
    async fn call(
        &self,
        case: &TestCase,
        phase: Phase,
        query: &str,
    ) -> Result<std::result::Result<String, Failure>> {
        let mut attempt = 0;
        loop {
            let result = self
                .transport
                .send(query, case.variables.as_ref(), &case.http_headers)
                .await;

            match result {
                Ok(body) => return Ok(Ok(body)),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) if e.is_transport() && attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!(
                        case = %case.name,
                        %phase,
                        attempt,
                        error = %e,
                        "Retrying request"
                    );
                }
                Err(e) => {
                    tracing::debug!(case = %case.name, %phase, error = %e, "Call failed");
                    return Ok(Err(Failure {
                        phase,
                        message: e.to_string(),
                    }));
                }
            }
        }
    }

    /// Run all entries in order and record their outcomes
    ///
    /// Invalid entries are recorded as load failures and ignored cases as
    /// skipped. With `max_parallel > 1`, consecutive isolated cases run
    /// concurrently; any other case runs alone. Once `cancel` fires, the case
    /// in flight is dropped and every remaining case is recorded as skipped.
    pub async fn run_all(
        &self,
        entries: Vec<CaseEntry>,
        reporter: &mut Reporter,
        cancel: &CancellationToken,
    ) -> Result<Tally> {
        let mut pending = entries.into_iter().peekable();

        while let Some(entry) = pending.next() {
            if cancel.is_cancelled() {
                reporter.record(Outcome::skipped(entry.name(), CANCELLED))?;
                continue;
            }

            let case = match entry {
                CaseEntry::Invalid { name, error, .. } => {
                    tracing::warn!(case = %name, error = %error, "Skipping invalid test case");
                    reporter.record(Outcome::fail(
                        name,
                        Phase::Load,
                        error.to_string(),
                        None,
                        Duration::ZERO,
                    ))?;
                    continue;
                }
                CaseEntry::Ready(case) if case.ignore => {
                    reporter.record(Outcome::skipped(case.name, IGNORED))?;
                    continue;
                }
                CaseEntry::Ready(case) => case,
            };

            if case.isolated && self.max_parallel > 1 {
                let mut batch = vec![case];
                while let Some(next) = pending.next_if(is_runnable_isolated) {
                    if let CaseEntry::Ready(next) = next {
                        batch.push(next);
                    }
                }
                self.run_batch(&batch, reporter, cancel).await?;
                continue;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(case = %case.name, "Run cancelled");
                    reporter.record(Outcome::skipped(&case.name, CANCELLED))?;
                }
                outcome = self.run_case(&case) => reporter.record(outcome?)?,
            }
        }

        reporter.finish()
    }

    /// Run isolated cases concurrently, recording outcomes in submission order
    ///
    /// Cases finishing out of order wait in their slot. On cancellation every
    /// finished case keeps its outcome and the rest are recorded as skipped.
    async fn run_batch(
        &self,
        batch: &[TestCase],
        reporter: &mut Reporter,
        cancel: &CancellationToken,
    ) -> Result<()> {
        tracing::debug!(size = batch.len(), "Running isolated cases concurrently");

        let mut slots: Vec<Option<Outcome>> = batch.iter().map(|_| None).collect();
        {
            let mut outcomes = std::pin::pin!(stream::iter(batch.iter().enumerate())
                .map(|(index, case)| async move { (index, self.run_case(case).await) })
                .buffer_unordered(self.max_parallel));

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::warn!("Run cancelled");
                        break;
                    }
                    next = outcomes.next() => match next {
                        Some((index, outcome)) => slots[index] = Some(outcome?),
                        None => break,
                    },
                }
            }
        }

        for (case, slot) in batch.iter().zip(slots) {
            match slot {
                Some(outcome) => reporter.record(outcome)?,
                None => reporter.record(Outcome::skipped(&case.name, CANCELLED))?,
            }
        }
        Ok(())
    }
}

fn is_runnable_isolated(entry: &CaseEntry) -> bool {
    matches!(entry, CaseEntry::Ready(case) if case.isolated && !case.ignore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::DEFAULT_PRIORITY;
    use crate::common::Error;
    use crate::http::{Headers, Variables};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const PREPARE: &str = "mutation { createHero }";
    const INPUT: &str = "{ hero { realName } }";
    const CLEANUP: &str = "mutation { removeHero }";
    const TONY: &str = r#"{"data":{"hero":{"realName":"Tony Stark"}}}"#;
    const BRUCE: &str = r#"{"data":{"hero":{"realName":"Bruce Banner"}}}"#;

    #[derive(Clone)]
    enum Reply {
        Body(&'static str),
        Delayed(u64, &'static str),
        Status(u16),
        Refused,
        Hang,
        Fatal,
    }

    #[derive(Debug, Clone)]
    struct Call {
        query: String,
        variables: Option<Variables>,
    }

    /// In-memory transport answering each query from a script
    #[derive(Default)]
    struct Scripted {
        script: Mutex<HashMap<String, VecDeque<Reply>>>,
        calls: Mutex<Vec<Call>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Scripted {
        /// Queue a reply for a query; the last queued reply repeats
        fn on(self, query: &str, reply: Reply) -> Self {
            self.script
                .lock()
                .unwrap()
                .entry(query.to_string())
                .or_default()
                .push_back(reply);
            self
        }

        fn queries(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.query.clone())
                .collect()
        }

        fn next_reply(&self, query: &str) -> Reply {
            let mut script = self.script.lock().unwrap();
            let queue = script.get_mut(query).expect("unscripted query");
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(
            &self,
            query: &str,
            variables: Option<&Variables>,
            _headers: &Headers,
        ) -> Result<String> {
            self.calls.lock().unwrap().push(Call {
                query: query.to_string(),
                variables: variables.cloned(),
            });
            let reply = self.next_reply(query);

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let result = match reply {
                Reply::Body(body) => Ok(body.to_string()),
                Reply::Delayed(ms, body) => {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(body.to_string())
                }
                Reply::Status(status) => Err(Error::status(status, "Internal Server Error")),
                Reply::Refused => Err(Error::connection("http://stub", "connection refused")),
                Reply::Hang => std::future::pending().await,
                Reply::Fatal => Err(Error::Encode("query must not be blank".to_string())),
            };
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn case(name: &str) -> TestCase {
        TestCase {
            name: name.to_string(),
            description: None,
            prepare: None,
            input: INPUT.to_string(),
            variables: None,
            http_headers: Headers::new(),
            cleanup: None,
            expected_output: serde_json::from_str(TONY).unwrap(),
            ignore: false,
            priority: DEFAULT_PRIORITY,
            isolated: false,
            source: PathBuf::from("memory"),
        }
    }

    fn full_case(name: &str) -> TestCase {
        TestCase {
            prepare: Some(PREPARE.to_string()),
            cleanup: Some(CLEANUP.to_string()),
            ..case(name)
        }
    }

    fn runner(transport: Scripted) -> CaseRunner<Arc<Scripted>> {
        CaseRunner::new(Arc::new(transport), CompareMode::Lenient)
    }

    #[tokio::test]
    async fn test_phases_run_in_order() {
        let runner = runner(
            Scripted::default()
                .on(PREPARE, Reply::Body("{}"))
                .on(INPUT, Reply::Body(TONY))
                .on(CLEANUP, Reply::Body("{}")),
        );
        let mut case = full_case("findHero");
        case.variables = Some(json!({"name": "Iron Man"}).as_object().unwrap().clone());

        let outcome = runner.run_case(&case).await.unwrap();

        assert!(outcome.passed, "{:?}", outcome.diagnostic);
        assert_eq!(outcome.response.as_deref(), Some(TONY));
        assert_eq!(runner.transport().queries(), [PREPARE, INPUT, CLEANUP]);
        let calls = runner.transport().calls.lock().unwrap().clone();
        assert!(calls.iter().all(|c| c.variables == case.variables));
    }

    #[tokio::test]
    async fn test_prepare_failure_skips_test_call() {
        let runner = runner(
            Scripted::default()
                .on(PREPARE, Reply::Status(500))
                .on(INPUT, Reply::Body(TONY))
                .on(CLEANUP, Reply::Body("{}")),
        );

        let outcome = runner.run_case(&full_case("createHero")).await.unwrap();

        assert!(!outcome.passed);
        assert_eq!(outcome.phase_failed, Some(Phase::Prepare));
        assert_eq!(
            outcome.diagnostic.as_deref(),
            Some("Status 500 - Internal Server Error")
        );
        assert_eq!(runner.transport().queries(), [PREPARE, CLEANUP]);
    }

    #[tokio::test]
    async fn test_mismatch_still_runs_cleanup() {
        let runner = runner(
            Scripted::default()
                .on(PREPARE, Reply::Body("{}"))
                .on(INPUT, Reply::Body(BRUCE))
                .on(CLEANUP, Reply::Body("{}")),
        );

        let outcome = runner.run_case(&full_case("findHero")).await.unwrap();

        assert_eq!(outcome.phase_failed, Some(Phase::Comparison));
        assert!(outcome
            .diagnostic
            .as_deref()
            .unwrap()
            .contains("data.hero.realName"));
        assert_eq!(outcome.response.as_deref(), Some(BRUCE));
        assert_eq!(runner.transport().queries(), [PREPARE, INPUT, CLEANUP]);
    }

    #[tokio::test]
    async fn test_test_call_failure_still_runs_cleanup() {
        let runner = runner(
            Scripted::default()
                .on(PREPARE, Reply::Body("{}"))
                .on(INPUT, Reply::Refused)
                .on(CLEANUP, Reply::Body("{}")),
        );

        let outcome = runner.run_case(&full_case("findHero")).await.unwrap();

        assert_eq!(outcome.phase_failed, Some(Phase::Test));
        assert!(outcome.response.is_none());
        assert_eq!(runner.transport().queries(), [PREPARE, INPUT, CLEANUP]);
    }

    #[tokio::test]
    async fn test_cleanup_failure_after_match() {
        let runner = runner(
            Scripted::default()
                .on(PREPARE, Reply::Body("{}"))
                .on(INPUT, Reply::Body(TONY))
                .on(CLEANUP, Reply::Status(503)),
        );

        let outcome = runner.run_case(&full_case("findHero")).await.unwrap();

        assert_eq!(outcome.phase_failed, Some(Phase::Cleanup));
        assert!(outcome.diagnostic.as_deref().unwrap().starts_with("Status 503"));
    }

    #[tokio::test]
    async fn test_mismatch_wins_over_cleanup_failure() {
        let runner = runner(
            Scripted::default()
                .on(PREPARE, Reply::Body("{}"))
                .on(INPUT, Reply::Body(BRUCE))
                .on(CLEANUP, Reply::Refused),
        );

        let outcome = runner.run_case(&full_case("findHero")).await.unwrap();

        assert_eq!(outcome.phase_failed, Some(Phase::Comparison));
        let diagnostic = outcome.diagnostic.unwrap();
        assert!(diagnostic.contains("data.hero.realName"));
        assert!(diagnostic.contains("cleanup also failed"));
    }

    #[tokio::test]
    async fn test_prepare_failure_wins_over_cleanup_failure() {
        let runner = runner(
            Scripted::default()
                .on(PREPARE, Reply::Status(500))
                .on(INPUT, Reply::Body(TONY))
                .on(CLEANUP, Reply::Refused),
        );

        let outcome = runner.run_case(&full_case("createHero")).await.unwrap();

        assert_eq!(outcome.phase_failed, Some(Phase::Prepare));
        let diagnostic = outcome.diagnostic.unwrap();
        assert!(diagnostic.starts_with("Status 500"), "{}", diagnostic);
        assert!(diagnostic.contains("cleanup also failed"));
        assert!(outcome.response.is_none());
        assert_eq!(runner.transport().queries(), [PREPARE, CLEANUP]);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let runner = runner(
            Scripted::default()
                .on(INPUT, Reply::Refused)
                .on(INPUT, Reply::Body(TONY)),
        );

        let outcome = runner.run_case(&case("findHero")).await.unwrap();

        assert_eq!(outcome.phase_failed, Some(Phase::Test));
        assert_eq!(runner.transport().queries().len(), 1);
    }

    #[tokio::test]
    async fn test_retries_transport_failures() {
        let transport = Scripted::default()
            .on(INPUT, Reply::Refused)
            .on(INPUT, Reply::Status(502))
            .on(INPUT, Reply::Body(TONY));
        let runner = runner(transport).with_retries(2);

        let outcome = runner.run_case(&case("findHero")).await.unwrap();

        assert!(outcome.passed);
        assert_eq!(runner.transport().queries().len(), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_aborts() {
        let runner = runner(Scripted::default().on(INPUT, Reply::Fatal)).with_retries(3);

        let result = runner.run_case(&case("findHero")).await;

        assert!(matches!(result, Err(Error::Encode(_))));
        assert_eq!(runner.transport().queries().len(), 1);
    }

    #[tokio::test]
    async fn test_run_all_records_every_entry() {
        let runner = runner(Scripted::default().on(INPUT, Reply::Body(TONY)));
        let mut ignored = case("ignored");
        ignored.ignore = true;
        let entries = vec![
            CaseEntry::Ready(case("a")),
            CaseEntry::Invalid {
                name: "broken".to_string(),
                source: PathBuf::from("broken"),
                error: Error::load("broken", "missing required field 'input'"),
            },
            CaseEntry::Ready(ignored),
        ];

        let mut reporter = Reporter::new();
        let tally = runner
            .run_all(entries, &mut reporter, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(tally.total, 3);
        assert_eq!(tally.passed, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.skipped, 1);
        let outcomes = reporter.outcomes();
        assert_eq!(outcomes[1].phase_failed, Some(Phase::Load));
        assert_eq!(outcomes[2].diagnostic.as_deref(), Some(IGNORED));
        assert_eq!(runner.transport().queries().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_runs_give_identical_tallies() {
        let other = "{ heroes { name } }";
        let runner = runner(
            Scripted::default()
                .on(INPUT, Reply::Body(TONY))
                .on(other, Reply::Body(BRUCE)),
        );
        let entries = || {
            let mut failing = case("b");
            failing.input = other.to_string();
            vec![CaseEntry::Ready(case("a")), CaseEntry::Ready(failing)]
        };

        let first = runner
            .run_all(entries(), &mut Reporter::new(), &CancellationToken::new())
            .await
            .unwrap();
        let second = runner
            .run_all(entries(), &mut Reporter::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.failed, 1);
    }

    #[tokio::test]
    async fn test_cancellation_skips_remaining_cases() {
        let hanging = "{ slow }";
        let runner = runner(
            Scripted::default()
                .on(INPUT, Reply::Body(TONY))
                .on(hanging, Reply::Hang)
                .on(CLEANUP, Reply::Body("{}")),
        );
        let mut slow = case("b");
        slow.input = hanging.to_string();
        slow.cleanup = Some(CLEANUP.to_string());
        let entries = vec![
            CaseEntry::Ready(case("a")),
            CaseEntry::Ready(slow),
            CaseEntry::Ready(case("c")),
        ];

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let mut reporter = Reporter::new();
        let tally = runner.run_all(entries, &mut reporter, &cancel).await.unwrap();

        assert_eq!(tally.passed, 1);
        assert_eq!(tally.skipped, 2);
        let outcomes = reporter.outcomes();
        assert!(outcomes[0].passed);
        assert_eq!(outcomes[1].diagnostic.as_deref(), Some(CANCELLED));
        assert_eq!(outcomes[2].diagnostic.as_deref(), Some(CANCELLED));
        assert_eq!(runner.transport().queries(), [INPUT, hanging]);
    }

    #[tokio::test]
    async fn test_cancellation_keeps_finished_isolated_cases() {
        let hanging = "{ slow }";
        let runner = runner(
            Scripted::default()
                .on(hanging, Reply::Hang)
                .on(INPUT, Reply::Body(TONY))
                .on(CLEANUP, Reply::Body("{}")),
        )
        .with_max_parallel(4);

        let mut slow = case("a");
        slow.input = hanging.to_string();
        slow.isolated = true;
        let mut fast = case("b");
        fast.cleanup = Some(CLEANUP.to_string());
        fast.isolated = true;
        let entries = vec![CaseEntry::Ready(slow), CaseEntry::Ready(fast)];

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let mut reporter = Reporter::new();
        let tally = runner.run_all(entries, &mut reporter, &cancel).await.unwrap();

        let outcomes = reporter.outcomes();
        assert_eq!(outcomes[0].name, "a");
        assert_eq!(outcomes[0].diagnostic.as_deref(), Some(CANCELLED));
        assert_eq!(outcomes[1].name, "b");
        assert!(outcomes[1].passed, "{:?}", outcomes[1].diagnostic);
        assert_eq!(tally.passed, 1);
        assert_eq!(tally.skipped, 1);
        let queries = runner.transport().queries();
        assert!(queries.contains(&CLEANUP.to_string()));
    }

    #[tokio::test]
    async fn test_isolated_cases_run_concurrently_in_order() {
        let slow = "{ slow }";
        let runner = runner(
            Scripted::default()
                .on(slow, Reply::Delayed(80, TONY))
                .on(INPUT, Reply::Delayed(10, BRUCE)),
        )
        .with_max_parallel(4);

        let isolated = |name: &str, input: &str| {
            let mut case = case(name);
            case.input = input.to_string();
            case.isolated = true;
            CaseEntry::Ready(case)
        };
        let entries = vec![
            isolated("a", slow),
            isolated("b", INPUT),
            isolated("c", INPUT),
            CaseEntry::Ready(case("barrier")),
        ];

        let mut reporter = Reporter::new();
        runner
            .run_all(entries, &mut reporter, &CancellationToken::new())
            .await
            .unwrap();

        let names: Vec<_> = reporter.outcomes().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "barrier"]);
        assert!(reporter.outcomes()[0].passed);
        assert!(!reporter.outcomes()[1].passed);
        assert!(runner.transport().peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_sequential_by_default() {
        let runner = runner(Scripted::default().on(INPUT, Reply::Delayed(5, TONY)));
        let entries = (0..3)
            .map(|i| {
                let mut case = case(&format!("case{}", i));
                case.isolated = true;
                CaseEntry::Ready(case)
            })
            .collect();

        runner
            .run_all(entries, &mut Reporter::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(runner.transport().peak.load(Ordering::SeqCst), 1);
    }
}
