// Task Supervisor
// Owns one unit of external work: launch, bounded readiness polling, output capture
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use super::polling::PollPolicy;
use crate::domain::{TaskOutput, TaskState, Work, SENTINEL_STATUS};
use crate::error::Result;
use crate::port::{EventDispatcher, NoopDispatcher, PollOutcome, Pollable, SpawnError, WorkLauncher};

/// What one poll attempt achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// Task is not running (any more)
    Done,
    /// Output was captured; the task is still running
    Progress,
    /// Nothing happened within the bound
    Pending,
}

/// Supervises one unit of work at a time
///
/// `ready()` never blocks past its timeout; `stop()` / `result()` are the only blocking calls.
/// The captured buffer is owned by the supervisor and only grows while polling.
///
/// Draining protocol: a `ready()` call that captures a chunk of output returns `false` even
/// when that chunk was the last one. End of output is only observed by a later call, so a
/// task that writes N chunks needs at least N + 1 `ready()` calls to report completion.
///
/// # Example
/// ```ignore
/// let mut task = TaskSupervisor::new(Arc::new(SystemLauncher::new()));
/// let _ = task.start(Work::command("zenity --question"));
/// while !task.ready(Duration::from_millis(50)) {
///     redraw();
/// }
/// let answer = task.result();
/// ```
pub struct TaskSupervisor {
    launcher: Arc<dyn WorkLauncher>,
    dispatcher: Arc<dyn EventDispatcher>,
    policy: PollPolicy,
    verbose: bool,
    state: TaskState,
    unit: Option<Box<dyn Pollable>>,
    captured: Vec<u8>,
    status: i32,
    label: String,
}

impl TaskSupervisor {
    /// Create an idle supervisor
    ///
    /// # Arguments
    /// * `launcher` - Platform adapter that turns Work into a Pollable
    pub fn new(launcher: Arc<dyn WorkLauncher>) -> Self {
        Self {
            launcher,
            dispatcher: Arc::new(NoopDispatcher),
            policy: PollPolicy::default(),
            verbose: false,
            state: TaskState::Idle,
            unit: None,
            captured: Vec::new(),
            status: SENTINEL_STATUS,
            label: String::new(),
        }
    }

    /// Event dispatcher pumped between attempts of blocking waits
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Log launched work at info level instead of debug
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Bytes captured so far (grows while polling)
    pub fn captured(&self) -> &[u8] {
        &self.captured
    }

    /// Status code, once finished
    pub fn status(&self) -> Option<i32> {
        (self.state == TaskState::Finished).then_some(self.status)
    }

    /// Begin executing `work`
    ///
    /// A previous run that is still going is force-completed first (blocking, like `stop()`),
    /// so its output never mixes into the new run.
    ///
    /// # Errors
    /// SpawnError if the work could not be launched. The task is then already finished with
    /// empty output and the sentinel status, so callers that ignore the error still observe
    /// immediate completion through `ready()` / `result()`.
    pub fn start(&mut self, work: Work) -> std::result::Result<(), SpawnError> {
        if self.state == TaskState::Running {
            debug!(work = %self.label, "Force-completing previous run before restart");
            self.stop();
        }

        self.captured.clear();
        self.status = SENTINEL_STATUS;
        self.label = work.describe().to_string();

        if self.verbose {
            info!(work = %self.label, "Launching work");
        } else {
            debug!(work = %self.label, "Launching work");
        }

        match self.launcher.launch(work) {
            Ok(unit) => {
                debug!(work = %self.label, pid = ?unit.pid(), "Work running");
                self.unit = Some(unit);
                self.state = TaskState::Running;
                Ok(())
            }
            Err(e) => {
                warn!(
                    work = %self.label,
                    error = %e,
                    "Launch failed, task completes with sentinel status"
                );
                self.unit = None;
                self.state = TaskState::Finished;
                Err(e)
            }
        }
    }

    /// Launch `work` and block until it finishes, surfacing launch failure as an error
    pub fn run(&mut self, work: Work) -> Result<TaskOutput> {
        self.start(work)?;
        Ok(self.result())
    }

    /// Bounded readiness check
    ///
    /// Returns `true` at once unless the task is running. Otherwise makes exactly one attempt
    /// lasting at most `timeout`; see the draining protocol on [`TaskSupervisor`].
    pub fn ready(&mut self, timeout: Duration) -> bool {
        self.attempt(timeout) == Attempt::Done
    }

    /// Block until the task finishes, with no bound on total time
    ///
    /// Each attempt waits at most one poll interval; between `Pending` attempts pending
    /// events are dispatched and the rest of the interval is slept out.
    /// A no-op on a finished task. Returns the status code.
    pub fn stop(&mut self) -> i32 {
        let interval = self.policy.poll_interval;
        loop {
            let started = Instant::now();
            match self.attempt(interval) {
                Attempt::Done => break,
                Attempt::Progress => continue,
                Attempt::Pending => {
                    self.dispatcher.dispatch_pending();
                    self.policy.pace(started);
                }
            }
        }
        self.settle_idle();
        self.status
    }

    /// `stop()` followed by the captured output and status. Always terminal.
    pub fn result(&mut self) -> TaskOutput {
        self.stop();
        self.output()
    }

    /// Async counterpart of `result()`
    ///
    /// Attempts never wait inside the poll; the executor is yielded to between attempts
    /// instead, so async callers never block their runtime thread.
    pub async fn wait_async(&mut self) -> TaskOutput {
        loop {
            match self.attempt(Duration::ZERO) {
                Attempt::Done => break,
                Attempt::Progress => tokio::task::yield_now().await,
                Attempt::Pending => {
                    self.dispatcher.dispatch_pending();
                    tokio::time::sleep(self.policy.poll_interval).await;
                }
            }
        }
        self.settle_idle();
        self.output()
    }

    fn attempt(&mut self, timeout: Duration) -> Attempt {
        if self.state != TaskState::Running {
            return Attempt::Done;
        }

        let outcome = match self.unit.as_mut() {
            Some(unit) => unit.poll(timeout),
            None => {
                self.finish(SENTINEL_STATUS);
                return Attempt::Done;
            }
        };

        match outcome {
            PollOutcome::Pending => Attempt::Pending,
            PollOutcome::Output(chunk) => {
                trace!(work = %self.label, bytes = chunk.len(), "Captured output");
                self.captured.extend_from_slice(&chunk);
                Attempt::Progress
            }
            PollOutcome::Finished { status, output } => {
                self.captured.extend_from_slice(&output);
                self.finish(status);
                Attempt::Done
            }
        }
    }

    fn finish(&mut self, status: i32) {
        // Dropping the unit releases the OS handle
        self.unit = None;
        self.status = status;
        self.state = TaskState::Finished;

        if self.verbose {
            info!(work = %self.label, status, bytes = self.captured.len(), "Work finished");
        } else {
            debug!(work = %self.label, status, bytes = self.captured.len(), "Work finished");
        }
    }

    // An idle task has nothing to wait for; blocking waits still end in Finished
    fn settle_idle(&mut self) {
        if self.state == TaskState::Idle {
            self.state = TaskState::Finished;
        }
    }

    fn output(&self) -> TaskOutput {
        TaskOutput::new(
            String::from_utf8_lossy(&self.captured).into_owned(),
            self.status,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::event_dispatcher::mocks::CountingDispatcher;
    use crate::port::work_launcher::mocks::{LaunchScript, ScriptedLauncher};

    fn fast_policy() -> PollPolicy {
        PollPolicy {
            poll_interval: Duration::from_millis(2),
            ready_timeout: Duration::from_millis(2),
        }
    }

    fn supervisor(scripts: Vec<LaunchScript>) -> (TaskSupervisor, Arc<ScriptedLauncher>) {
        let launcher = Arc::new(ScriptedLauncher::new(scripts));
        let task = TaskSupervisor::new(launcher.clone()).with_policy(fast_policy());
        (task, launcher)
    }

    fn chunk(s: &str) -> PollOutcome {
        PollOutcome::Output(s.as_bytes().to_vec())
    }

    fn finished(status: i32) -> PollOutcome {
        PollOutcome::Finished {
            status,
            output: Vec::new(),
        }
    }

    #[test]
    fn test_idle_task_is_ready() {
        let (mut task, _) = supervisor(vec![]);
        assert_eq!(task.state(), TaskState::Idle);
        assert!(task.ready(Duration::ZERO));
        assert_eq!(task.status(), None);
    }

    #[test]
    fn test_result_of_idle_task_is_sentinel_and_terminal() {
        let (mut task, _) = supervisor(vec![]);
        assert_eq!(task.result(), TaskOutput::sentinel());
        assert_eq!(task.state(), TaskState::Finished);
    }

    #[test]
    fn test_silent_success() {
        let (mut task, _) = supervisor(vec![LaunchScript::Steps(vec![finished(0)])]);
        task.start(Work::command("true")).unwrap();
        assert_eq!(task.result(), TaskOutput::new("", 0));
    }

    #[test]
    fn test_output_chunk_does_not_report_ready() {
        let (mut task, _) = supervisor(vec![LaunchScript::Steps(vec![
            chunk("hello "),
            chunk("world"),
            finished(0),
        ])]);
        task.start(Work::command("greet")).unwrap();

        assert!(!task.ready(Duration::ZERO));
        assert_eq!(task.captured(), b"hello ");
        assert!(!task.ready(Duration::ZERO));
        assert!(task.ready(Duration::ZERO));
        assert_eq!(task.state(), TaskState::Finished);
        assert_eq!(task.result(), TaskOutput::new("hello world", 0));
    }

    #[test]
    fn test_pending_then_finish() {
        let (mut task, _) = supervisor(vec![LaunchScript::Steps(vec![
            PollOutcome::Pending,
            PollOutcome::Pending,
            PollOutcome::Finished {
                status: 3,
                output: b"native".to_vec(),
            },
        ])]);
        task.start(Work::command("slow")).unwrap();

        assert!(!task.ready(Duration::ZERO));
        assert_eq!(task.status(), None);
        assert_eq!(task.result(), TaskOutput::new("native", 3));
    }

    #[test]
    fn test_spawn_failure_degrades_to_sentinel() {
        let (mut task, _) = supervisor(vec![LaunchScript::Fail("no such program".into())]);
        let err = task.start(Work::command("missing-helper")).unwrap_err();

        assert!(matches!(err, SpawnError::Spawn { .. }));
        assert!(task.ready(Duration::ZERO));
        assert_eq!(task.result(), TaskOutput::sentinel());
    }

    #[test]
    fn test_run_surfaces_spawn_failure() {
        let (mut task, _) = supervisor(vec![LaunchScript::Fail("nope".into())]);
        let result = task.run(Work::command("missing-helper"));
        assert!(matches!(result, Err(crate::AppError::Spawn(_))));
    }

    #[test]
    fn test_stop_on_finished_task_is_noop() {
        let (mut task, launcher) = supervisor(vec![LaunchScript::Steps(vec![
            chunk("once"),
            finished(7),
        ])]);
        task.start(Work::command("once")).unwrap();

        let first = task.result();
        assert_eq!(task.stop(), 7);
        assert_eq!(task.result(), first);
        assert_eq!(launcher.launched().len(), 1);
    }

    #[test]
    fn test_restart_completes_prior_run_without_mixing_output() {
        let (mut task, launcher) = supervisor(vec![
            LaunchScript::Steps(vec![chunk("first"), PollOutcome::Pending, finished(1)]),
            LaunchScript::Steps(vec![chunk("second"), finished(0)]),
        ]);

        task.start(Work::command("one")).unwrap();
        assert!(!task.ready(Duration::ZERO));
        task.start(Work::command("two")).unwrap();

        // chunk + Pending + finished: the first unit was polled to its end before relaunch
        assert_eq!(launcher.poll_counts()[0], 3);

        assert_eq!(task.result(), TaskOutput::new("second", 0));
        assert_eq!(launcher.launched(), vec!["one".to_string(), "two".to_string()]);
        assert_eq!(launcher.poll_counts(), vec![3, 2]);
    }

    #[test]
    fn test_stop_dispatches_events_between_pending_polls() {
        let dispatcher = Arc::new(CountingDispatcher::default());
        let launcher = Arc::new(ScriptedLauncher::new(vec![LaunchScript::Steps(vec![
            PollOutcome::Pending,
            PollOutcome::Pending,
            chunk("x"),
            finished(0),
        ])]));
        let mut task = TaskSupervisor::new(launcher)
            .with_policy(fast_policy())
            .with_dispatcher(dispatcher.clone());

        task.start(Work::command("pump")).unwrap();
        task.stop();

        assert_eq!(dispatcher.calls(), 2);
    }

    #[test]
    fn test_ready_respects_timeout() {
        let (mut task, _) = supervisor(vec![LaunchScript::Steps(vec![PollOutcome::Pending])]);
        task.start(Work::command("sleepy")).unwrap();

        let started = Instant::now();
        assert!(!task.ready(Duration::from_millis(10)));
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_wait_async_collects_output() {
        let (mut task, _) = supervisor(vec![LaunchScript::Steps(vec![
            PollOutcome::Pending,
            chunk("a"),
            chunk("b"),
            finished(0),
        ])]);
        task.start(Work::command("async")).unwrap();

        let out = task.wait_async().await;
        assert_eq!(out, TaskOutput::new("ab", 0));
        assert_eq!(task.state(), TaskState::Finished);
    }
}
