use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::time::Instant;

use respawn::config::ProcessConfig;
use respawn::errors::{Result, SupervisorError};
use respawn::process::{BoxFuture, ChildExit, ChildProcess, ProcessLauncher, ProcessTerminator};

/// How the next fake process behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehaviour {
    /// Runs until terminated, killed, or killed externally.
    Runs,
    /// Runs and ignores termination requests; only `kill` stops it.
    IgnoresTerm,
    /// Exits with the given code right after spawning.
    ExitsImmediately(i32),
    /// `launch` itself returns an error.
    SpawnError,
}

/// A simulated OS process, shared between the test and the supervisor's
/// `FakeChild` handle.
#[derive(Debug, Clone)]
pub struct FakeProcess {
    inner: Arc<ProcessInner>,
}

#[derive(Debug)]
struct ProcessInner {
    pid: u32,
    honours_term: bool,
    alive: watch::Sender<bool>,
    exit: Mutex<Option<ChildExit>>,
    term_requests: AtomicUsize,
    killed: AtomicBool,
    failing_queries: AtomicUsize,
    queried_at: Mutex<Vec<Instant>>,
}

impl FakeProcess {
    fn spawn(pid: u32, honours_term: bool) -> Self {
        let (alive, _) = watch::channel(true);
        Self {
            inner: Arc::new(ProcessInner {
                pid,
                honours_term,
                alive,
                exit: Mutex::new(None),
                term_requests: AtomicUsize::new(0),
                killed: AtomicBool::new(false),
                failing_queries: AtomicUsize::new(0),
                queried_at: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns `false` if the process had already exited.
    fn exit_with(&self, exit: ChildExit) -> bool {
        {
            let mut slot = self.inner.exit.lock().unwrap();
            if slot.is_some() {
                return false;
            }
            *slot = Some(exit);
        }
        self.inner.alive.send_replace(false);
        true
    }

    fn exit_status(&self) -> Option<ChildExit> {
        *self.inner.exit.lock().unwrap()
    }

    pub fn pid(&self) -> u32 {
        self.inner.pid
    }

    pub fn is_alive(&self) -> bool {
        *self.inner.alive.borrow()
    }

    /// Simulate the process dying on its own (crash, OOM killer, `kill -9`
    /// from a shell). Returns `false` if it was already dead.
    pub fn kill_externally(&self, code: i32) -> bool {
        self.exit_with(ChildExit::code(code))
    }

    /// How many termination requests the supervisor sent.
    pub fn term_requests(&self) -> usize {
        self.inner.term_requests.load(Ordering::SeqCst)
    }

    /// Whether the supervisor had to force-kill it.
    pub fn was_killed(&self) -> bool {
        self.inner.killed.load(Ordering::SeqCst)
    }

    /// Make the next `n` status queries (`try_wait`) return an error while
    /// the process keeps running.
    pub fn fail_status_queries(&self, n: usize) {
        self.inner.failing_queries.store(n, Ordering::SeqCst);
    }

    /// When each status query happened, failed ones included.
    pub fn status_queries(&self) -> Vec<Instant> {
        self.inner.queried_at.lock().unwrap().clone()
    }

    /// Consume one pending failure, if any.
    fn take_query_failure(&self) -> bool {
        self.inner
            .failing_queries
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// The supervisor-side handle to a [`FakeProcess`].
#[derive(Debug)]
pub struct FakeChild {
    process: FakeProcess,
    reaped: bool,
}

impl ChildProcess for FakeChild {
    fn id(&self) -> Option<u32> {
        (!self.reaped).then(|| self.process.pid())
    }

    fn try_wait(&mut self) -> Result<Option<ChildExit>> {
        self.process.inner.queried_at.lock().unwrap().push(Instant::now());
        if self.process.take_query_failure() {
            return Err(SupervisorError::Other(anyhow::anyhow!(
                "fake status query failure"
            )));
        }

        let exit = self.process.exit_status();
        if exit.is_some() {
            self.reaped = true;
        }
        Ok(exit)
    }

    fn terminate(&mut self) -> Result<()> {
        self.process.inner.term_requests.fetch_add(1, Ordering::SeqCst);
        if self.process.inner.honours_term {
            self.process.exit_with(ChildExit::signaled());
        }
        Ok(())
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<ChildExit>> {
        Box::pin(async move {
            let mut rx = self.process.inner.alive.subscribe();
            rx.wait_for(|alive| !*alive)
                .await
                .map_err(|e| SupervisorError::Other(e.into()))?;

            self.reaped = true;
            Ok(self.process.exit_status().unwrap_or_else(ChildExit::signaled))
        })
    }

    fn kill(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.process.inner.killed.store(true, Ordering::SeqCst);
            self.process.exit_with(ChildExit::signaled());
            self.reaped = true;
            Ok(())
        })
    }
}

/// One call to `FakeLauncher::launch`.
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub at: Instant,
    pub behaviour: FakeBehaviour,
    /// Fake processes still alive at the moment of this launch.
    pub live_at_launch: usize,
    /// `None` for `SpawnError`.
    pub process: Option<FakeProcess>,
}

#[derive(Debug, Default)]
struct LauncherState {
    script: VecDeque<FakeBehaviour>,
    launches: Vec<LaunchRecord>,
}

/// A fake launcher that:
/// - hands out behaviours from a script, then `Runs` once it is exhausted
/// - records every launch, with a handle to the simulated process
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    state: Arc<Mutex<LauncherState>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(behaviours: impl IntoIterator<Item = FakeBehaviour>) -> Self {
        let launcher = Self::new();
        launcher.state.lock().unwrap().script.extend(behaviours);
        launcher
    }

    pub fn launches(&self) -> Vec<LaunchRecord> {
        self.state.lock().unwrap().launches.clone()
    }

    pub fn launch_count(&self) -> usize {
        self.state.lock().unwrap().launches.len()
    }

    /// Every process that was actually spawned, oldest first.
    pub fn processes(&self) -> Vec<FakeProcess> {
        self.state
            .lock()
            .unwrap()
            .launches
            .iter()
            .filter_map(|l| l.process.clone())
            .collect()
    }

    /// The most recently spawned process.
    pub fn latest(&self) -> Option<FakeProcess> {
        self.processes().pop()
    }

    pub fn live_count(&self) -> usize {
        self.processes().iter().filter(|p| p.is_alive()).count()
    }
}

impl ProcessLauncher for FakeLauncher {
    type Child = FakeChild;

    fn launch(&mut self, process: &ProcessConfig) -> Result<FakeChild> {
        let mut state = self.state.lock().unwrap();
        let behaviour = state.script.pop_front().unwrap_or(FakeBehaviour::Runs);
        let live_at_launch = state
            .launches
            .iter()
            .filter_map(|l| l.process.as_ref())
            .filter(|p| p.is_alive())
            .count();
        let pid = 1000 + state.launches.len() as u32;

        let spawned = match behaviour {
            FakeBehaviour::Runs => Some(FakeProcess::spawn(pid, true)),
            FakeBehaviour::IgnoresTerm => Some(FakeProcess::spawn(pid, false)),
            FakeBehaviour::ExitsImmediately(code) => {
                let p = FakeProcess::spawn(pid, true);
                p.exit_with(ChildExit::code(code));
                Some(p)
            }
            FakeBehaviour::SpawnError => None,
        };

        state.launches.push(LaunchRecord {
            at: Instant::now(),
            behaviour,
            live_at_launch,
            process: spawned.clone(),
        });

        match spawned {
            Some(process) => Ok(FakeChild {
                process,
                reaped: false,
            }),
            None => Err(SupervisorError::Spawn {
                program: process.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "fake spawn failure"),
            }),
        }
    }
}

/// A fake `pkill` that records the patterns it was asked to match.
#[derive(Debug, Clone, Default)]
pub struct FakeTerminator {
    calls: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl FakeTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call records the pattern and then fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessTerminator for FakeTerminator {
    fn terminate_matching<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(pattern.to_string());
            if self.fail {
                return Err(SupervisorError::Other(anyhow::anyhow!(
                    "fake pkill failure"
                )));
            }
            Ok(())
        })
    }
}
