//! Seams to the game server hosting the engine
//!
//! The engine never talks to players directly. Messages, console commands
//! and fines go through a [`Host`]; effects that must happen after the
//! current event finishes are handed to a [`Scheduler`].

use chatward_core::Actor;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Length of one server tick
pub const TICK: Duration = Duration::from_millis(50);

/// The server runtime
///
/// Implementations must silently ignore recipients that are no longer
/// online; deferred effects may run after a player disconnected.
pub trait Host: Send + Sync {
    /// Currently online actors
    fn online_actors(&self) -> Vec<Actor>;

    /// Send a message to one player
    fn tell(&self, recipient: &str, message: &str);

    /// Send a message to every player
    fn broadcast(&self, message: &str);

    /// Run a command as the server console
    fn dispatch_console_command(&self, command: &str);

    /// Take money from a player
    fn withdraw(&self, player: &str, amount: f64);
}

/// A deferred effect
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks after a number of server ticks
///
/// Scheduled tasks are never awaited and cannot be cancelled.
pub trait Scheduler: Send + Sync {
    fn run_later(&self, delay_ticks: u64, task: Task);
}

/// Scheduler backed by a tokio runtime
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running on
    pub fn current() -> chatward_core::Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| chatward_core::Error::internal(format!("no tokio runtime: {}", e)))
    }
}

impl Scheduler for TokioScheduler {
    fn run_later(&self, delay_ticks: u64, task: Task) {
        let delay = TICK * u32::try_from(delay_ticks).unwrap_or(u32::MAX);

        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

/// Scheduler that queues tasks until [`ManualScheduler::run_pending`]
///
/// For synchronous hosts driving their own tick loop, and for tests.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<(u64, Task)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run every queued task in scheduling order, returning how many ran
    pub fn run_pending(&self) -> usize {
        let tasks: Vec<_> = self.queue.lock().drain(..).collect();
        let count = tasks.len();

        for (_, task) in tasks {
            task();
        }

        count
    }
}

impl Scheduler for ManualScheduler {
    fn run_later(&self, delay_ticks: u64, task: Task) {
        self.queue.lock().push_back((delay_ticks, task));
    }
}

/// Host that records everything sent through it
///
/// Useful for tests and dry runs.
#[derive(Default)]
pub struct RecordingHost {
    online: Mutex<Vec<Actor>>,
    told: Mutex<Vec<(String, String)>>,
    broadcasts: Mutex<Vec<String>>,
    commands: Mutex<Vec<String>>,
    withdrawals: Mutex<Vec<(String, f64)>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an actor as online
    pub fn join(&self, actor: Actor) {
        let mut online = self.online.lock();
        online.retain(|a| a.name != actor.name);
        online.push(actor);
    }

    /// Mark a player as offline
    pub fn quit(&self, name: &str) {
        self.online.lock().retain(|a| a.name != name);
    }

    /// Every (recipient, message) pair delivered
    pub fn told(&self) -> Vec<(String, String)> {
        self.told.lock().clone()
    }

    /// Messages delivered to one player
    pub fn messages_for(&self, name: &str) -> Vec<String> {
        self.told
            .lock()
            .iter()
            .filter(|(recipient, _)| recipient == name)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    pub fn withdrawals(&self) -> Vec<(String, f64)> {
        self.withdrawals.lock().clone()
    }
}

impl Host for RecordingHost {
    fn online_actors(&self) -> Vec<Actor> {
        self.online.lock().clone()
    }

    fn tell(&self, recipient: &str, message: &str) {
        if !self.online.lock().iter().any(|a| a.name == recipient) {
            return;
        }
        self.told
            .lock()
            .push((recipient.to_string(), message.to_string()));
    }

    fn broadcast(&self, message: &str) {
        self.broadcasts.lock().push(message.to_string());
    }

    fn dispatch_console_command(&self, command: &str) {
        self.commands.lock().push(command.to_string());
    }

    fn withdraw(&self, player: &str, amount: f64) {
        self.withdrawals.lock().push((player.to_string(), amount));
    }
}
