use super::{BreakerConfig, CircuitBreakerTrait, State};
use crate::stat::{SlidingWindowMetric, Summary};
use crate::utils::{Clock, SystemClock};
use crate::{logging, Result};
use std::fmt;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

enum Command {
    Allow(SyncSender<bool>),
    State(SyncSender<State>),
    Success(Duration),
    Failure(Duration),
    Trip,
    Reset,
    /// a cooldown armed at the given generation has elapsed
    CooldownElapsed(u64),
    Shutdown,
}

/// The sending half shared by every clone of a `CircuitBreaker`.
/// Dropping the last clone stops the control loop.
struct Handle {
    commands: SyncSender<Command>,
    config: BreakerConfig,
}

impl Drop for Handle {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// `CircuitBreaker` protects one downstream resource.
///
/// The state machine runs on a dedicated thread which owns the state, the sliding window
/// and the cooldown timer. Every operation is a blocking rendezvous with that thread
/// (a zero-capacity channel), so at most one command is serviced at a time and no lock
/// guards the state. Cloning is cheap and every clone drives the same breaker.
#[derive(Clone)]
pub struct CircuitBreaker {
    handle: Arc<Handle>,
}

impl CircuitBreaker {
    /// `new` builds a breaker with the default window, cooldown and min observations,
    /// opening once the failure ratio exceeds `failure_ratio` (clamped into `[0.0, 1.0]`).
    pub fn new(failure_ratio: f64) -> Result<Self> {
        Self::with_config(BreakerConfig::new(failure_ratio), Arc::new(SystemClock))
    }

    pub fn with_config(config: BreakerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let config = config.normalized();
        let metric = SlidingWindowMetric::new(config.window(), Arc::clone(&clock))?;
        let (commands, inbox) = sync_channel(0);
        let machine = StateMachine {
            config: config.clone(),
            clock,
            metric,
            state: State::Closed,
            generation: 0,
            timers: commands.clone(),
        };
        thread::Builder::new()
            .name("circuit-breaker".into())
            .spawn(move || machine.run(inbox))?;
        Ok(CircuitBreaker {
            handle: Arc::new(Handle { commands, config }),
        })
    }

    /// the effective (normalized) configuration
    pub fn config(&self) -> &BreakerConfig {
        &self.handle.config
    }

    pub fn allow(&self) -> bool {
        let (reply, answer) = sync_channel(1);
        if !self.send(Command::Allow(reply)) {
            return false;
        }
        answer.recv().unwrap_or(false)
    }

    pub fn success(&self, latency: Duration) {
        self.send(Command::Success(latency));
    }

    pub fn failure(&self, latency: Duration) {
        self.send(Command::Failure(latency));
    }

    pub fn trip(&self) {
        self.send(Command::Trip);
    }

    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    /// `state` reports the current state, for diagnostics.
    pub fn state(&self) -> State {
        let (reply, answer) = sync_channel(1);
        if !self.send(Command::State(reply)) {
            return State::Open;
        }
        answer.recv().unwrap_or(State::Open)
    }

    fn send(&self, command: Command) -> bool {
        if self.handle.commands.send(command).is_err() {
            logging::error!("[CircuitBreaker] The control loop is not running, command dropped");
            return false;
        }
        true
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.handle.config)
            .finish()
    }
}

impl CircuitBreakerTrait for CircuitBreaker {
    fn allow(&self) -> bool {
        CircuitBreaker::allow(self)
    }

    fn success(&self, latency: Duration) {
        CircuitBreaker::success(self, latency)
    }

    fn failure(&self, latency: Duration) {
        CircuitBreaker::failure(self, latency)
    }

    fn trip(&self) {
        CircuitBreaker::trip(self)
    }

    fn reset(&self) {
        CircuitBreaker::reset(self)
    }

    fn current_state(&self) -> State {
        CircuitBreaker::state(self)
    }
}

/// The single owner of the breaker state, living on the control loop thread.
struct StateMachine {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    metric: SlidingWindowMetric,
    state: State,
    /// bumped on every transition to Open or Closed, so that cooldowns armed
    /// before the latest transition are recognized as stale
    generation: u64,
    timers: SyncSender<Command>,
}

impl StateMachine {
    fn run(mut self, inbox: Receiver<Command>) {
        logging::debug!(
            "[CircuitBreaker] Control loop started, config {:?}",
            self.config
        );
        while let Ok(command) = inbox.recv() {
            match command {
                Command::Allow(reply) => {
                    let allowed = self.allow();
                    let _ = reply.send(allowed);
                }
                Command::State(reply) => {
                    let _ = reply.send(self.state);
                }
                Command::Success(latency) => self.on_success(latency),
                Command::Failure(latency) => self.on_failure(latency),
                Command::Trip => self.to_open(),
                Command::Reset => self.to_closed(),
                Command::CooldownElapsed(generation) => self.on_cooldown(generation),
                Command::Shutdown => break,
            }
        }
        logging::debug!("[CircuitBreaker] Control loop stopped");
    }

    fn allow(&mut self) -> bool {
        match self.state {
            State::Closed => true,
            State::Open => false,
            State::HalfOpen => {
                // the trial request is in flight, nobody else gets through until
                // its outcome is reported or the next cooldown elapses
                self.to_open();
                true
            }
        }
    }

    fn on_success(&mut self, latency: Duration) {
        match self.state {
            State::Closed => self.metric.success(latency),
            State::Open | State::HalfOpen => self.to_closed(),
        }
    }

    fn on_failure(&mut self, latency: Duration) {
        match self.state {
            State::Closed => {
                self.metric.failure(latency);
                let summary = self.metric.summary();
                if self.should_open(&summary) {
                    logging::warn!(
                        "[CircuitBreaker] Failure ratio exceeded, summary {:?}, window {}",
                        summary,
                        self.metric
                    );
                    self.to_open();
                }
            }
            State::HalfOpen => self.to_open(),
            State::Open => {}
        }
    }

    fn on_cooldown(&mut self, generation: u64) {
        if self.state == State::Open && generation == self.generation {
            self.transform(State::HalfOpen);
        } else {
            logging::trace!(
                "[CircuitBreaker] Stale cooldown ignored, generation {} (current {})",
                generation,
                self.generation
            );
        }
    }

    fn should_open(&self, summary: &Summary) -> bool {
        summary.total > self.config.min_observations && summary.rate > self.config.failure_ratio
    }

    fn to_open(&mut self) {
        self.generation += 1;
        self.transform(State::Open);
        let generation = self.generation;
        let timers = self.timers.clone();
        self.clock.after(
            self.config.cooldown(),
            Box::new(move || {
                // the loop may be gone already
                let _ = timers.send(Command::CooldownElapsed(generation));
            }),
        );
    }

    fn to_closed(&mut self) {
        self.generation += 1;
        self.metric = self.metric.fresh();
        self.transform(State::Closed);
    }

    fn transform(&mut self, to: State) {
        let prev = std::mem::replace(&mut self.state, to);
        logging::debug!("[CircuitBreaker] State transformed, {:?} -> {:?}", prev, to);
    }
}
