use crate::logging;
use lazy_static::lazy_static;
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use time::{macros::format_description, OffsetDateTime};

lazy_static! {
    static ref UNIX_TIME_UNIT_OFFSET: i128 =
        (time::Duration::MILLISECOND / time::Duration::NANOSECOND) as i128;
    static ref TIMER_QUEUE: Mutex<Option<Sender<Timer>>> = Mutex::new(spawn_timer_thread());
}

#[inline]
pub fn sleep_for_ms(ms: u64) {
    std::thread::sleep(Duration::from_millis(ms));
}

#[inline]
pub fn curr_time_millis() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / (*UNIX_TIME_UNIT_OFFSET)) as u64
}

#[inline]
pub fn milli2nano<T: Into<i128>>(t: T) -> i128 {
    *UNIX_TIME_UNIT_OFFSET * t.into()
}

/// Formats a unix timestamp in seconds as `hh:mm:ss`, used by the diagnostics of the sliding window.
pub fn format_time_secs(ts_secs: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(milli2nano(ts_secs.saturating_mul(1000)))
        .ok()
        .and_then(|t| {
            t.format(format_description!("[hour]:[minute]:[second]"))
                .ok()
        })
        .unwrap_or_else(|| ts_secs.to_string())
}

/// A deferred action scheduled on a [`Clock`].
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// `Clock` is the time source of the sliding window metric and the cooldown timer of circuit breakers.
/// It is injectable so that window expiry and cooldown expiry can be driven deterministically in tests.
pub trait Clock: Send + Sync {
    /// current unix timestamp in milliseconds
    fn now_millis(&self) -> u64;

    /// `after` schedules `callback` to run once `delay` has elapsed, even a zero one.
    ///
    /// The callback must never run synchronously inside `after`: circuit breakers arm their
    /// cooldown from their control loop, and the callback blocks until that same loop takes
    /// its message. The callback may block, so implementations must not run it while
    /// holding any lock of their own.
    fn after(&self, delay: Duration, callback: TimerCallback);
}

struct Timer {
    deadline: Instant,
    seq: u64,
    callback: TimerCallback,
}

impl Timer {
    fn key(&self) -> Reverse<(Instant, u64)> {
        Reverse((self.deadline, self.seq))
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

// the heap is a max-heap, the earliest deadline ranks highest
impl Ord for Timer {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.key().cmp(&other.key())
    }
}

fn spawn_timer_thread() -> Option<Sender<Timer>> {
    let (queue, inbox) = channel();
    match thread::Builder::new()
        .name("resilience-timer".into())
        .spawn(move || run_timers(inbox))
    {
        Ok(_) => Some(queue),
        Err(err) => {
            logging::error!("[SystemClock] Failed to spawn the timer thread, error: {}", err);
            None
        }
    }
}

fn run_timers(inbox: Receiver<Timer>) {
    let mut timers = BinaryHeap::new();
    loop {
        let now = Instant::now();
        while timers
            .peek()
            .map_or(false, |timer: &Timer| timer.deadline <= now)
        {
            if let Some(timer) = timers.pop() {
                (timer.callback)();
            }
        }
        let received = match timers.peek() {
            Some(next) => inbox.recv_timeout(next.deadline.saturating_duration_since(now)),
            None => inbox.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(timer) => timers.push(timer),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// The wall clock. Every timer of the process is served by one shared timer thread,
/// callbacks run on that thread one after another in deadline order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        curr_time_millis()
    }

    fn after(&self, delay: Duration, callback: TimerCallback) {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let deadline = match Instant::now().checked_add(delay) {
            Some(deadline) => deadline,
            None => {
                logging::warn!("[SystemClock] Timer delay {:?} never elapses, dropped", delay);
                return;
            }
        };
        let timer = Timer {
            deadline,
            seq: SEQ.fetch_add(1, Ordering::Relaxed),
            callback,
        };
        let queue = TIMER_QUEUE.lock().unwrap_or_else(PoisonError::into_inner);
        let sent = queue.as_ref().map(|queue| queue.send(timer).is_ok());
        if sent != Some(true) {
            logging::error!("[SystemClock] The timer thread is gone, a timer is dropped");
        }
    }
}

/// A clock that only moves when told to. Timers fire when the clock is advanced past
/// their deadline, or on demand with [`ManualClock::fire_all`].
#[derive(Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
    timers: Mutex<Vec<(u64, TimerCallback)>>,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        ManualClock {
            now_ms: AtomicU64::new(now_ms),
            timers: Mutex::new(Vec::new()),
        }
    }

    pub fn set_millis(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
        self.fire_due();
    }

    pub fn advance(&self, delta: Duration) {
        self.now_ms
            .fetch_add(delta.as_millis() as u64, Ordering::SeqCst);
        self.fire_due();
    }

    /// number of timers that have not fired yet
    pub fn pending(&self) -> usize {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// fires every pending timer regardless of its deadline, returns how many fired
    pub fn fire_all(&self) -> usize {
        let fired: Vec<TimerCallback> = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .map(|(_, callback)| callback)
            .collect();
        let count = fired.len();
        for callback in fired {
            callback();
        }
        count
    }

    fn fire_due(&self) {
        let now = self.now_millis();
        let due: Vec<TimerCallback> = {
            let mut timers = self
                .timers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let (due, pending): (Vec<_>, Vec<_>) =
                timers.drain(..).partition(|(deadline, _)| *deadline <= now);
            *timers = pending;
            due.into_iter().map(|(_, callback)| callback).collect()
        };
        for callback in due {
            callback();
        }
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn after(&self, delay: Duration, callback: TimerCallback) {
        let deadline = self.now_millis() + delay.as_millis() as u64;
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((deadline, callback));
    }
}

#[cfg(test)]
pub(crate) use test::MockClock;
