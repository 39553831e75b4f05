//! Stream monitor: reads a port byte by byte until a termination predicate
//! fires.
//!
//! Each loop iteration performs one bounded single-byte read, forwards a
//! non-terminator byte to the sink (and the keystroke emitter, if any), then
//! checks, in this order:
//!
//! 1. terminator byte seen,
//! 2. idle timeout elapsed since the last forwarded byte,
//! 3. byte limit reached,
//! 4. external interrupt requested.
//!
//! The first one that holds ends the run. A failed read counts as "no byte"
//! and never ends the run by itself; the idle timeout is the backstop for a
//! port that has gone away.

use std::fmt;
use std::io::Write;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::error::Result;
use crate::keystroke::KeystrokeEmitter;
use crate::port::ByteSource;

/// Source of monotonic time for idle-timeout arithmetic.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// When to stop reading. Unset fields never fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminationPolicy {
    max_byte_count: Option<NonZeroU64>,
    idle_timeout: Option<Duration>,
    terminator_byte: Option<u8>,
}

impl TerminationPolicy {
    /// A policy with every predicate disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after `count` forwarded bytes. Zero disables the limit.
    #[must_use]
    pub fn with_byte_limit(mut self, count: u64) -> Self {
        self.max_byte_count = NonZeroU64::new(count);
        self
    }

    /// Stop when no byte has been forwarded for longer than `timeout`.
    /// A zero duration disables the timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Stop when `byte` is read. Any value `0x00..=0xFF` is allowed.
    #[must_use]
    pub fn with_terminator(mut self, byte: u8) -> Self {
        self.terminator_byte = Some(byte);
        self
    }

    /// Byte limit, if any.
    pub fn max_byte_count(&self) -> Option<NonZeroU64> {
        self.max_byte_count
    }

    /// Idle timeout, if any.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Terminator byte, if any.
    pub fn terminator_byte(&self) -> Option<u8> {
        self.terminator_byte
    }

    /// True if nothing but an interrupt can end a run.
    pub fn is_unbounded(&self) -> bool {
        self.max_byte_count.is_none() && self.idle_timeout.is_none() && self.terminator_byte.is_none()
    }
}

/// Why a monitor run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The configured number of bytes was forwarded.
    ByteLimitReached,
    /// Nothing was forwarded for longer than the idle timeout.
    IdleTimeout,
    /// The terminator byte was read.
    TerminatorSeen,
    /// The interrupt flag was raised (e.g. Ctrl-C).
    Interrupted,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ByteLimitReached => "byte limit reached",
            Self::IdleTimeout => "idle timeout",
            Self::TerminatorSeen => "terminator seen",
            Self::Interrupted => "interrupted",
        })
    }
}

/// Mutable bookkeeping of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorState {
    /// Bytes forwarded to the sink (terminator excluded).
    pub bytes_read: u64,
    /// Time of the last forwarded byte, or of the start of the run.
    pub last_activity: Instant,
    /// Most recently read byte, terminator included.
    pub last_byte: Option<u8>,
}

impl MonitorState {
    fn new(now: Instant) -> Self {
        Self {
            bytes_read: 0,
            last_activity: now,
            last_byte: None,
        }
    }
}

/// Reads a [`ByteSource`] into a sink until the [`TerminationPolicy`] says
/// stop.
pub struct Monitor<'a, C: Clock = MonotonicClock> {
    policy: TerminationPolicy,
    clock: C,
    keystrokes: Option<&'a mut dyn KeystrokeEmitter>,
    interrupt: Option<Arc<AtomicBool>>,
    state: MonitorState,
}

impl<'a> Monitor<'a, MonotonicClock> {
    /// Create a monitor on the system monotonic clock.
    pub fn new(policy: TerminationPolicy) -> Self {
        Self::with_clock(policy, MonotonicClock)
    }
}

impl<'a, C: Clock> Monitor<'a, C> {
    /// Create a monitor on a custom clock.
    pub fn with_clock(policy: TerminationPolicy, clock: C) -> Self {
        let state = MonitorState::new(clock.now());
        Self {
            policy,
            clock,
            keystrokes: None,
            interrupt: None,
            state,
        }
    }

    /// Replay every forwarded byte through `emitter`.
    #[must_use]
    pub fn with_keystrokes(mut self, emitter: &'a mut dyn KeystrokeEmitter) -> Self {
        self.keystrokes = Some(emitter);
        self
    }

    /// Stop with [`TerminationReason::Interrupted`] once `flag` becomes true.
    #[must_use]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Policy in use.
    pub fn policy(&self) -> &TerminationPolicy {
        &self.policy
    }

    /// Counters of the current (or last) run.
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Read until a termination predicate fires.
    ///
    /// Only sink write failures are returned as errors; read failures are
    /// absorbed.
    pub fn run<S, W>(&mut self, source: &mut S, sink: &mut W) -> Result<TerminationReason>
    where
        S: ByteSource + ?Sized,
        W: Write + ?Sized,
    {
        self.state = MonitorState::new(self.clock.now());
        debug!("Monitoring with {:?}", self.policy);

        loop {
            if let Some(reason) = self.step(source, sink)? {
                debug!("Stopped: {reason} after {} bytes", self.state.bytes_read);
                return Ok(reason);
            }
        }
    }

    fn step<S, W>(&mut self, source: &mut S, sink: &mut W) -> Result<Option<TerminationReason>>
    where
        S: ByteSource + ?Sized,
        W: Write + ?Sized,
    {
        let read = match source.read_one_byte() {
            Ok(byte) => byte,
            Err(e) => {
                trace!("Read failed, treating as no data: {e}");
                None
            },
        };

        let terminator = self.policy.terminator_byte;
        if let Some(byte) = read {
            self.state.last_byte = Some(byte);
            if Some(byte) != terminator {
                self.state.last_activity = self.clock.now();
                self.state.bytes_read += 1;
                sink.write_all(&[byte])?;
                sink.flush()?;
                if let Some(emitter) = self.keystrokes.as_mut() {
                    emitter.emit(byte);
                }
            }
        }

        if read.is_some() && read == terminator {
            return Ok(Some(TerminationReason::TerminatorSeen));
        }

        if let Some(idle) = self.policy.idle_timeout {
            let quiet_for = self
                .clock
                .now()
                .saturating_duration_since(self.state.last_activity);
            if quiet_for > idle {
                return Ok(Some(TerminationReason::IdleTimeout));
            }
        }

        if let Some(limit) = self.policy.max_byte_count {
            if self.state.bytes_read >= limit.get() {
                return Ok(Some(TerminationReason::ByteLimitReached));
            }
        }

        if self
            .interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Ok(Some(TerminationReason::Interrupted));
        }

        Ok(None)
    }
}

/// Run a monitor with default settings: `run(port, policy, sink)`.
pub fn run<S, W>(source: &mut S, policy: TerminationPolicy, sink: &mut W) -> Result<TerminationReason>
where
    S: ByteSource + ?Sized,
    W: Write + ?Sized,
{
    Monitor::new(policy).run(source, sink)
}
