//! In-memory doubles for unit tests.

use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::monitor::Clock;
use crate::port::{ByteSource, Port, PortConfig, PortOpener};

/// Shared count of `close()` calls.
#[derive(Debug, Clone, Default)]
pub(crate) struct CloseCounter(Arc<AtomicUsize>);

impl CloseCounter {
    pub(crate) fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct FakePort {
    name: String,
    data: VecDeque<u8>,
    closes: CloseCounter,
    fail_close: bool,
    fail_configure: bool,
    applied: Arc<Mutex<Option<PortConfig>>>,
}

impl FakePort {
    pub(crate) fn new(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            data: data.iter().copied().collect(),
            closes: CloseCounter::default(),
            fail_close: false,
            fail_configure: false,
            applied: Arc::default(),
        }
    }

    pub(crate) fn close_counter(&self) -> CloseCounter {
        self.closes.clone()
    }

    pub(crate) fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

impl ByteSource for FakePort {
    fn read_one_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.data.pop_front())
    }
}

impl Port for FakePort {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&mut self, config: &PortConfig) -> Result<()> {
        if self.fail_configure {
            return Err(Error::ConfigurationFailed {
                port: self.name.clone(),
                reason: "baud rate: rejected".to_string(),
            });
        }
        *self.applied.lock().unwrap() = Some(config.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closes.bump();
        if self.fail_close {
            return Err(Error::Io(io::Error::other("close failed")));
        }
        Ok(())
    }
}

#[derive(Default)]
struct OpenerState {
    attempts: Vec<u32>,
}

/// Opener where only the listed indices exist, named `COM{n}`.
#[derive(Clone)]
pub(crate) struct FakeOpener {
    working: Vec<u32>,
    fail_configure: bool,
    state: Arc<Mutex<OpenerState>>,
    closes: CloseCounter,
    applied: Arc<Mutex<Option<PortConfig>>>,
}

impl FakeOpener {
    pub(crate) fn new(working: &[u32]) -> Self {
        Self {
            working: working.to_vec(),
            fail_configure: false,
            state: Arc::default(),
            closes: CloseCounter::default(),
            applied: Arc::default(),
        }
    }

    pub(crate) fn failing_configure(mut self) -> Self {
        self.fail_configure = true;
        self
    }

    pub(crate) fn attempts(&self) -> Vec<u32> {
        self.state.lock().unwrap().attempts.clone()
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.get()
    }

    pub(crate) fn applied_config(&self) -> Option<PortConfig> {
        self.applied.lock().unwrap().clone()
    }
}

impl PortOpener for FakeOpener {
    type Port = FakePort;

    fn device_name(&self, index: u32) -> String {
        format!("COM{index}")
    }

    fn open(&self, index: u32) -> Result<FakePort> {
        self.state.lock().unwrap().attempts.push(index);
        if !self.working.contains(&index) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "no such device",
            )));
        }

        let mut port = FakePort::new(&self.device_name(index), b"");
        port.closes = self.closes.clone();
        port.fail_configure = self.fail_configure;
        port.applied = Arc::clone(&self.applied);
        Ok(port)
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub(crate) struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::default(),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Byte(u8),
    /// Read call timed out without data.
    Silent,
    /// Read call failed with an I/O error.
    Fail,
}

/// Byte source replaying a script; every call costs `poll` on the clock,
/// and an exhausted script stays silent forever.
pub(crate) struct ScriptedSource {
    steps: VecDeque<Step>,
    clock: ManualClock,
    poll: Duration,
    reads: usize,
}

impl ScriptedSource {
    pub(crate) fn new(steps: &[Step], clock: ManualClock) -> Self {
        Self {
            steps: steps.iter().copied().collect(),
            clock,
            poll: Duration::from_millis(60),
            reads: 0,
        }
    }

    pub(crate) fn bytes(data: &[u8], clock: ManualClock) -> Self {
        let steps: Vec<Step> = data.iter().map(|&b| Step::Byte(b)).collect();
        Self::new(&steps, clock)
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads
    }
}

impl ByteSource for ScriptedSource {
    fn read_one_byte(&mut self) -> io::Result<Option<u8>> {
        self.reads += 1;
        self.clock.advance(self.poll);
        match self.steps.pop_front().unwrap_or(Step::Silent) {
            Step::Byte(b) => Ok(Some(b)),
            Step::Silent => Ok(None),
            Step::Fail => Err(io::Error::other("device reports framing error")),
        }
    }
}
