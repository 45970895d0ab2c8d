use super::diagnostics::{Condition, DEFAULT_REPORT_INTERVAL, ThrottledCounter};
use crate::config::{OverrunPolicy, UnderrunPolicy};
use crate::error::{CaptureError, Result};

const LOG_SOURCE: &str = "ring buffer";

/// Fixed-capacity circular buffer for audio samples
///
/// Append and remove never block and never fail. A full buffer overwrites,
/// an empty buffer still yields a value; both conditions are counted and
/// logged at most once per `report_interval` occurrences.
///
/// With the default [`OverrunPolicy::OverwriteHead`], appending to a full
/// buffer writes into the slot at the tail, which is the head slot, and the
/// head stays put. The value just written is therefore the next one removed,
/// and the element it replaced is lost.
///
/// All mutation takes `&mut self`, so a single owner drives both ends. Use
/// [`SampleRing`](super::SampleRing) to split producer and consumer across
/// threads.
///
/// # Example
/// ```
/// use soundrec::audio::CircularBuffer;
///
/// let mut buffer = CircularBuffer::new(4).unwrap();
/// buffer.push_back(1.0_f32);
/// buffer.push_back(2.0);
/// assert_eq!(buffer.pop_front(), 1.0);
/// assert_eq!(buffer.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    storage: Vec<T>,
    head: usize,
    tail: usize,
    size: usize,
    overrun_policy: OverrunPolicy,
    underrun_policy: UnderrunPolicy,
    overruns: ThrottledCounter,
    underruns: ThrottledCounter,
}

impl<T: Clone + Default> CircularBuffer<T> {
    /// Create a buffer with the default policies and report interval
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_policies(
            capacity,
            OverrunPolicy::default(),
            UnderrunPolicy::default(),
            DEFAULT_REPORT_INTERVAL,
        )
    }

    pub fn with_policies(
        capacity: usize,
        overrun_policy: OverrunPolicy,
        underrun_policy: UnderrunPolicy,
        report_interval: u64,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(CaptureError::InvalidCapacity);
        }
        if report_interval == 0 {
            return Err(CaptureError::Config(
                "report_interval must be positive".into(),
            ));
        }

        Ok(Self {
            storage: vec![T::default(); capacity],
            head: 0,
            tail: 0,
            size: 0,
            overrun_policy,
            underrun_policy,
            overruns: ThrottledCounter::new(Condition::Overrun, report_interval),
            underruns: ThrottledCounter::new(Condition::Underrun, report_interval),
        })
    }

    /// Append at the tail
    pub fn push_back(&mut self, value: T) {
        let capacity = self.storage.len();

        if self.size == capacity && self.overrun_policy == OverrunPolicy::DropNewest {
            self.overruns.record(LOG_SOURCE);
            return;
        }

        self.storage[self.tail] = value;
        self.tail = (self.tail + 1) % capacity;

        if self.size < capacity {
            self.size += 1;
        } else {
            if self.overrun_policy == OverrunPolicy::DropOldest {
                self.head = (self.head + 1) % capacity;
            }
            self.overruns.record(LOG_SOURCE);
        }
    }

    /// Remove from the head
    ///
    /// On an empty buffer this counts an underrun and, under
    /// [`UnderrunPolicy::Stale`], returns whatever the head slot last held
    /// (the default value if it was never written).
    pub fn pop_front(&mut self) -> T {
        if self.size == 0 {
            self.underruns.record(LOG_SOURCE);
            if self.underrun_policy == UnderrunPolicy::Silence {
                return T::default();
            }
        }

        let value = self.storage[self.head].clone();
        self.head = (self.head + 1) % self.storage.len();
        self.size = self.size.saturating_sub(1);
        value
    }
}

impl<T> CircularBuffer<T> {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size == self.storage.len()
    }

    /// Number of elements currently held
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn overrun_policy(&self) -> OverrunPolicy {
        self.overrun_policy
    }

    /// Appends made while the buffer was full
    pub fn overrun_count(&self) -> u64 {
        self.overruns.count()
    }

    /// Removes made while the buffer was empty
    pub fn underrun_count(&self) -> u64 {
        self.underruns.count()
    }

    /// Overrun diagnostic lines emitted so far
    pub fn overrun_reports(&self) -> u64 {
        self.overruns.reports()
    }

    /// Underrun diagnostic lines emitted so far
    pub fn underrun_reports(&self) -> u64 {
        self.underruns.reports()
    }
}
