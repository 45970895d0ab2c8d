//! Single-producer/single-consumer sample ring shared between threads.
//!
//! [`CircularBuffer`] has plain indices and needs a single owner. When an
//! audio callback thread feeds a consumer thread the ring is split into a
//! [`SampleProducer`] and a [`SampleConsumer`] over one of two backends:
//!
//! - **lock-free**: `ringbuf`'s `HeapRb`, whose head and tail are published
//!   atomically. The halves cannot touch each other's slots, so a full ring
//!   drops the incoming sample and an empty ring yields `T::default()`
//!   (silence). Selected for [`OverrunPolicy::DropNewest`] with
//!   [`UnderrunPolicy::Silence`].
//! - **locked**: a [`CircularBuffer`] behind a `Mutex`, honouring every
//!   overrun and underrun policy exactly. Each push or pop takes the lock
//!   for one sample or one block.
//!
//! Both count and report overruns and underruns the same way.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};

use super::CircularBuffer;
use super::diagnostics::{Condition, SharedThrottledCounter};
use crate::config::{BufferConfig, OverrunPolicy, UnderrunPolicy};
use crate::error::{CaptureError, Result};

const LOG_SOURCE: &str = "sample ring";

/// Poisoning is ignored: a panic on the other half cannot leave the indices
/// out of range.
fn lock<B>(buffer: &Mutex<B>) -> MutexGuard<'_, B> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

trait CounterSource: Send + Sync {
    fn overruns(&self) -> u64;
    fn underruns(&self) -> u64;
    fn overrun_reports(&self) -> u64;
    fn underrun_reports(&self) -> u64;
}

#[derive(Debug)]
struct Counters {
    overruns: SharedThrottledCounter,
    underruns: SharedThrottledCounter,
}

impl CounterSource for Counters {
    fn overruns(&self) -> u64 {
        self.overruns.count()
    }

    fn underruns(&self) -> u64 {
        self.underruns.count()
    }

    fn overrun_reports(&self) -> u64 {
        self.overruns.reports()
    }

    fn underrun_reports(&self) -> u64 {
        self.underruns.reports()
    }
}

impl<T: Send> CounterSource for Mutex<CircularBuffer<T>> {
    fn overruns(&self) -> u64 {
        lock(self).overrun_count()
    }

    fn underruns(&self) -> u64 {
        lock(self).underrun_count()
    }

    fn overrun_reports(&self) -> u64 {
        lock(self).overrun_reports()
    }

    fn underrun_reports(&self) -> u64 {
        lock(self).underrun_reports()
    }
}

/// Read-only view of a ring's overrun/underrun counters
///
/// Cheap to clone and safe to read from any thread.
#[derive(Clone)]
pub struct RingStats {
    counters: Arc<dyn CounterSource>,
}

impl RingStats {
    pub fn overruns(&self) -> u64 {
        self.counters.overruns()
    }

    pub fn underruns(&self) -> u64 {
        self.counters.underruns()
    }

    pub fn overrun_reports(&self) -> u64 {
        self.counters.overrun_reports()
    }

    pub fn underrun_reports(&self) -> u64 {
        self.counters.underrun_reports()
    }
}

impl fmt::Debug for RingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingStats")
            .field("overruns", &self.overruns())
            .field("underruns", &self.underruns())
            .finish()
    }
}

/// Constructor for split sample rings
pub struct SampleRing;

impl SampleRing {
    /// Create a lock-free ring holding `capacity` samples
    ///
    /// A full ring drops incoming samples and an empty ring yields silence.
    ///
    /// # Returns
    /// `(producer, consumer)`; move the producer into the audio callback.
    pub fn new<T: Copy + Default + Send + 'static>(
        capacity: usize,
        report_interval: u64,
    ) -> Result<(SampleProducer<T>, SampleConsumer<T>)> {
        if capacity == 0 {
            return Err(CaptureError::InvalidCapacity);
        }
        if report_interval == 0 {
            return Err(CaptureError::Config(
                "report_interval must be positive".into(),
            ));
        }

        let counters = Arc::new(Counters {
            overruns: SharedThrottledCounter::new(Condition::Overrun, report_interval),
            underruns: SharedThrottledCounter::new(Condition::Underrun, report_interval),
        });
        let stats = RingStats {
            counters: Arc::clone(&counters) as Arc<dyn CounterSource>,
        };
        let (prod, cons) = HeapRb::<T>::new(capacity).split();

        Ok((
            SampleProducer {
                inner: ProducerInner::LockFree {
                    prod,
                    counters: Arc::clone(&counters),
                },
                stats: stats.clone(),
            },
            SampleConsumer {
                inner: ConsumerInner::LockFree { cons, counters },
                stats,
            },
        ))
    }

    /// Create a ring with the given overrun and underrun behaviour
    ///
    /// Falls back to the lock-free ring when the policies are the ones it
    /// implements natively.
    pub fn with_policies<T: Copy + Default + Send + 'static>(
        capacity: usize,
        overrun_policy: OverrunPolicy,
        underrun_policy: UnderrunPolicy,
        report_interval: u64,
    ) -> Result<(SampleProducer<T>, SampleConsumer<T>)> {
        if overrun_policy == OverrunPolicy::DropNewest && underrun_policy == UnderrunPolicy::Silence
        {
            return Self::new(capacity, report_interval);
        }

        let buffer = CircularBuffer::with_policies(
            capacity,
            overrun_policy,
            underrun_policy,
            report_interval,
        )?;
        let shared = Arc::new(Mutex::new(buffer));
        let stats = RingStats {
            counters: Arc::clone(&shared) as Arc<dyn CounterSource>,
        };

        Ok((
            SampleProducer {
                inner: ProducerInner::Locked(Arc::clone(&shared)),
                stats: stats.clone(),
            },
            SampleConsumer {
                inner: ConsumerInner::Locked(shared),
                stats,
            },
        ))
    }

    pub fn from_config<T: Copy + Default + Send + 'static>(
        config: &BufferConfig,
    ) -> Result<(SampleProducer<T>, SampleConsumer<T>)> {
        Self::with_policies(
            config.capacity,
            config.overrun_policy,
            config.underrun_policy,
            config.report_interval,
        )
    }
}

enum ProducerInner<T> {
    LockFree {
        prod: HeapProd<T>,
        counters: Arc<Counters>,
    },
    Locked(Arc<Mutex<CircularBuffer<T>>>),
}

/// Writing half of a [`SampleRing`]
pub struct SampleProducer<T> {
    inner: ProducerInner<T>,
    stats: RingStats,
}

impl<T: Copy + Default> SampleProducer<T> {
    /// Push one sample, never blocking on a full ring
    pub fn push(&mut self, value: T) {
        match &mut self.inner {
            ProducerInner::LockFree { prod, counters } => {
                if prod.try_push(value).is_err() {
                    counters.overruns.record(LOG_SOURCE);
                }
            }
            ProducerInner::Locked(buffer) => lock(buffer).push_back(value),
        }
    }

    /// Push a block, counting one overrun per sample that hit a full ring
    ///
    /// # Returns
    /// Number of samples written into the ring (overwrites included)
    pub fn push_slice(&mut self, values: &[T]) -> usize {
        match &mut self.inner {
            ProducerInner::LockFree { prod, counters } => {
                let written = prod.push_slice(values);
                let dropped = values.len() - written;
                if dropped > 0 {
                    counters.overruns.record_many(LOG_SOURCE, dropped as u64);
                }
                written
            }
            ProducerInner::Locked(buffer) => {
                let mut buffer = lock(buffer);
                let before = buffer.overrun_count();
                for &value in values {
                    buffer.push_back(value);
                }
                if buffer.overrun_policy() == OverrunPolicy::DropNewest {
                    values.len() - (buffer.overrun_count() - before) as usize
                } else {
                    values.len()
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            ProducerInner::LockFree { prod, .. } => prod.occupied_len(),
            ProducerInner::Locked(buffer) => lock(buffer).len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        match &self.inner {
            ProducerInner::LockFree { prod, .. } => prod.is_full(),
            ProducerInner::Locked(buffer) => lock(buffer).is_full(),
        }
    }

    pub fn capacity(&self) -> usize {
        match &self.inner {
            ProducerInner::LockFree { prod, .. } => prod.capacity().get(),
            ProducerInner::Locked(buffer) => lock(buffer).capacity(),
        }
    }

    pub fn stats(&self) -> RingStats {
        self.stats.clone()
    }
}

enum ConsumerInner<T> {
    LockFree {
        cons: HeapCons<T>,
        counters: Arc<Counters>,
    },
    Locked(Arc<Mutex<CircularBuffer<T>>>),
}

/// Reading half of a [`SampleRing`]
pub struct SampleConsumer<T> {
    inner: ConsumerInner<T>,
    stats: RingStats,
}

impl<T: Copy + Default> SampleConsumer<T> {
    /// Pop one sample; an empty ring counts an underrun and yields the value
    /// its underrun policy dictates
    pub fn pop(&mut self) -> T {
        match &mut self.inner {
            ConsumerInner::LockFree { cons, counters } => match cons.try_pop() {
                Some(value) => value,
                None => {
                    counters.underruns.record(LOG_SOURCE);
                    T::default()
                }
            },
            ConsumerInner::Locked(buffer) => lock(buffer).pop_front(),
        }
    }

    /// Drain up to `out.len()` samples without counting underruns
    ///
    /// # Returns
    /// Number of samples written into `out`
    pub fn pop_into(&mut self, out: &mut [T]) -> usize {
        match &mut self.inner {
            ConsumerInner::LockFree { cons, .. } => cons.pop_slice(out),
            ConsumerInner::Locked(buffer) => {
                let mut buffer = lock(buffer);
                let n = buffer.len().min(out.len());
                for slot in &mut out[..n] {
                    *slot = buffer.pop_front();
                }
                n
            }
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            ConsumerInner::LockFree { cons, .. } => cons.occupied_len(),
            ConsumerInner::Locked(buffer) => lock(buffer).len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match &self.inner {
            ConsumerInner::LockFree { cons, .. } => cons.capacity().get(),
            ConsumerInner::Locked(buffer) => lock(buffer).capacity(),
        }
    }

    pub fn stats(&self) -> RingStats {
        self.stats.clone()
    }
}
