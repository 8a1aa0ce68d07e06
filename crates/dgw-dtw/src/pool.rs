//! Fixed-size worker pool fed through bounded crossbeam channels.
//!
//! The coordinator (the calling thread) pushes work items into a bounded
//! queue, followed by one stop sentinel per worker. Workers push answers into
//! a second bounded queue and report failures on an error channel. The
//! coordinator multiplexes sending and receiving with [`Select`], so a full
//! queue on either side never blocks progress on the other.

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam::channel::{Receiver, Select, Sender, bounded, unbounded};
use tracing::{debug, warn};

use crate::error::{DtwError, EngineError};

/// Number of worker threads, validated against the CPU count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parallelism(NonZeroUsize);

impl Parallelism {
    /// One worker per available CPU.
    #[must_use]
    pub fn available() -> Self {
        Self(thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }

    /// A single worker.
    #[must_use]
    pub fn single() -> Self {
        Self(NonZeroUsize::MIN)
    }

    /// Validate a requested worker count.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EngineError::InvalidParallelism`] | `n` is zero or exceeds the CPU count |
    pub fn new(n: usize) -> Result<Self, EngineError> {
        let available = Self::available().get();
        match NonZeroUsize::new(n) {
            Some(n) if n.get() <= available => Ok(Self(n)),
            _ => Err(EngineError::InvalidParallelism {
                requested: n,
                available,
            }),
        }
    }

    /// Return the worker count.
    #[must_use]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::available()
    }
}

enum Job<T> {
    Work(T),
    Stop,
}

enum Event<A> {
    Sent,
    SendFailed,
    Answer(A),
    Error(EngineError),
    Closed,
}

/// Runs work items on a fixed set of scoped threads.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    parallelism: Parallelism,
    queue_capacity: usize,
}

impl WorkerPool {
    /// Create a pool with a queue capacity of twice the worker count.
    #[must_use]
    pub fn new(parallelism: Parallelism) -> Self {
        Self {
            parallelism,
            queue_capacity: 2 * parallelism.get(),
        }
    }

    /// Override the capacity of the work and answer queues (minimum 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Return the worker count.
    #[must_use]
    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// Feed `items` to the workers, which apply `work` to each one, and hand
    /// every answer to `on_answer` on the calling thread.
    ///
    /// Returns the number of answers delivered. On the first failure the
    /// remaining workers are cancelled, the queues are closed, every worker is
    /// joined, and the failure is returned.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EngineError::WorkerFailure`] | `work` returned an error |
    /// | [`EngineError::WorkerPanicked`] | `work` panicked |
    pub fn run<T, A, I, F, G>(&self, items: I, work: F, mut on_answer: G) -> Result<usize, EngineError>
    where
        I: IntoIterator<Item = T>,
        T: Send,
        A: Send,
        F: Fn(T) -> Result<A, DtwError> + Sync,
        G: FnMut(A),
    {
        let workers = self.parallelism.get();
        let (work_tx, work_rx) = bounded::<Job<T>>(self.queue_capacity);
        let (answer_tx, answer_rx) = bounded::<A>(self.queue_capacity);
        let (error_tx, error_rx) = unbounded::<EngineError>();
        let cancelled = AtomicBool::new(false);

        thread::scope(|scope| {
            // Owned by the coordinator so that returning early closes them.
            let (answer_rx, error_rx) = (answer_rx, error_rx);
            for worker in 0..workers {
                let work_rx = work_rx.clone();
                let answer_tx = answer_tx.clone();
                let error_tx = error_tx.clone();
                let (work, cancelled) = (&work, &cancelled);
                scope.spawn(move || {
                    worker_loop(worker, &work_rx, &answer_tx, &error_tx, work, cancelled);
                });
            }
            drop(work_rx);
            drop(answer_tx);
            drop(error_tx);
            debug!(workers, capacity = self.queue_capacity, "worker pool started");

            let mut items = items.into_iter();
            let mut work_tx = Some(work_tx);
            let mut pending: Option<Job<T>> = None;
            let mut stops_left = workers;
            let mut answers = 0usize;

            loop {
                if pending.is_none() && work_tx.is_some() {
                    pending = match items.next() {
                        Some(item) => Some(Job::Work(item)),
                        None if stops_left > 0 => {
                            stops_left -= 1;
                            Some(Job::Stop)
                        }
                        None => None,
                    };
                    if pending.is_none() {
                        // Every sentinel is queued; close the queue.
                        work_tx = None;
                    }
                }

                match next_event(work_tx.as_ref(), &mut pending, &answer_rx, &error_rx) {
                    Event::Sent => {}
                    Event::SendFailed => {
                        work_tx = None;
                        pending = None;
                    }
                    Event::Answer(answer) => {
                        answers += 1;
                        on_answer(answer);
                    }
                    Event::Error(e) => {
                        warn!(error = %e, "worker failed; cancelling pool");
                        cancelled.store(true, Ordering::Relaxed);
                        return Err(e);
                    }
                    Event::Closed => break,
                }
            }

            // Every worker has exited. Errors and answers may still be buffered.
            if let Ok(e) = error_rx.try_recv() {
                return Err(e);
            }
            for answer in answer_rx.try_iter() {
                answers += 1;
                on_answer(answer);
            }
            debug!(answers, "worker pool drained");
            Ok(answers)
        })
    }
}

/// Block until one of: the pending job is sent, an answer arrives, an error
/// arrives, or every worker has hung up.
fn next_event<T, A>(
    work_tx: Option<&Sender<Job<T>>>,
    pending: &mut Option<Job<T>>,
    answer_rx: &Receiver<A>,
    error_rx: &Receiver<EngineError>,
) -> Event<A> {
    let mut sel = Select::new();
    let mut send = match (work_tx, pending.take()) {
        (Some(tx), Some(job)) => Some((sel.send(tx), tx, job)),
        (_, job) => {
            *pending = job;
            None
        }
    };
    let answer_index = sel.recv(answer_rx);
    let error_index = sel.recv(error_rx);

    let op = sel.select();
    let index = op.index();
    match send.take() {
        Some((send_index, tx, job)) if send_index == index => match op.send(tx, job) {
            Ok(()) => Event::Sent,
            Err(_) => Event::SendFailed,
        },
        unsent => {
            if let Some((_, _, job)) = unsent {
                *pending = Some(job);
            }
            if index == answer_index {
                match op.recv(answer_rx) {
                    Ok(answer) => Event::Answer(answer),
                    Err(_) => Event::Closed,
                }
            } else {
                debug_assert_eq!(index, error_index);
                match op.recv(error_rx) {
                    Ok(e) => Event::Error(e),
                    Err(_) => Event::Closed,
                }
            }
        }
    }
}

fn worker_loop<T, A, F>(
    worker: usize,
    work_rx: &Receiver<Job<T>>,
    answer_tx: &Sender<A>,
    error_tx: &Sender<EngineError>,
    work: &F,
    cancelled: &AtomicBool,
) where
    F: Fn(T) -> Result<A, DtwError>,
{
    let mut processed = 0usize;
    while let Ok(Job::Work(item)) = work_rx.recv() {
        if cancelled.load(Ordering::Relaxed) {
            break;
        }
        match panic::catch_unwind(AssertUnwindSafe(|| work(item))) {
            Ok(Ok(answer)) => {
                processed += 1;
                if answer_tx.send(answer).is_err() {
                    break;
                }
            }
            Ok(Err(source)) => {
                cancelled.store(true, Ordering::Relaxed);
                let _ = error_tx.send(EngineError::WorkerFailure { worker, source });
                break;
            }
            Err(_) => {
                cancelled.store(true, Ordering::Relaxed);
                let _ = error_tx.send(EngineError::WorkerPanicked { worker });
                break;
            }
        }
    }
    debug!(worker, processed, "worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(workers: usize) -> WorkerPool {
        let workers = workers.min(Parallelism::available().get());
        WorkerPool::new(Parallelism::new(workers).unwrap())
    }

    #[test]
    fn parallelism_bounds() {
        assert!(matches!(
            Parallelism::new(0),
            Err(EngineError::InvalidParallelism { requested: 0, .. })
        ));
        let cpus = Parallelism::available().get();
        assert!(Parallelism::new(cpus + 1).is_err());
        assert_eq!(Parallelism::new(1).unwrap(), Parallelism::single());
    }

    #[test]
    fn every_item_is_answered() {
        let mut seen = Vec::new();
        let n = pool(4)
            .run(0..100u32, |x| Ok(x * 2), |y| seen.push(y))
            .unwrap();
        assert_eq!(n, 100);
        seen.sort_unstable();
        assert_eq!(seen, (0..100).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn tiny_queue_does_not_deadlock() {
        let mut total = 0u64;
        pool(4)
            .with_queue_capacity(1)
            .run(0..500u64, Ok, |x| total += x)
            .unwrap();
        assert_eq!(total, (0..500).sum());
    }

    #[test]
    fn empty_input_returns_zero() {
        let n = pool(2).run(std::iter::empty::<u8>(), Ok, |_| {}).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn first_error_is_returned() {
        let result = pool(2).run(
            0..50u32,
            |x| {
                if x == 7 {
                    Err(DtwError::EmptySequence)
                } else {
                    Ok(x)
                }
            },
            |_| {},
        );
        match result {
            Err(EngineError::WorkerFailure { source, .. }) => {
                assert_eq!(source, DtwError::EmptySequence);
            }
            other => panic!("expected worker failure, got {other:?}"),
        }
    }

    #[test]
    fn panics_are_reported() {
        let result = pool(2).run(
            0..10u32,
            |x| {
                assert!(x != 3, "boom");
                Ok(x)
            },
            |_| {},
        );
        assert!(matches!(result, Err(EngineError::WorkerPanicked { .. })));
    }

    #[test]
    fn workers_may_borrow_disjoint_output_slots() {
        let mut out = vec![0usize; 37];
        let chunks = out.chunks_mut(5).enumerate();
        pool(3)
            .run(
                chunks,
                |(k, slots): (usize, &mut [usize])| {
                    for (offset, slot) in slots.iter_mut().enumerate() {
                        *slot = k * 5 + offset;
                    }
                    Ok(())
                },
                |()| {},
            )
            .unwrap();
        assert_eq!(out, (0..37).collect::<Vec<_>>());
    }
}
