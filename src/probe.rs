//! Bounded-concurrency execution of independent network probes.
//!
//! Both scan paths fan out over the same shape: a finite batch of probe
//! descriptors, a worker budget, and a probe function that always yields a
//! result value. [`ProbePool`] keeps at most `max_workers` probes in flight
//! and hands back results in completion order, so one hung target never
//! stalls the rest of the batch.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::future;
use futures::stream::{self, Stream, StreamExt};

/// Worker budget plus an optional whole-batch deadline.
///
/// Probe functions are expected to swallow their own transport failures and
/// encode them in the result value. The pool itself never fails: it emits
/// exactly one result per descriptor, or fewer only when a batch deadline
/// cuts the run short.
#[derive(Debug, Clone, Copy)]
pub struct ProbePool {
    max_workers: usize,
    deadline: Option<Duration>,
}

impl ProbePool {
    /// Creates a pool with the given worker budget. A budget of zero is
    /// treated as one worker.
    #[must_use]
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            deadline: None,
        }
    }

    /// Bounds the wall-clock time of a whole batch. When the deadline fires,
    /// in-flight probes are abandoned and no further descriptors are
    /// dispatched; results collected so far are still returned.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Runs `probe` over every descriptor and yields results as they
    /// complete, not in submission order. The stream is finite and ends
    /// after one result per dispatched descriptor.
    ///
    /// Callers needing per-target grouping must group on the identifying
    /// fields carried inside each result, never on arrival order.
    pub fn stream<'a, D, F, Fut>(
        &self,
        descriptors: impl IntoIterator<Item = D> + 'a,
        probe: F,
    ) -> impl Stream<Item = Fut::Output> + 'a
    where
        D: 'a,
        F: FnMut(D) -> Fut + 'a,
        Fut: Future + 'a,
    {
        let cutoff: Pin<Box<dyn Future<Output = ()> + 'a>> = match self.deadline {
            Some(limit) => Box::pin(tokio::time::sleep(limit)),
            None => Box::pin(future::pending()),
        };

        stream::iter(descriptors)
            .map(probe)
            .buffer_unordered(self.max_workers)
            .take_until(cutoff)
    }

    /// Collects [`ProbePool::stream`] into a `Vec`, preserving completion
    /// order.
    pub async fn run<D, F, Fut>(
        &self,
        descriptors: impl IntoIterator<Item = D>,
        probe: F,
    ) -> Vec<Fut::Output>
    where
        F: FnMut(D) -> Fut,
        Fut: Future,
    {
        self.stream(descriptors, probe).collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    #[tokio::test]
    async fn one_result_per_descriptor() {
        let pool = ProbePool::new(8);
        let descriptors: Vec<u32> = (0..100).collect();

        let mut results = pool.run(descriptors.clone(), |d| async move { d }).await;

        results.sort_unstable();
        assert_eq!(descriptors, results);
    }

    #[tokio::test]
    async fn empty_batch_yields_nothing() {
        let pool = ProbePool::new(4);
        let results = pool.run(Vec::<u8>::new(), |d| async move { d }).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn zero_workers_is_clamped() {
        let pool = ProbePool::new(0);
        assert_eq!(pool.max_workers(), 1);

        let results = pool.run(vec![1, 2, 3], |d| async move { d }).await;
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn worker_budget_is_respected() {
        let budget = 7;
        let pool = ProbePool::new(budget);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = pool
            .run(0..50, |d: u32| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    d
                }
            })
            .await;

        assert_eq!(results.len(), 50);
        assert!(peak.load(Ordering::SeqCst) <= budget);
    }

    #[tokio::test]
    async fn results_arrive_in_completion_order() {
        let pool = ProbePool::new(2);
        let delays = vec![("slow", 200u64), ("fast", 5u64)];

        let results = pool
            .run(delays, |(name, millis)| async move {
                sleep(Duration::from_millis(millis)).await;
                name
            })
            .await;

        assert_eq!(results, vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn probe_failures_do_not_abort_the_batch() {
        // Failure is a value. A descriptor that "errors" still produces its
        // result and the rest of the batch completes untouched.
        let pool = ProbePool::new(4);

        let results: Vec<Result<u32, &str>> = pool
            .run(0..10u32, |d| async move {
                if d % 3 == 0 {
                    Err("connection refused")
                } else {
                    Ok(d)
                }
            })
            .await;

        assert_eq!(results.len(), 10);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 4);
    }

    #[tokio::test]
    async fn deadline_keeps_finished_results_and_drops_the_rest() {
        let pool = ProbePool::new(4).with_deadline(Duration::from_millis(100));
        let delays = vec![5u64, 5, 2_000, 2_000];

        let results = pool
            .run(delays, |millis| async move {
                sleep(Duration::from_millis(millis)).await;
                millis
            })
            .await;

        assert!(results.len() >= 2, "fast probes must be collected");
        assert!(results.len() < 4, "deadline must abandon hung probes");
        assert!(results.iter().all(|&millis| millis == 5));
    }

    #[tokio::test]
    async fn reruns_yield_identical_multisets() {
        let pool = ProbePool::new(3);
        let descriptors: Vec<u32> = (0..20).collect();

        let mut first = pool.run(descriptors.clone(), |d| async move { d * 2 }).await;
        let mut second = pool.run(descriptors, |d| async move { d * 2 }).await;

        first.sort_unstable();
        second.sort_unstable();
        assert_eq!(first, second);
    }
}
