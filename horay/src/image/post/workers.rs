//! Structured fan-out/join for post-processing.
//!
//! Partitions run as jobs on a small dedicated rayon pool and each job owns its input
//! outright, so no worker can observe another's writes. Results come back over a channel and
//! the caller waits at most `timeout` for them. A job that misses the deadline is left to
//! finish on its pool thread; its result is discarded.

use crossbeam_channel::{RecvTimeoutError, bounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Default bound on how long a filter waits for its workers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Upper bound on post-processing pool threads.
const MAX_POOL_THREADS: usize = 8;

static POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

/// Number of threads the post-processing pool runs with.
pub fn pool_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(4, MAX_POOL_THREADS)
}

/// The shared post-processing pool, or `None` if it could not be built (jobs then go to
/// rayon's global pool).
fn pool() -> Option<&'static ThreadPool> {
    POOL.get_or_init(|| {
        let threads = pool_threads();
        match ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("horay-post-{index}"))
            .panic_handler(|_| log::error!("post-processing worker panicked"))
            .build()
        {
            Ok(pool) => {
                log::debug!("Post-processing pool started with {threads} thread(s)");
                Some(pool)
            }
            Err(e) => {
                log::error!("Failed to build post-processing pool: {e}");
                None
            }
        }
    })
    .as_ref()
}

/// Outcome of a fan-out: one slot per input, `None` where the worker did not report in time.
#[derive(Debug)]
pub struct FanOutResult<O> {
    pub outputs: Vec<Option<O>>,
    pub waited: Duration,
}

impl<O> FanOutResult<O> {
    pub fn unfinished(&self) -> usize {
        self.outputs.iter().filter(|output| output.is_none()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.unfinished() == 0
    }
}

/// Runs `work` on every input in parallel and joins with a bounded wait.
///
/// # Parameters
///
/// * `label` - used in log messages
/// * `inputs` - one owned snapshot per worker
/// * `timeout` - deadline measured from the moment the first job is queued
pub fn fan_out<I, O, F>(
    label: &str,
    inputs: Vec<I>,
    timeout: Duration,
    work: F,
) -> FanOutResult<O>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let count = inputs.len();
    let work = Arc::new(work);
    // Capacity for every job, so late senders never block after the caller gave up.
    let (sender, receiver) = bounded::<(usize, O)>(count.max(1));

    let pool = pool();
    for (index, input) in inputs.into_iter().enumerate() {
        let work = Arc::clone(&work);
        let sender = sender.clone();
        let job = move || {
            let output = work(input);
            let _ = sender.send((index, output));
        };
        match pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
    }
    drop(sender);

    let mut outputs: Vec<Option<O>> = (0..count).map(|_| None).collect();
    let mut received = 0;
    while received < count {
        match receiver.recv_deadline(deadline) {
            Ok((index, output)) => {
                outputs[index] = Some(output);
                received += 1;
            }
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => {
                log::error!("{label}: worker exited without reporting a result");
                break;
            }
        }
    }

    FanOutResult {
        outputs,
        waited: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_results_keep_input_order() {
        let result = fan_out("square", vec![1, 2, 3, 4], DEFAULT_TIMEOUT, |v: i32| v * v);
        assert!(result.is_complete());
        let values: Vec<i32> = result.outputs.into_iter().flatten().collect();
        assert_eq!(values, vec![1, 4, 9, 16]);
    }

    #[test]
    fn test_slow_worker_times_out() {
        let result = fan_out(
            "sleepy",
            vec![0u64, 2_000],
            Duration::from_millis(100),
            |ms: u64| {
                thread::sleep(Duration::from_millis(ms));
                ms
            },
        );
        assert_eq!(result.unfinished(), 1);
        assert_eq!(result.outputs[0], Some(0));
        assert!(result.outputs[1].is_none());
        assert!(result.waited < Duration::from_millis(1_500));
    }

    #[test]
    fn test_workers_are_reused_across_calls() {
        let mut workers = HashSet::new();
        for _ in 0..10 {
            let result = fan_out("ids", vec![(); 3], DEFAULT_TIMEOUT, |_| thread::current().id());
            assert!(result.is_complete());
            workers.extend(result.outputs.into_iter().flatten());
        }
        assert!(workers.len() <= pool_threads());
        assert!(workers.len() < 30);
    }

    #[test]
    fn test_worker_panic_is_reported_as_unfinished() {
        let result = fan_out("panicky", vec![1, 0], DEFAULT_TIMEOUT, |v: i32| {
            assert!(v != 0, "bad partition");
            v
        });
        assert_eq!(result.outputs[0], Some(1));
        assert!(result.outputs[1].is_none());
        assert!(result.waited < DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_empty_input() {
        let result = fan_out("none", Vec::<u8>::new(), DEFAULT_TIMEOUT, |v| v);
        assert!(result.is_complete());
        assert!(result.outputs.is_empty());
    }
}
