//! Parallel likelihood evaluation.
//!
//! At each sampler step every walker's proposal is independent, so the
//! (log-prior, log-likelihood) pairs are computed concurrently. Two modes:
//!
//! - `Local`: a fixed-size rayon thread pool inside this process.
//! - `Channel`: a coordinator/follower pattern over mpsc channels. Followers
//!   block on a shared task queue, evaluate, reply with the walker index and
//!   the result, and loop until an explicit shutdown message. Followers hold
//!   no state across tasks; only the coordinator advances sampler state.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use rayon::prelude::*;

use crate::domain::PoolKind;
use crate::error::AppError;

/// Tempered-posterior split: the sampler combines the two terms as
/// `log_prior + beta * log_like`, so the pool hands both back separately.
pub type LogProb = (f64, f64);

/// The evaluation closure. Must be infallible at this level: structural
/// failures are probed once before sampling starts, and numeric failures
/// inside the hot path map to negative infinity.
pub type LogProbFn = Arc<dyn Fn(&[f64]) -> LogProb + Send + Sync>;

const REPLY_POLL: Duration = Duration::from_millis(200);

enum Task {
    Eval(usize, Vec<f64>),
    Shutdown,
}

enum PoolImpl {
    Local {
        pool: rayon::ThreadPool,
        logp: LogProbFn,
    },
    Channel {
        task_tx: Sender<Task>,
        result_rx: Receiver<(usize, LogProb)>,
        followers: Vec<JoinHandle<()>>,
    },
}

pub struct EvalPool {
    inner: PoolImpl,
}

impl EvalPool {
    pub fn new(kind: PoolKind, n_threads: usize, logp: LogProbFn) -> Result<Self, AppError> {
        let inner = match kind {
            PoolKind::Local => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n_threads)
                    .build()
                    .map_err(|e| {
                        AppError::config(format!("Cannot build the worker pool: {e}"))
                    })?;
                PoolImpl::Local { pool, logp }
            }
            PoolKind::Channel => {
                let (task_tx, task_rx) = mpsc::channel::<Task>();
                let (result_tx, result_rx) = mpsc::channel::<(usize, LogProb)>();
                let task_rx = Arc::new(Mutex::new(task_rx));

                let mut followers = Vec::with_capacity(n_threads);
                for _ in 0..n_threads {
                    let task_rx = Arc::clone(&task_rx);
                    let result_tx = result_tx.clone();
                    let logp = Arc::clone(&logp);
                    followers.push(std::thread::spawn(move || {
                        loop {
                            let task = {
                                let rx = match task_rx.lock() {
                                    Ok(rx) => rx,
                                    Err(_) => return,
                                };
                                rx.recv()
                            };
                            match task {
                                Ok(Task::Eval(idx, pars)) => {
                                    let value = logp(&pars);
                                    if result_tx.send((idx, value)).is_err() {
                                        return;
                                    }
                                }
                                Ok(Task::Shutdown) | Err(_) => return,
                            }
                        }
                    }));
                }
                PoolImpl::Channel {
                    task_tx,
                    result_rx,
                    followers,
                }
            }
        };
        Ok(EvalPool { inner })
    }

    /// Evaluate every position, preserving input order.
    pub fn map(&self, positions: &[Vec<f64>]) -> Result<Vec<LogProb>, AppError> {
        match &self.inner {
            PoolImpl::Local { pool, logp } => {
                let logp = Arc::clone(logp);
                Ok(pool.install(|| positions.par_iter().map(|p| logp(p)).collect()))
            }
            PoolImpl::Channel {
                task_tx,
                result_rx,
                followers,
            } => {
                for (idx, pars) in positions.iter().enumerate() {
                    task_tx.send(Task::Eval(idx, pars.clone())).map_err(|_| {
                        AppError::numeric("All follower workers have disconnected.")
                    })?;
                }
                let mut out = vec![(f64::NEG_INFINITY, f64::NEG_INFINITY); positions.len()];
                let mut received = 0;
                while received < positions.len() {
                    match result_rx.recv_timeout(REPLY_POLL) {
                        Ok((idx, value)) => {
                            out[idx] = value;
                            received += 1;
                        }
                        // A follower that exited may have taken a task with
                        // it; its reply will never arrive, so the run aborts
                        // rather than waiting on a channel the surviving
                        // followers keep open.
                        Err(RecvTimeoutError::Timeout) => {
                            if followers.iter().any(|h| h.is_finished()) {
                                return Err(AppError::numeric(
                                    "A follower worker exited before replying.",
                                ));
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            return Err(AppError::numeric(
                                "All follower workers have disconnected.",
                            ));
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

impl Drop for EvalPool {
    fn drop(&mut self) {
        if let PoolImpl::Channel {
            task_tx, followers, ..
        } = &mut self.inner
        {
            for _ in 0..followers.len() {
                // Followers that already exited leave a dead channel; that is
                // the same outcome as a received shutdown.
                let _ = task_tx.send(Task::Shutdown);
            }
            for handle in followers.drain(..) {
                let _ = handle.join();
            }
        }
    }
}
