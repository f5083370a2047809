//! Tile scheduler and worker pool (C4): a priority queue of jobs drained by
//! `W` OS threads, each blocking on its own task wakeups and reporting
//! completions through one shared result channel.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobPriority {
    Low,
    Normal,
    High,
    Critical,
}

pub type JobId = u64;

pub struct Job {
    pub id: JobId,
    pub priority: JobPriority,
    pub cancel_flag: Arc<AtomicBool>,
    /// `Fn`, not `FnOnce`: a panicked job is retried once in place, which
    /// requires calling the closure a second time.
    pub run: Box<dyn Fn(&AtomicBool) -> JobOutcome + Send>,
}

pub enum JobOutcome {
    Completed(Vec<u8>),
    Glitched(Vec<u8>),
    Cancelled,
    Failed(String),
}

pub struct JobResult {
    pub id: JobId,
    pub outcome: JobOutcome,
    pub wall_time: Duration,
}

struct QueuedJob {
    priority: JobPriority,
    sequence: u64,
    job: Job,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}
impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    /// Higher priority first; lower (earlier) sequence number first within a band.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<QueuedJob>,
    shutdown: bool,
}

struct SharedQueue {
    state: Mutex<QueueState>,
    condvar: Condvar,
}

impl SharedQueue {
    fn new() -> Self {
        SharedQueue {
            state: Mutex::new(QueueState::default()),
            condvar: Condvar::new(),
        }
    }

    fn push(&self, job: QueuedJob) {
        let mut state = self.state.lock().unwrap();
        state.heap.push(job);
        self.condvar.notify_one();
    }

    fn pop(&self) -> Option<QueuedJob> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(job) = state.heap.pop() {
                return Some(job);
            }
            if state.shutdown {
                return None;
            }
            state = self.condvar.wait(state).unwrap();
        }
    }

    fn shutdown(&self) {
        let mut state = self.state.lock().unwrap();
        state.shutdown = true;
        self.condvar.notify_all();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub glitched: u64,
    pub total_wall_time: Duration,
}

impl Stats {
    pub fn average_wall_time(&self) -> Duration {
        let n = self.completed.max(1);
        self.total_wall_time / n as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy,
    Error,
    Terminated,
}

/// A pool of `W` worker threads draining a shared priority queue. Completion
/// results flow out through one `mpsc` channel; statistics are tracked under
/// a mutex since precise consistency isn't required (§5).
pub struct Scheduler {
    queue: Arc<SharedQueue>,
    result_tx: Sender<JobResult>,
    result_rx: Receiver<JobResult>,
    threads: Vec<JoinHandle<()>>,
    worker_states: Arc<Mutex<Vec<WorkerState>>>,
    stats: Arc<Mutex<Stats>>,
    next_sequence: AtomicU64,
    max_restarts_per_worker: u32,
}

impl Scheduler {
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let queue = Arc::new(SharedQueue::new());
        let (result_tx, result_rx) = mpsc::channel();
        let worker_states = Arc::new(Mutex::new(vec![WorkerState::Idle; worker_count]));
        let stats = Arc::new(Mutex::new(Stats::default()));

        let max_restarts_per_worker = 3;
        let mut threads = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            threads.push(spawn_worker(
                worker_id,
                queue.clone(),
                result_tx.clone(),
                worker_states.clone(),
                stats.clone(),
                max_restarts_per_worker,
            ));
        }

        Scheduler {
            queue,
            result_tx,
            result_rx,
            threads,
            worker_states,
            stats,
            next_sequence: AtomicU64::new(0),
            max_restarts_per_worker,
        }
    }

    pub fn submit(&self, job: Job) {
        let mut stats = self.stats.lock().unwrap();
        stats.submitted += 1;
        drop(stats);

        let sequence = self.next_sequence.fetch_add(1, AtomicOrdering::Relaxed);
        self.queue.push(QueuedJob {
            priority: job.priority,
            sequence,
            job,
        });
    }

    /// Non-blocking drain: returns the next available completion, if any.
    pub fn try_recv(&self) -> Option<JobResult> {
        self.result_rx.try_recv().ok()
    }

    pub fn stats(&self) -> Stats {
        *self.stats.lock().unwrap()
    }

    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.worker_states.lock().unwrap().clone()
    }

    pub fn dispose(self) {
        self.queue.shutdown();
        for handle in self.threads {
            let _ = handle.join();
        }
    }

    pub fn max_restarts_per_worker(&self) -> u32 {
        self.max_restarts_per_worker
    }
}

fn spawn_worker(
    worker_id: usize,
    queue: Arc<SharedQueue>,
    result_tx: Sender<JobResult>,
    worker_states: Arc<Mutex<Vec<WorkerState>>>,
    stats: Arc<Mutex<Stats>>,
    max_restarts: u32,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name(format!("fractal-worker-{worker_id}"))
        .spawn(move || {
            let mut restarts = 0u32;

            while let Some(queued) = queue.pop() {
                set_state(&worker_states, worker_id, WorkerState::Busy);

                if queued.job.cancel_flag.load(AtomicOrdering::Relaxed) {
                    record(&stats, |s| s.cancelled += 1);
                    let _ = result_tx.send(JobResult {
                        id: queued.job.id,
                        outcome: JobOutcome::Cancelled,
                        wall_time: Duration::ZERO,
                    });
                    set_state(&worker_states, worker_id, WorkerState::Idle);
                    continue;
                }

                let start = Instant::now();
                let id = queued.job.id;
                let cancel_flag = queued.job.cancel_flag.clone();
                let run = &queued.job.run;

                let mut outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(&cancel_flag)));
                if outcome.is_err() {
                    warn!("worker {worker_id} panicked on job {id}, retrying once");
                    outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(&cancel_flag)));
                }
                let wall_time = start.elapsed();

                match outcome {
                    Ok(outcome) => {
                        match &outcome {
                            JobOutcome::Completed(_) => record(&stats, |s| {
                                s.completed += 1;
                                s.total_wall_time += wall_time;
                            }),
                            JobOutcome::Glitched(_) => record(&stats, |s| {
                                s.glitched += 1;
                                s.total_wall_time += wall_time;
                            }),
                            JobOutcome::Cancelled => record(&stats, |s| s.cancelled += 1),
                            JobOutcome::Failed(reason) => {
                                warn!("worker {worker_id} job {id} failed: {reason}");
                                record(&stats, |s| s.failed += 1);
                            }
                        }
                        let _ = result_tx.send(JobResult { id, outcome, wall_time });
                        set_state(&worker_states, worker_id, WorkerState::Idle);
                    }
                    Err(_) => {
                        warn!("worker {worker_id} panicked on job {id} a second time, giving up on it");
                        record(&stats, |s| s.failed += 1);
                        let _ = result_tx.send(JobResult {
                            id,
                            outcome: JobOutcome::Failed("worker panicked twice on the same job".into()),
                            wall_time,
                        });

                        restarts += 1;
                        if restarts >= max_restarts {
                            warn!("worker {worker_id} exceeded {max_restarts} restarts, retiring it permanently");
                            set_state(&worker_states, worker_id, WorkerState::Terminated);
                            return;
                        }
                        set_state(&worker_states, worker_id, WorkerState::Error);
                        set_state(&worker_states, worker_id, WorkerState::Idle);
                    }
                }
            }
            debug!("worker {worker_id} shutting down");
            set_state(&worker_states, worker_id, WorkerState::Terminated);
        })
        .expect("failed to spawn fractal worker thread")
}

fn set_state(worker_states: &Arc<Mutex<Vec<WorkerState>>>, worker_id: usize, state: WorkerState) {
    worker_states.lock().unwrap()[worker_id] = state;
}

fn record(stats: &Arc<Mutex<Stats>>, f: impl FnOnce(&mut Stats)) {
    f(&mut stats.lock().unwrap());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn make_job(id: JobId, priority: JobPriority, result: &'static str) -> Job {
        Job {
            id,
            priority,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            run: Box::new(move |_cancel| JobOutcome::Completed(result.as_bytes().to_vec())),
        }
    }

    #[test]
    fn submitted_job_completes_and_drains_via_try_recv() {
        let scheduler = Scheduler::new(1);
        scheduler.submit(make_job(1, JobPriority::Normal, "ok"));

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut result = None;
        while Instant::now() < deadline {
            if let Some(r) = scheduler.try_recv() {
                result = Some(r);
                break;
            }
            std::thread::yield_now();
        }

        let result = result.expect("job should complete");
        assert_eq!(result.id, 1);
        assert!(matches!(result.outcome, JobOutcome::Completed(_)));
        scheduler.dispose();
    }

    #[test]
    fn cancelled_job_reports_cancelled_outcome() {
        let scheduler = Scheduler::new(1);
        let cancel_flag = Arc::new(AtomicBool::new(true));
        let job = Job {
            id: 2,
            priority: JobPriority::Low,
            cancel_flag: cancel_flag.clone(),
            run: Box::new(|_| JobOutcome::Completed(vec![])),
        };
        scheduler.submit(job);

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut result = None;
        while Instant::now() < deadline {
            if let Some(r) = scheduler.try_recv() {
                result = Some(r);
                break;
            }
            std::thread::yield_now();
        }
        assert!(matches!(result.unwrap().outcome, JobOutcome::Cancelled));
        scheduler.dispose();
    }

    #[test]
    fn panicking_job_is_isolated_and_reported_as_failed() {
        let scheduler = Scheduler::new(1);
        let job = Job {
            id: 3,
            priority: JobPriority::Normal,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            run: Box::new(|_| panic!("kernel exploded")),
        };
        scheduler.submit(job);
        scheduler.submit(make_job(4, JobPriority::Normal, "recovered"));

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut results = Vec::new();
        while results.len() < 2 && Instant::now() < deadline {
            if let Some(r) = scheduler.try_recv() {
                results.push(r);
            }
        }
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|r| matches!(r.outcome, JobOutcome::Failed(_))));
        scheduler.dispose();
    }

    #[test]
    fn worker_retires_after_exceeding_its_restart_budget() {
        let scheduler = Scheduler::new(1);
        let always_panics = || Job {
            id: 0,
            priority: JobPriority::Normal,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            run: Box::new(|_| panic!("kernel exploded")),
        };

        // max_restarts_per_worker is 3: three consecutive panicking jobs
        // (each already surviving one in-place retry) drive the single
        // worker to its budget and it retires permanently on the third.
        for id in 0..3 {
            let mut job = always_panics();
            job.id = id;
            scheduler.submit(job);
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut failed_count = 0;
        while failed_count < 3 && Instant::now() < deadline {
            if let Some(r) = scheduler.try_recv() {
                assert!(matches!(r.outcome, JobOutcome::Failed(_)));
                failed_count += 1;
            }
        }
        assert_eq!(failed_count, 3);

        let retire_deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < retire_deadline {
            if scheduler.worker_states() == vec![WorkerState::Terminated] {
                break;
            }
            std::thread::yield_now();
        }
        assert_eq!(scheduler.worker_states(), vec![WorkerState::Terminated]);

        // The worker is gone; this job sits in the queue forever.
        scheduler.submit(make_job(99, JobPriority::Normal, "stranded"));
        assert!(scheduler.try_recv().is_none());
        scheduler.dispose();
    }

    #[test]
    fn higher_priority_jobs_are_favored_in_ordering() {
        let low = QueuedJob {
            priority: JobPriority::Low,
            sequence: 0,
            job: make_job(1, JobPriority::Low, "a"),
        };
        let high = QueuedJob {
            priority: JobPriority::High,
            sequence: 1,
            job: make_job(2, JobPriority::High, "b"),
        };
        assert!(high > low);
    }
}
