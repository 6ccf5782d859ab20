//! Test-only thread pool used to drive concurrent scenarios (parallel
//! refill, no-duplicates-under-contention) without hand-rolling thread
//! bookkeeping in every test.
//!
//! Joins every worker on drop, and `join()` blocks the caller until every
//! submitted job has finished.

#![allow(clippy::mutex_atomic)]

use crossbeam_channel::{unbounded, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

struct Job(Box<dyn FnOnce() + Send + 'static>);

enum Message {
    NewJob(Job),
    Terminate,
}

struct Worker {
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            thread.join().unwrap();
        }
    }
}

#[derive(Default)]
struct PoolInner {
    job_count: Mutex<usize>,
    empty_condvar: Condvar,
}

impl PoolInner {
    fn start_job(&self) {
        *self.job_count.lock().unwrap() += 1;
    }

    fn finish_job(&self) {
        let mut count = self.job_count.lock().unwrap();
        assert!(*count > 0);
        *count -= 1;
        if *count == 0 {
            self.empty_condvar.notify_one();
        }
    }

    fn wait_empty(&self) {
        let mut count = self.job_count.lock().unwrap();
        while *count > 0 {
            count = self.empty_condvar.wait(count).unwrap();
        }
    }
}

/// A fixed-size pool of worker threads for fan-out tests.
pub(crate) struct ThreadPool {
    workers: Vec<Worker>,
    job_sender: Option<Sender<Message>>,
    inner: Arc<PoolInner>,
}

impl ThreadPool {
    pub(crate) fn new(size: usize) -> Self {
        assert!(size > 0);
        let (sender, receiver) = unbounded();
        let inner = Arc::new(PoolInner::default());

        let workers = (0..size)
            .map(|_| {
                let inner = inner.clone();
                let receiver = receiver.clone();
                let thread = thread::spawn(move || loop {
                    match receiver.recv().unwrap() {
                        Message::NewJob(job) => {
                            job.0();
                            inner.finish_job();
                        }
                        Message::Terminate => break,
                    }
                });
                Worker {
                    thread: Some(thread),
                }
            })
            .collect();

        ThreadPool {
            workers,
            job_sender: Some(sender),
            inner,
        }
    }

    pub(crate) fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.start_job();
        self.job_sender
            .as_ref()
            .unwrap()
            .send(Message::NewJob(Job(Box::new(f))))
            .unwrap();
    }

    /// Blocks until every job submitted so far has finished.
    pub(crate) fn join(&self) {
        self.inner.wait_empty();
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        for _ in &self.workers {
            self.job_sender
                .as_ref()
                .unwrap()
                .send(Message::Terminate)
                .unwrap();
        }
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                thread.join().unwrap();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn join_waits_for_every_job() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..256 {
            let counter = counter.clone();
            pool.execute(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
        pool.join();
        assert_eq!(counter.load(Ordering::Relaxed), 256);
    }
}
