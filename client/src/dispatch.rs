//! Delivery contexts for completion callbacks.
//!
//! A UI layer usually wants results on its own event thread. [`MainQueue`]
//! is the receiving end owned by that thread, [`MainQueueHandle`] is the
//! sending end handed to the fetcher.

use futures::{channel::mpsc, StreamExt};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Runs the job right away on whichever task completed the fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Dispatcher for Immediate {
    fn dispatch(&self, job: Job) {
        job()
    }
}

#[derive(Clone)]
pub struct MainQueueHandle {
    sender: mpsc::UnboundedSender<Job>,
}

impl Dispatcher for MainQueueHandle {
    fn dispatch(&self, job: Job) {
        if self.sender.unbounded_send(job).is_err() {
            log::warn!("Delivery queue is closed, dropping completion");
        }
    }
}

pub struct MainQueue {
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl MainQueue {
    pub fn new() -> (MainQueueHandle, MainQueue) {
        let (sender, receiver) = mpsc::unbounded();
        (MainQueueHandle { sender }, MainQueue { receiver })
    }

    /// Run every job queued so far on the calling thread and return how many ran.
    pub fn drain(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(Some(job)) = self.receiver.try_next() {
            job();
            ran += 1;
        }
        ran
    }

    /// Run jobs as they arrive until every handle has been dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.receiver.next().await {
            job();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };
    use std::thread;

    #[test]
    fn test_immediate_runs_inline() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        Immediate.dispatch(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drain_runs_on_owner_thread() {
        let (handle, mut queue) = MainQueue::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let worker = {
            let seen = seen.clone();
            thread::spawn(move || {
                for _ in 0..3 {
                    let seen = seen.clone();
                    handle.dispatch(Box::new(move || {
                        seen.lock().unwrap().push(thread::current().id());
                    }));
                }
            })
        };
        worker.join().unwrap();

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(queue.drain(), 3);
        assert_eq!(queue.drain(), 0);

        let owner = thread::current().id();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|id| *id == owner));
    }

    #[test]
    fn test_dispatch_after_queue_dropped() {
        let (handle, queue) = MainQueue::new();
        drop(queue);
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        handle.dispatch(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_until_handles_dropped() {
        let (handle, queue) = MainQueue::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let counter = count.clone();
            handle.dispatch(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        drop(handle);
        queue.run().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
