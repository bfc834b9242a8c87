//! Bounded dispatch queue (spec §4.6).
//!
//! Producers get a cheap, cloneable, non-blocking handle. The worker gets
//! exclusive ownership of the receiving half plus an in-memory requeue list
//! for frames that failed to send; `take`/`poll` always drain the requeue
//! list before the channel, which is what gives requeued frames FIFO
//! priority over newly enqueued ones (spec §9: head-insertion resolves the
//! open question on requeue ordering).

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;

/// Returned by [`DispatchQueue::try_enqueue`] when the bounded channel is at
/// capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

/// Producer-facing handle. Cheap to clone; every clone shares the same
/// bounded channel.
#[derive(Clone)]
pub struct DispatchQueue {
    sender: mpsc::Sender<Vec<u8>>,
    capacity: usize,
}

impl DispatchQueue {
    /// Create a bounded queue of `capacity` and the worker-owned receiving
    /// half.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, WorkerQueue) {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, capacity }, WorkerQueue { receiver, requeue: VecDeque::new() })
    }

    /// Offer a frame. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`QueueFull`] if the channel is at capacity.
    pub fn try_enqueue(&self, frame: Vec<u8>) -> Result<(), QueueFull> {
        self.sender.try_send(frame).map_err(|_| QueueFull)
    }

    /// Approximate number of frames currently buffered in the channel.
    ///
    /// Does not see frames sitting in the worker's private requeue list, so
    /// it is a lower bound while a requeue is outstanding, not an exact
    /// count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    /// Whether the channel side of the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Worker-exclusive half: the channel receiver plus the requeue list.
///
/// Not `Clone` and not `Send` across worker instances by design — spec §4.6
/// invariant: "at most one worker exists".
pub struct WorkerQueue {
    receiver: mpsc::Receiver<Vec<u8>>,
    requeue: VecDeque<Vec<u8>>,
}

impl WorkerQueue {
    /// Block until a frame is available: a requeued frame first, otherwise
    /// the next enqueued one. Returns `None` once the queue is closed
    /// (service stopped) and the requeue list is empty.
    pub async fn take(&mut self) -> Option<Vec<u8>> {
        if let Some(frame) = self.requeue.pop_front() {
            return Some(frame);
        }
        self.receiver.recv().await
    }

    /// Wait up to `timeout` for the next frame, requeued frames still taking
    /// priority. Returns `None` on timeout or once the queue is closed and
    /// drained.
    pub async fn poll(&mut self, timeout: Duration) -> Option<Vec<u8>> {
        if let Some(frame) = self.requeue.pop_front() {
            return Some(frame);
        }
        tokio::time::timeout(timeout, self.receiver.recv()).await.unwrap_or(None)
    }

    /// Hand a frame that failed to send back to the head of the queue, to be
    /// retried before any newly enqueued frame (spec §8 property 6).
    pub fn requeue(&mut self, frame: Vec<u8>) {
        self.requeue.push_front(frame);
    }

    /// Approximate number of frames currently waiting (requeued plus
    /// channel-buffered). Exposed for observability, not for synchronization.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requeue.len() + self.receiver.len()
    }

    /// Whether the queue is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn requeued_frame_precedes_channel_frame() {
        let (producer, mut worker) = DispatchQueue::new(4);
        producer.try_enqueue(vec![2]).unwrap();
        worker.requeue(vec![1]);

        assert_eq!(worker.take().await, Some(vec![1]));
        assert_eq!(worker.take().await, Some(vec![2]));
    }

    #[test]
    fn try_enqueue_fails_at_capacity() {
        let (producer, _worker) = DispatchQueue::new(1);
        producer.try_enqueue(vec![1]).unwrap();
        assert_eq!(producer.try_enqueue(vec![2]), Err(QueueFull));
    }

    #[tokio::test]
    async fn poll_times_out_when_empty() {
        let (_producer, mut worker) = DispatchQueue::new(1);
        let result = worker.poll(Duration::from_millis(10)).await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn take_returns_none_once_closed_and_drained() {
        let (producer, mut worker) = DispatchQueue::new(1);
        drop(producer);
        assert_eq!(worker.take().await, None);
    }

    #[tokio::test]
    async fn concurrent_producers_respect_capacity_matching_scenario_s5() {
        let (producer, _worker) = DispatchQueue::new(2);
        let mut handles = Vec::new();
        for i in 0..3u8 {
            let producer = producer.clone();
            handles.push(tokio::spawn(async move { producer.try_enqueue(vec![i]) }));
        }

        let mut ok = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(QueueFull) => full += 1,
            }
        }
        assert_eq!(ok, 2);
        assert_eq!(full, 1);
    }
}
