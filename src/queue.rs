//! The bounded datagram queue shared between the UDP receive loop and its
//! consumers, standing in for Python's `Queue.join()`/`task_done()`
//! contract from `pymads.server.DnsServer`/`pymads.consumer.Consumer`: a
//! bounded `tokio::sync::mpsc` channel plus an in-flight counter so
//! `join()` can wait for every enqueued item to be marked done, not just
//! for the channel to empty out.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex, Notify};

/// A raw datagram plus the peer address it arrived from.
pub type Datagram = (Vec<u8>, SocketAddr);

pub struct DatagramQueue {
    sender: mpsc::Sender<Datagram>,
    receiver: Mutex<mpsc::Receiver<Datagram>>,
    in_flight: AtomicUsize,
    drained: Notify,
}

impl DatagramQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(receiver),
            in_flight: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    /// Enqueue a datagram, blocking if the bounded queue is full.
    pub async fn enqueue(&self, datagram: Datagram) -> Result<(), mpsc::error::SendError<Datagram>> {
        self.sender.send(datagram).await?;
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Dequeue with a timeout, returning `None` if nothing arrived in time
    /// (spec section 4.7's consumer loop: "dequeue with the server's
    /// timeout; on timeout, return").
    pub async fn dequeue_timeout(&self, timeout: Duration) -> Option<Datagram> {
        let mut receiver = self.receiver.lock().await;
        tokio::time::timeout(timeout, receiver.recv())
            .await
            .ok()
            .flatten()
    }

    /// Mark one previously dequeued item as fully processed.
    pub fn task_done(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every enqueued item has reached [`Self::task_done`].
    ///
    /// The `notified()` future is created *before* checking `in_flight`, not
    /// after: otherwise a `task_done()` landing between the check and the
    /// `.await` would call `notify_waiters()` while nothing is registered to
    /// receive it yet, and this would hang until some unrelated later
    /// decrement happened to wake it.
    pub async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:53".parse().unwrap()
    }

    #[tokio::test]
    async fn dequeue_times_out_when_empty() {
        let queue = DatagramQueue::new(4);
        let result = queue.dequeue_timeout(Duration::from_millis(10)).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn enqueue_then_dequeue_round_trips() {
        let queue = DatagramQueue::new(4);
        queue.enqueue((vec![1, 2, 3], addr())).await.unwrap();
        let (bytes, _) = queue
            .dequeue_timeout(Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn join_waits_for_task_done() {
        let queue = std::sync::Arc::new(DatagramQueue::new(4));
        queue.enqueue((vec![1], addr())).await.unwrap();
        assert_eq!(queue.in_flight(), 1);

        let joiner = {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue.join().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!joiner.is_finished());

        let (_, _) = queue.dequeue_timeout(Duration::from_millis(10)).await.unwrap();
        queue.task_done();

        tokio::time::timeout(Duration::from_millis(200), joiner)
            .await
            .expect("join should complete after task_done")
            .unwrap();
    }
}
