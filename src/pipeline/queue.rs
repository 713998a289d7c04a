//! Bounded single-producer single-consumer frame queue.
//!
//! A thin layer over a `crossbeam-channel` bounded channel: the producer
//! blocks while the queue is full (frames are never dropped), and either
//! side can see when the other has gone away.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TryRecvError};

use super::StopFlag;
use crate::error::{Result, VisError};

/// Outcome of a non-blocking or bounded pop
#[derive(Debug, PartialEq)]
pub enum Pop<T> {
    Item(T),
    /// Nothing buffered, producer still alive
    Empty,
    /// Nothing buffered and the producer is gone
    Closed,
}

/// Result of a push that honours a stop request
#[derive(Debug, PartialEq, Eq)]
pub enum Push {
    Sent,
    Stopped,
}

/// Create a queue holding at most `capacity` items
pub fn bounded_queue<T>(capacity: usize) -> Result<(QueueSender<T>, QueueReceiver<T>)> {
    if capacity == 0 {
        return Err(VisError::config("queue capacity must be > 0"));
    }
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    Ok((QueueSender { tx }, QueueReceiver { rx }))
}

/// Producer end
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: Sender<T>,
}

impl<T> QueueSender<T> {
    /// Block until there is room; `QueueClosed` if the consumer is gone
    pub fn push(&self, item: T) -> Result<()> {
        self.tx.send(item).map_err(|_| VisError::QueueClosed)
    }

    /// Block until there is room or `stop` is requested, re-checking the
    /// flag every `poll`
    pub fn push_until(&self, mut item: T, stop: &StopFlag, poll: Duration) -> Result<Push> {
        loop {
            if stop.is_requested() {
                return Ok(Push::Stopped);
            }
            match self.tx.send_timeout(item, poll) {
                Ok(()) => return Ok(Push::Sent),
                Err(SendTimeoutError::Timeout(back)) => item = back,
                Err(SendTimeoutError::Disconnected(_)) => {
                    // A consumer dropped during shutdown is not a failure
                    if stop.is_requested() {
                        return Ok(Push::Stopped);
                    }
                    return Err(VisError::QueueClosed);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(0)
    }
}

/// Consumer end
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: Receiver<T>,
}

impl<T> QueueReceiver<T> {
    pub fn try_pop(&self) -> Pop<T> {
        match self.rx.try_recv() {
            Ok(item) => Pop::Item(item),
            Err(TryRecvError::Empty) => Pop::Empty,
            Err(TryRecvError::Disconnected) => Pop::Closed,
        }
    }

    pub fn pop_timeout(&self, timeout: Duration) -> Pop<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Pop::Item(item),
            Err(RecvTimeoutError::Timeout) => Pop::Empty,
            Err(RecvTimeoutError::Disconnected) => Pop::Closed,
        }
    }

    /// Throw away everything currently buffered; returns how many items
    pub fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            bounded_queue::<u32>(0),
            Err(VisError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn fifo_order() {
        let (tx, rx) = bounded_queue(4).unwrap();
        for i in 0..4 {
            tx.push(i).unwrap();
        }
        assert_eq!(tx.len(), 4);
        for i in 0..4 {
            assert_eq!(rx.try_pop(), Pop::Item(i));
        }
        assert_eq!(rx.try_pop(), Pop::Empty);
    }

    #[test]
    fn closed_only_after_drain() {
        let (tx, rx) = bounded_queue(2).unwrap();
        tx.push("a").unwrap();
        drop(tx);
        assert_eq!(rx.try_pop(), Pop::Item("a"));
        assert_eq!(rx.try_pop(), Pop::Closed);
        assert_eq!(rx.pop_timeout(Duration::from_millis(5)), Pop::Closed);
    }

    #[test]
    fn push_to_dropped_consumer_fails() {
        let (tx, rx) = bounded_queue(1).unwrap();
        drop(rx);
        assert!(matches!(tx.push(1), Err(VisError::QueueClosed)));
        assert!(matches!(
            tx.push_until(1, &StopFlag::new(), Duration::from_millis(1)),
            Err(VisError::QueueClosed)
        ));
    }

    #[test]
    fn push_until_gives_up_on_stop() {
        let (tx, _rx) = bounded_queue(1).unwrap();
        tx.push(0).unwrap();

        let stop = StopFlag::new();
        let remote = stop.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            remote.request();
        });

        let outcome = tx.push_until(1, &stop, Duration::from_millis(5)).unwrap();
        assert_eq!(outcome, Push::Stopped);
        stopper.join().unwrap();
    }

    #[test]
    fn drain_empties_queue() {
        let (tx, rx) = bounded_queue(3).unwrap();
        for i in 0..3 {
            tx.push(i).unwrap();
        }
        assert_eq!(rx.drain(), 3);
        assert!(rx.is_empty());
    }
}
