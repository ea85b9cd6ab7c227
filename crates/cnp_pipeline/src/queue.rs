use thiserror::Error;
use tokio::sync::mpsc;

/// Returned by [`QueueProducer::try_push`] with the rejected item.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("queue is full")]
pub struct QueueFull<T>(pub T);

/// Returned by [`QueueProducer::push`] when the consumer is gone.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("queue consumer dropped")]
pub struct QueueClosed<T>(pub T);

/// FIFO with a fixed upper bound. Producers wait for space instead of growing
/// the queue; a single consumer drains it.
pub fn bounded<T>(capacity: usize) -> (QueueProducer<T>, QueueConsumer<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (QueueProducer { tx }, QueueConsumer { rx })
}

#[derive(Debug, Clone)]
pub struct QueueProducer<T> {
    tx: mpsc::Sender<T>,
}

impl<T> QueueProducer<T> {
    /// Enqueue, waiting while the queue is at capacity.
    pub async fn push(&self, item: T) -> Result<(), QueueClosed<T>> {
        self.tx.send(item).await.map_err(|e| QueueClosed(e.0))
    }

    pub fn try_push(&self, item: T) -> Result<(), QueueFull<T>> {
        self.tx.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(item) | mpsc::error::TrySendError::Closed(item) => QueueFull(item),
        })
    }

    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

#[derive(Debug)]
pub struct QueueConsumer<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> QueueConsumer<T> {
    /// Next item, or `None` once every producer is dropped and the queue is empty.
    pub async fn pop(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Everything queued right now, without waiting.
    pub fn drain_ready(&mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            items.push(item);
        }
        items
    }

    /// Everything until the producers hang up.
    pub async fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Some(item) = self.rx.recv().await {
            items.push(item);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_try_push_never_exceeds_capacity() {
        let (tx, mut rx) = bounded(3);
        for i in 0..3 {
            tx.try_push(i).unwrap();
        }
        assert_eq!(tx.try_push(99), Err(QueueFull(99)));
        assert_eq!(tx.len(), 3);
        assert_eq!(tx.capacity(), 3);

        assert_eq!(rx.drain_ready(), vec![0, 1, 2]);
        assert!(tx.is_empty());
    }

    #[tokio::test]
    async fn test_push_waits_for_space() {
        let (tx, mut rx) = bounded(1);
        tx.push("a").await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), tx.push("b")).await;
        assert!(blocked.is_err(), "push should wait while full");
        assert_eq!(tx.len(), 1);

        let producer = tokio::spawn(async move {
            tx.push("b").await.unwrap();
            tx.push("c").await.unwrap();
        });
        let mut seen = Vec::new();
        while let Some(item) = rx.pop().await {
            seen.push(item);
        }
        producer.await.unwrap();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_closed_queue() {
        let (tx, rx) = bounded::<u8>(2);
        drop(rx);
        assert_eq!(tx.push(1).await, Err(QueueClosed(1)));

        let (tx, mut rx) = bounded::<u8>(0);
        assert_eq!(tx.capacity(), 1);
        tx.try_push(5).unwrap();
        drop(tx);
        assert_eq!(rx.drain().await, vec![5]);
    }
}
