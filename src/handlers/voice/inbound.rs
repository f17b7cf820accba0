//! Inbound frame queue between the socket reader and the session task.
//!
//! The queue is bounded twice: by frame count and by the bytes the queued
//! frames hold. Pushing never waits, so the reader keeps polling the socket
//! (and notices a disconnect) while the session is busy with a provider call.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use bytes::Bytes;

/// Raw frame handed from the socket reader to the session task.
#[derive(Debug, Clone)]
pub enum InboundFrame {
    Text(String),
    Binary(Bytes),
}

impl InboundFrame {
    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            InboundFrame::Text(text) => text.len(),
            InboundFrame::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why a frame was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    #[error("inbound queue is full")]
    Full,
    #[error("session has stopped")]
    Closed,
}

/// Create a queue holding at most `max_frames` frames and `max_bytes` bytes.
pub fn inbound_queue(max_frames: usize, max_bytes: usize) -> (InboundSender, InboundReceiver) {
    let (tx, rx) = mpsc::channel(max_frames.max(1));
    let capacity = max_bytes.clamp(1, u32::MAX as usize);
    let sender = InboundSender {
        tx,
        budget: Arc::new(Semaphore::new(capacity)),
        capacity,
    };
    (sender, InboundReceiver { rx })
}

/// Reader side of the queue.
#[derive(Clone)]
pub struct InboundSender {
    tx: mpsc::Sender<(InboundFrame, OwnedSemaphorePermit)>,
    budget: Arc<Semaphore>,
    capacity: usize,
}

impl InboundSender {
    /// Queue a frame without waiting.
    pub fn try_push(&self, frame: InboundFrame) -> Result<(), PushError> {
        if self.tx.is_closed() {
            return Err(PushError::Closed);
        }
        // Empty frames still occupy a slot.
        let weight = u32::try_from(frame.len().max(1)).map_err(|_| PushError::Full)?;
        let permit = self
            .budget
            .clone()
            .try_acquire_many_owned(weight)
            .map_err(|_| PushError::Full)?;

        self.tx.try_send((frame, permit)).map_err(|e| match e {
            TrySendError::Full(_) => PushError::Full,
            TrySendError::Closed(_) => PushError::Closed,
        })
    }

    /// Bytes currently held by queued frames.
    pub fn queued_bytes(&self) -> usize {
        self.capacity.saturating_sub(self.budget.available_permits())
    }
}

/// Session side of the queue.
pub struct InboundReceiver {
    rx: mpsc::Receiver<(InboundFrame, OwnedSemaphorePermit)>,
}

impl InboundReceiver {
    /// Next frame in arrival order; its bytes are returned to the budget.
    pub async fn recv(&mut self) -> Option<InboundFrame> {
        self.rx.recv().await.map(|(frame, _permit)| frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(len: usize) -> InboundFrame {
        InboundFrame::Binary(Bytes::from(vec![0u8; len]))
    }

    #[tokio::test]
    async fn test_frames_come_out_in_order() {
        let (tx, mut rx) = inbound_queue(4, 1024);
        tx.try_push(InboundFrame::Text("a".into())).unwrap();
        tx.try_push(binary(3)).unwrap();

        assert!(matches!(rx.recv().await, Some(InboundFrame::Text(t)) if t == "a"));
        assert!(matches!(rx.recv().await, Some(InboundFrame::Binary(b)) if b.len() == 3));
    }

    #[tokio::test]
    async fn test_frame_count_limit() {
        let (tx, mut rx) = inbound_queue(2, 1024);
        tx.try_push(binary(1)).unwrap();
        tx.try_push(binary(1)).unwrap();
        assert_eq!(tx.try_push(binary(1)), Err(PushError::Full));

        rx.recv().await.unwrap();
        assert!(tx.try_push(binary(1)).is_ok());
    }

    #[tokio::test]
    async fn test_byte_limit_and_release() {
        let (tx, mut rx) = inbound_queue(64, 100);
        tx.try_push(binary(60)).unwrap();
        assert_eq!(tx.queued_bytes(), 60);
        assert_eq!(tx.try_push(binary(50)), Err(PushError::Full));
        tx.try_push(binary(40)).unwrap();
        assert_eq!(tx.queued_bytes(), 100);

        rx.recv().await.unwrap();
        assert_eq!(tx.queued_bytes(), 40);
        assert!(tx.try_push(binary(50)).is_ok());
    }

    #[tokio::test]
    async fn test_oversized_frame_is_rejected() {
        let (tx, _rx) = inbound_queue(8, 16);
        assert_eq!(tx.try_push(binary(17)), Err(PushError::Full));
        assert_eq!(tx.queued_bytes(), 0);
    }

    #[tokio::test]
    async fn test_push_after_receiver_dropped() {
        let (tx, rx) = inbound_queue(8, 16);
        drop(rx);
        assert_eq!(tx.try_push(binary(1)), Err(PushError::Closed));
    }

    #[tokio::test]
    async fn test_recv_ends_when_senders_dropped() {
        let (tx, mut rx) = inbound_queue(8, 16);
        tx.try_push(binary(1)).unwrap();
        drop(tx);
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }
}
