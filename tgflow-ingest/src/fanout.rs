//! Typed hand-off streams from the classifier to passive consumers.
//!
//! Each stream is a bounded mpsc channel. Delivery awaits free capacity, so a subscribed consumer
//! that stops reading stalls ingestion. A stream nobody subscribed to is skipped, and so is one
//! whose receiver was dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tgflow_core::{ChatMemberUpdated, Poll, PollAnswer, Update, UpdateKind};
use tokio::sync::mpsc;
use tracing::debug;

/// Stream an update is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Updates,
    Polls,
    PollAnswers,
    ChatMembers,
}

/// Routing rule: non-empty poll id → polls; poll answers and member changes to their own streams;
/// everything else (including polls without an id) → generic updates.
pub fn route(update: &Update) -> StreamKind {
    if update.poll_id().is_some() {
        return StreamKind::Polls;
    }
    match update.kind {
        UpdateKind::PollAnswer(_) => StreamKind::PollAnswers,
        UpdateKind::MyChatMember(_) | UpdateKind::ChatMember(_) => StreamKind::ChatMembers,
        _ => StreamKind::Updates,
    }
}

struct Slot<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<Option<mpsc::Receiver<T>>>,
    subscribed: AtomicBool,
}

impl<T> Slot<T> {
    fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            subscribed: AtomicBool::new(false),
        }
    }

    fn take(&self) -> Option<mpsc::Receiver<T>> {
        let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner).take();
        if rx.is_some() {
            self.subscribed.store(true, Ordering::Release);
        }
        rx
    }

    async fn send(&self, item: T, stream: StreamKind, update_id: i64) -> bool {
        if !self.subscribed.load(Ordering::Acquire) {
            return false;
        }
        if self.tx.send(item).await.is_err() {
            debug!(stream = ?stream, update_id = update_id, "Stream receiver dropped; skipping");
            return false;
        }
        true
    }
}

/// The four consumer streams.
pub struct Fanout {
    updates: Slot<Update>,
    polls: Slot<Poll>,
    poll_answers: Slot<PollAnswer>,
    chat_members: Slot<ChatMemberUpdated>,
}

impl Fanout {
    pub fn new(capacity: usize) -> Self {
        Self {
            updates: Slot::new(capacity),
            polls: Slot::new(capacity),
            poll_answers: Slot::new(capacity),
            chat_members: Slot::new(capacity),
        }
    }

    /// Generic update stream. Handed out once; later calls return `None`.
    pub fn updates(&self) -> Option<mpsc::Receiver<Update>> {
        self.updates.take()
    }

    pub fn polls(&self) -> Option<mpsc::Receiver<Poll>> {
        self.polls.take()
    }

    pub fn poll_answers(&self) -> Option<mpsc::Receiver<PollAnswer>> {
        self.poll_answers.take()
    }

    pub fn chat_members(&self) -> Option<mpsc::Receiver<ChatMemberUpdated>> {
        self.chat_members.take()
    }

    /// Sends `update` to the stream [`route`] picks. Waits while that stream is full. Returns
    /// whether a consumer received it.
    pub async fn deliver(&self, update: Update) -> bool {
        let stream = route(&update);
        let update_id = update.update_id;
        match (stream, update.kind) {
            (StreamKind::Polls, UpdateKind::Poll(poll)) => {
                self.polls.send(poll, stream, update_id).await
            }
            (StreamKind::PollAnswers, UpdateKind::PollAnswer(answer)) => {
                self.poll_answers.send(answer, stream, update_id).await
            }
            (StreamKind::ChatMembers, UpdateKind::MyChatMember(member))
            | (StreamKind::ChatMembers, UpdateKind::ChatMember(member)) => {
                self.chat_members.send(member, stream, update_id).await
            }
            (_, kind) => {
                self.updates
                    .send(Update { update_id, kind }, StreamKind::Updates, update_id)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_route() {
        let poll = update(json!({"update_id": 1, "poll": {"id": "p1", "question": "?"}}));
        let anonymous = update(json!({"update_id": 2, "poll": {"id": "", "question": "?"}}));
        let answer = update(json!({"update_id": 3, "poll_answer": {"poll_id": "p1", "option_ids": [0]}}));
        let member = update(json!({"update_id": 4, "my_chat_member": {
            "chat": {"id": 1, "type": "group"}, "from": {"id": 2, "first_name": "A"}, "date": 0
        }}));
        let text = update(json!({"update_id": 5, "message": {
            "message_id": 1, "chat": {"id": 1, "type": "private"}, "text": "hi"
        }}));

        assert_eq!(route(&poll), StreamKind::Polls);
        assert_eq!(route(&anonymous), StreamKind::Updates);
        assert_eq!(route(&answer), StreamKind::PollAnswers);
        assert_eq!(route(&member), StreamKind::ChatMembers);
        assert_eq!(route(&text), StreamKind::Updates);
    }

    #[tokio::test]
    async fn test_unsubscribed_stream_is_skipped() {
        let fanout = Fanout::new(1);
        let text = update(json!({"update_id": 5, "message": {
            "message_id": 1, "chat": {"id": 1, "type": "private"}, "text": "hi"
        }}));
        // Nobody took the receiver: delivery must not block even though capacity is 1.
        assert!(!fanout.deliver(text.clone()).await);
        assert!(!fanout.deliver(text).await);
    }

    #[tokio::test]
    async fn test_receiver_handed_out_once() {
        let fanout = Fanout::new(4);
        assert!(fanout.polls().is_some());
        assert!(fanout.polls().is_none());
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_skipped() {
        let fanout = Fanout::new(1);
        drop(fanout.updates());
        let text = update(json!({"update_id": 5, "message": {
            "message_id": 1, "chat": {"id": 1, "type": "private"}, "text": "hi"
        }}));
        assert!(!fanout.deliver(text).await);
    }
}
