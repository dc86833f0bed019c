//! Correlation table for in-flight requests

use std::collections::HashMap;

use dh_protocol::{Envelope, RequestId};

/// One-shot completion callback invoked with the parsed reply envelope.
pub type ReplyCallback = Box<dyn FnOnce(Envelope) + Send>;

/// Maps outstanding request ids to one-shot completion callbacks.
///
/// An entry is removed before its callback runs, so resolution is
/// structurally at-most-once and a callback that issues a new request never
/// observes itself in the table.
#[derive(Default)]
pub struct PendingReplies {
    entries: HashMap<RequestId, ReplyCallback>,
}

impl PendingReplies {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a callback for `id`.
    ///
    /// Re-registering a live id replaces the previous callback without
    /// invoking it.
    pub fn register(&mut self, id: RequestId, callback: ReplyCallback) {
        if self.entries.insert(id.clone(), callback).is_some() {
            tracing::warn!(%id, "replacing callback already registered under live request id");
        }
    }

    /// Resolve `id` with its reply. Returns true if a callback was found and
    /// invoked.
    pub fn resolve(&mut self, id: &RequestId, reply: Envelope) -> bool {
        match self.entries.remove(id) {
            Some(callback) => {
                callback(reply);
                true
            }
            None => false,
        }
    }

    /// Drop all entries without invoking them. In-flight requests silently
    /// lose their callback when the connection goes away.
    pub fn teardown(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(
                count = self.entries.len(),
                "discarding callbacks for in-flight requests"
            );
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn reply(id: &str) -> Envelope {
        Envelope {
            kind: "success".to_string(),
            id: Some(RequestId::new(id)),
            payload: serde_json::json!({}),
        }
    }

    #[test]
    fn test_resolve_invokes_at_most_once() {
        let mut pending = PendingReplies::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        pending.register(
            RequestId::new("req-1"),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(pending.resolve(&RequestId::new("req-1"), reply("req-1")));
        // A duplicate reply with the same id is a no-op
        assert!(!pending.resolve(&RequestId::new("req-1"), reply("req-1")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_resolve_unknown_id_is_noop() {
        let mut pending = PendingReplies::new();
        assert!(!pending.resolve(&RequestId::new("req-404"), reply("req-404")));
    }

    #[test]
    fn test_callback_receives_matching_reply() {
        let mut pending = PendingReplies::new();
        let seen: Arc<std::sync::Mutex<Option<Envelope>>> = Arc::new(std::sync::Mutex::new(None));

        let sink = Arc::clone(&seen);
        pending.register(
            RequestId::new("req-7"),
            Box::new(move |envelope| {
                *sink.lock().unwrap() = Some(envelope);
            }),
        );

        pending.resolve(&RequestId::new("req-7"), reply("req-7"));
        let envelope = seen.lock().unwrap().take().expect("callback should run");
        assert_eq!(envelope.id, Some(RequestId::new("req-7")));
        assert!(envelope.is_success());
    }

    #[test]
    fn test_teardown_invokes_nothing() {
        let mut pending = PendingReplies::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for id in ["req-1", "req-2", "req-3"] {
            let counter = Arc::clone(&calls);
            pending.register(
                RequestId::new(id),
                Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }
        assert_eq!(pending.len(), 3);

        pending.teardown();
        assert!(pending.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // A stray late reply after teardown is a no-op
        assert!(!pending.resolve(&RequestId::new("req-2"), reply("req-2")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicate_register_replaces_without_invoking() {
        let mut pending = PendingReplies::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first);
        pending.register(
            RequestId::new("req-1"),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let counter = Arc::clone(&second);
        pending.register(
            RequestId::new("req-1"),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(pending.len(), 1);
        pending.resolve(&RequestId::new("req-1"), reply("req-1"));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
