//! Inbound frame routing
//!
//! Every decoded envelope is first resolved against the correlation table
//! (if it carries an id), then — independently — matched by kind against the
//! push rules that mutate the session store. A reply may do both.

use dh_protocol::{
    kind, Envelope, ErrorPayload, InitCompletePayload, InitProgressPayload, ServiceEventPayload,
    ServiceLogPayload, ServiceRecord, ServiceState,
};

use crate::pending::PendingReplies;
use crate::store::SessionStore;

pub(crate) fn route(store: &SessionStore, pending: &mut PendingReplies, envelope: Envelope) {
    if let Some(id) = envelope.id.clone() {
        if pending.resolve(&id, envelope.clone()) {
            tracing::trace!(%id, kind = %envelope.kind, "resolved pending request");
        } else {
            tracing::debug!(%id, kind = %envelope.kind, "reply with no pending request");
        }
    }

    match envelope.kind.as_str() {
        kind::SERVICE_LOG => match envelope.parse_payload::<ServiceLogPayload>() {
            Ok(payload) => store.push_service_log(&payload),
            Err(e) => tracing::warn!("dropping service.log push: {e}"),
        },

        kind::SERVICE_STARTED => {
            apply_service_event(store, &envelope, ServiceState::Running);
        }
        kind::SERVICE_STOPPED => {
            apply_service_event(store, &envelope, ServiceState::Stopped);
        }

        kind::INIT_PROGRESS => match envelope.parse_payload::<InitProgressPayload>() {
            Ok(payload) => store.push_init_progress(&payload),
            Err(e) => tracing::warn!("dropping init.progress push: {e}"),
        },

        kind::INIT_COMPLETE => match envelope.parse_payload::<InitCompletePayload>() {
            Ok(payload) => store.push_init_complete(payload),
            Err(e) => tracing::warn!("dropping init.complete push: {e}"),
        },

        kind::ERROR | kind::INIT_ERROR | kind::SERVICE_ERROR => {
            match envelope.parse_payload::<ErrorPayload>() {
                Ok(payload) => store.push_error(payload.message),
                Err(e) => tracing::warn!("dropping error push: {e}"),
            }
        }

        // Success replies mutate state only through the callbacks the
        // operation surface registered
        kind::SUCCESS => {}

        // Server-added push kinds we do not recognize yet
        other => tracing::trace!(kind = other, "ignoring unrecognized message kind"),
    }
}

fn apply_service_event(store: &SessionStore, envelope: &Envelope, status: ServiceState) {
    match envelope.parse_payload::<ServiceEventPayload>() {
        Ok(payload) => {
            store.merge_service(&ServiceRecord::status_only(payload.service_name, status));
        }
        Err(e) => tracing::warn!(kind = %envelope.kind, "dropping service event push: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn push(kind: &str, payload: serde_json::Value) -> Envelope {
        Envelope::new(kind, payload)
    }

    #[test]
    fn test_service_started_merges_status() {
        let store = SessionStore::new();
        let mut pending = PendingReplies::new();

        route(
            &store,
            &mut pending,
            push("service.started", json!({"service_name": "backend"})),
        );

        let backend = store.service("backend").unwrap();
        assert_eq!(backend.status, ServiceState::Running);
    }

    #[test]
    fn test_error_push_lands_in_log() {
        let store = SessionStore::new();
        let mut pending = PendingReplies::new();

        route(
            &store,
            &mut pending,
            push("error", json!({"message": "git clone failed"})),
        );

        let log = store.log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, crate::store::LogKind::Error);
        assert_eq!(log[0].text, "git clone failed");
    }

    #[test]
    fn test_unrecognized_kind_is_ignored() {
        let store = SessionStore::new();
        let mut pending = PendingReplies::new();

        route(
            &store,
            &mut pending,
            push("workspace.archived", json!({"whatever": true})),
        );

        assert_eq!(store.log_len(), 0);
        assert!(store.services().is_empty());
    }

    #[test]
    fn test_reply_resolves_and_applies_push_rule_independently() {
        // A frame with an id still runs its kind rule after resolution
        let store = SessionStore::new();
        let mut pending = PendingReplies::new();

        let fired = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = std::sync::Arc::clone(&fired);
        pending.register(
            dh_protocol::RequestId::new("req-1"),
            Box::new(move |_| flag.store(true, std::sync::atomic::Ordering::SeqCst)),
        );

        let mut envelope = push("service.started", json!({"service_name": "backend"}));
        envelope.id = Some(dh_protocol::RequestId::new("req-1"));
        route(&store, &mut pending, envelope);

        assert!(fired.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(
            store.service("backend").unwrap().status,
            ServiceState::Running
        );
    }

    #[test]
    fn test_bad_push_payload_is_dropped() {
        let store = SessionStore::new();
        let mut pending = PendingReplies::new();

        route(
            &store,
            &mut pending,
            push("service.log", json!({"line": 42})),
        );

        assert_eq!(store.log_len(), 0);
    }
}
