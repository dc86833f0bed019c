//! Wire protocol for the deckhand orchestration client
//!
//! Defines the JSON envelope exchanged with the orchestration server over a
//! single WebSocket connection, the client-originated request types, and the
//! typed payloads carried by server replies and pushes.
//!
//! # Envelope
//!
//! Every frame, in both directions, is one JSON object:
//!
//! ```json
//! { "type": "service.start", "id": "req-7", "payload": { "service_name": "backend" } }
//! ```
//!
//! `id` is present on client-originated requests and echoed verbatim on
//! their reply; server pushes carry no `id`. `payload` is kind-specific.
//!
//! # Message Flow
//!
//! 1. Client connects and may immediately issue requests
//! 2. Each request carries a fresh correlation id (`req-{n}`)
//! 3. The server answers with a `success` or `error` envelope echoing the id
//! 4. Independently, the server pushes unsolicited events (`service.log`,
//!    `service.started`, `init.progress`, ...) with no id

mod envelope;
mod error;
mod payload;
mod request;

pub use envelope::{decode, encode, kind, Envelope};
pub use error::ProtocolError;
pub use payload::{
    ConfigDiffPayload, ConfigSummary, ErrorPayload, InitCompletePayload, InitProgressPayload,
    RepoSummary, ServiceEventPayload, ServiceListPayload, ServiceLogPayload, ServiceRecord,
    ServiceState, SuccessPayload,
};
pub use request::{Request, RequestId, RequestIdAllocator};
