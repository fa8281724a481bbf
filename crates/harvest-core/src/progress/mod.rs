//! Job progress over a server-push channel.
//!
//! A `ProgressClient` opens at most one channel per subscription, decodes
//! `progress` and `done` events into `ProgressSnapshot`s and publishes them as
//! a `ProgressView` (`snapshot` + `is_connected`). The channel closes itself on
//! a terminal status, on a transport error and when the subscription is
//! dropped or unsubscribed.

mod client;
mod endpoint;
mod event;
mod guard;
mod snapshot;
mod sse;
mod state;
mod transport;
mod watcher;


pub use client::{ProgressClient, ProgressSubscription};
pub use endpoint::{EndpointError, ProgressEndpoint};
pub use event::{decode, StreamEvent, EVENT_DONE, EVENT_PROGRESS};
pub use snapshot::{JobStatus, ProgressSnapshot};
pub use sse::{SseDecoder, SseFrame};
pub use state::{ChannelState, CloseReason, ProgressView};
pub use transport::{ByteStream, HttpTransport, PushTransport, TransportError};
pub use watcher::ProgressWatcher;
