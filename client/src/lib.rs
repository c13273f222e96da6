//! Whiteboard client: a synchronized replica of one shared board.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every client keeps the full document. The relay only forwards frames, so
//! replicas converge by applying the same mutations in the same order.
//!
//! - `state` holds the document store, peer presence, and viewport
//! - `net` owns the websocket to the relay
//! - `session` ties them together and enforces echo suppression

pub mod net;
pub mod session;
pub mod state;

pub use net::transport::{Transport, TransportError};
pub use session::{DEFAULT_RELAY_URL, Session};
pub use state::doc::{Applied, DocStore, Mutation, Origin, new_object_id};
pub use state::presence::PresenceView;
pub use state::viewport::Viewport;
