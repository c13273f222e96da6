//! Domain services used by the websocket route.
//!
//! ARCHITECTURE
//! ============
//! Service modules own registry mutation and fan-out so the route handler can
//! stay focused on socket plumbing and frame decoding.

pub mod presence;
pub mod relay;
