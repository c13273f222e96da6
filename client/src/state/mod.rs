//! Client-side state: the document replica, peer presence, and viewport.
//!
//! SYSTEM CONTEXT
//! ==============
//! None of these types touch the network. `Session` owns one of each and
//! routes local gestures and relayed frames through them.

pub mod doc;
pub mod presence;
pub mod viewport;
