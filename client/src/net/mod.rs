//! Networking for the relay connection.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` owns the websocket and moves already-typed frames in both
//! directions. It knows nothing about documents or presence; `Session` does.

pub mod transport;
