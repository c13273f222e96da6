//! Presence registry and broadcast relay for the collaborative whiteboard.
//!
//! The server holds one record per open websocket (id, cursor, color) and
//! relays object edits between connections. It never stores the board:
//! every client owns a full replica and the relay only moves frames.

pub mod config;
pub mod routes;
pub mod services;
pub mod state;
