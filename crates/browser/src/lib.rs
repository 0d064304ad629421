//! Reader host for live Chrome tabs
//!
//! Connects to Chrome over the DevTools Protocol, builds a source document
//! (DOM tree, layout bounds, natural image sizes) for a tab, runs the
//! `termview` reader over it and injects the resulting overlay.
//!
//! # Layout
//!
//! - [`cdp`]: one websocket, many page sessions, request/response by id
//! - [`host`]: activation and dismissal, serialized per tab
//! - [`events`]: broadcast of reader lifecycle events

pub mod cdp;
pub mod events;
pub mod host;

pub use cdp::{CDPClient, CDPSession};
pub use events::{EventBus, ReaderEvent};
pub use host::{HostConfig, HostError, ReaderHost};
