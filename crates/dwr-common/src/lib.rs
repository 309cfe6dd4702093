//! DWR Common Types and Transport
//!
//! This crate provides the protocol definitions and HTTP plumbing shared by
//! the DWR remote-call bridge.
//!
//! # Overview
//!
//! DWR lets browser script invoke server-side operations and receive the
//! results as directly executable script. This crate contains the pieces that
//! every other component agrees on:
//!
//! - **Protocol Layer**: batch types ([`Call`], [`Calls`], [`Reply`],
//!   [`Replies`]) and the [`DwrError`] taxonomy
//! - **Transport Layer**: the collected [`InboundRequest`] and helpers for
//!   building hyper responses
//!
//! # Wire Protocol
//!
//! A batch arrives as `key=value` pairs:
//!
//! ```text
//! callCount=1
//! c0-scriptName=Demo
//! c0-methodName=sayHello
//! c0-id=8467_1133888541111
//! c0-param0=string:Joe
//! ```
//!
//! and replies leave as script, e.g.
//! `DWREngine._handleResponse('8467_1133888541111', "Hello, Joe");`.
//!
//! # Example
//!
//! ```
//! use dwr_common::{Call, Reply};
//! use serde_json::json;
//!
//! let call = Call::new("0", "Demo", "sayHello", vec![json!("Joe")]);
//! let reply = Reply::success(&call.id, json!("Hello, Joe"));
//! assert!(reply.is_success());
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
pub use transport::{HttpTransport, HyperRequest, HyperResponse, InboundRequest};
