//! DWR Transport Layer
//!
//! HTTP plumbing shared by the dispatcher and the server loop.
//!
//! # Components
//!
//! - **[`InboundRequest`]**: a fully collected request, detached from hyper's
//!   streaming body so marshallers can be plain synchronous code
//! - **[`HttpTransport`]**: response builders (text, redirect, 304, 404)
//! - **[`HyperRequest`]** / **[`HyperResponse`]**: type aliases for hyper types

pub mod http;
pub mod request;

pub use http::{mime, HttpTransport, HyperRequest, HyperResponse};
pub use request::InboundRequest;
