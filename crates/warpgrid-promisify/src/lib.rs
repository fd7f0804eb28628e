//! WarpGrid adapter that turns callback-style HTTP handlers into
//! awaitable responses.
//!
//! Serverless request-handling conventions hand a handler a mutable
//! response object and expect it to finish the response by calling
//! `end`/`send` on it, synchronously or at some later point. This crate
//! supplies a stub of that response object, the [`ResponseBuilder`], and
//! wraps the handler so each invocation yields a [`ResponseFuture`] that
//! resolves with the final status, body and headers.
//!
//! ```ignore
//! use warpgrid_promisify::{promisify_handler, ResponseBuilder};
//!
//! let handler = promisify_handler(|_req: (), mut res: ResponseBuilder| {
//!     res.status(404).send("Oh no!");
//! });
//! let response = handler.call(()).await?;
//! assert_eq!(response.status, 404);
//! ```
//!
//! # Completion Model
//!
//! Three ways of finishing a response coalesce into one result:
//!
//! - `end()` after any number of `write()` calls
//! - `send(text)`, which appends then ends
//! - `send(json)`, which replaces anything written then ends
//!
//! Only the first completion is observed. Failures returned by the
//! handler, synchronously or from its future, surface unaltered unless
//! the response already completed. A handler that never completes its
//! response leaves the future pending forever.
//!
//! Members of the response object outside this subset (cookies,
//! redirects, file sending, ...) return
//! [`ResponseError::UnsupportedOperation`] instead of being ignored.

mod body;
mod config;
mod convert;
mod error;
mod handler;
mod header;
mod response;

pub use body::Body;
pub use config::AdapterConfig;
pub use convert::status_from_u16;
pub use error::{Operation, OperationKind, ResponseError};
pub use handler::{
    promisify_handler, promisify_handler_with, HandlerFuture, HandlerOutcome, HandlerReturn,
    Promisified, ResponseFuture,
};
pub use header::{Header, HeaderMap};
pub use response::{HandlerResponse, HeaderField, ResponseBuilder};
