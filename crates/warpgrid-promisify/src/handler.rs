//! The response-completion adapter.
//!
//! [`promisify_handler`] wraps a callback-style handler so each call
//! yields a [`ResponseFuture`]. The handler runs synchronously inside
//! [`Promisified::call`] against a fresh [`ResponseBuilder`]; the future
//! then settles on whichever comes first:
//!
//! ```text
//! builder.end() / builder.send()  ──▶ Ok(HandlerResponse)
//! handler returns Err(e)          ──▶ Err(e)
//! handler future resolves Err(e)  ──▶ Err(e)
//! ```
//!
//! A handler future that resolves `Ok(())` settles nothing: finishing the
//! handler says nothing about finishing the response.
//!
//! # Execution Model
//!
//! An asynchronous handler is polled once inside `call`, so everything up
//! to its first `.await` has happened when `call` returns. If it is still
//! pending and a Tokio runtime is current, it is spawned onto that runtime
//! and runs to the end on its own: dropping the [`ResponseFuture`] (for
//! example when a caller's timeout fires) does not abort it. Without a
//! runtime, or with [`AdapterConfig::spawn_handler`] off, the handler is
//! driven by polling the `ResponseFuture` instead and is dropped with it.
//!
//! # Liveness
//!
//! If the handler never completes its builder the future stays pending
//! forever. There is no built-in timeout; callers that need one race the
//! future against their own timer (e.g. `tokio::time::timeout`).

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::config::AdapterConfig;
use crate::response::{HandlerResponse, ResponseBuilder};

/// A boxed handler future, the asynchronous handler return shape.
pub type HandlerFuture<E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send>>;

/// What a handler call produced, before the response is settled.
pub enum HandlerOutcome<E> {
    /// Returned normally; completion, if any, comes from the builder.
    Returned,
    /// Failed synchronously.
    Failed(E),
    /// Returned a future that may still fail.
    Pending(HandlerFuture<E>),
}

/// Return types accepted from a handler.
///
/// Implemented for the three handler shapes: `()` for infallible
/// synchronous handlers, `Result<(), E>` for fallible synchronous ones and
/// `Pin<Box<F>>` (including an already type-erased [`HandlerFuture`]) for
/// asynchronous ones.
pub trait HandlerReturn {
    type Error;

    fn into_outcome(self) -> HandlerOutcome<Self::Error>;
}

impl HandlerReturn for () {
    type Error = Infallible;

    fn into_outcome(self) -> HandlerOutcome<Infallible> {
        HandlerOutcome::Returned
    }
}

impl<E> HandlerReturn for Result<(), E> {
    type Error = E;

    fn into_outcome(self) -> HandlerOutcome<E> {
        match self {
            Ok(()) => HandlerOutcome::Returned,
            Err(err) => HandlerOutcome::Failed(err),
        }
    }
}

impl<F, E> HandlerReturn for Pin<Box<F>>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
{
    type Error = E;

    fn into_outcome(self) -> HandlerOutcome<E> {
        HandlerOutcome::Pending(self)
    }
}

impl<E> HandlerReturn for HandlerFuture<E> {
    type Error = E;

    fn into_outcome(self) -> HandlerOutcome<E> {
        HandlerOutcome::Pending(self)
    }
}

/// Wrap `handler` with the default [`AdapterConfig`].
pub fn promisify_handler<H>(handler: H) -> Promisified<H> {
    promisify_handler_with(handler, AdapterConfig::default())
}

/// Wrap `handler` with an explicit [`AdapterConfig`].
pub fn promisify_handler_with<H>(handler: H, config: AdapterConfig) -> Promisified<H> {
    Promisified { handler, config }
}

/// A handler wrapped by [`promisify_handler`].
#[derive(Debug, Clone)]
pub struct Promisified<H> {
    handler: H,
    config: AdapterConfig,
}

impl<H> Promisified<H> {
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Invoke the handler with a fresh response builder.
    ///
    /// Synchronous handlers run to the end before this returns;
    /// asynchronous ones run up to their first suspension point. The
    /// request is passed through untouched.
    pub fn call<Req, R>(&self, request: Req) -> ResponseFuture<R::Error>
    where
        H: Fn(Req, ResponseBuilder) -> R,
        R: HandlerReturn,
        R::Error: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let builder = ResponseBuilder::new(self.config.default_status, tx);

        debug!(
            default_status = self.config.default_status,
            "invoking promisified handler"
        );

        let mut future = ResponseFuture {
            completion: Some(rx),
            failed: None,
            handler: None,
            failure: None,
        };
        match (self.handler)(request, builder).into_outcome() {
            HandlerOutcome::Returned => {}
            HandlerOutcome::Failed(err) => future.failure = Some(err),
            HandlerOutcome::Pending(mut handler) => {
                // The spawned task or the first poll of the response
                // future re-polls with a real waker.
                let mut cx = Context::from_waker(Waker::noop());
                match handler.as_mut().poll(&mut cx) {
                    Poll::Ready(Ok(())) => {}
                    Poll::Ready(Err(err)) => future.failure = Some(err),
                    Poll::Pending => future.drive(handler, self.config.spawn_handler),
                }
            }
        }
        future
    }
}

/// Future returned by [`Promisified::call`].
///
/// Resolves once with either the completed response or the handler's
/// own failure, unaltered.
#[must_use = "futures do nothing unless polled"]
pub struct ResponseFuture<E> {
    /// `None` once the builder has been consumed or dropped.
    completion: Option<oneshot::Receiver<HandlerResponse>>,
    /// Failure of a handler spawned onto the runtime. Closed if the
    /// handler finished without failing.
    failed: Option<oneshot::Receiver<E>>,
    /// Handler driven by this future when it could not be spawned.
    handler: Option<HandlerFuture<E>>,
    failure: Option<E>,
}

// `E` is only ever moved out, never pinned.
impl<E> Unpin for ResponseFuture<E> {}

impl<E: Send + 'static> ResponseFuture<E> {
    fn drive(&mut self, handler: HandlerFuture<E>, spawn: bool) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) if spawn => runtime,
            _ => {
                trace!("driving handler from the response future");
                self.handler = Some(handler);
                return;
            }
        };

        let (tx, rx) = oneshot::channel();
        runtime.spawn(async move {
            if let Err(err) = handler.await {
                // Nobody listening once the response future is gone.
                let _ = tx.send(err);
            }
        });
        self.failed = Some(rx);
    }
}

impl<E> ResponseFuture<E> {
    fn poll_completion(&mut self, cx: &mut Context<'_>) -> Option<HandlerResponse> {
        let completion = self.completion.as_mut()?;
        match Pin::new(completion).poll(cx) {
            Poll::Ready(Ok(response)) => {
                self.completion = None;
                Some(response)
            }
            Poll::Ready(Err(_)) => {
                trace!("response builder dropped without completing");
                self.completion = None;
                None
            }
            Poll::Pending => None,
        }
    }

    fn poll_failed(&mut self, cx: &mut Context<'_>) -> Option<E> {
        let failed = self.failed.as_mut()?;
        match Pin::new(failed).poll(cx) {
            Poll::Ready(Ok(err)) => {
                self.failed = None;
                Some(err)
            }
            Poll::Ready(Err(_)) => {
                self.failed = None;
                None
            }
            Poll::Pending => None,
        }
    }
}

impl<E> Future for ResponseFuture<E> {
    type Output = Result<HandlerResponse, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(response) = this.poll_completion(cx) {
            this.handler = None;
            return Poll::Ready(Ok(response));
        }
        if let Some(err) = this.failure.take() {
            return Poll::Ready(Err(err));
        }

        if let Some(err) = this.poll_failed(cx) {
            // The spawned handler completes before it fails, so a
            // completion sent earlier is visible now.
            if let Some(response) = this.poll_completion(cx) {
                return Poll::Ready(Ok(response));
            }
            return Poll::Ready(Err(err));
        }

        let Some(handler) = this.handler.as_mut() else {
            return Poll::Pending;
        };
        let handler_result = handler.as_mut().poll(cx);

        // The handler may have completed the response during this poll,
        // before it went on to fail or suspend.
        if let Some(response) = this.poll_completion(cx) {
            this.handler = None;
            return Poll::Ready(Ok(response));
        }

        match handler_result {
            Poll::Ready(Err(err)) => {
                this.handler = None;
                Poll::Ready(Err(err))
            }
            Poll::Ready(Ok(())) => {
                trace!("handler finished without completing the response");
                this.handler = None;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
