//! Route handlers and their type erasure.
//!
//! # How async handlers are stored
//!
//! Every `async fn` has its own anonymous future type, so two handlers never
//! share a concrete type. The router still has to keep all of them in one
//! `HashMap<Method, Tree>`, so each handler is hidden behind a trait object
//! (`dyn ErasedHandler`) when it is registered:
//!
//! ```text
//! async fn ticker(req: Request) -> Response { … }   ← user writes this
//!        ↓ router.on(Method::GET, "/ticker", ticker)
//! ticker.into_boxed_handler()                      ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(ticker))                      ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time               ← one vtable dispatch
//!        ↓
//! Box::pin(async { ticker(req).await.into_response() })  ← BoxFuture
//! ```
//!
//! Middleware futures have the same [`BoxFuture`] shape. A request therefore
//! travels through a chain of boxed futures, one per middleware stage plus
//! one for the matched handler, and every link resolves to a [`Response`].
//!
//! Per request this costs one `Arc` clone (an atomic increment) and one
//! virtual call per stage.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Pin<Box<…>>` because the runtime polls the future in place and must not
/// move it after the first poll. `Send + 'static` so tokio can hand it to any
/// worker thread.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)`: it appears in the return
/// type of the public `Handler::into_boxed_handler`.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared by every connection task.
///
/// Cloning the `Arc` per request hands the task its own reference without
/// copying the handler.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. Any function with the signature
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// satisfies it, as does a closure returning such a future.
///
/// The trait is **sealed** through the private `Sealed` supertrait, so only
/// the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// `Sealed` is private, so external crates cannot name it and cannot
/// implement `Handler` on their own types.
mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Holds a concrete handler `F` and implements [`ErasedHandler`] for it,
/// bridging typed functions to the trait-object table.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        // Calling the function yields its concrete `Fut`; mapping the output
        // through `IntoResponse` and boxing gives the uniform return type.
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
