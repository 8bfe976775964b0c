use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Dispatcher::dispatch`]
pub type DispatchFuture<'a, T, E> = Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send + 'a>>;

/// External collaborator that performs the actual downstream delivery
///
/// The limiter never inspects the payload or the signature; it only decides
/// *when* `dispatch` may run. Exactly one `dispatch` call happens per
/// successful admission, and a failed dispatch is never retried — the error
/// propagates to the admitting caller unchanged.
pub trait Dispatcher: Send + Sync {
    /// Opaque payload owned by the caller, passed through unmodified
    type Payload: Send;

    /// Value produced by a successful dispatch
    type Response: Send;

    /// Error reported by a failed dispatch
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deliver the payload downstream
    fn dispatch<'a>(&'a self, payload: Self::Payload, signature: &'a str) -> DispatchFuture<'a, Self::Response, Self::Error>;
}
