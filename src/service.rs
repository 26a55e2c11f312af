//! Type-erased, clonable call sites for user closures.
//!
//! Instantiators and hooks are stored as [`BoxCloneService`] and cloned before every call,
//! so concurrent constructions never share a `&mut` closure.

mod boxed_clone;
mod service_fn;

pub(crate) use boxed_clone::BoxCloneService;
pub(crate) use service_fn::service_fn;

pub(crate) trait Service<Request> {
    type Response;
    type Error;

    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error>;
}
