use crate::Result;
use http::{Request, Response};
use std::sync::Arc;

/// `Transport` performs a single request/response exchange with a downstream resource,
/// it is the client side seam that circuit breaking and retrying wrap around.
/// The request is borrowed, so that the same request can be sent again.
pub trait Transport: Send + Sync {
    type ReqBody: 'static;
    type ResBody: 'static;

    fn round_trip(&self, req: &Request<Self::ReqBody>) -> Result<Response<Self::ResBody>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    type ReqBody = T::ReqBody;
    type ResBody = T::ResBody;

    fn round_trip(&self, req: &Request<Self::ReqBody>) -> Result<Response<Self::ResBody>> {
        (**self).round_trip(req)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    type ReqBody = T::ReqBody;
    type ResBody = T::ResBody;

    fn round_trip(&self, req: &Request<Self::ReqBody>) -> Result<Response<Self::ResBody>> {
        (**self).round_trip(req)
    }
}

/// `Handler` serves a request on the server side. Failures are expressed by the status code.
pub trait Handler: Send + Sync {
    type ReqBody: 'static;
    type ResBody: 'static;

    fn serve(&self, req: &Request<Self::ReqBody>) -> Response<Self::ResBody>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    type ReqBody = H::ReqBody;
    type ResBody = H::ResBody;

    fn serve(&self, req: &Request<Self::ReqBody>) -> Response<Self::ResBody> {
        (**self).serve(req)
    }
}

#[cfg(test)]
pub(crate) use test::{MockDownstream, MockServer};
