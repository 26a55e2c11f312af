use super::Service;

type BoxedService<Request, Response, Error> =
    Box<dyn CloneService<Request, Response = Response, Error = Error> + Send + Sync>;

pub(crate) struct BoxCloneService<Request, Response, Error>(pub(crate) BoxedService<Request, Response, Error>);

pub(crate) trait CloneService<Request>: Service<Request> {
    #[must_use]
    fn clone_box(&self) -> BoxedService<Request, Self::Response, Self::Error>;
}

impl<Request, T> CloneService<Request> for T
where
    T: Service<Request> + Clone + Send + Sync + 'static,
{
    #[inline]
    fn clone_box(&self) -> BoxedService<Request, T::Response, T::Error> {
        Box::new(self.clone())
    }
}

impl<Request, Response, Error> BoxCloneService<Request, Response, Error> {
    /// Calls a fresh clone, leaving `self` untouched
    #[inline]
    pub(crate) fn call_cloned(&self, request: Request) -> Result<Response, Error> {
        self.0.clone_box().call(request)
    }
}

impl<Request, Response, Error> Clone for BoxCloneService<Request, Response, Error> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl<Request, Response, Error> Service<Request> for BoxCloneService<Request, Response, Error> {
    type Response = Response;
    type Error = Error;

    #[inline]
    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error> {
        self.0.call(request)
    }
}
