use super::Service;

#[inline]
#[must_use]
pub(crate) const fn service_fn<T>(f: T) -> ServiceFn<T> {
    ServiceFn { f }
}

#[derive(Clone)]
pub(crate) struct ServiceFn<T> {
    f: T,
}

impl<F, Request, Response, Error> Service<Request> for ServiceFn<F>
where
    F: FnMut(Request) -> Result<Response, Error>,
{
    type Response = Response;
    type Error = Error;

    #[inline]
    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error> {
        (self.f)(request)
    }
}

#[cfg(test)]
mod tests {
    use super::{service_fn, Service as _};

    #[test]
    fn test_service_fn() {
        let mut service = service_fn(|name: &str| if name.is_empty() { Err("empty") } else { Ok(name.len()) });

        assert_eq!(service.call("Logger"), Ok(6));
        assert_eq!(service.call(""), Err("empty"));
    }
}
