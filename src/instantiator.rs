use std::sync::Arc;

use tracing::debug;

use crate::{
    errors::{InstantiateErrorKind, ResolveErrorKind},
    identity::Identity,
    lifecycle::Instance,
    provider::Provider,
    service::{service_fn, BoxCloneService},
};

/// Value bound to one injection point.
#[derive(Clone)]
pub enum Arg {
    Instance(Instance),
    /// Deferred injection point
    Provider(Provider),
    /// Optional injection point without a matching component
    Absent,
}

impl Arg {
    const fn kind(&self) -> &'static str {
        match self {
            Arg::Instance(_) => "an instance",
            Arg::Provider(_) => "a provider",
            Arg::Absent => "absent",
        }
    }
}

/// Injected values of one construction, indexed like the component's injection points.
#[derive(Clone)]
pub struct Args {
    values: Vec<(Identity, Arg)>,
}

impl Args {
    pub(crate) fn new(values: Vec<(Identity, Arg)>) -> Self {
        Self { values }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn entry(&self, index: usize) -> Result<&(Identity, Arg), ResolveErrorKind> {
        self.values.get(index).ok_or(ResolveErrorKind::NoArgument {
            index,
            len: self.values.len(),
        })
    }

    /// Required injection point `index`.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::NoArgument`] when there's no such injection point
    /// - [`ResolveErrorKind::IncorrectArgument`] when it holds a provider or nothing
    /// - [`ResolveErrorKind::IncorrectType`] when the instance isn't a `T`
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, ResolveErrorKind> {
        match self.entry(index)? {
            (identity, Arg::Instance(instance)) => downcast(identity, instance.clone()),
            (_, arg) => Err(ResolveErrorKind::IncorrectArgument {
                index,
                expected: "an instance",
                actual: arg.kind(),
            }),
        }
    }

    /// Optional injection point `index`, `None` when nothing matched it.
    ///
    /// # Errors
    /// Same as [`Args::get`]
    pub fn optional<T: Send + Sync + 'static>(&self, index: usize) -> Result<Option<Arc<T>>, ResolveErrorKind> {
        match self.entry(index)? {
            (identity, Arg::Instance(instance)) => downcast(identity, instance.clone()).map(Some),
            (_, Arg::Absent) => Ok(None),
            (_, arg) => Err(ResolveErrorKind::IncorrectArgument {
                index,
                expected: "an instance",
                actual: arg.kind(),
            }),
        }
    }

    /// Deferred injection point `index`.
    ///
    /// # Errors
    /// [`ResolveErrorKind::NoArgument`] or [`ResolveErrorKind::IncorrectArgument`] when it isn't a provider
    pub fn provider(&self, index: usize) -> Result<Provider, ResolveErrorKind> {
        match self.entry(index)? {
            (_, Arg::Provider(provider)) => Ok(provider.clone()),
            (_, arg) => Err(ResolveErrorKind::IncorrectArgument {
                index,
                expected: "a provider",
                actual: arg.kind(),
            }),
        }
    }
}

pub(crate) fn downcast<T: Send + Sync + 'static>(identity: &Identity, instance: Instance) -> Result<Arc<T>, ResolveErrorKind> {
    instance.downcast::<T>().map_err(|_| ResolveErrorKind::IncorrectType {
        identity: identity.clone(),
        expected: core::any::type_name::<T>(),
    })
}

pub trait Instantiator: Clone + Send + Sync + 'static {
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, args: Args) -> Result<Self::Provides, Self::Error>;
}

impl<F, Response, Err> Instantiator for F
where
    F: FnMut(Args) -> Result<Response, Err> + Clone + Send + Sync + 'static,
    Response: Send + Sync + 'static,
    Err: Into<InstantiateErrorKind>,
{
    type Provides = Response;
    type Error = Err;

    #[inline]
    fn instantiate(&mut self, args: Args) -> Result<Self::Provides, Self::Error> {
        self(args)
    }
}

/// Wrapper to create an instantiator that just returns passed value.
/// It can be used when the value was created outside the container.
#[inline]
#[must_use]
pub fn instance<T: Clone + Send + Sync + 'static>(val: T) -> impl Instantiator<Provides = T, Error = InstantiateErrorKind> {
    move |_: Args| Ok(val.clone())
}

pub(crate) type BoxedCloneInstantiator = BoxCloneService<Args, Instance, InstantiateErrorKind>;

#[must_use]
pub(crate) fn boxed_instantiator_factory<Inst: Instantiator>(mut instantiator: Inst) -> BoxedCloneInstantiator {
    BoxCloneService(Box::new(service_fn(move |args: Args| {
        let provides = match instantiator.instantiate(args) {
            Ok(provides) => provides,
            Err(err) => {
                let err: InstantiateErrorKind = err.into();
                return Err(err);
            }
        };
        debug!("Instantiated");
        Ok(Arc::new(provides) as Instance)
    })))
}
