//! Actor and context resolvers.
//!
//! Resolvers are injected collaborators that may read ambient request or
//! session state. The builder only requires that they are present.

use crate::core::Actor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Resolves who is making the current change.
pub trait UserResolver: Send + Sync {
    fn resolve(&self) -> Option<Actor>;
}

/// Resolves one string of request context (URL, address, agent, group).
pub trait ContextResolver: Send + Sync {
    fn resolve(&self) -> Option<String>;
}

impl<F> UserResolver for F
where
    F: Fn() -> Option<Actor> + Send + Sync,
{
    fn resolve(&self) -> Option<Actor> {
        self()
    }
}

impl<F> ContextResolver for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn resolve(&self) -> Option<String> {
        self()
    }
}

/// Resolver returning a fixed value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fixed<T>(pub Option<T>);

impl Fixed<String> {
    pub fn text(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }
}

impl UserResolver for Fixed<Actor> {
    fn resolve(&self) -> Option<Actor> {
        self.0.clone()
    }
}

impl ContextResolver for Fixed<String> {
    fn resolve(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads a value from a snapshot of request headers, with a fallback.
#[derive(Clone, Debug)]
pub struct HeaderResolver {
    headers: HashMap<String, String>,
    name: String,
    fallback: Option<String>,
}

impl HeaderResolver {
    /// Header names are matched case-insensitively.
    pub fn new(headers: &HashMap<String, String>, name: impl Into<String>) -> Self {
        Self {
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            name: name.into().to_ascii_lowercase(),
            fallback: None,
        }
    }

    pub fn or(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

impl ContextResolver for HeaderResolver {
    fn resolve(&self) -> Option<String> {
        self.headers
            .get(&self.name)
            .cloned()
            .or_else(|| self.fallback.clone())
    }
}

/// The set of resolvers an audit builder draws on.
///
/// The user, URL, IP address and user agent resolvers are required; the
/// group resolver is optional.
#[derive(Clone, Default)]
pub struct Resolvers {
    pub(crate) user: Option<Arc<dyn UserResolver>>,
    pub(crate) url: Option<Arc<dyn ContextResolver>>,
    pub(crate) ip_address: Option<Arc<dyn ContextResolver>>,
    pub(crate) user_agent: Option<Arc<dyn ContextResolver>>,
    pub(crate) group: Option<Arc<dyn ContextResolver>>,
}

impl Resolvers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolvers for a batch process: no actor, URL `console`, loopback address.
    pub fn console() -> Self {
        Self::new()
            .user(Fixed::<Actor>(None))
            .url(Fixed::text("console"))
            .ip_address(Fixed::text("127.0.0.1"))
            .user_agent(Fixed::<String>(None))
    }

    pub fn user<R: UserResolver + 'static>(mut self, resolver: R) -> Self {
        self.user = Some(Arc::new(resolver));
        self
    }

    pub fn url<R: ContextResolver + 'static>(mut self, resolver: R) -> Self {
        self.url = Some(Arc::new(resolver));
        self
    }

    pub fn ip_address<R: ContextResolver + 'static>(mut self, resolver: R) -> Self {
        self.ip_address = Some(Arc::new(resolver));
        self
    }

    pub fn user_agent<R: ContextResolver + 'static>(mut self, resolver: R) -> Self {
        self.user_agent = Some(Arc::new(resolver));
        self
    }

    pub fn group<R: ContextResolver + 'static>(mut self, resolver: R) -> Self {
        self.group = Some(Arc::new(resolver));
        self
    }
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvers")
            .field("user", &self.user.is_some())
            .field("url", &self.url.is_some())
            .field("ip_address", &self.ip_address.is_some())
            .field("user_agent", &self.user_agent.is_some())
            .field("group", &self.group.is_some())
            .finish()
    }
}
