//! Cluster member selection.

use rand::seq::SliceRandom;

use crate::types::Endpoint;

/// Chooses which cluster member serves the next request.
///
/// Implementations may track member health; callers only ever see the
/// chosen endpoint.
pub trait EndpointSelector: Send + Sync {
    /// Pick one endpoint, or `None` when `endpoints` is empty.
    fn select<'a>(&self, endpoints: &'a [Endpoint]) -> Option<&'a Endpoint>;
}

/// Picks a member uniformly at random on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl EndpointSelector for RandomSelector {
    fn select<'a>(&self, endpoints: &'a [Endpoint]) -> Option<&'a Endpoint> {
        endpoints.choose(&mut rand::thread_rng())
    }
}
