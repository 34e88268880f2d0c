//! Interface definitions for the search cluster.
//!
//! These traits are the seams between the sink and the outside world: the
//! raw HTTP transport, the choice of cluster member per request, and the
//! index-level operations used by the listener.

mod endpoint_selector;
mod http_transport;
mod search_engine_client;

pub use endpoint_selector::{EndpointSelector, RandomSelector};
pub use http_transport::{ContentType, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use search_engine_client::SearchEngineClient;
