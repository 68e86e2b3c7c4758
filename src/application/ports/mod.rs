pub mod http_transport;
pub mod mutation_queue;
pub mod response_cache;

pub use http_transport::{HttpTransport, OutboundRequest, TransportError, TransportResponse};
pub use mutation_queue::MutationQueue;
pub use response_cache::ResponseCache;
