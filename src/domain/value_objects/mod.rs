pub mod cache_namespace;
pub mod gps;
pub mod mutation_id;
pub mod mutation_method;
pub mod mutation_payload;
pub mod photo;
pub mod record_type;

pub use cache_namespace::{CacheKind, CacheNamespace};
pub use gps::GpsCoordinates;
pub use mutation_id::MutationId;
pub use mutation_method::MutationMethod;
pub use mutation_payload::MutationPayload;
pub use photo::Photo;
pub use record_type::RecordType;
