// catalog/src/lib.rs
//
// Gateway to the external book catalog: a TTL cache in front of the
// upstream search API, a bounded retry policy for transient failures,
// and normalization of upstream payloads into the internal book shape.
// Every public operation returns a usable value under all failure
// modes; callers never see an error from this crate.

pub mod gateway;
pub mod normalize;
pub mod transport;
pub mod volume;

pub use gateway::{
    fallback_volume, is_valid_volume_id, CatalogConfig, CatalogGateway, FALLBACK_AUTHOR,
    FALLBACK_DESCRIPTION, FALLBACK_TITLE,
};
pub use normalize::{
    normalize_book, normalize_search_results, BookRecord, SearchItem, SearchSummary,
};
pub use transport::{CatalogTransport, HttpCatalogTransport, TransportError};
pub use volume::{SearchResponse, Volume, VolumeInfo};
