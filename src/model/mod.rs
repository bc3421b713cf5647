mod records;
mod request;

pub use records::{
    Collection, CollectionUpdate, Environment, EnvironmentUpdate, HistoryEntry, NewRequest,
    RecordId, RequestUpdate, StoredRequest, DEFAULT_REQUEST_NAME,
};
pub use request::{RequestBody, RequestTemplate};
