// Library error type. Storage failures stay distinct from decode failures so callers can
// tell a broken database apart from a broken row.

use crate::models::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("malformed power value {value:?} for entity {entity}")]
    MalformedPower { entity: EntityId, value: String },

    #[error("malformed multiaddr blob: {0}")]
    Blob(String),

    /// Peer and agent records can not be stored under the network total id.
    #[error("entity id 0 is reserved for the network total")]
    ReservedEntity,

    #[error("before and after must both be set and before must be earlier than after")]
    InvalidRange,

    #[error("export: {0}")]
    Export(#[from] crate::export::CsvError),
}

pub type Result<T> = std::result::Result<T, Error>;
