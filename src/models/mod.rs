// Domain models: entity ids, time-series records, capacity values, categories and the
// derived snapshot/diff/aggregate views.

mod category;
mod entity;
mod power;
mod query;
mod snapshot;

pub use category::{Category, classify};
pub use entity::{AgentRecord, Entity, EntityId, PeerRecord, PowerRecord, RecordKind};
pub use power::{PIB_BYTES, Power};
pub use query::QueryOptions;
pub use snapshot::{Brief, DiffKind, Difference, StaticInfo, Summary};
