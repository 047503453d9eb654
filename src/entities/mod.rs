//! Entity module - `SeaORM` entity definitions for the local client database.
//! The backend owns all school data; locally we only persist snapshots.

pub mod snapshot;

pub use snapshot::{Column as SnapshotColumn, Entity as Snapshot, Model as SnapshotModel};
