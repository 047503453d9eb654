//! Persisted snapshots of the signed-in user, classes and teachers.
//!
//! Snapshots let a screen paint the last known list immediately while a fresh copy is
//! fetched. They are never expired, only overwritten, and cleared on logout. A payload that
//! no longer matches its type is reported as absent.

use crate::{
    entities::{Snapshot, snapshot},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use tracing::{debug, info, warn};

/// Keys of the persisted snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKey {
    /// The signed-in user
    User,
    /// Class pairs
    Classes,
    /// Teacher accounts
    Teachers,
}

impl SnapshotKey {
    /// Storage key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Classes => "classes",
            Self::Teachers => "teachers",
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

async fn find<C: ConnectionTrait>(db: &C, key: SnapshotKey) -> Result<Option<snapshot::Model>> {
    Snapshot::find()
        .filter(snapshot::Column::Key.eq(key.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Overwrites the snapshot under `key` with `value`.
pub async fn save<C, T>(db: &C, key: SnapshotKey, value: &T) -> Result<()>
where
    C: ConnectionTrait,
    T: Serialize + ?Sized,
{
    let payload = serde_json::to_string(value)?;
    let now = Utc::now().naive_utc();

    if let Some(existing) = find(db, key).await? {
        let mut active_model: snapshot::ActiveModel = existing.into();
        active_model.payload = Set(payload);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_snapshot = snapshot::ActiveModel {
            key: Set(key.as_str().to_string()),
            payload: Set(payload),
            updated_at: Set(now),
            ..Default::default()
        };
        new_snapshot.insert(db).await?;
    }

    debug!(%key, "Saved snapshot");
    Ok(())
}

/// Loads the snapshot under `key`; `None` when missing or no longer decodable.
pub async fn load<C, T>(db: &C, key: SnapshotKey) -> Result<Option<T>>
where
    C: ConnectionTrait,
    T: DeserializeOwned,
{
    let Some(row) = find(db, key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&row.payload) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(%key, error = %e, "Ignoring snapshot that no longer matches its schema");
            Ok(None)
        }
    }
}

/// Removes every snapshot. Returns the number of rows deleted.
pub async fn clear_all<C: ConnectionTrait>(db: &C) -> Result<u64> {
    let result = Snapshot::delete_many().exec(db).await?;
    info!(removed = result.rows_affected, "Cleared snapshots");
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{models::Group, test_utils::setup_test_db};
    use sea_orm::PaginatorTrait;

    fn groups() -> Vec<Group> {
        vec![
            Group {
                id: 1,
                name: "4-A".to_string(),
                teacher_id: Some(9),
                student_count: Some(24),
            },
            Group {
                id: 2,
                name: "4-B".to_string(),
                teacher_id: None,
                student_count: None,
            },
        ]
    }

    #[tokio::test]
    async fn test_save_then_load() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(load::<_, Vec<Group>>(&db, SnapshotKey::Classes).await?.is_none());

        save(&db, SnapshotKey::Classes, &groups()).await?;
        let loaded: Vec<Group> = load(&db, SnapshotKey::Classes).await?.unwrap();
        assert_eq!(loaded, groups());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_overwrites_single_row() -> Result<()> {
        let db = setup_test_db().await?;
        save(&db, SnapshotKey::Classes, &groups()).await?;
        save(&db, SnapshotKey::Classes, &groups()[..1]).await?;

        let loaded: Vec<Group> = load(&db, SnapshotKey::Classes).await?.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(Snapshot::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_mismatched_payload_reads_as_absent() -> Result<()> {
        let db = setup_test_db().await?;
        save(&db, SnapshotKey::Teachers, &"not a list").await?;
        let loaded: Option<Vec<Group>> = load(&db, SnapshotKey::Teachers).await?;
        assert!(loaded.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_all() -> Result<()> {
        let db = setup_test_db().await?;
        save(&db, SnapshotKey::Classes, &groups()).await?;
        save(&db, SnapshotKey::User, &"admin").await?;

        assert_eq!(clear_all(&db).await?, 2);
        assert!(load::<_, String>(&db, SnapshotKey::User).await?.is_none());
        Ok(())
    }
}
