//! Filesystem snapshots.

use serde_json::{json, Value};
use tracing::warn;

use crate::codes::SNAPSHOT_NOT_EXIST;
use crate::error::Result;
use crate::ops::snapshot_name;
use crate::ArrayClient;

/// Parent object type of a filesystem snapshot.
const PARENT_TYPE_FILESYSTEM: &str = "40";

impl ArrayClient {
    /// Snapshot `fs_id` under `name` and return the snapshot ID.
    pub async fn create_snapshot(&self, fs_id: &str, name: &str) -> Result<Option<String>> {
        let data = json!({
            "PARENTTYPE": PARENT_TYPE_FILESYSTEM,
            "PARENTID": fs_id,
            "NAME": snapshot_name(name),
        });
        let result = self.post("/FSSNAPSHOT", &data).await;
        result.check(format!("Create snapshot {} error.", data))?;
        Ok(result.data_str("ID"))
    }

    /// Delete a snapshot. An already missing snapshot is not an error.
    pub async fn delete_snapshot(&self, snap_id: &str) -> Result<()> {
        let result = self.delete(&format!("/FSSNAPSHOT/{}", snap_id), None).await;
        if result.code() == SNAPSHOT_NOT_EXIST {
            warn!(snap_id, "snapshot to delete does not exist");
            return Ok(());
        }
        result.check(format!("Delete snapshot {} error.", snap_id))?;
        Ok(())
    }

    /// `None` when the snapshot does not exist.
    pub async fn get_snapshot_by_id(&self, snap_id: &str) -> Result<Option<Value>> {
        let result = self.get(&format!("/FSSNAPSHOT/{}", snap_id)).await;
        result.check(format!("Get snapshot by id {} error.", snap_id))?;
        Ok(result.data)
    }

    /// Rename a snapshot in place.
    pub async fn rename_snapshot(&self, snap_id: &str, new_name: &str) -> Result<()> {
        let data = json!({ "NAME": snapshot_name(new_name) });
        let result = self.put(&format!("/FSSNAPSHOT/{}", snap_id), &data).await;
        result.check(format!("Rename snapshot {} error.", snap_id))?;
        Ok(())
    }
}
