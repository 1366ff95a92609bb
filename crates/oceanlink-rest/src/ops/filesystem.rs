//! Filesystem lifecycle.

use serde_json::Value;
use tracing::warn;

use crate::codes::FILESYSTEM_NOT_EXIST;
use crate::error::Result;
use crate::ops::share_name;
use crate::ArrayClient;

impl ArrayClient {
    /// Create a filesystem and return its ID.
    pub async fn create_filesystem(&self, params: &Value) -> Result<Option<String>> {
        let result = self.post("/filesystem", params).await;
        result.check(format!("Create filesystem {} error.", params))?;
        Ok(result.data_str("ID"))
    }

    /// Delete a filesystem. An already missing filesystem is not an error.
    pub async fn delete_filesystem(&self, params: &Value) -> Result<()> {
        let result = self.delete("/filesystem", Some(params)).await;
        if result.code() == FILESYSTEM_NOT_EXIST {
            warn!(params = %params, "filesystem to delete does not exist");
            return Ok(());
        }
        result.check(format!("Delete filesystem {} error.", params))?;
        Ok(())
    }

    /// `None` when the filesystem does not exist.
    pub async fn get_filesystem_by_id(&self, fs_id: &str) -> Result<Option<Value>> {
        let result = self.get(&format!("/filesystem/{}", fs_id)).await;
        if result.code() == FILESYSTEM_NOT_EXIST {
            warn!(fs_id, "filesystem does not exist");
            return Ok(None);
        }
        result.check(format!("Get filesystem by id {} error.", fs_id))?;
        Ok(result.data)
    }

    /// Look up a filesystem by name; dashes are mapped the way creation maps them.
    pub async fn get_filesystem_by_name(&self, name: &str) -> Result<Option<Value>> {
        let path = format!("/filesystem?filter=NAME::{}&range=[0-100]", share_name(name));
        let result = self.get(&path).await;
        result.check(format!("Get filesystem by name {} error.", name))?;
        Ok(result.first_record())
    }

    /// Apply `params` to an existing filesystem.
    pub async fn update_filesystem(&self, fs_id: &str, params: &Value) -> Result<()> {
        let result = self.put(&format!("/filesystem/{}", fs_id), params).await;
        result.check(format!("Update filesystem {} by {} error.", fs_id, params))?;
        Ok(())
    }
}
