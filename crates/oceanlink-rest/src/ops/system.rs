//! Array-wide queries: system record and storage pools.

use serde_json::Value;

use crate::error::Result;
use crate::session::CallOptions;
use crate::transport::HttpMethod;
use crate::ArrayClient;

impl ArrayClient {
    /// The `/system/` record. Polled often, so not logged.
    pub async fn get_array_info(&self) -> Result<Option<Value>> {
        let result = self
            .call("/system/", HttpMethod::Get, None, CallOptions::quiet())
            .await;
        result.check("Get array info error.")?;
        Ok(result.data)
    }

    /// Every storage pool on the array.
    pub async fn get_all_pools(&self) -> Result<Vec<Value>> {
        let result = self.get("/storagepool").await;
        result.check("Query resource pool error.")?;
        Ok(result.records())
    }

    /// Pool named `name`; `quiet` suppresses request logging.
    pub async fn get_pool_by_name(&self, name: &str, quiet: bool) -> Result<Option<Value>> {
        let options = if quiet {
            CallOptions::quiet()
        } else {
            CallOptions::default()
        };
        let result = self
            .call(&format!("/storagepool?filter=NAME::{}", name), HttpMethod::Get, None, options)
            .await;
        result.check(format!("Get pool {} error.", name))?;
        Ok(result.first_record())
    }
}
