//! NFS and CIFS shares.

use serde_json::{json, Value};
use tracing::warn;

use crate::codes::{SHARE_NOT_EXIST, SHARE_PATH_INVALID};
use crate::error::Result;
use crate::ops::{share_name, share_path};
use crate::transport::HttpMethod;
use crate::ArrayClient;

/// NAS protocol of a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareProto {
    /// NFS export under `/NFSHARE`.
    Nfs,
    /// CIFS share under `/CIFSHARE`.
    Cifs,
}

impl ShareProto {
    /// Collection path of shares of this protocol.
    pub fn collection(&self) -> &'static str {
        match self {
            ShareProto::Nfs => "/NFSHARE",
            ShareProto::Cifs => "/CIFSHARE",
        }
    }
}

fn vstore_body(vstore_id: Option<&str>) -> Option<Value> {
    vstore_id.map(|id| json!({ "vstoreId": id }))
}

impl ArrayClient {
    /// Create a share on filesystem `fs_id` and return its ID.
    pub async fn create_share(
        &self,
        name: &str,
        fs_id: &str,
        proto: ShareProto,
        vstore_id: Option<&str>,
    ) -> Result<Option<String>> {
        let mut data = json!({
            "DESCRIPTION": name,
            "FSID": fs_id,
            "SHAREPATH": share_path(name, true),
        });
        if proto == ShareProto::Cifs {
            data["NAME"] = Value::String(share_name(name));
        }
        if let Some(id) = vstore_id {
            data["vstoreId"] = Value::String(id.to_string());
        }

        let result = self.post(proto.collection(), &data).await;
        result.check(format!("Create share for {} error.", name))?;
        Ok(result.data_str("ID"))
    }

    /// Delete a share. An already missing share is not an error.
    pub async fn delete_share(&self, share_id: &str, proto: ShareProto, vstore_id: Option<&str>) -> Result<()> {
        let path = format!("{}/{}", proto.collection(), share_id);
        let body = vstore_body(vstore_id);
        let result = self.delete(&path, body.as_ref()).await;
        if result.code() == SHARE_NOT_EXIST {
            warn!(share_id, "share to delete does not exist");
            return Ok(());
        }
        result.check(format!("Delete share {} error.", share_id))?;
        Ok(())
    }

    /// Look a share up by name. CIFS shares not found by name are looked up
    /// by description.
    pub async fn get_share_by_name(
        &self,
        name: &str,
        proto: ShareProto,
        vstore_id: Option<&str>,
    ) -> Result<Option<Value>> {
        let cifs_name = share_name(name);
        let path = match proto {
            ShareProto::Nfs => format!(
                "/NFSHARE?filter=SHAREPATH::{}&range=[0-100]",
                share_path(name, true)
            ),
            ShareProto::Cifs => format!("/CIFSHARE?filter=NAME:{}&range=[0-100]", cifs_name),
        };
        let body = vstore_body(vstore_id);

        let mut result = self.call(&path, HttpMethod::Get, body.as_ref(), Default::default()).await;
        if result.code() == SHARE_PATH_INVALID {
            warn!(name, "share does not exist");
            return Ok(None);
        }
        result.check(format!("Get share by name {} error.", name))?;

        if proto == ShareProto::Cifs {
            if result.records().is_empty() {
                let path = format!("/CIFSHARE?filter=DESCRIPTION:{}&range=[0-100]", name);
                result = self.call(&path, HttpMethod::Get, body.as_ref(), Default::default()).await;
            }
            if let Some(exact) = result
                .records()
                .into_iter()
                .find(|r| r.get("NAME").and_then(Value::as_str) == Some(cifs_name.as_str()))
            {
                return Ok(Some(exact));
            }
        }
        Ok(result.first_record())
    }
}
