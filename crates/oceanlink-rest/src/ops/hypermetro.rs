//! HyperMetro domains, vstore pairs and pair removal.

use serde_json::Value;
use tracing::warn;

use crate::codes::HYPERMETRO_NOT_EXIST;
use crate::envelope::field_str;
use crate::error::{RestError, Result};
use crate::ArrayClient;

impl ArrayClient {
    /// All HyperMetro domains, fetched window by window.
    pub async fn get_hypermetro_domains(&self) -> Result<Vec<Value>> {
        self.fetch_all(|window| async move {
            let result = self
                .get(&format!("/HyperMetroDomain?{}", window.range_query()))
                .await;
            result.check("Get HyperMetro domains info error.")?;
            Ok::<_, RestError>(result.records())
        })
        .await
    }

    /// ID of the HyperMetro domain called `domain_name`.
    pub async fn get_hypermetro_domain_id(&self, domain_name: &str) -> Result<Option<String>> {
        let domains = self.get_hypermetro_domains().await?;
        Ok(domains
            .iter()
            .find(|d| d.get("NAME").and_then(Value::as_str) == Some(domain_name))
            .and_then(|d| field_str(d, "ID")))
    }

    /// ID of the vstore pair joining `local` and `remote` in `domain_name`.
    pub async fn get_hypermetro_vstore_id(
        &self,
        domain_name: &str,
        local: &str,
        remote: &str,
    ) -> Result<Option<String>> {
        let pairs = self
            .fetch_all(|window| async move {
                let result = self
                    .get(&format!("/vstore_pair?{}", window.range_query()))
                    .await;
                result.check("Get vstore_pair id error.")?;
                Ok::<_, RestError>(result.records())
            })
            .await?;

        let field = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);
        Ok(pairs
            .iter()
            .find(|p| {
                field(p, "DOMAINNAME").as_deref() == Some(domain_name)
                    && field(p, "LOCALVSTORENAME").as_deref() == Some(local)
                    && field(p, "REMOTEVSTORENAME").as_deref() == Some(remote)
            })
            .and_then(|p| field_str(p, "ID")))
    }

    /// Delete a HyperMetro pair. An already missing pair is not an error.
    pub async fn delete_hypermetro_pair(&self, pair_id: &str) -> Result<()> {
        let path = format!("/HyperMetroPair/{}?isOnlineDeleting=0", pair_id);
        let result = self.delete(&path, None).await;
        if result.code() == HYPERMETRO_NOT_EXIST {
            warn!(pair_id, "hypermetro pair to delete does not exist");
            return Ok(());
        }
        result.check(format!("Delete HyperMetro pair {} error.", pair_id))?;
        Ok(())
    }
}
