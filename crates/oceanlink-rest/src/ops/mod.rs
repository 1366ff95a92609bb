//! Domain operations built on [`ArrayClient::call`](crate::ArrayClient::call).
//!
//! Each operation composes a path and payload, sends it through the call
//! coordinator, and interprets the handful of codes that mean something for
//! that resource, e.g. a missing object on delete is treated as done. No
//! operation retries or touches the session on its own.

pub mod filesystem;
pub mod hypermetro;
pub mod share;
pub mod snapshot;
pub mod system;

use std::fmt;
use std::str::FromStr;

use crate::error::RestError;

pub use share::ShareProto;

/// Array-side name of a share or filesystem: dashes become underscores.
pub fn share_name(name: &str) -> String {
    name.replace('-', "_")
}

/// Array-side name of a snapshot.
pub fn snapshot_name(name: &str) -> String {
    name.replace('-', "_")
}

/// Export path of a share, e.g. `/share_1/`.
pub fn share_path(name: &str, need_replace: bool) -> String {
    let name = if need_replace {
        share_name(name)
    } else {
        name.to_string()
    };
    format!("/{}/", name)
}

impl FromStr for ShareProto {
    type Err = RestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NFS" => Ok(ShareProto::Nfs),
            "CIFS" => Ok(ShareProto::Cifs),
            _ => Err(RestError::InvalidInput(format!("Invalid NAS protocol {}.", s))),
        }
    }
}

impl fmt::Display for ShareProto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareProto::Nfs => f.write_str("NFS"),
            ShareProto::Cifs => f.write_str("CIFS"),
        }
    }
}
