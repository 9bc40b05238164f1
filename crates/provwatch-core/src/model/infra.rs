//! Infrastructure records and their two API versions.
//!
//! The infras API serves two record shapes: legacy v1 records (an empty or
//! `"v1"` `api_version`) carry only coarse status, while v2 records embed
//! their latest operation. The version is an explicit discriminant here —
//! consumers dispatch by pattern matching on [`InfraRecord`], never by
//! probing for fields.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::operation::Operation;

/// The kind of infrastructure being provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InfraKind {
    Eks,
    Ecr,
    Doks,
    Docr,
    Gke,
    Gcr,
    Rds,
    /// A kind this client has no display metadata for.
    Other(String),
}

impl InfraKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Eks => "eks",
            Self::Ecr => "ecr",
            Self::Doks => "doks",
            Self::Docr => "docr",
            Self::Gke => "gke",
            Self::Gcr => "gcr",
            Self::Rds => "rds",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Full product name for headers and cards.
    #[must_use]
    pub fn long_name(&self) -> &str {
        match self {
            Self::Eks => "Elastic Kubernetes Service (EKS)",
            Self::Ecr => "Elastic Container Registry (ECR)",
            Self::Doks => "DigitalOcean Kubernetes Service (DOKS)",
            Self::Docr => "DigitalOcean Container Registry (DOCR)",
            Self::Gke => "Google Kubernetes Engine (GKE)",
            Self::Gcr => "Google Container Registry (GCR)",
            Self::Rds => "Amazon Relational Database (RDS)",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Cloud provider display name.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        match self {
            Self::Eks | Self::Ecr | Self::Rds => "Amazon Web Services (AWS)",
            Self::Doks | Self::Docr => "DigitalOcean",
            Self::Gke | Self::Gcr => "Google Cloud Platform (GCP)",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for InfraKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "eks" => Self::Eks,
            "ecr" => Self::Ecr,
            "doks" => Self::Doks,
            "docr" => Self::Docr,
            "gke" => Self::Gke,
            "gcr" => Self::Gcr,
            "rds" => Self::Rds,
            _ => Self::Other(s),
        }
    }
}

impl From<InfraKind> for String {
    fn from(kind: InfraKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for InfraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse status of an infrastructure as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InfraStatus {
    Creating,
    Created,
    Updating,
    Deleting,
    Deleted,
    Destroyed,
    Errored,
    Other(String),
}

impl InfraStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "creating",
            Self::Created => "created",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
            Self::Destroyed => "destroyed",
            Self::Errored => "errored",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Whether the infrastructure no longer exists.
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Deleted | Self::Destroyed)
    }

    /// Whether an operation is currently in flight.
    #[must_use]
    pub fn in_progress(&self) -> bool {
        matches!(self, Self::Creating | Self::Updating | Self::Deleting)
    }
}

impl From<String> for InfraStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "creating" => Self::Creating,
            "created" => Self::Created,
            "updating" => Self::Updating,
            "deleting" => Self::Deleting,
            "deleted" => Self::Deleted,
            "destroyed" => Self::Destroyed,
            "errored" => Self::Errored,
            _ => Self::Other(s),
        }
    }
}

impl From<InfraStatus> for String {
    fn from(status: InfraStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for InfraStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label for the header timestamp, keyed on infrastructure status.
#[must_use]
pub fn timestamp_label(status: &InfraStatus) -> &'static str {
    match status {
        InfraStatus::Created => "Created at",
        InfraStatus::Creating => "Started creating at",
        InfraStatus::Deleted => "Deleted at",
        InfraStatus::Deleting => "Started deleting at",
        InfraStatus::Updating => "Started updating at",
        _ => "Started",
    }
}

/// Legacy v1 infrastructure record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraV1 {
    pub id: u64,
    pub kind: InfraKind,
    pub status: InfraStatus,
    #[serde(default)]
    pub created_at: String,
}

/// v2 infrastructure record carrying its latest operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraV2 {
    pub id: u64,
    pub kind: InfraKind,
    pub status: InfraStatus,
    #[serde(default)]
    pub updated_at: String,
    pub latest_operation: Operation,
}

/// An infrastructure record, tagged by API version.
///
/// Serde cannot express "empty string means v1" with a plain tag attribute,
/// so deserialization is two-pass: decode the raw value once to read
/// `api_version`, then decode the payload as the matching variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfraRecord {
    V1(InfraV1),
    V2(InfraV2),
}

impl InfraRecord {
    #[must_use]
    pub const fn api_version(&self) -> &'static str {
        match self {
            Self::V1(_) => "v1",
            Self::V2(_) => "v2",
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::V1(infra) => infra.id,
            Self::V2(infra) => infra.id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &InfraKind {
        match self {
            Self::V1(infra) => &infra.kind,
            Self::V2(infra) => &infra.kind,
        }
    }

    #[must_use]
    pub const fn status(&self) -> &InfraStatus {
        match self {
            Self::V1(infra) => &infra.status,
            Self::V2(infra) => &infra.status,
        }
    }
}

impl Serialize for InfraRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::Error;

        let mut value = match self {
            Self::V1(infra) => serde_json::to_value(infra).map_err(S::Error::custom)?,
            Self::V2(infra) => serde_json::to_value(infra).map_err(S::Error::custom)?,
        };
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "api_version".to_string(),
                serde_json::Value::String(self.api_version().to_string()),
            );
        }
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InfraRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let raw = serde_json::Value::deserialize(deserializer)?;
        let version = raw
            .get("api_version")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("");

        match version {
            "" | "v1" => serde_json::from_value(raw)
                .map(Self::V1)
                .map_err(D::Error::custom),
            "v2" => serde_json::from_value(raw)
                .map(Self::V2)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "unsupported infra api_version '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InfraKind, InfraRecord, InfraStatus, timestamp_label};

    #[test]
    fn kind_display_metadata() {
        assert_eq!(
            InfraKind::Eks.long_name(),
            "Elastic Kubernetes Service (EKS)"
        );
        assert_eq!(InfraKind::Docr.provider_name(), "DigitalOcean");
        assert_eq!(InfraKind::Gke.provider_name(), "Google Cloud Platform (GCP)");
    }

    #[test]
    fn unknown_kind_roundtrips() {
        let kind: InfraKind = serde_json::from_str("\"aks\"").unwrap();
        assert_eq!(kind, InfraKind::Other("aks".into()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"aks\"");
    }

    #[test]
    fn status_predicates() {
        assert!(InfraStatus::Destroyed.is_gone());
        assert!(InfraStatus::Deleted.is_gone());
        assert!(!InfraStatus::Created.is_gone());
        assert!(InfraStatus::Updating.in_progress());
        assert!(!InfraStatus::Errored.in_progress());
    }

    #[test]
    fn timestamp_labels() {
        assert_eq!(timestamp_label(&InfraStatus::Created), "Created at");
        assert_eq!(
            timestamp_label(&InfraStatus::Creating),
            "Started creating at"
        );
        assert_eq!(timestamp_label(&InfraStatus::Errored), "Started");
    }

    #[test]
    fn empty_api_version_is_v1() {
        let record: InfraRecord = serde_json::from_str(
            r#"{"api_version":"","id":3,"kind":"ecr","status":"destroyed","created_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(matches!(record, InfraRecord::V1(_)));
        assert_eq!(record.api_version(), "v1");
        assert_eq!(*record.kind(), InfraKind::Ecr);
    }

    #[test]
    fn missing_api_version_is_v1() {
        let record: InfraRecord =
            serde_json::from_str(r#"{"id":3,"kind":"ecr","status":"created"}"#).unwrap();
        assert!(matches!(record, InfraRecord::V1(_)));
    }

    #[test]
    fn v2_record_carries_latest_operation() {
        let record: InfraRecord = serde_json::from_str(
            r#"{
                "api_version": "v2",
                "id": 7,
                "kind": "doks",
                "status": "creating",
                "updated_at": "2024-03-01T10:00:00Z",
                "latest_operation": {
                    "id": "op-9",
                    "type": "create",
                    "status": "starting",
                    "last_updated": "2024-03-01T10:00:00Z"
                }
            }"#,
        )
        .unwrap();

        let InfraRecord::V2(infra) = record else {
            panic!("expected v2 record");
        };
        assert_eq!(infra.latest_operation.id, "op-9");
        assert!(infra.status.in_progress());
    }

    #[test]
    fn unsupported_api_version_is_rejected() {
        let result: Result<InfraRecord, _> =
            serde_json::from_str(r#"{"api_version":"v3","id":1,"kind":"eks","status":"created"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn serialize_reemits_api_version() {
        let record: InfraRecord =
            serde_json::from_str(r#"{"id":3,"kind":"rds","status":"created"}"#).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["api_version"], "v1");
        assert_eq!(json["kind"], "rds");
    }
}
