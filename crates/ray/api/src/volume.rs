use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::Display;

/// A storage mount requested by a head or worker role.
///
/// This is the flat form accepted from clients: the fields that are
/// meaningful depend on [`VolumeType`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    /// Unique within a role; joins the pod volume with its container mount.
    pub name: String,
    pub volume_type: VolumeType,
    /// Host filesystem path, used by [`VolumeType::HostPath`] only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub mount_path: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub mount_propagation_mode: MountPropagationMode,
    /// Used by [`VolumeType::HostPath`] only; `Directory` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path_type: Option<HostPathType>,
}

#[derive(
    Clone, Debug, Default, Display, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum VolumeType {
    #[default]
    #[serde(alias = "PERSISTENT_VOLUME_CLAIM")]
    PersistentVolumeClaim,
    #[serde(alias = "HOST_PATH")]
    HostPath,
    #[serde(alias = "EPHEMERAL")]
    Ephemeral,
    #[serde(other)]
    Unknown,
}

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum MountPropagationMode {
    #[default]
    #[serde(alias = "NONE")]
    None,
    #[serde(alias = "HOSTTOCONTAINER")]
    HostToContainer,
    #[serde(alias = "BIDIRECTIONAL")]
    Bidirectional,
}

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum HostPathType {
    #[default]
    #[serde(alias = "DIRECTORY")]
    Directory,
    #[serde(alias = "FILE")]
    File,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_with_defaults() {
        let spec: VolumeSpec = ::serde_json::from_str(
            r#"{
                "name": "hdfs",
                "volumeType": "HostPath",
                "source": "/opt/hdfs",
                "mountPath": "/mnt/hdfs",
                "readOnly": true
            }"#,
        )
        .unwrap();

        assert_eq!(spec.volume_type, VolumeType::HostPath);
        assert_eq!(spec.mount_propagation_mode, MountPropagationMode::None);
        assert_eq!(spec.host_path_type, None);
    }

    #[test]
    fn deserialize_legacy_enum_names() {
        let spec: VolumeSpec = ::serde_json::from_str(
            r#"{
                "name": "test-file",
                "volumeType": "HOST_PATH",
                "mountPath": "/proc/stat",
                "mountPropagationMode": "HOSTTOCONTAINER",
                "hostPathType": "FILE"
            }"#,
        )
        .unwrap();

        assert_eq!(spec.volume_type, VolumeType::HostPath);
        assert_eq!(
            spec.mount_propagation_mode,
            MountPropagationMode::HostToContainer,
        );
        assert_eq!(spec.host_path_type, Some(HostPathType::File));
    }
}
