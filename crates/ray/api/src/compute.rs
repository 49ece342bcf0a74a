use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named bundle of resource quantities and scheduling tolerations,
/// shared by any role that references it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComputeTemplate {
    pub name: String,
    pub namespace: String,
    /// Number of cores.
    pub cpu: u32,
    /// Memory in GiB.
    pub memory: u32,
    #[serde(default)]
    pub gpu: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_accelerator: Option<String>,
    #[serde(default)]
    pub tolerations: Vec<PodToleration>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodToleration {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toleration_seconds: Option<i64>,
}
