use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::role::{HeadGroupSpec, WorkerGroupSpec};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub user: String,
    /// Ray version; selects the default image of roles without one.
    pub version: String,
    #[serde(default)]
    pub environment: ClusterEnvironment,
    pub cluster_spec: ClusterRoles,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoles {
    pub head_group_spec: HeadGroupSpec,
    #[serde(default)]
    pub worker_group_spec: Vec<WorkerGroupSpec>,
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterEnvironment {
    #[default]
    Dev,
    Testing,
    Staging,
    Production,
}
