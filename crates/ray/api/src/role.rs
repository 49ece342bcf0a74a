use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::volume::VolumeSpec;

/// Fields shared by every role of a cluster, regardless of its kind.
pub trait RoleSpec {
    const KIND: RoleKind;

    fn compute_template(&self) -> &str;

    fn image(&self) -> Option<&str>;

    fn ray_start_params(&self) -> &BTreeMap<String, String>;

    fn environment(&self) -> &BTreeMap<String, String>;

    fn annotations(&self) -> &BTreeMap<String, String>;

    fn labels(&self) -> &BTreeMap<String, String>;

    fn volumes(&self) -> &[VolumeSpec];
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum RoleKind {
    Head,
    Worker,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeadGroupSpec {
    pub compute_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(default)]
    pub ray_start_params: BTreeMap<String, String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub volumes: Vec<VolumeSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerGroupSpec {
    pub group_name: String,
    pub compute_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub replicas: i32,
    #[serde(default)]
    pub min_replicas: i32,
    #[serde(default)]
    pub max_replicas: i32,
    #[serde(default)]
    pub ray_start_params: BTreeMap<String, String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub volumes: Vec<VolumeSpec>,
}

macro_rules! impl_role_spec {
    ( $ty:ty => $kind:expr ) => {
        impl RoleSpec for $ty {
            const KIND: RoleKind = $kind;

            fn compute_template(&self) -> &str {
                &self.compute_template
            }

            fn image(&self) -> Option<&str> {
                self.image.as_deref().filter(|image| !image.is_empty())
            }

            fn ray_start_params(&self) -> &BTreeMap<String, String> {
                &self.ray_start_params
            }

            fn environment(&self) -> &BTreeMap<String, String> {
                &self.environment
            }

            fn annotations(&self) -> &BTreeMap<String, String> {
                &self.annotations
            }

            fn labels(&self) -> &BTreeMap<String, String> {
                &self.labels
            }

            fn volumes(&self) -> &[VolumeSpec] {
                &self.volumes
            }
        }
    };
}

impl_role_spec!(HeadGroupSpec => RoleKind::Head);
impl_role_spec!(WorkerGroupSpec => RoleKind::Worker);
