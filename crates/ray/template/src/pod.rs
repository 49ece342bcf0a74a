use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, ExecAction, Lifecycle, LifecycleHandler,
    ObjectFieldSelector, PodSpec, PodTemplateSpec,
};
use kube::core::ObjectMeta;
use ray_api::{
    compute::ComputeTemplate,
    role::{HeadGroupSpec, RoleKind, RoleSpec, WorkerGroupSpec},
};
use tracing::{instrument, Level};

use crate::{
    compute::{resolve_resources, resolve_tolerations},
    error::Result,
    volume::TranslatedVolumes,
};

pub const DEFAULT_IMAGE_REPOSITORY: &str = "rayproject/ray";

pub const CONTAINER_NAME_HEAD: &str = "ray-head";
pub const CONTAINER_NAME_WORKER: &str = "ray-worker";

pub const ENV_POD_IP: &str = "MY_POD_IP";

pub const PORT_GCS_SERVER: i32 = 6379;
pub const PORT_CLIENT: i32 = 10001;
pub const PORT_DASHBOARD: i32 = 8265;
pub const PORT_METRICS: i32 = 8080;

/// Environment injected by the operator into every role.
///
/// Role-level environment takes precedence on a key collision.
pub type InternalParams = BTreeMap<String, String>;

pub fn build_head_pod_template(
    ray_version: &str,
    internal_params: &InternalParams,
    head: &HeadGroupSpec,
    template: &ComputeTemplate,
) -> Result<PodTemplateSpec> {
    PodTemplateAssembler::default().build(ray_version, internal_params, head, template)
}

pub fn build_worker_pod_template(
    ray_version: &str,
    internal_params: &InternalParams,
    worker: &WorkerGroupSpec,
    template: &ComputeTemplate,
) -> Result<PodTemplateSpec> {
    PodTemplateAssembler::default().build(ray_version, internal_params, worker, template)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodTemplateAssembler {
    image_repository: String,
}

impl Default for PodTemplateAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_REPOSITORY)
    }
}

impl PodTemplateAssembler {
    pub fn new(image_repository: impl Into<String>) -> Self {
        Self {
            image_repository: image_repository.into(),
        }
    }

    /// Compiles the pod template of a single role.
    ///
    /// Either the whole template is returned or the first validation error.
    #[instrument(
        level = Level::INFO,
        skip_all,
        fields(role = %R::KIND, compute_template = role.compute_template()),
        err(Display)
    )]
    pub fn build<R>(
        &self,
        ray_version: &str,
        internal_params: &InternalParams,
        role: &R,
        template: &ComputeTemplate,
    ) -> Result<PodTemplateSpec>
    where
        R: RoleSpec,
    {
        let TranslatedVolumes {
            volumes,
            volume_mounts,
        } = crate::volume::translate(role.volumes())?;
        let resources = resolve_resources(template);
        let tolerations = resolve_tolerations(template);

        let image = role
            .image()
            .map(Into::into)
            .unwrap_or_else(|| format!("{}:{ray_version}", &self.image_repository));

        let (name, ports) = match R::KIND {
            RoleKind::Head => (CONTAINER_NAME_HEAD, Some(head_ports())),
            RoleKind::Worker => (CONTAINER_NAME_WORKER, None),
        };

        Ok(PodTemplateSpec {
            metadata: Some(ObjectMeta {
                annotations: non_empty_map(role.annotations()),
                labels: non_empty_map(role.labels()),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: name.into(),
                    image: Some(image),
                    env: Some(build_env(internal_params, role.environment())),
                    lifecycle: Some(Lifecycle {
                        pre_stop: Some(LifecycleHandler {
                            exec: Some(ExecAction {
                                command: Some(vec![
                                    "/bin/sh".into(),
                                    "-c".into(),
                                    "ray stop".into(),
                                ]),
                            }),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ports,
                    resources: Some(resources),
                    volume_mounts: non_empty(volume_mounts),
                    ..Default::default()
                }],
                tolerations: non_empty(tolerations),
                volumes: non_empty(volumes),
                ..Default::default()
            }),
        })
    }
}

fn build_env(
    internal_params: &InternalParams,
    environment: &BTreeMap<String, String>,
) -> Vec<EnvVar> {
    let mut merged: BTreeMap<&str, &str> = internal_params
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    merged.extend(
        environment
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );

    let pod_ip = if merged.contains_key(ENV_POD_IP) {
        None
    } else {
        Some(EnvVar {
            name: ENV_POD_IP.into(),
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: "status.podIP".into(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
    };

    pod_ip
        .into_iter()
        .chain(merged.into_iter().map(|(name, value)| EnvVar {
            name: name.into(),
            value: Some(value.into()),
            ..Default::default()
        }))
        .collect()
}

fn head_ports() -> Vec<ContainerPort> {
    [
        ("gcs-server", PORT_GCS_SERVER),
        ("client", PORT_CLIENT),
        ("dashboard", PORT_DASHBOARD),
        ("metrics", PORT_METRICS),
    ]
    .into_iter()
    .map(|(name, port)| ContainerPort {
        name: Some(name.into()),
        container_port: port,
        ..Default::default()
    })
    .collect()
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn non_empty_map(map: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    if map.is_empty() {
        None
    } else {
        Some(map.clone())
    }
}
