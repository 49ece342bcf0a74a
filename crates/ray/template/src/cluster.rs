use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::core::v1::PodTemplateSpec;
use kube::core::ObjectMeta;
use ray_api::{
    cluster::{ClusterRoles, ClusterSpec},
    consts,
    role::{HeadGroupSpec, RoleSpec, WorkerGroupSpec},
};
use serde::Serialize;
use tracing::{info, instrument, warn, Level};

use crate::{
    config::TemplateConfig,
    error::{Result, TemplateError},
    pod::PodTemplateAssembler,
    source::ComputeTemplateSource,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadGroupTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    pub ray_start_params: BTreeMap<String, String>,
    pub template: PodTemplateSpec,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerGroupTemplate {
    pub group_name: String,
    pub replicas: i32,
    pub min_replicas: i32,
    pub max_replicas: i32,
    pub ray_start_params: BTreeMap<String, String>,
    pub template: PodTemplateSpec,
}

/// Outcome of compiling every role of a cluster.
///
/// A failing role does not prevent its siblings from being compiled.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterTemplate {
    pub metadata: ObjectMeta,
    pub ray_version: String,
    pub head_group: Result<HeadGroupTemplate>,
    pub worker_groups: Vec<(String, Result<WorkerGroupTemplate>)>,
}

impl ClusterTemplate {
    pub fn is_ok(&self) -> bool {
        self.head_group.is_ok() && self.worker_groups.iter().all(|(_, group)| group.is_ok())
    }

    /// Collapses the per-role outcomes, failing with the first error.
    pub fn into_result(self) -> Result<CompiledCluster> {
        Ok(CompiledCluster {
            metadata: self.metadata,
            ray_version: self.ray_version,
            head_group: self.head_group?,
            worker_groups: self
                .worker_groups
                .into_iter()
                .map(|(_, group)| group)
                .collect::<Result<_>>()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledCluster {
    pub metadata: ObjectMeta,
    pub ray_version: String,
    pub head_group: HeadGroupTemplate,
    pub worker_groups: Vec<WorkerGroupTemplate>,
}

pub struct ClusterCompiler<S> {
    assembler: PodTemplateAssembler,
    config: TemplateConfig,
    source: S,
}

impl<S> ClusterCompiler<S>
where
    S: ComputeTemplateSource,
{
    pub fn new(config: TemplateConfig, source: S) -> Self {
        Self {
            assembler: PodTemplateAssembler::new(config.image_repository.clone()),
            config,
            source,
        }
    }

    #[instrument(
        level = Level::INFO,
        skip_all,
        fields(namespace = %spec.namespace, name = %spec.name)
    )]
    pub fn compile(&self, spec: &ClusterSpec) -> ClusterTemplate {
        let ClusterRoles {
            head_group_spec,
            worker_group_spec,
        } = &spec.cluster_spec;

        let head_group = self.compile_head(spec, head_group_spec);
        if let Err(error) = &head_group {
            warn!("failed to compile the head group: {error}");
        }

        let mut group_names = BTreeSet::default();
        let worker_groups: Vec<_> = worker_group_spec
            .iter()
            .map(|worker| {
                let group = if group_names.insert(worker.group_name.as_str()) {
                    self.compile_worker(spec, worker)
                } else {
                    Err(TemplateError::DuplicateWorkerGroup {
                        group: worker.group_name.clone(),
                    })
                };
                if let Err(error) = &group {
                    warn!(
                        "failed to compile the worker group ({}): {error}",
                        &worker.group_name,
                    );
                }
                (worker.group_name.clone(), group)
            })
            .collect();

        let template = ClusterTemplate {
            metadata: ObjectMeta {
                name: Some(spec.name.clone()),
                namespace: Some(spec.namespace.clone()),
                labels: Some(cluster_labels(spec)),
                ..Default::default()
            },
            ray_version: spec.version.clone(),
            head_group,
            worker_groups,
        };
        if template.is_ok() {
            info!("compiled cluster ({}/{})", &spec.namespace, &spec.name);
        }
        template
    }

    fn compile_head(
        &self,
        spec: &ClusterSpec,
        head: &HeadGroupSpec,
    ) -> Result<HeadGroupTemplate> {
        Ok(HeadGroupTemplate {
            service_type: head.service_type.clone(),
            ray_start_params: head.ray_start_params.clone(),
            template: self.compile_role(spec, head)?,
        })
    }

    fn compile_worker(
        &self,
        spec: &ClusterSpec,
        worker: &WorkerGroupSpec,
    ) -> Result<WorkerGroupTemplate> {
        Ok(WorkerGroupTemplate {
            group_name: worker.group_name.clone(),
            replicas: worker.replicas,
            min_replicas: worker.min_replicas,
            max_replicas: worker.max_replicas,
            ray_start_params: worker.ray_start_params.clone(),
            template: self.compile_role(spec, worker)?,
        })
    }

    fn compile_role<R>(&self, spec: &ClusterSpec, role: &R) -> Result<PodTemplateSpec>
    where
        R: RoleSpec,
    {
        let template = self
            .source
            .get(&spec.namespace, role.compute_template())?;
        self.assembler.build(
            &spec.version,
            &self.config.internal_params,
            role,
            &template,
        )
    }
}

fn cluster_labels(spec: &ClusterSpec) -> BTreeMap<String, String> {
    [
        (consts::LABEL_CLUSTER_NAME, spec.name.clone()),
        (consts::LABEL_CLUSTER_USER, spec.user.clone()),
        (consts::LABEL_CLUSTER_VERSION, spec.version.clone()),
        (
            consts::LABEL_CLUSTER_ENVIRONMENT,
            spec.environment.to_string(),
        ),
        (consts::LABEL_APP_NAME, consts::LABEL_APP_NAME_VALUE.into()),
        (
            consts::LABEL_MANAGED_BY,
            consts::LABEL_MANAGED_BY_VALUE.into(),
        ),
    ]
    .into_iter()
    .map(|(key, value)| (key.into(), value))
    .collect()
}
