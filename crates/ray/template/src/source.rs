use std::{borrow::Borrow, collections::BTreeMap};

use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use ray_api::{compute::ComputeTemplate, consts};
use tracing::{debug, instrument, warn, Level};

use crate::error::{Result, TemplateError};

/// Synchronous access to already-resolved compute templates.
pub trait ComputeTemplateSource {
    fn get(&self, namespace: &str, name: &str) -> Result<ComputeTemplate>;
}

/// An immutable, owned copy of the compute templates known at some point.
#[derive(Clone, Debug, Default)]
pub struct ComputeTemplateSnapshot {
    templates: BTreeMap<(String, String), Result<ComputeTemplate>>,
}

impl ComputeTemplateSnapshot {
    /// Collects the compute templates among the given config maps.
    ///
    /// Config maps without the compute template label are ignored.
    /// Malformed ones are kept, so that the roles referencing them fail
    /// with the parse error instead of a missing template.
    #[instrument(level = Level::DEBUG, skip_all)]
    pub fn from_config_maps<I>(config_maps: I) -> Self
    where
        I: IntoIterator,
        <I as IntoIterator>::Item: Borrow<ConfigMap>,
    {
        let mut templates = BTreeMap::default();
        for config_map in config_maps {
            let config_map: &ConfigMap = config_map.borrow();
            if !is_compute_template(config_map) {
                continue;
            }

            let template = parse_config_map(config_map);
            if let Err(error) = &template {
                warn!("invalid compute template: {error}");
            }

            let key = template_key(config_map);
            if templates.insert(key.clone(), template).is_some() {
                let (namespace, name) = key;
                warn!("duplicated compute template ({namespace}/{name}): using the last one");
            }
        }

        debug!("loaded {} compute template(s)", templates.len());
        Self { templates }
    }

    pub fn insert(&mut self, template: ComputeTemplate) {
        let key = (template.namespace.clone(), template.name.clone());
        self.templates.insert(key, Ok(template));
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<ComputeTemplate> for ComputeTemplateSnapshot {
    fn from_iter<T: IntoIterator<Item = ComputeTemplate>>(iter: T) -> Self {
        let mut snapshot = Self::default();
        iter.into_iter()
            .for_each(|template| snapshot.insert(template));
        snapshot
    }
}

impl ComputeTemplateSource for ComputeTemplateSnapshot {
    fn get(&self, namespace: &str, name: &str) -> Result<ComputeTemplate> {
        self.templates
            .get(&(namespace.into(), name.into()))
            .cloned()
            .unwrap_or_else(|| {
                Err(TemplateError::MissingComputeTemplate {
                    namespace: namespace.into(),
                    name: name.into(),
                })
            })
    }
}

fn is_compute_template(config_map: &ConfigMap) -> bool {
    config_map
        .labels()
        .get(consts::LABEL_CONFIG_TYPE)
        .map(String::as_str)
        == Some(consts::LABEL_CONFIG_TYPE_COMPUTE_TEMPLATE)
}

/// Returns the `(namespace, name)` a config map publishes its template under.
///
/// The `name` and `namespace` data keys take precedence over the config
/// map's own metadata.
fn template_key(config_map: &ConfigMap) -> (String, String) {
    let get = |key: &str| {
        config_map
            .data
            .as_ref()
            .and_then(|data| data.get(key))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(String::from)
    };

    let namespace = get("namespace")
        .or_else(|| config_map.namespace())
        .unwrap_or_default();
    let name = get("name").unwrap_or_else(|| config_map.name_any());
    (namespace, name)
}

/// Reads a compute template from the config map it is stored in.
pub fn parse_config_map(config_map: &ConfigMap) -> Result<ComputeTemplate> {
    let get = |key: &str| {
        config_map
            .data
            .as_ref()
            .and_then(|data| data.get(key))
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    };

    let (namespace, name) = template_key(config_map);

    let invalid = |reason: String| TemplateError::InvalidComputeTemplate {
        name: name.clone(),
        reason,
    };
    let parse_quantity = |key: &str, required: bool| match get(key) {
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|error| invalid(format!("invalid {key} {value:?}: {error}"))),
        None if required => Err(invalid(format!("missing {key}"))),
        None => Ok(0),
    };

    let cpu = parse_quantity("cpu", true)?;
    let memory = parse_quantity("memory", true)?;
    let gpu = parse_quantity("gpu", false)?;
    let gpu_accelerator = get("gpu_accelerator").map(Into::into);
    let tolerations = match get("tolerations") {
        Some(value) => ::serde_json::from_str(value)
            .map_err(|error| invalid(format!("invalid tolerations: {error}")))?,
        None => Default::default(),
    };

    Ok(ComputeTemplate {
        name,
        namespace,
        cpu,
        memory,
        gpu,
        gpu_accelerator,
        tolerations,
    })
}
