use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{ResourceRequirements, Toleration},
    apimachinery::pkg::api::resource::Quantity,
};
use ray_api::compute::{ComputeTemplate, PodToleration};

pub const DEFAULT_GPU_ACCELERATOR: &str = "nvidia.com/gpu";

/// Requests and limits are always identical.
pub fn resolve_resources(template: &ComputeTemplate) -> ResourceRequirements {
    let ComputeTemplate {
        cpu,
        memory,
        gpu,
        gpu_accelerator,
        ..
    } = template;

    let mut quantities = BTreeMap::default();
    quantities.insert("cpu".into(), Quantity(cpu.to_string()));
    quantities.insert("memory".into(), Quantity(format!("{memory}Gi")));
    if *gpu > 0 {
        let accelerator = gpu_accelerator
            .as_deref()
            .filter(|accelerator| !accelerator.is_empty())
            .unwrap_or(DEFAULT_GPU_ACCELERATOR);
        quantities.insert(accelerator.into(), Quantity(gpu.to_string()));
    }

    ResourceRequirements {
        limits: Some(quantities.clone()),
        requests: Some(quantities),
        ..Default::default()
    }
}

pub fn resolve_tolerations(template: &ComputeTemplate) -> Vec<Toleration> {
    template.tolerations.iter().map(resolve_toleration).collect()
}

fn resolve_toleration(toleration: &PodToleration) -> Toleration {
    fn non_empty(value: &str) -> Option<String> {
        if value.is_empty() {
            None
        } else {
            Some(value.into())
        }
    }

    let PodToleration {
        key,
        operator,
        value,
        effect,
        toleration_seconds,
    } = toleration;

    Toleration {
        effect: non_empty(effect),
        key: non_empty(key),
        operator: non_empty(operator),
        toleration_seconds: *toleration_seconds,
        value: non_empty(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ComputeTemplate {
        ComputeTemplate {
            name: "foo".into(),
            cpu: 2,
            memory: 8,
            tolerations: vec![PodToleration {
                key: "blah1".into(),
                operator: "Exists".into(),
                effect: "NoExecute".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn cpu_and_memory() {
        let resources = resolve_resources(&template());

        let expected: BTreeMap<_, _> = [
            ("cpu".to_string(), Quantity("2".into())),
            ("memory".to_string(), Quantity("8Gi".into())),
        ]
        .into_iter()
        .collect();
        assert_eq!(resources.limits.as_ref(), Some(&expected));
        assert_eq!(resources.requests.as_ref(), Some(&expected));
    }

    #[test]
    fn gpu_with_default_accelerator() {
        let template = ComputeTemplate {
            gpu: 1,
            ..template()
        };

        let resources = resolve_resources(&template);
        let limits = resources.limits.unwrap();
        assert_eq!(limits.get(DEFAULT_GPU_ACCELERATOR), Some(&Quantity("1".into())));
        assert_eq!(resources.requests.unwrap(), limits);
    }

    #[test]
    fn gpu_with_custom_accelerator() {
        let template = ComputeTemplate {
            gpu: 4,
            gpu_accelerator: Some("amd.com/gpu".into()),
            ..template()
        };

        let limits = resolve_resources(&template).limits.unwrap();
        assert_eq!(limits.get("amd.com/gpu"), Some(&Quantity("4".into())));
        assert!(!limits.contains_key(DEFAULT_GPU_ACCELERATOR));
    }

    #[test]
    fn tolerations_field_by_field() {
        let template = ComputeTemplate {
            tolerations: vec![
                PodToleration {
                    key: "blah1".into(),
                    operator: "Exists".into(),
                    effect: "NoExecute".into(),
                    ..Default::default()
                },
                PodToleration {
                    key: "gpu".into(),
                    operator: "Equal".into(),
                    value: "a100".into(),
                    effect: "NoSchedule".into(),
                    toleration_seconds: Some(30),
                },
            ],
            ..template()
        };

        let expected = vec![
            Toleration {
                key: Some("blah1".into()),
                operator: Some("Exists".into()),
                effect: Some("NoExecute".into()),
                ..Default::default()
            },
            Toleration {
                key: Some("gpu".into()),
                operator: Some("Equal".into()),
                value: Some("a100".into()),
                effect: Some("NoSchedule".into()),
                toleration_seconds: Some(30),
            },
        ];
        assert_eq!(resolve_tolerations(&template), expected);
    }

    #[test]
    fn no_tolerations() {
        let template = ComputeTemplate {
            tolerations: vec![],
            ..template()
        };

        assert!(resolve_tolerations(&template).is_empty());
    }
}
