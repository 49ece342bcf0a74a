use k8s_openapi::api::core::v1::{Container, EnvVar, PodTemplateSpec, Toleration};
use maplit::btreemap;
use ray_api::{
    compute::{ComputeTemplate, PodToleration},
    role::{HeadGroupSpec, WorkerGroupSpec},
    volume::{VolumeSpec, VolumeType},
};
use ray_template::{
    pod::{
        build_head_pod_template, build_worker_pod_template, InternalParams, PodTemplateAssembler,
        CONTAINER_NAME_HEAD, CONTAINER_NAME_WORKER, ENV_POD_IP,
    },
    TemplateError,
};

fn head_group() -> HeadGroupSpec {
    HeadGroupSpec {
        compute_template: "foo".into(),
        image: Some("bar".into()),
        service_type: Some("ClusterIP".into()),
        ray_start_params: btreemap! {
            "dashboard-host".into() => "0.0.0.0".into(),
            "metrics-export-port".into() => "8080".into(),
            "num-cpus".into() => "0".into(),
        },
        environment: btreemap! { "foo".into() => "bar".into() },
        annotations: btreemap! { "foo".into() => "bar".into() },
        labels: btreemap! { "foo".into() => "bar".into() },
        volumes: vec![],
    }
}

fn worker_group() -> WorkerGroupSpec {
    WorkerGroupSpec {
        group_name: "wg".into(),
        compute_template: "foo".into(),
        image: Some("bar".into()),
        replicas: 5,
        min_replicas: 5,
        max_replicas: 5,
        ray_start_params: btreemap! { "node-ip-address".into() => "$MY_POD_IP".into() },
        environment: btreemap! { "foo".into() => "bar".into() },
        annotations: btreemap! { "foo".into() => "bar".into() },
        labels: btreemap! { "foo".into() => "bar".into() },
        volumes: vec![],
    }
}

fn compute_template() -> ComputeTemplate {
    ComputeTemplate {
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

fn expected_toleration() -> Toleration {
    Toleration {
        key: Some("blah1".into()),
        operator: Some("Exists".into()),
        effect: Some("NoExecute".into()),
        ..Default::default()
    }
}

fn container(template: &PodTemplateSpec) -> &Container {
    &template.spec.as_ref().unwrap().containers[0]
}

fn env_value<'a>(template: &'a PodTemplateSpec, name: &str) -> Option<&'a str> {
    container(template)
        .env
        .iter()
        .flatten()
        .find(|env| env.name == name)
        .and_then(|env| env.value.as_deref())
}

fn assert_role_fields_propagated(template: &PodTemplateSpec) {
    assert_eq!(env_value(template, "foo"), Some("bar"));

    let tolerations = template.spec.as_ref().unwrap().tolerations.as_ref().unwrap();
    assert_eq!(tolerations, &vec![expected_toleration()]);

    let metadata = template.metadata.as_ref().unwrap();
    let expected = btreemap! { "foo".to_string() => "bar".to_string() };
    assert_eq!(metadata.annotations.as_ref(), Some(&expected));
    assert_eq!(metadata.labels.as_ref(), Some(&expected));
}

#[test]
fn build_head_template() {
    let template =
        build_head_pod_template("2.4", &InternalParams::default(), &head_group(), &compute_template())
            .unwrap();

    assert_role_fields_propagated(&template);

    let container = container(&template);
    assert_eq!(container.name, CONTAINER_NAME_HEAD);
    assert_eq!(container.image.as_deref(), Some("bar"));
    assert_eq!(container.ports.as_ref().map(Vec::len), Some(4));
}

#[test]
fn build_worker_template() {
    let template = build_worker_pod_template(
        "2.4",
        &InternalParams::default(),
        &worker_group(),
        &compute_template(),
    )
    .unwrap();

    assert_role_fields_propagated(&template);

    let container = container(&template);
    assert_eq!(container.name, CONTAINER_NAME_WORKER);
    assert_eq!(container.ports, None);
}

#[test]
fn head_and_worker_share_the_same_shape() {
    let internal_params = InternalParams::default();
    let head =
        build_head_pod_template("2.4", &internal_params, &head_group(), &compute_template())
            .unwrap();
    let worker =
        build_worker_pod_template("2.4", &internal_params, &worker_group(), &compute_template())
            .unwrap();

    assert_eq!(head.metadata, worker.metadata);

    let (head_spec, worker_spec) = (head.spec.unwrap(), worker.spec.unwrap());
    assert_eq!(head_spec.tolerations, worker_spec.tolerations);
    assert_eq!(head_spec.volumes, worker_spec.volumes);

    let (head_container, worker_container) = (&head_spec.containers[0], &worker_spec.containers[0]);
    assert_eq!(head_container.env, worker_container.env);
    assert_eq!(head_container.resources, worker_container.resources);
    assert_eq!(head_container.volume_mounts, worker_container.volume_mounts);
}

#[test]
fn role_environment_overrides_internal_params() {
    let internal_params = btreemap! {
        "foo".to_string() => "internal".to_string(),
        "RAY_USAGE_STATS_ENABLED".to_string() => "0".to_string(),
    };

    let template =
        build_head_pod_template("2.4", &internal_params, &head_group(), &compute_template())
            .unwrap();

    assert_eq!(env_value(&template, "foo"), Some("bar"));
    assert_eq!(env_value(&template, "RAY_USAGE_STATS_ENABLED"), Some("0"));

    let names: Vec<_> = container(&template)
        .env
        .iter()
        .flatten()
        .map(|env| env.name.as_str())
        .collect();
    assert_eq!(names, vec![ENV_POD_IP, "RAY_USAGE_STATS_ENABLED", "foo"]);
}

#[test]
fn pod_ip_comes_from_downward_api() {
    let template =
        build_head_pod_template("2.4", &InternalParams::default(), &head_group(), &compute_template())
            .unwrap();

    let pod_ip: &EnvVar = &container(&template).env.as_ref().unwrap()[0];
    assert_eq!(pod_ip.name, ENV_POD_IP);
    assert_eq!(pod_ip.value, None);
    assert_eq!(
        pod_ip
            .value_from
            .as_ref()
            .and_then(|source| source.field_ref.as_ref())
            .map(|field| field.field_path.as_str()),
        Some("status.podIP"),
    );
}

#[test]
fn default_image_follows_ray_version() {
    let head = HeadGroupSpec {
        image: None,
        ..head_group()
    };
    let worker = WorkerGroupSpec {
        image: Some(String::new()),
        ..worker_group()
    };
    let assembler = PodTemplateAssembler::new("registry.local/ray");

    let head = assembler
        .build("2.9.0", &InternalParams::default(), &head, &compute_template())
        .unwrap();
    let worker = assembler
        .build("2.9.0", &InternalParams::default(), &worker, &compute_template())
        .unwrap();

    assert_eq!(container(&head).image.as_deref(), Some("registry.local/ray:2.9.0"));
    assert_eq!(container(&worker).image.as_deref(), Some("registry.local/ray:2.9.0"));
}

#[test]
fn volumes_are_attached_to_pod_and_container() {
    let head = HeadGroupSpec {
        volumes: vec![
            VolumeSpec {
                name: "hdfs".into(),
                volume_type: VolumeType::HostPath,
                source: Some("/opt/hdfs".into()),
                mount_path: "/mnt/hdfs".into(),
                read_only: true,
                ..Default::default()
            },
            VolumeSpec {
                name: "test-pvc".into(),
                volume_type: VolumeType::PersistentVolumeClaim,
                mount_path: "/pvc/dir".into(),
                read_only: true,
                ..Default::default()
            },
        ],
        ..head_group()
    };

    let template =
        build_head_pod_template("2.4", &InternalParams::default(), &head, &compute_template())
            .unwrap();

    let volumes = template.spec.as_ref().unwrap().volumes.as_ref().unwrap();
    let mounts = container(&template).volume_mounts.as_ref().unwrap();
    assert_eq!(volumes.len(), 2);
    assert_eq!(mounts.len(), 2);
    for (volume, mount) in volumes.iter().zip(mounts) {
        assert_eq!(volume.name, mount.name);
    }
}

#[test]
fn no_tolerations_means_none() {
    let template = ComputeTemplate {
        tolerations: vec![],
        ..compute_template()
    };

    let pod = build_worker_pod_template("2.4", &InternalParams::default(), &worker_group(), &template)
        .unwrap();
    assert_eq!(pod.spec.unwrap().tolerations, None);
}

#[test]
fn unsupported_volume_fails_the_role() {
    let worker = WorkerGroupSpec {
        volumes: vec![VolumeSpec {
            name: "scratch".into(),
            volume_type: VolumeType::Ephemeral,
            mount_path: "/scratch".into(),
            ..Default::default()
        }],
        ..worker_group()
    };

    let result =
        build_worker_pod_template("2.4", &InternalParams::default(), &worker, &compute_template());
    assert_eq!(
        result,
        Err(TemplateError::UnsupportedVolumeType {
            volume: "scratch".into(),
            volume_type: "Ephemeral".into(),
        }),
    );
}

#[test]
fn building_twice_yields_the_same_template() {
    let internal_params = btreemap! { "RAY_USAGE_STATS_ENABLED".to_string() => "0".to_string() };

    let first =
        build_head_pod_template("2.4", &internal_params, &head_group(), &compute_template());
    let second =
        build_head_pod_template("2.4", &internal_params, &head_group(), &compute_template());
    assert_eq!(first, second);
}
