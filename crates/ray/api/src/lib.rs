pub mod cluster;
pub mod compute;
pub mod role;
pub mod volume;

pub mod consts {
    pub const LABEL_CLUSTER_NAME: &str = "ray.io/cluster-name";
    pub const LABEL_CLUSTER_USER: &str = "ray.io/user";
    pub const LABEL_CLUSTER_VERSION: &str = "ray.io/version";
    pub const LABEL_CLUSTER_ENVIRONMENT: &str = "ray.io/cluster-environment";

    pub const LABEL_CONFIG_TYPE: &str = "ray.io/config-type";
    pub const LABEL_CONFIG_TYPE_COMPUTE_TEMPLATE: &str = "compute-template";

    pub const LABEL_APP_NAME: &str = "app.kubernetes.io/name";
    pub const LABEL_APP_NAME_VALUE: &str = "ray";
    pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
    pub const LABEL_MANAGED_BY_VALUE: &str = "ray-template";
}
