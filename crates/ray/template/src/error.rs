use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("volume {volume:?}: unsupported volume type: {volume_type}")]
    UnsupportedVolumeType { volume: String, volume_type: String },
    #[error("volume {volume:?}: inconsistent spec: {reason}")]
    InconsistentVolumeSpec { volume: String, reason: String },
    #[error("volume {volume:?}: duplicated volume name")]
    DuplicateVolumeName { volume: String },
    #[error("volumes {first:?} and {second:?}: both are mounted on {mount_path:?}")]
    MountPathConflict {
        mount_path: String,
        first: String,
        second: String,
    },
    #[error("compute template {namespace}/{name}: not found")]
    MissingComputeTemplate { namespace: String, name: String },
    #[error("compute template {name:?}: {reason}")]
    InvalidComputeTemplate { name: String, reason: String },
    #[error("worker group {group:?}: duplicated group name")]
    DuplicateWorkerGroup { group: String },
}

pub type Result<T, E = TemplateError> = ::core::result::Result<T, E>;
