use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use k8s_openapi::api::core::v1::{
    HostPathVolumeSource, PersistentVolumeClaimVolumeSource, Volume, VolumeMount,
};
use ray_api::volume::{HostPathType, MountPropagationMode, VolumeSpec, VolumeType};
use tracing::{instrument, Level};

use crate::error::{Result, TemplateError};

/// Pod-level volumes and the matching container mounts of a single role.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranslatedVolumes {
    pub volumes: Vec<Volume>,
    pub volume_mounts: Vec<VolumeMount>,
}

#[instrument(level = Level::DEBUG, skip_all, err(Display))]
pub fn translate(specs: &[VolumeSpec]) -> Result<TranslatedVolumes> {
    let resolved = resolve_all(specs)?;
    Ok(TranslatedVolumes {
        volumes: resolved.iter().map(ResolvedVolume::to_volume).collect(),
        volume_mounts: resolved.iter().map(ResolvedVolume::to_volume_mount).collect(),
    })
}

#[instrument(level = Level::DEBUG, skip_all, err(Display))]
pub fn translate_volumes(specs: &[VolumeSpec]) -> Result<Vec<Volume>> {
    resolve_all(specs).map(|resolved| resolved.iter().map(ResolvedVolume::to_volume).collect())
}

#[instrument(level = Level::DEBUG, skip_all, err(Display))]
pub fn translate_mounts(specs: &[VolumeSpec]) -> Result<Vec<VolumeMount>> {
    resolve_all(specs).map(|resolved| {
        resolved
            .iter()
            .map(ResolvedVolume::to_volume_mount)
            .collect()
    })
}

fn resolve_all(specs: &[VolumeSpec]) -> Result<Vec<ResolvedVolume<'_>>> {
    let mut names = BTreeSet::default();
    let mut mount_paths = BTreeMap::default();

    specs
        .iter()
        .map(|spec| {
            let volume = ResolvedVolume::try_from(spec)?;

            if !names.insert(volume.name) {
                return Err(TemplateError::DuplicateVolumeName {
                    volume: volume.name.into(),
                });
            }
            match mount_paths.entry(normalize_mount_path(volume.mount_path)) {
                Entry::Vacant(entry) => {
                    entry.insert(volume.name);
                }
                Entry::Occupied(entry) => {
                    return Err(TemplateError::MountPathConflict {
                        mount_path: volume.mount_path.into(),
                        first: (*entry.get()).into(),
                        second: volume.name.into(),
                    })
                }
            }
            Ok(volume)
        })
        .collect()
}

/// Strips trailing slashes so that `/mnt/data` and `/mnt/data/` collide.
fn normalize_mount_path(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" if path.starts_with('/') => "/",
        trimmed => trimmed,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ResolvedVolume<'a> {
    name: &'a str,
    mount_path: &'a str,
    read_only: bool,
    source: VolumeSource<'a>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum VolumeSource<'a> {
    HostPath {
        path: &'a str,
        type_: HostPathType,
        propagation: MountPropagationMode,
    },
    // NOTE: the claim is always named after the volume itself
    PersistentVolumeClaim { claim_name: &'a str },
}

impl<'a> TryFrom<&'a VolumeSpec> for ResolvedVolume<'a> {
    type Error = TemplateError;

    fn try_from(spec: &'a VolumeSpec) -> Result<Self, Self::Error> {
        let VolumeSpec {
            name,
            volume_type,
            source,
            mount_path,
            read_only,
            mount_propagation_mode,
            host_path_type,
        } = spec;

        let inconsistent = |reason: &str| TemplateError::InconsistentVolumeSpec {
            volume: name.clone(),
            reason: reason.into(),
        };
        let source_path = source.as_deref().filter(|path| !path.is_empty());

        let source = match volume_type {
            VolumeType::HostPath => VolumeSource::HostPath {
                path: source_path.ok_or_else(|| inconsistent("host path volume without source"))?,
                type_: host_path_type.unwrap_or_default(),
                propagation: *mount_propagation_mode,
            },
            VolumeType::PersistentVolumeClaim => {
                if source_path.is_some() {
                    return Err(inconsistent("claim volume with a host source"));
                }
                // an explicit `Directory` is the wire default, not a host path request
                if *host_path_type == Some(HostPathType::File) {
                    return Err(inconsistent("claim volume with a host path type"));
                }
                if *mount_propagation_mode != MountPropagationMode::None {
                    return Err(inconsistent("claim volume with a mount propagation mode"));
                }
                VolumeSource::PersistentVolumeClaim { claim_name: name }
            }
            VolumeType::Ephemeral | VolumeType::Unknown => {
                return Err(TemplateError::UnsupportedVolumeType {
                    volume: name.clone(),
                    volume_type: volume_type.to_string(),
                })
            }
        };

        Ok(Self {
            name,
            mount_path,
            read_only: *read_only,
            source,
        })
    }
}

impl<'a> ResolvedVolume<'a> {
    fn to_volume(&self) -> Volume {
        match self.source {
            VolumeSource::HostPath { path, type_, .. } => Volume {
                name: self.name.into(),
                host_path: Some(HostPathVolumeSource {
                    path: path.into(),
                    type_: Some(type_.to_string()),
                }),
                ..Default::default()
            },
            VolumeSource::PersistentVolumeClaim { claim_name } => Volume {
                name: self.name.into(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: claim_name.into(),
                    read_only: Some(self.read_only),
                }),
                ..Default::default()
            },
        }
    }

    fn to_volume_mount(&self) -> VolumeMount {
        let mount_propagation = match self.source {
            VolumeSource::HostPath { propagation, .. } => match propagation {
                MountPropagationMode::None => None,
                MountPropagationMode::HostToContainer | MountPropagationMode::Bidirectional => {
                    Some(propagation.to_string())
                }
            },
            VolumeSource::PersistentVolumeClaim { .. } => None,
        };

        VolumeMount {
            name: self.name.into(),
            mount_path: self.mount_path.into(),
            mount_propagation,
            read_only: Some(self.read_only),
            ..Default::default()
        }
    }
}
