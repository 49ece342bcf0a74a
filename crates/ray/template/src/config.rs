use std::str::FromStr;

use anyhow::{anyhow, Error, Result};
use ray_core::env::{infer_or_else, Infer};

use crate::pod::{InternalParams, DEFAULT_IMAGE_REPOSITORY};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Image used by roles without one, tagged with the cluster's Ray version.
    pub image_repository: String,
    pub internal_params: InternalParams,
}

impl TemplateConfig {
    pub const KEY_IMAGE_REPOSITORY: &'static str = "RAY_TEMPLATE_IMAGE_REPOSITORY";
    pub const KEY_INTERNAL_PARAMS: &'static str = "RAY_TEMPLATE_ENV";
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            image_repository: DEFAULT_IMAGE_REPOSITORY.into(),
            internal_params: InternalParams::default(),
        }
    }
}

impl Infer for TemplateConfig {
    fn try_infer() -> Result<Self> {
        Ok(Self {
            image_repository: infer_or_else(Self::KEY_IMAGE_REPOSITORY, || {
                DEFAULT_IMAGE_REPOSITORY.into()
            })?,
            internal_params: infer_or_else(Self::KEY_INTERNAL_PARAMS, EnvPairs::default)?.0,
        })
    }
}

/// Comma-separated `KEY=VALUE` pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct EnvPairs(InternalParams);

impl FromStr for EnvPairs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    Ok((key.trim().to_string(), value.trim().to_string()))
                }
                _ => Err(anyhow!("expected KEY=VALUE, but given {pair:?}")),
            })
            .collect::<Result<_>>()
            .map(Self)
    }
}
