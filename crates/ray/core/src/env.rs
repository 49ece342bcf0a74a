use anyhow::{anyhow, Result};
use tracing::{instrument, Level};

pub trait Infer {
    #[instrument(level = Level::INFO, skip_all)]
    fn infer() -> Self
    where
        Self: Sized,
    {
        // init tracer
        crate::tracer::init_once();

        match <Self as Infer>::try_infer() {
            Ok(this) => this,
            Err(e) => {
                ::tracing::error!("failed to infer: {e}");
                panic!("failed to infer: {e}");
            }
        }
    }

    fn try_infer() -> Result<Self>
    where
        Self: Sized;
}

pub fn infer<K, R>(key: K) -> Result<R>
where
    K: AsRef<str>,
    R: ::core::str::FromStr,
    <R as ::core::str::FromStr>::Err: 'static + Send + Sync + ::core::fmt::Display,
{
    let key = key.as_ref();

    infer_string(key).and_then(|value| parse(key, &value))
}

pub fn infer_or_else<K, R, F>(key: K, default: F) -> Result<R>
where
    K: AsRef<str>,
    R: ::core::str::FromStr,
    <R as ::core::str::FromStr>::Err: 'static + Send + Sync + ::core::fmt::Display,
    F: FnOnce() -> R,
{
    let key = key.as_ref();

    match ::std::env::var(key) {
        Ok(value) => parse(key, &value),
        Err(::std::env::VarError::NotPresent) => Ok(default()),
        Err(error) => Err(anyhow!(
            "failed to read the environment variable ({key}): {error}"
        )),
    }
}

pub fn infer_string<K>(key: K) -> Result<String>
where
    K: AsRef<str>,
{
    let key = key.as_ref();

    ::std::env::var(key).map_err(|_| anyhow!("failed to find the environment variable: {key}"))
}

fn parse<R>(key: &str, value: &str) -> Result<R>
where
    R: ::core::str::FromStr,
    <R as ::core::str::FromStr>::Err: 'static + Send + Sync + ::core::fmt::Display,
{
    value
        .parse()
        .map_err(|error| anyhow!("failed to parse the environment variable ({key}): {error}"))
}
