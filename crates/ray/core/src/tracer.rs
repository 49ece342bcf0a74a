use std::env;

use tracing::dispatcher;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const KEY: &str = "RUST_LOG";

fn init_once_registry() {
    // Skip init if has been set
    if dispatcher::has_been_set() {
        return;
    }

    Registry::default()
        .with(EnvFilter::from_default_env())
        .with(::tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}

pub fn init_once() {
    // Skip init if has been set
    if dispatcher::has_been_set() {
        return;
    }

    // set default tracing level
    if env::var_os(KEY).is_none() {
        env::set_var(KEY, "INFO");
    }

    init_once_registry()
}
