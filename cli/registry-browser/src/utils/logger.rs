use std::sync::OnceLock;

use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,registry_browser=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,registry_browser=warn,registry_browser_sdk=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => {
            "off,registry_browser=info,registry_browser_sdk=info,registry_client=info"
        },
        // Also show debug from our libraries
        Verbosity::Verbose(2) => {
            "off,registry_browser=debug,registry_browser_sdk=debug,registry_client=debug"
        },
        Verbosity::Verbose(3) => {
            "off,registry_browser=trace,registry_browser_sdk=trace,registry_client=trace"
        },
        // Also show debug from the http stack
        Verbosity::Verbose(4) => {
            "debug,registry_browser=trace,registry_browser_sdk=trace,registry_client=trace"
        },
        Verbosity::Verbose(_) => "trace",
    }
}

/// Install the subscriber on first use, afterwards only update its filter.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let verbosity = verbosity.unwrap_or_default();

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    update_filters(filter_handle, log_filter(verbosity));
}

pub fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

fn create_registry_and_filter_reload_handle() -> (
    impl tracing_subscriber::layer::SubscriberExt,
    Handle<EnvFilter, Registry>,
) {
    // Starts fully open, the actual filter is set through the handle.
    let filter = EnvFilter::new("trace");
    let (filter, filter_reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(tracing_subscriber::fmt::format())
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(log_layer);

    (registry, filter_reload_handle)
}
