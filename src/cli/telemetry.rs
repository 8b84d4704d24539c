use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use opentelemetry::{KeyValue, global, trace::TracerProvider as _};
use opentelemetry_otlp::{WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    trace::{SdkTracerProvider, Tracer},
};
use std::{
    env::var,
    fs,
    path::Path,
    sync::Mutex,
    time::Duration,
};
use tonic::{
    metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue},
    transport::ClientTlsConfig,
};
use tracing::{Level, debug};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

const OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
const OTLP_HEADERS: &str = "OTEL_EXPORTER_OTLP_HEADERS";

const LOG_FILE_PREFIX: &str = "tracker-app";
const LOG_FILE_SUFFIX: &str = "log";
/// Daily files kept in the log directory, today's included.
pub const MAX_LOG_FILES: usize = 5;

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();
static LOG_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

/// `key=value,key=value` pairs from `OTEL_EXPORTER_OTLP_HEADERS`; malformed pairs are skipped.
fn parse_headers(headers: &str) -> Result<MetadataMap> {
    let mut metadata = MetadataMap::new();

    for (key, value) in headers.split(',').filter_map(|pair| pair.split_once('=')) {
        let key = key.trim().to_ascii_lowercase();
        let name = MetadataKey::<Ascii>::from_bytes(key.as_bytes())
            .with_context(|| format!("invalid OTLP header name {key}"))?;
        let value: MetadataValue<Ascii> = value
            .trim()
            .parse()
            .with_context(|| format!("invalid OTLP header value for {key}"))?;
        metadata.insert(name, value);
    }

    Ok(metadata)
}

fn init_tracer(endpoint: &str) -> Result<Tracer> {
    let mut builder = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(Duration::from_secs(3));

    if endpoint.starts_with("https://") {
        builder = builder.with_tls_config(ClientTlsConfig::new().with_native_roots());
    }

    if let Ok(headers) = var(OTLP_HEADERS) {
        builder = builder.with_metadata(parse_headers(&headers)?);
    }

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(builder.build()?)
        .with_resource(
            Resource::builder()
                .with_service_name(env!("CARGO_PKG_NAME"))
                .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
                .build(),
        )
        .build();

    let _ = TRACER_PROVIDER.set(provider.clone());
    global::set_tracer_provider(provider.clone());

    Ok(provider.tracer(env!("CARGO_PKG_NAME")))
}

/// Remove the oldest `tracker-app.<date>.log` files so at most `keep` remain.
/// The date in the name sorts chronologically.
fn prune_log_files(dir: &Path, keep: usize) -> Result<()> {
    let prefix = format!("{LOG_FILE_PREFIX}.");
    let suffix = format!(".{LOG_FILE_SUFFIX}");

    let mut files: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read log directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(&suffix))
        })
        .collect();
    files.sort();

    let excess = files.len().saturating_sub(keep);
    for path in files.into_iter().take(excess) {
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove old log file {}", path.display()))?;
    }

    Ok(())
}

/// Daily rotating appender writing `<dir>/tracker-app.YYYY-MM-DD.log`.
///
/// The appender only prunes when it rolls over, so files left behind by
/// earlier runs are pruned here as well.
fn log_appender(dir: &Path) -> Result<RollingFileAppender> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))?;

    prune_log_files(dir, MAX_LOG_FILES)?;

    Ok(appender)
}

/// Initialize logging, an optional rotating log file and an optional tracing exporter.
/// Tracing is enabled if `OTEL_EXPORTER_OTLP_ENDPOINT` is set (gRPC only).
///
/// # Errors
///
/// Returns an error if the log file, tracer or subscriber cannot be initialized
pub fn init(verbosity_level: Level, log_dir: Option<&Path>) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .pretty();

    let file_layer = match log_dir {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(log_appender(dir)?);
            if let Ok(mut slot) = LOG_GUARD.lock() {
                *slot = Some(guard);
            }
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("tokio=error".parse()?)
        .add_directive("sqlx=warn".parse()?)
        .add_directive("opentelemetry_sdk=warn".parse()?);

    let otel_layer = match var(OTLP_ENDPOINT) {
        Ok(endpoint) => Some(tracing_opentelemetry::layer().with_tracer(init_tracer(&endpoint)?)),
        Err(_) => None,
    };

    let subscriber = Registry::default()
        .with(fmt_layer)
        .with(file_layer)
        .with(otel_layer)
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Flush the tracer provider and the log file writer (noop if not initialized)
pub fn shutdown() {
    if let Some(tp) = TRACER_PROVIDER.get() {
        debug!("shutting down tracer provider");
        let _ = tp.shutdown();
        debug!("tracer provider shutdown complete");
    }

    if let Ok(mut slot) = LOG_GUARD.lock() {
        drop(slot.take());
    }
}
