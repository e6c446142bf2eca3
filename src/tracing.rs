//! Logging and optional OpenTelemetry trace export
//!
//! Diagnostics go to stderr through `tracing`, filtered by `RUST_LOG`
//! (default `warn`, so the interactive session stays readable). When an
//! OTLP endpoint is configured, spans are also exported:
//!
//! ```text
//! shellmate → OTLP (gRPC) → OTel Collector → Tempo / Jaeger
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Error returned when the subscriber or the OTLP pipeline cannot be set up
pub type TracingError = Box<dyn std::error::Error + Send + Sync>;

/// Filter used when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "warn";

static OTEL_ENABLED: AtomicBool = AtomicBool::new(false);

/// Initialize the tracing subsystem
///
/// # Arguments
/// * `service_name` - Name for the service in exported traces
/// * `otlp_endpoint` - OTLP collector URL; `None` disables export
///
/// # Example
/// ```ignore
/// init_tracing("shellmate", None)?;
/// ```
pub fn init_tracing(
    service_name: &str,
    otlp_endpoint: Option<&str>,
) -> Result<(), TracingError> {
    let otel_layer = match otlp_endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint);

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(exporter)
                .with_trace_config(sdktrace::Config::default().with_resource(Resource::new(
                    vec![
                        KeyValue::new("service.name", service_name.to_string()),
                        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                    ],
                )))
                .install_batch(runtime::Tokio)?;

            OTEL_ENABLED.store(true, Ordering::SeqCst);
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    // User-facing output owns stdout, diagnostics go to stderr
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    tracing::info!(
        service = service_name,
        otlp = otlp_endpoint.unwrap_or("disabled"),
        "Tracing initialized"
    );

    Ok(())
}

/// Flush pending spans to the collector, if export was enabled
pub fn shutdown_tracing() {
    if OTEL_ENABLED.swap(false, Ordering::SeqCst) {
        opentelemetry::global::shutdown_tracer_provider();
        tracing::info!("OpenTelemetry tracing shutdown complete");
    }
}
