//! Logging setup for the storyshare binary
//!
//! One subscriber stack: `EnvFilter`, a compact formatter on stderr (stdout
//! carries command output such as hashes and JSON reports), and, with the
//! `telemetry` feature, an OTLP span exporter.
//!
//! `RUST_LOG` always wins over the built-in filters. Without it, `--debug`
//! (or `DEBUG=true`) turns on debug output for storyshare and request
//! tracing while keeping sqlx at info.
//!
//! Telemetry environment:
//!   OTEL_EXPORTER_OTLP_ENDPOINT       # OTLP endpoint (default: http://localhost:4317)
//!   OTEL_SERVICE_NAME                 # Service name (default: storyshare)

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor debug mode is set
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Filter used in debug mode when `RUST_LOG` is unset
pub const DEBUG_FILTER: &str =
    "info,storyshare=debug,storyshare_server=debug,tower_http=debug,sqlx=info";

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    pub debug: bool,
    /// Export spans over OTLP (needs the telemetry feature)
    pub otel: bool,
}

impl TracingConfig {
    fn default_filter(&self) -> &'static str {
        if self.debug {
            DEBUG_FILTER
        } else {
            DEFAULT_FILTER
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_filter()))
    }
}

/// Keeps the exporter alive; flushes pending spans when dropped.
#[must_use = "dropping the guard stops span export"]
pub struct TracingGuard {
    #[cfg_attr(not(feature = "telemetry"), allow(dead_code))]
    otel: bool,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if self.otel {
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init(config: &TracingConfig) -> Result<TracingGuard> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.debug)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer);

    #[cfg(feature = "telemetry")]
    let registry = registry.with(if config.otel {
        Some(otlp::layer()?)
    } else {
        None
    });

    #[cfg(not(feature = "telemetry"))]
    if config.otel {
        eprintln!("warning: --otel ignored, built without the telemetry feature");
    }

    registry.try_init().map_err(|err| anyhow!(err))?;

    Ok(TracingGuard { otel: config.otel })
}

#[cfg(feature = "telemetry")]
mod otlp {
    use anyhow::{anyhow, Result};
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{Tracer, TracerProvider};
    use tracing::Subscriber;
    use tracing_opentelemetry::OpenTelemetryLayer;
    use tracing_subscriber::registry::LookupSpan;

    /// Span export layer; the provider is registered globally so it lives
    /// until [`super::TracingGuard`] shuts it down.
    pub fn layer<S>() -> Result<OpenTelemetryLayer<S, Tracer>>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4317".to_string());
        let service_name =
            std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "storyshare".to_string());

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&endpoint)
            .build()
            .map_err(|e| anyhow!("Failed to create OTLP exporter for {}: {}", endpoint, e))?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_resource(opentelemetry_sdk::Resource::new(vec![KeyValue::new(
                "service.name",
                service_name,
            )]))
            .build();

        let tracer = provider.tracer("storyshare");
        let _ = opentelemetry::global::set_tracer_provider(provider);

        Ok(tracing_opentelemetry::layer().with_tracer(tracer))
    }
}
