//! Logging and optional OpenTelemetry export.
//!
//! Local logging always goes through a `tracing-subscriber` fmt layer filtered by
//! `RUST_LOG` (default `info`). With the `telemetry` feature enabled and any of
//! `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_EXPORTER_OTLP_HEADERS` or
//! `OTEL_EXPORTER_OTLP_PROTOCOL` set, spans and metrics are also exported over OTLP.

use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(feature = "telemetry")]
use otel::{TelemetryProtocol, init_meter_provider, init_tracer_provider};

/// Telemetry setup. Keep the registered value alive for the life of the process;
/// dropping it flushes and shuts down the exporters.
pub struct Telemetry {
    name: String,
    version: String,
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
    #[cfg(feature = "telemetry")]
    meter_provider: Option<opentelemetry_sdk::metrics::SdkMeterProvider>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            #[cfg(feature = "telemetry")]
            tracer_provider: None,
            #[cfg(feature = "telemetry")]
            meter_provider: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Installs the global subscriber.
    #[cfg(not(feature = "telemetry"))]
    pub fn register(self) -> Self {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer())
            .init();
        tracing::info!(service = %self.name, version = %self.version, "Logging initialized");
        self
    }

    /// Installs the global subscriber, with OTLP layers when OTEL is configured.
    #[cfg(feature = "telemetry")]
    pub fn register(mut self) -> Self {
        use opentelemetry::trace::TracerProvider as _;
        use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};

        let providers = TelemetryProtocol::from_env().map(|protocol| {
            let tracer = init_tracer_provider(&protocol, &self.name, &self.version);
            let meter = init_meter_provider(&protocol, &self.name, &self.version);
            (protocol, tracer, meter)
        });
        match providers {
            Some((protocol, Ok(tracer_provider), Ok(meter_provider))) => {
                let tracer = tracer_provider.tracer("tracing-otel-subscriber");
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(tracing_subscriber::fmt::layer())
                    .with(MetricsLayer::new(meter_provider.clone()))
                    .with(OpenTelemetryLayer::new(tracer))
                    .init();
                tracing::info!(?protocol, "OpenTelemetry tracing and metrics exporter is enabled");
                self.tracer_provider = Some(tracer_provider);
                self.meter_provider = Some(meter_provider);
            }
            Some((protocol, tracer, meter)) => {
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(tracing_subscriber::fmt::layer())
                    .init();
                let error = tracer.err().or(meter.err()).map(|e| e.to_string());
                tracing::warn!(?protocol, ?error, "OpenTelemetry exporter failed to start");
            }
            None => {
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(tracing_subscriber::fmt::layer())
                    .init();
                tracing::info!("OpenTelemetry is not enabled");
            }
        }
        self
    }

    /// Per-request spans for the HTTP server.
    pub fn http_tracing(&self) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
        TraceLayer::new_for_http()
    }
}

#[cfg(feature = "telemetry")]
impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Some(tracer_provider) = self.tracer_provider.as_ref() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
        if let Some(meter_provider) = self.meter_provider.as_ref() {
            if let Err(err) = meter_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}

#[cfg(feature = "telemetry")]
mod otel {
    use opentelemetry::{KeyValue, global};
    use opentelemetry_otlp::ExporterBuildError;
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::metrics::{MeterProviderBuilder, PeriodicReader, SdkMeterProvider};
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
    use opentelemetry_semantic_conventions::SCHEMA_URL;
    use opentelemetry_semantic_conventions::attribute::{
        DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION,
    };
    use std::env;

    #[allow(clippy::upper_case_acronyms)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TelemetryProtocol {
        HTTP,
        GRPC,
    }

    impl TelemetryProtocol {
        /// `None` unless some `OTEL_EXPORTER_OTLP_*` variable is set.
        pub fn from_env() -> Option<Self> {
            let is_enabled = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
                || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
                || env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
            if !is_enabled {
                return None;
            }
            let protocol = match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
                Ok("grpc") => TelemetryProtocol::GRPC,
                _ => TelemetryProtocol::HTTP,
            };
            Some(protocol)
        }
    }

    fn resource(name: &str, version: &str) -> Resource {
        let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_string());
        Resource::builder()
            .with_service_name(name.to_string())
            .with_schema_url(
                [
                    KeyValue::new(SERVICE_VERSION, version.to_string()),
                    KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
                ],
                SCHEMA_URL,
            )
            .build()
    }

    pub fn init_meter_provider(
        protocol: &TelemetryProtocol,
        name: &str,
        version: &str,
    ) -> Result<SdkMeterProvider, ExporterBuildError> {
        let exporter = opentelemetry_otlp::MetricExporter::builder();
        let exporter = match protocol {
            TelemetryProtocol::HTTP => exporter
                .with_http()
                .with_temporality(opentelemetry_sdk::metrics::Temporality::default())
                .build(),
            TelemetryProtocol::GRPC => exporter
                .with_tonic()
                .with_temporality(opentelemetry_sdk::metrics::Temporality::default())
                .build(),
        }?;
        let reader = PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(30))
            .build();
        let meter_provider = MeterProviderBuilder::default()
            .with_resource(resource(name, version))
            .with_reader(reader)
            .build();
        global::set_meter_provider(meter_provider.clone());
        Ok(meter_provider)
    }

    pub fn init_tracer_provider(
        protocol: &TelemetryProtocol,
        name: &str,
        version: &str,
    ) -> Result<SdkTracerProvider, ExporterBuildError> {
        let exporter = opentelemetry_otlp::SpanExporter::builder();
        let exporter = match protocol {
            TelemetryProtocol::HTTP => exporter.with_http().build(),
            TelemetryProtocol::GRPC => exporter.with_tonic().build(),
        }?;
        Ok(SdkTracerProvider::builder()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
                1.0,
            ))))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource(name, version))
            .with_batch_exporter(exporter)
            .build())
    }
}
