use crate::config::{LogFormat, OpenTelemetry, Tracing};
use color_eyre::config::Theme;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, Resource};
use tracing::subscriber::set_global_default;
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, Layer, Registry};

pub(super) fn init_tracing(tracing: &Tracing) -> color_eyre::Result<()> {
    let eyre_theme = if tracing.logging.format == LogFormat::Normal {
        Theme::dark()
    } else {
        Theme::new()
    };

    color_eyre::config::HookBuilder::new()
        .theme(eyre_theme)
        .add_default_filters()
        .install()?;

    LogTracer::init()?;

    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    let format_layer = tracing_subscriber::fmt::layer();

    let format_layer = if tracing.logging.log_spans {
        format_layer.with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
    } else {
        format_layer
    };

    match tracing.logging.format {
        LogFormat::Compact => with_format(format_layer.compact(), tracing),
        LogFormat::Json => with_format(format_layer.json(), tracing),
        LogFormat::Normal => with_format(format_layer, tracing),
        LogFormat::Pretty => with_format(format_layer.pretty(), tracing),
    }
}

fn with_format<F>(format_layer: F, tracing: &Tracing) -> color_eyre::Result<()>
where
    F: Layer<Registry> + Send + Sync,
{
    let format_layer = format_layer.with_filter(tracing.logging.targets.targets.clone());

    let subscriber = Registry::default()
        .with(format_layer)
        .with(ErrorLayer::default());

    if let Some(otel) = build_otel(&tracing.opentelemetry)? {
        set_global_default(subscriber.with(otel))?;
    } else {
        set_global_default(subscriber)?;
    }

    Ok(())
}

fn build_otel<S>(
    otel: &OpenTelemetry,
) -> color_eyre::Result<Option<impl Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    let Some(url) = otel.url.as_ref() else {
        return Ok(None);
    };

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(
            opentelemetry_sdk::trace::config().with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                otel.service_name.clone(),
            )])),
        )
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(url.as_str()),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    let otel_layer = tracing_opentelemetry::layer()
        .with_tracer(tracer)
        .with_filter(otel.targets.targets.clone());

    Ok(Some(otel_layer))
}
