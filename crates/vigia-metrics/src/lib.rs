//! ---
//! vigia_section: "03-persistence-logging"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Metrics collection and export utilities."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, StatusCode};
use axum::routing::get;
use axum::{response::IntoResponse, Router};
use prometheus::{
    Gauge, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Shared registry type used across the monitor.
pub type SharedRegistry = Arc<Registry>;

/// Produce a new shared registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Encode every family in `registry` using the Prometheus text format.
pub fn render(registry: &Registry) -> Result<String> {
    TextEncoder::new()
        .encode_to_string(&registry.gather())
        .context("failed to encode metrics")
}

/// Spawn an HTTP server that exposes the registry at `/metrics`.
pub fn spawn_http_server(registry: SharedRegistry, addr: SocketAddr) -> Result<MetricsServer> {
    let app = Router::new().route(
        "/metrics",
        get({
            let registry = registry.clone();
            move || metrics_handler(registry.clone())
        }),
    );

    let std_listener = StdTcpListener::bind(addr)
        .with_context(|| format!("failed to bind metrics listener {}", addr))?;
    std_listener
        .set_nonblocking(true)
        .with_context(|| "failed to configure metrics listener as non-blocking")?;
    let bound = std_listener
        .local_addr()
        .with_context(|| "failed to read metrics listener address")?;
    let listener = TcpListener::from_std(std_listener)
        .with_context(|| "failed to convert std listener into tokio listener")?;

    info!(address = %bound, "metrics server starting");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .context("metrics server encountered an error")?;
        Ok(())
    });

    Ok(MetricsServer {
        addr: bound,
        shutdown: Some(shutdown_tx),
        task: handle,
    })
}

async fn metrics_handler(registry: SharedRegistry) -> impl IntoResponse {
    match render(&registry) {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(prometheus::TEXT_FORMAT),
            )],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("metrics encoding error"),
            )
                .into_response()
        }
    }
}

/// Handle to the running HTTP exporter.
#[derive(Debug)]
pub struct MetricsServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl MetricsServer {
    /// Address the listener actually bound, including an OS-assigned port.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal shutdown and await task completion.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err),
            Err(join_err) => Err(anyhow::Error::new(join_err)),
        }
    }
}

/// Metrics recorded by the daemon process itself.
#[derive(Clone)]
pub struct DaemonMetrics {
    starts_total: IntCounter,
    config_load_seconds: Histogram,
}

impl DaemonMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let starts_total = IntCounter::with_opts(Opts::new(
            "vigiad_starts_total",
            "Total number of times the Vigia daemon has initialised",
        ))?;
        registry.register(Box::new(starts_total.clone()))?;

        let buckets = prometheus::exponential_buckets(0.001, 2.0, 12)
            .context("failed to construct histogram buckets")?;
        let config_load_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "vigiad_config_load_seconds",
                "Time spent loading and validating configuration",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(config_load_seconds.clone()))?;

        Ok(Self {
            starts_total,
            config_load_seconds,
        })
    }

    pub fn inc_start(&self) {
        self.starts_total.inc();
    }

    pub fn observe_config_load(&self, seconds: f64) {
        self.config_load_seconds.observe(seconds);
    }
}

/// Telemetry loop instrumentation: tick throughput, alert volume and the
/// latest simulated value of every parameter.
#[derive(Clone, Debug)]
pub struct MonitorMetrics {
    ticks_total: IntCounter,
    tick_duration: Histogram,
    alerts_raised: IntCounterVec,
    scenarios_started: IntCounterVec,
    scenarios_active: IntGauge,
    parameter_value: GaugeVec,
    feed_size: Gauge,
}

impl MonitorMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let ticks_total = IntCounter::with_opts(Opts::new(
            "vigia_ticks_total",
            "Telemetry ticks processed by the monitor",
        ))?;
        registry.register(Box::new(ticks_total.clone()))?;

        let buckets = prometheus::exponential_buckets(0.000_05, 2.0, 14)
            .context("failed to construct histogram buckets")?;
        let tick_duration = Histogram::with_opts(
            HistogramOpts::new(
                "vigia_tick_duration_seconds",
                "Wall time spent computing one telemetry tick",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(tick_duration.clone()))?;

        let alerts_raised = IntCounterVec::new(
            Opts::new("vigia_alerts_raised_total", "Alerts raised by priority"),
            &["priority"],
        )?;
        registry.register(Box::new(alerts_raised.clone()))?;

        let scenarios_started = IntCounterVec::new(
            Opts::new(
                "vigia_scenarios_started_total",
                "Fault scenarios started by kind",
            ),
            &["scenario"],
        )?;
        registry.register(Box::new(scenarios_started.clone()))?;

        let scenarios_active = IntGauge::with_opts(Opts::new(
            "vigia_scenarios_active",
            "Fault scenarios currently in progress",
        ))?;
        registry.register(Box::new(scenarios_active.clone()))?;

        let parameter_value = GaugeVec::new(
            Opts::new(
                "vigia_parameter_value",
                "Latest simulated value per monitored parameter",
            ),
            &["parameter"],
        )?;
        registry.register(Box::new(parameter_value.clone()))?;

        let feed_size = Gauge::with_opts(Opts::new(
            "vigia_alert_feed_size",
            "Alerts currently retained in the persisted feed",
        ))?;
        registry.register(Box::new(feed_size.clone()))?;

        Ok(Self {
            ticks_total,
            tick_duration,
            alerts_raised,
            scenarios_started,
            scenarios_active,
            parameter_value,
            feed_size,
        })
    }

    pub fn record_tick(&self, seconds: f64) {
        self.ticks_total.inc();
        self.tick_duration.observe(seconds);
    }

    pub fn record_alert(&self, priority: &str) {
        self.alerts_raised.with_label_values(&[priority]).inc();
    }

    pub fn record_scenario_started(&self, scenario: &str) {
        self.scenarios_started.with_label_values(&[scenario]).inc();
    }

    pub fn set_scenarios_active(&self, count: usize) {
        self.scenarios_active.set(count as i64);
    }

    pub fn set_parameter(&self, parameter: &str, value: f64) {
        self.parameter_value
            .with_label_values(&[parameter])
            .set(value);
    }

    pub fn set_feed_size(&self, size: usize) {
        self.feed_size.set(size as f64);
    }
}

pub use prometheus;
