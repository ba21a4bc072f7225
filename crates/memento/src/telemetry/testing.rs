// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Capture helpers for asserting on emitted logs and metrics.

use std::{io::Write, sync::Arc};

use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::{
    InMemoryMetricExporter, SdkMeterProvider,
    data::{AggregatedMetrics, Metric, MetricData, ResourceMetrics, ScopeMetrics},
};
use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

/// Collects metrics into memory so tests can inspect their attributes.
#[derive(Debug)]
pub(crate) struct MetricTester {
    exporter: InMemoryMetricExporter,
    provider: SdkMeterProvider,
}

impl MetricTester {
    pub fn new() -> Self {
        let exporter = InMemoryMetricExporter::default();
        Self {
            provider: SdkMeterProvider::builder().with_periodic_exporter(exporter.clone()).build(),
            exporter,
        }
    }

    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.provider
    }

    pub fn collect_attributes(&self) -> Vec<KeyValue> {
        self.provider.force_flush().unwrap();
        self.exporter
            .get_finished_metrics()
            .unwrap()
            .iter()
            .flat_map(ResourceMetrics::scope_metrics)
            .flat_map(ScopeMetrics::metrics)
            .flat_map(metric_attributes)
            .collect()
    }

    pub fn assert_attributes_contain(&self, expected: &[KeyValue]) {
        let attributes = self.collect_attributes();
        for attr in expected {
            assert!(attributes.contains(attr), "attribute {attr:?} not found in {attributes:?}");
        }
    }
}

fn metric_attributes(metric: &Metric) -> Vec<KeyValue> {
    macro_rules! points {
        ($data:expr) => {
            match $data {
                MetricData::Gauge(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
                MetricData::Sum(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
                MetricData::Histogram(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
                MetricData::ExponentialHistogram(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
            }
        };
    }

    match metric.data() {
        AggregatedMetrics::F64(data) => points!(data),
        AggregatedMetrics::U64(data) => points!(data),
        AggregatedMetrics::I64(data) => points!(data),
    }
}

/// Captures formatted `tracing` output in memory.
///
/// Install with `tracing::subscriber::set_default(capture.subscriber())`, which only
/// affects the current thread.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).to_string()
    }

    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        assert!(output.contains(expected), "log output does not contain '{expected}', got:\n{output}");
    }

    pub fn subscriber(&self) -> impl tracing::Subscriber {
        use tracing_subscriber::layer::SubscriberExt;
        tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_writer(self.clone()).with_ansi(false))
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

pub(crate) struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
