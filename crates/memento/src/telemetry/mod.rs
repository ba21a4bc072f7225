// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry for memoized calls.
//!
//! Every store interaction is reported as a `memo.event` through `tracing`. With the
//! `metrics` feature enabled, the same events also feed OpenTelemetry instruments.

use std::{fmt::Display, time::Duration};

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Gauge, Histogram, MeterProvider},
};
use tracing::Level;

pub(crate) mod attributes;
pub(crate) mod ext;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

/// Logging and metrics sink for a memoized function.
///
/// The default sink emits structured logs and records no metrics. Pass a configured
/// sink to the builder via `.telemetry()`.
///
/// # Examples
///
/// ```
/// use memento::MemoTelemetry;
///
/// // Logs only (the default)
/// let telemetry = MemoTelemetry::new();
///
/// // Nothing at all
/// let telemetry = MemoTelemetry::new().without_logs();
/// ```
#[derive(Clone, Debug)]
pub struct MemoTelemetry {
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    instruments: Option<Instruments>,
}

#[cfg(any(feature = "metrics", test))]
#[derive(Clone, Debug)]
struct Instruments {
    event_counter: Counter<u64>,
    operation_duration: Histogram<f64>,
    tracked_keys: Gauge<u64>,
}

impl Default for MemoTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoTelemetry {
    /// Creates a sink that logs every store interaction and records no metrics.
    #[must_use]
    pub fn new() -> Self {
        Self {
            logging_enabled: true,
            #[cfg(any(feature = "metrics", test))]
            instruments: None,
        }
    }

    /// Disables structured logging.
    #[must_use]
    pub fn without_logs(self) -> Self {
        Self {
            logging_enabled: false,
            ..self
        }
    }

    /// Records metrics through instruments created from `provider`.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn with_metrics(self, provider: &dyn MeterProvider) -> Self {
        let meter = metrics::create_meter(provider);
        Self {
            instruments: Some(Instruments {
                event_counter: metrics::create_event_counter(&meter),
                operation_duration: metrics::create_operation_duration_histogram(&meter),
                tracked_keys: metrics::create_tracked_keys_gauge(&meter),
            }),
            ..self
        }
    }

    /// Records a store interaction that completed as expected.
    pub(crate) fn record(&self, function: &str, operation: MemoOperation, activity: MemoActivity, duration: Option<Duration>) {
        self.measure(function, operation, activity, duration);

        if self.logging_enabled {
            Self::emit(function, operation, activity, duration);
        }
    }

    /// Records a fault that the memoized function absorbed by falling back.
    pub(crate) fn record_fault(
        &self,
        function: &str,
        operation: MemoOperation,
        key: Option<&str>,
        error: &dyn Display,
        duration: Option<Duration>,
    ) {
        self.measure(function, operation, MemoActivity::Error, duration);

        if self.logging_enabled {
            let duration_ns = duration.map(|d| d.as_nanos());
            tracing::warn!(
                memo.function = function,
                memo.operation = operation.as_str(),
                memo.activity = MemoActivity::Error.as_str(),
                memo.duration_ns = ?duration_ns,
                memo.key = key,
                error = %error,
                "memo.event"
            );
        }
    }

    /// Records the number of keys currently tracked for invalidation.
    #[allow(unused_variables, clippy::unused_self, reason = "no-op without metrics")]
    pub(crate) fn record_tracked(&self, function: &str, count: u64) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(instruments) = &self.instruments {
            let attrs = [KeyValue::new(attributes::MEMO_FUNCTION_NAME, function.to_string())];
            instruments.tracked_keys.record(count, &attrs);
        }
    }

    #[allow(unused_variables, clippy::unused_self, reason = "no-op without metrics")]
    fn measure(&self, function: &str, operation: MemoOperation, activity: MemoActivity, duration: Option<Duration>) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(instruments) = &self.instruments {
            let attrs = [
                KeyValue::new(attributes::MEMO_FUNCTION_NAME, function.to_string()),
                KeyValue::new(attributes::MEMO_OPERATION_NAME, operation.as_str()),
                KeyValue::new(attributes::MEMO_ACTIVITY_NAME, activity.as_str()),
            ];
            instruments.event_counter.add(1, &attrs);
            if let Some(d) = duration {
                instruments.operation_duration.record(d.as_secs_f64(), &attrs);
            }
        }
    }

    fn emit(function: &str, operation: MemoOperation, activity: MemoActivity, duration: Option<Duration>) {
        let op = operation.as_str();
        let act = activity.as_str();
        let duration_ns = duration.map(|d| d.as_nanos());

        // Tracing levels must be constant, so the macro selects the call site.
        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    memo.function = function,
                    memo.operation = op,
                    memo.activity = act,
                    memo.duration_ns = ?duration_ns,
                    "memo.event"
                )
            };
        }

        match activity.level() {
            Level::DEBUG => emit_event!(debug),
            Level::INFO => emit_event!(info),
            _ => emit_event!(warn),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemoOperation {
    Get,
    Set,
    Delete,
    Connect,
}

impl MemoOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "memo.get",
            Self::Set => "memo.set",
            Self::Delete => "memo.delete",
            Self::Connect => "memo.connect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemoActivity {
    Hit,
    Miss,
    Stored,
    Invalidated,
    Connected,
    Error,
}

impl MemoActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "memo.hit",
            Self::Miss => "memo.miss",
            Self::Stored => "memo.stored",
            Self::Invalidated => "memo.invalidated",
            Self::Connected => "memo.connected",
            Self::Error => "memo.error",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::Hit | Self::Miss | Self::Stored => Level::DEBUG,
            Self::Invalidated | Self::Connected => Level::INFO,
            Self::Error => Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::{LogCapture, MetricTester};

    #[test]
    fn operation_as_str() {
        assert_eq!(MemoOperation::Get.as_str(), "memo.get");
        assert_eq!(MemoOperation::Set.as_str(), "memo.set");
        assert_eq!(MemoOperation::Delete.as_str(), "memo.delete");
        assert_eq!(MemoOperation::Connect.as_str(), "memo.connect");
    }

    #[test]
    fn activity_as_str() {
        assert_eq!(MemoActivity::Hit.as_str(), "memo.hit");
        assert_eq!(MemoActivity::Miss.as_str(), "memo.miss");
        assert_eq!(MemoActivity::Stored.as_str(), "memo.stored");
        assert_eq!(MemoActivity::Invalidated.as_str(), "memo.invalidated");
        assert_eq!(MemoActivity::Connected.as_str(), "memo.connected");
        assert_eq!(MemoActivity::Error.as_str(), "memo.error");
    }

    #[test]
    fn activity_levels() {
        assert_eq!(MemoActivity::Hit.level(), Level::DEBUG);
        assert_eq!(MemoActivity::Miss.level(), Level::DEBUG);
        assert_eq!(MemoActivity::Stored.level(), Level::DEBUG);
        assert_eq!(MemoActivity::Invalidated.level(), Level::INFO);
        assert_eq!(MemoActivity::Connected.level(), Level::INFO);
        assert_eq!(MemoActivity::Error.level(), Level::WARN);
    }

    #[test]
    fn emit_contains_all_fields_and_values() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        MemoTelemetry::emit(
            "app:load",
            MemoOperation::Delete,
            MemoActivity::Invalidated,
            Some(Duration::from_nanos(12345)),
        );

        capture.assert_contains(attributes::MEMO_FUNCTION_NAME);
        capture.assert_contains(attributes::MEMO_OPERATION_NAME);
        capture.assert_contains(attributes::MEMO_ACTIVITY_NAME);
        capture.assert_contains(attributes::MEMO_DURATION_NAME);
        capture.assert_contains(attributes::MEMO_EVENT_NAME);

        capture.assert_contains("app:load");
        capture.assert_contains(MemoOperation::Delete.as_str());
        capture.assert_contains(MemoActivity::Invalidated.as_str());
        capture.assert_contains("12345");
        capture.assert_contains("INFO");
    }

    #[test]
    fn record_fault_logs_warning_with_error_and_key() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        MemoTelemetry::new().record_fault("app:load", MemoOperation::Get, Some("app:load:00ff"), &"connection reset", None);

        capture.assert_contains("WARN");
        capture.assert_contains("memo.error");
        capture.assert_contains("connection reset");
        capture.assert_contains("app:load:00ff");
    }

    #[test]
    fn without_logs_emits_nothing() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let telemetry = MemoTelemetry::new().without_logs();
        telemetry.record("app:load", MemoOperation::Get, MemoActivity::Hit, None);
        telemetry.record_fault("app:load", MemoOperation::Set, None, &"boom", None);

        assert!(capture.output().is_empty(), "unexpected output: {}", capture.output());
    }

    #[test]
    fn metrics_record_emits_attributes() {
        let tester = MetricTester::new();
        let telemetry = MemoTelemetry::new().without_logs().with_metrics(tester.meter_provider());

        telemetry.record("app:load", MemoOperation::Get, MemoActivity::Hit, Some(Duration::from_millis(5)));

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::MEMO_FUNCTION_NAME, "app:load"),
            KeyValue::new(attributes::MEMO_OPERATION_NAME, MemoOperation::Get.as_str()),
            KeyValue::new(attributes::MEMO_ACTIVITY_NAME, MemoActivity::Hit.as_str()),
        ]);
    }

    #[test]
    fn metrics_record_fault_uses_error_activity() {
        let tester = MetricTester::new();
        let telemetry = MemoTelemetry::new().without_logs().with_metrics(tester.meter_provider());

        telemetry.record_fault("app:load", MemoOperation::Set, Some("k"), &"boom", None);

        tester.assert_attributes_contain(&[KeyValue::new(attributes::MEMO_ACTIVITY_NAME, MemoActivity::Error.as_str())]);
    }

    #[test]
    fn metrics_record_tracked_emits_function() {
        let tester = MetricTester::new();
        let telemetry = MemoTelemetry::new().with_metrics(tester.meter_provider());

        telemetry.record_tracked("app:tracked", 3);

        tester.assert_attributes_contain(&[KeyValue::new(attributes::MEMO_FUNCTION_NAME, "app:tracked")]);
    }

    #[test]
    fn record_tracked_without_metrics_is_a_no_op() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        MemoTelemetry::new().record_tracked("app:load", 3);

        assert!(capture.output().is_empty());
    }
}
