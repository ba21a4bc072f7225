// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use opentelemetry::{
    InstrumentationScope,
    metrics::{Counter, Gauge, Histogram, Meter, MeterProvider},
};

const METER_NAME: &str = "memento";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";
const MEMO_EVENT_COUNT_NAME: &str = "memo.event.count";
const MEMO_OPERATION_DURATION_NAME: &str = "memo.operation.duration";
const MEMO_TRACKED_KEYS_NAME: &str = "memo.tracked_keys";

pub(crate) fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    meter_provider.meter_with_scope(
        InstrumentationScope::builder(METER_NAME)
            .with_version(VERSION)
            .with_schema_url(SCHEMA_URL)
            .build(),
    )
}

pub(crate) fn create_event_counter(meter: &Meter) -> Counter<u64> {
    meter
        .u64_counter(MEMO_EVENT_COUNT_NAME)
        .with_description("Memoized call events")
        .with_unit("{event}")
        .build()
}

pub(crate) fn create_operation_duration_histogram(meter: &Meter) -> Histogram<f64> {
    meter
        .f64_histogram(MEMO_OPERATION_DURATION_NAME)
        .with_description("Store operation duration")
        .with_unit("s")
        .build()
}

pub(crate) fn create_tracked_keys_gauge(meter: &Meter) -> Gauge<u64> {
    meter
        .u64_gauge(MEMO_TRACKED_KEYS_NAME)
        .with_description("Number of keys written and not yet invalidated")
        .with_unit("{key}")
        .build()
}
