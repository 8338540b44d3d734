//! Metrics definitions for the tracker.

use shared::metrics_defs::{MetricDef, MetricType};

pub const LOCATION_UPDATE_APPLIED: MetricDef = MetricDef {
    name: "location_update.applied",
    metric_type: MetricType::Counter,
    description: "Number of scans that updated a member's location",
};

pub const LOCATION_UPDATE_REJECTED: MetricDef = MetricDef {
    name: "location_update.rejected",
    metric_type: MetricType::Counter,
    description: "Number of scans answered with an error",
};

pub const HEARTBEAT_APPLIED: MetricDef = MetricDef {
    name: "heartbeat.applied",
    metric_type: MetricType::Counter,
    description: "Number of reader heartbeats recorded",
};

pub const HEARTBEAT_REJECTED: MetricDef = MetricDef {
    name: "heartbeat.rejected",
    metric_type: MetricType::Counter,
    description: "Number of reader heartbeats answered with an error",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Time to answer a request in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    LOCATION_UPDATE_APPLIED,
    LOCATION_UPDATE_REJECTED,
    HEARTBEAT_APPLIED,
    HEARTBEAT_REJECTED,
    REQUEST_DURATION,
];
