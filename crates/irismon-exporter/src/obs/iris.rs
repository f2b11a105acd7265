use irismon_core::error::Result;
use irismon_core::registry::{MetricKind, Registry};

pub const REQUESTS_TOTAL: &str = "iris_api_requests_total";
pub const REQUEST_LATENCY: &str = "iris_api_request_latency_seconds";
pub const PREDICTIONS_TOTAL: &str = "iris_model_predictions_total";
pub const MODEL_CONFIDENCE: &str = "iris_model_confidence";
pub const FEATURE_VALUES: &str = "iris_feature_values";
pub const SYSTEM_MEMORY: &str = "system_memory_usage_percent";
pub const SYSTEM_CPU: &str = "system_cpu_usage_percent";

pub const CLASS_LABEL: &str = "class_name";
pub const FEATURE_LABEL: &str = "feature";

/// Feature gauges, in the order they are set each cycle.
pub const FEATURE_NAMES: [&str; 4] = ["sepal_length", "sepal_width", "petal_length", "petal_width"];

/// The closed set of predicted classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrisClass {
    Setosa,
    Versicolor,
    Virginica,
}

impl IrisClass {
    pub const ALL: [IrisClass; 3] = [IrisClass::Setosa, IrisClass::Versicolor, IrisClass::Virginica];

    pub fn as_str(self) -> &'static str {
        match self {
            IrisClass::Setosa => "setosa",
            IrisClass::Versicolor => "versicolor",
            IrisClass::Virginica => "virginica",
        }
    }
}

/// Register every instrument the simulator writes.
///
/// A failure here means the declarations clash with something already in the
/// registry; startup should abort.
pub fn register_iris_metrics(registry: &Registry) -> Result<()> {
    registry.register(
        REQUESTS_TOTAL,
        MetricKind::Counter,
        "Total number of requests received",
        &[],
    )?;
    registry.register(
        REQUEST_LATENCY,
        MetricKind::Summary,
        "Request latency in seconds",
        &[],
    )?;
    registry.register(
        PREDICTIONS_TOTAL,
        MetricKind::Counter,
        "Total number of predictions made",
        &[CLASS_LABEL],
    )?;
    registry.register(
        MODEL_CONFIDENCE,
        MetricKind::Histogram,
        "Confidence scores of model predictions",
        &[CLASS_LABEL],
    )?;
    registry.register(
        FEATURE_VALUES,
        MetricKind::Gauge,
        "Feature values used for prediction",
        &[FEATURE_LABEL],
    )?;
    registry.register(
        SYSTEM_MEMORY,
        MetricKind::Gauge,
        "System memory usage percentage",
        &[],
    )?;
    registry.register(
        SYSTEM_CPU,
        MetricKind::Gauge,
        "System CPU usage percentage",
        &[],
    )?;
    Ok(())
}
