use ndarray::{ArrayD, ArrayViewD, Dimension};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Per-event metrics reported by the training loop, keyed by metric name.
pub type Logs = BTreeMap<String, LogValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    Scalar(f64),
    Array(ArrayD<f64>),
    Json(Value),
}

impl LogValue {
    /// Arrays are emitted as plain nested sequences, a 0-d array as its only
    /// element. NaN and infinities have no JSON form and become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            LogValue::Scalar(value) => float_to_json(*value),
            LogValue::Array(array) => array_to_json(array.view()),
            LogValue::Json(value) => value.clone(),
        }
    }
}

fn float_to_json(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn array_to_json(view: ArrayViewD<'_, f64>) -> Value {
    if view.ndim() == 0 {
        return view
            .iter()
            .next()
            .map(|value| float_to_json(*value))
            .unwrap_or(Value::Null);
    }
    Value::Array(view.outer_iter().map(array_to_json).collect())
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        LogValue::Scalar(value)
    }
}

impl From<f32> for LogValue {
    fn from(value: f32) -> Self {
        LogValue::Scalar(f64::from(value))
    }
}

impl From<i64> for LogValue {
    fn from(value: i64) -> Self {
        LogValue::Json(Value::from(value))
    }
}

impl From<u64> for LogValue {
    fn from(value: u64) -> Self {
        LogValue::Json(Value::from(value))
    }
}

impl From<Value> for LogValue {
    fn from(value: Value) -> Self {
        LogValue::Json(value)
    }
}

impl<D: Dimension> From<ndarray::Array<f64, D>> for LogValue {
    fn from(array: ndarray::Array<f64, D>) -> Self {
        LogValue::Array(array.into_dyn())
    }
}

impl<D: Dimension> From<ndarray::Array<f32, D>> for LogValue {
    fn from(array: ndarray::Array<f32, D>) -> Self {
        LogValue::Array(array.mapv(f64::from).into_dyn())
    }
}
