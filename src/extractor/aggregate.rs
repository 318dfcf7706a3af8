//! Aggregation functions
//!
//! Every aggregation takes the skip-missing flag as part of its contract.
//! Built-in aggregations honour it directly. Plain closures are wrapped in
//! [`FnAggregator`], which drops missing values before the closure sees
//! them when skipping is requested.

use std::fmt;

use crate::errors::{ExtractError, ExtractResult};

/// Reduce a group of pixel values to one value
pub trait Aggregator: fmt::Debug + Send + Sync {
    /// Aggregate `values`; missing values are `NaN`
    ///
    /// With `skip_missing` set, missing values are ignored and an all-missing
    /// group yields `NaN`. Without it, any missing value may poison the
    /// result.
    fn aggregate(&self, values: &[f64], skip_missing: bool) -> f64;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Built-in aggregations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Median,
    Min,
    Max,
    Sum,
    StdDev,
    Count,
}

impl Aggregation {
    pub fn parse(name: &str) -> ExtractResult<Aggregation> {
        match name.trim().to_lowercase().as_str() {
            "mean" | "avg" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "sum" => Ok(Aggregation::Sum),
            "sd" | "std" | "stddev" => Ok(Aggregation::StdDev),
            "count" | "n" => Ok(Aggregation::Count),
            other => Err(ExtractError::InvalidInput(format!("Unknown aggregation function: {}", other))),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation, `NaN` below two values
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

impl Aggregator for Aggregation {
    fn aggregate(&self, values: &[f64], skip_missing: bool) -> f64 {
        let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();

        if let Aggregation::Count = self {
            return present.len() as f64;
        }
        if present.is_empty() || (!skip_missing && present.len() != values.len()) {
            return f64::NAN;
        }

        match self {
            Aggregation::Mean => mean(&present),
            Aggregation::Median => median(&present),
            Aggregation::Min => present.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => present.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Sum => present.iter().sum(),
            Aggregation::StdDev => std_dev(&present),
            Aggregation::Count => present.len() as f64,
        }
    }

    fn name(&self) -> &str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Sum => "sum",
            Aggregation::StdDev => "sd",
            Aggregation::Count => "count",
        }
    }
}

/// Wraps a closure that knows nothing about missing values
pub struct FnAggregator<F> {
    name: String,
    func: F,
}

impl<F> FnAggregator<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        FnAggregator { name: name.into(), func }
    }
}

impl<F> fmt::Debug for FnAggregator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAggregator").field("name", &self.name).finish()
    }
}

impl<F> Aggregator for FnAggregator<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn aggregate(&self, values: &[f64], skip_missing: bool) -> f64 {
        if skip_missing {
            let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
            if present.is_empty() {
                return f64::NAN;
            }
            (self.func)(&present)
        } else if values.is_empty() {
            f64::NAN
        } else {
            (self.func)(values)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
