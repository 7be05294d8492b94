//! Chart descriptions of runtime profiles.
//!
//! Nothing is rendered here. A [`ProfilePlot`] is a plain, serializable
//! description of a step chart that a plotting frontend can draw.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ecdf::Ecdf;
use crate::error::Error;
use crate::indicator::IndicatorRef;
use crate::result_set::ResultSet;
use crate::rtp::{RuntimeProfileOptions, runtime_profiles};

pub const X_AXIS_LABEL: &str = "log10(# fevals / dimension)";
pub const Y_AXIS_LABEL: &str = "Fraction of targets reached [%]";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    #[default]
    Linear,
    Log,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Axis {
    pub label: String,
    pub scale: Scale,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// The value of a step holds from its `x` until the next `x`.
    #[default]
    Post,
}

/// One algorithm's profile as a step function.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StepSeries {
    pub label: String,
    pub x: Vec<f64>,
    /// Percent of targets reached, in `0..=100`.
    pub y: Vec<f64>,
    pub step: StepPosition,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ProfilePlot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<StepSeries>,
}

impl ProfilePlot {
    /// Builds a chart with one series per algorithm, sorted by algorithm name.
    pub fn from_profiles(profiles: &HashMap<String, Ecdf>) -> Self {
        let mut algorithms: Vec<&String> = profiles.keys().collect();
        algorithms.sort();
        let series = algorithms
            .into_iter()
            .map(|algorithm| {
                let ecdf = &profiles[algorithm];
                StepSeries {
                    label: algorithm.clone(),
                    x: ecdf.quantiles.clone(),
                    y: ecdf.probabilities.iter().map(|p| p * 100.0).collect(),
                    step: StepPosition::Post,
                }
            })
            .collect();

        Self {
            title: None,
            x_axis: Axis {
                label: X_AXIS_LABEL.to_string(),
                scale: Scale::Log,
                min: None,
                max: None,
            },
            y_axis: Axis {
                label: Y_AXIS_LABEL.to_string(),
                scale: Scale::Linear,
                min: Some(0.0),
                max: Some(100.0),
            },
            series,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Computes the runtime profiles of `results` and describes them as a chart.
pub fn rtp_plot<'a>(
    results: &ResultSet,
    indicator: impl Into<IndicatorRef<'a>>,
    options: &RuntimeProfileOptions,
) -> Result<ProfilePlot, Error> {
    let profiles = runtime_profiles(results, indicator, options)?;
    Ok(ProfilePlot::from_profiles(&profiles))
}
