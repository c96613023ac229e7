//! One-shot prediction commands

use anyhow::Result;
use clap::Args;
use screw_lib::models::{
    BinaryFlag, ScenarioCondition, SeriesFeature, WorkpieceLocation, WorkpieceResult,
};
use screw_lib::requests::{CustomRequest, MetadataInput, TorqueRequest};
use screw_lib::session::{default_series_text, DEFAULT_TIME};
use std::collections::BTreeMap;

use crate::client::ApiClient;
use crate::output::{print_prediction, OutputFormat};

/// Inputs for a torque-only prediction
#[derive(Debug, Args)]
pub struct TorqueArgs {
    /// Comma-separated timestamps
    #[arg(long, default_value = DEFAULT_TIME)]
    pub time: String,

    /// Comma-separated torque values
    #[arg(long, default_value = "0.1,0.2,0.15,0.25")]
    pub torque: String,
}

impl TorqueArgs {
    pub fn to_request(&self) -> TorqueRequest {
        TorqueRequest {
            time: self.time.clone(),
            torque: self.torque.clone(),
        }
    }
}

/// Inputs for a custom prediction; every flag given enables that feature
#[derive(Debug, Args)]
pub struct CustomArgs {
    /// Comma-separated timestamps shared by all series
    #[arg(long, default_value = DEFAULT_TIME)]
    pub time: String,

    /// Comma-separated torque values
    #[arg(long)]
    pub torque: Option<String>,

    /// Comma-separated angle values
    #[arg(long)]
    pub angle: Option<String>,

    /// Comma-separated gradient values
    #[arg(long)]
    pub gradient: Option<String>,

    /// Comma-separated step values
    #[arg(long)]
    pub step: Option<String>,

    /// Use the built-in sample text for every series not given explicitly
    #[arg(long)]
    pub all_series: bool,

    /// Workpiece location (left, middle, right)
    #[arg(long)]
    pub location: Option<WorkpieceLocation>,

    /// Workpiece usage (0 or 1)
    #[arg(long)]
    pub usage: Option<BinaryFlag>,

    /// Workpiece result (OK or NOK)
    #[arg(long)]
    pub result: Option<WorkpieceResult>,

    /// Scenario condition (normal or abnormal)
    #[arg(long)]
    pub condition: Option<ScenarioCondition>,

    /// Scenario exception (0 or 1)
    #[arg(long)]
    pub exception: Option<BinaryFlag>,
}

impl CustomArgs {
    pub fn to_request(&self) -> CustomRequest {
        let given = [
            (SeriesFeature::Torque, &self.torque),
            (SeriesFeature::Angle, &self.angle),
            (SeriesFeature::Gradient, &self.gradient),
            (SeriesFeature::Step, &self.step),
        ];

        let series: BTreeMap<SeriesFeature, String> = given
            .into_iter()
            .filter_map(|(feature, text)| match text {
                Some(text) => Some((feature, text.clone())),
                None if self.all_series => Some((feature, default_series_text(feature).to_string())),
                None => None,
            })
            .collect();

        CustomRequest {
            time: self.time.clone(),
            series,
            metadata: MetadataInput {
                workpiece_location: self.location,
                workpiece_usage: self.usage,
                workpiece_result: self.result,
                scenario_condition: self.condition,
                scenario_exception: self.exception,
            },
        }
    }
}

pub async fn predict_torque(client: &ApiClient, args: &TorqueArgs, format: OutputFormat) -> Result<()> {
    let prediction = client.predict_torque(&args.to_request()).await?;
    print_prediction(&prediction, format);
    Ok(())
}

pub async fn predict_custom(client: &ApiClient, args: &CustomArgs, format: OutputFormat) -> Result<()> {
    let prediction = client.predict_custom(&args.to_request()).await?;
    print_prediction(&prediction, format);
    Ok(())
}
