//! Interactive session state machine
//!
//! A session is in one of three modes. Selecting a different mode throws
//! away whatever the user typed and starts from the default form of the
//! new mode. Only the two prediction modes can submit.

use crate::error::ChoiceError;
use crate::models::{FeatureName, MetadataChoices, ScalarValue, SeriesFeature};
use crate::pipeline::FeatureSelection;
use crate::requests::{CustomRequest, MetadataInput, TorqueRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Default shared time text
pub const DEFAULT_TIME: &str = "0.0,0.001,0.002,0.003";

/// Default value text shown for each series
pub fn default_series_text(feature: SeriesFeature) -> &'static str {
    match feature {
        SeriesFeature::Torque => "0.1,0.2,0.15,0.25",
        SeriesFeature::Angle => "2.5,5.25,6.25,7.0",
        SeriesFeature::Gradient => "0.01,0.02,0.03,0.04",
        SeriesFeature::Step => "0,0,1,1",
    }
}

/// Screen the session is on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Home,
    TorqueOnly,
    Custom,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Home => f.write_str("home"),
            Mode::TorqueOnly => f.write_str("torque"),
            Mode::Custom => f.write_str("custom"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = ChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Mode::Home),
            "torque" | "torque_only" => Ok(Mode::TorqueOnly),
            "custom" => Ok(Mode::Custom),
            _ => Err(ChoiceError::new("mode", s, "home, torque, custom")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("nothing to fill in on the home screen, choose a mode first")]
    NoForm,

    #[error("{feature} cannot be changed in {mode} mode")]
    Locked { feature: FeatureName, mode: Mode },

    #[error(transparent)]
    Choice(#[from] ChoiceError),
}

/// Unsubmitted user input for the current mode
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub time: String,
    pub series: BTreeMap<SeriesFeature, String>,
    pub selection: FeatureSelection,
    pub metadata: MetadataChoices,
}

impl Form {
    fn for_mode(mode: Mode) -> Option<Self> {
        let (features, selection): (&[SeriesFeature], FeatureSelection) = match mode {
            Mode::Home => return None,
            Mode::TorqueOnly => (&[SeriesFeature::Torque], FeatureSelection::torque_only()),
            Mode::Custom => (&SeriesFeature::ALL, FeatureSelection::all()),
        };

        Some(Self {
            time: DEFAULT_TIME.to_string(),
            series: features
                .iter()
                .map(|f| (*f, default_series_text(*f).to_string()))
                .collect(),
            selection,
            metadata: MetadataChoices::default(),
        })
    }
}

/// What a submit action sends
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Torque(TorqueRequest),
    Custom(CustomRequest),
}

/// One user's interactive session
#[derive(Debug, Clone, Default)]
pub struct Session {
    mode: Mode,
    form: Option<Form>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    /// Move to a mode. Switching modes discards unsubmitted input;
    /// reselecting the current mode changes nothing.
    pub fn select(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.form = Form::for_mode(mode);
    }

    fn form_mut(&mut self) -> Result<&mut Form, SessionError> {
        self.form.as_mut().ok_or(SessionError::NoForm)
    }

    pub fn set_time(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.form_mut()?.time = text.into();
        Ok(())
    }

    pub fn set_series(
        &mut self,
        feature: SeriesFeature,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_unlocked(feature.name())?;
        self.form_mut()?.series.insert(feature, text.into());
        Ok(())
    }

    /// Turn a feature on or off; only custom mode has toggles
    pub fn toggle(&mut self, feature: FeatureName, enabled: bool) -> Result<(), SessionError> {
        self.ensure_custom(feature)?;
        self.form_mut()?.selection.set(feature, enabled);
        Ok(())
    }

    /// Turn all metadata fields on or off together
    pub fn toggle_metadata(&mut self, enabled: bool) -> Result<(), SessionError> {
        self.ensure_custom(FeatureName::WorkpieceLocation)?;
        self.form_mut()?.selection.set_metadata(enabled);
        Ok(())
    }

    /// Choose a metadata value from its enumerated options
    pub fn set_metadata(&mut self, field: FeatureName, text: &str) -> Result<(), SessionError> {
        self.ensure_custom(field)?;
        let value = ScalarValue::parse(field, text)?;
        self.form_mut()?.metadata.set(value);
        Ok(())
    }

    fn ensure_custom(&self, feature: FeatureName) -> Result<(), SessionError> {
        match self.mode {
            Mode::Home => Err(SessionError::NoForm),
            Mode::TorqueOnly => Err(SessionError::Locked {
                feature,
                mode: self.mode,
            }),
            Mode::Custom => Ok(()),
        }
    }

    fn ensure_unlocked(&self, feature: FeatureName) -> Result<(), SessionError> {
        if self.mode == Mode::TorqueOnly && feature != FeatureName::TorqueValues {
            return Err(SessionError::Locked {
                feature,
                mode: self.mode,
            });
        }
        Ok(())
    }

    /// Build the request for the submit action of the current mode
    pub fn submission(&self) -> Result<Submission, SessionError> {
        let form = self.form.as_ref().ok_or(SessionError::NoForm)?;
        let text = |feature: SeriesFeature| form.series.get(&feature).cloned().unwrap_or_default();

        match self.mode {
            Mode::Home => Err(SessionError::NoForm),
            Mode::TorqueOnly => Ok(Submission::Torque(TorqueRequest {
                time: form.time.clone(),
                torque: text(SeriesFeature::Torque),
            })),
            Mode::Custom => Ok(Submission::Custom(CustomRequest {
                time: form.time.clone(),
                series: SeriesFeature::ALL
                    .into_iter()
                    .filter(|f| form.selection.is_enabled(f.name()))
                    .map(|f| (f, text(f)))
                    .collect(),
                metadata: MetadataInput::selected(form.metadata, &form.selection),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{WorkpieceLocation, WorkpieceResult};

    #[test]
    fn test_starts_at_home_without_form() {
        let session = Session::new();
        assert_eq!(session.mode(), Mode::Home);
        assert!(session.form().is_none());
        assert_eq!(session.submission(), Err(SessionError::NoForm));
    }

    #[test]
    fn test_torque_mode_defaults() {
        let mut session = Session::new();
        session.select(Mode::TorqueOnly);

        match session.submission().unwrap() {
            Submission::Torque(request) => {
                assert_eq!(request.time, DEFAULT_TIME);
                assert_eq!(request.torque, "0.1,0.2,0.15,0.25");
            }
            other => panic!("unexpected submission {:?}", other),
        }
    }

    #[test]
    fn test_custom_mode_enables_everything_by_default() {
        let mut session = Session::new();
        session.select(Mode::Custom);

        match session.submission().unwrap() {
            Submission::Custom(request) => {
                assert_eq!(request.series.len(), 4);
                assert_eq!(request.series[&SeriesFeature::Step], "0,0,1,1");
                assert_eq!(request.selection().enabled().count(), FeatureName::COUNT);
            }
            other => panic!("unexpected submission {:?}", other),
        }
    }

    #[test]
    fn test_switching_modes_discards_input() {
        let mut session = Session::new();
        session.select(Mode::Custom);
        session.set_time("1,2").unwrap();
        session.toggle(FeatureName::AngleValues, false).unwrap();

        session.select(Mode::TorqueOnly);
        session.select(Mode::Custom);

        let form = session.form().unwrap();
        assert_eq!(form.time, DEFAULT_TIME);
        assert!(form.selection.is_enabled(FeatureName::AngleValues));

        session.select(Mode::Home);
        assert!(session.form().is_none());
    }

    #[test]
    fn test_reselecting_current_mode_keeps_input() {
        let mut session = Session::new();
        session.select(Mode::TorqueOnly);
        session.set_series(SeriesFeature::Torque, "9,9,9,9").unwrap();
        session.select(Mode::TorqueOnly);
        assert_eq!(session.form().unwrap().series[&SeriesFeature::Torque], "9,9,9,9");
    }

    #[test]
    fn test_torque_mode_locks_other_features() {
        let mut session = Session::new();
        session.select(Mode::TorqueOnly);

        assert!(matches!(
            session.set_series(SeriesFeature::Angle, "1"),
            Err(SessionError::Locked { .. })
        ));
        assert!(matches!(
            session.toggle(FeatureName::TorqueValues, false),
            Err(SessionError::Locked { .. })
        ));
        assert!(matches!(
            session.set_metadata(FeatureName::WorkpieceLocation, "left"),
            Err(SessionError::Locked { .. })
        ));
    }

    #[test]
    fn test_custom_submission_respects_toggles() {
        let mut session = Session::new();
        session.select(Mode::Custom);
        session.toggle(FeatureName::GradientValues, false).unwrap();
        session.toggle_metadata(false).unwrap();
        session.toggle(FeatureName::WorkpieceResult, true).unwrap();
        session.set_metadata(FeatureName::WorkpieceResult, "NOK").unwrap();
        session.set_metadata(FeatureName::WorkpieceLocation, "right").unwrap();

        let Submission::Custom(request) = session.submission().unwrap() else {
            panic!("expected custom submission");
        };
        assert!(!request.series.contains_key(&SeriesFeature::Gradient));
        assert_eq!(request.metadata.workpiece_result, Some(WorkpieceResult::Nok));
        // Location was changed but stays disabled
        assert_eq!(request.metadata.workpiece_location, None);

        session.toggle(FeatureName::WorkpieceLocation, true).unwrap();
        let Submission::Custom(request) = session.submission().unwrap() else {
            panic!("expected custom submission");
        };
        assert_eq!(
            request.metadata.workpiece_location,
            Some(WorkpieceLocation::Right)
        );
    }

    #[test]
    fn test_invalid_metadata_choice() {
        let mut session = Session::new();
        session.select(Mode::Custom);
        assert!(matches!(
            session.set_metadata(FeatureName::WorkpieceUsage, "2"),
            Err(SessionError::Choice(_))
        ));
    }

    #[test]
    fn test_home_has_no_form() {
        let mut session = Session::new();
        assert_eq!(session.set_time("0"), Err(SessionError::NoForm));
        assert_eq!(
            session.toggle(FeatureName::AngleValues, true),
            Err(SessionError::NoForm)
        );
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("torque".parse::<Mode>().unwrap(), Mode::TorqueOnly);
        assert_eq!("custom".parse::<Mode>().unwrap(), Mode::Custom);
        assert!("settings".parse::<Mode>().is_err());
    }
}
