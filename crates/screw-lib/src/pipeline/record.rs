//! Fixed-schema feature record handed to a classifier

use crate::models::{FeatureName, FeatureValue, ScalarValue, SeriesFeature, TimeSeries};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Assembled input for one prediction.
///
/// Slots are keyed by [`FeatureName`], so only the enumerated features can
/// ever be stored. Iteration follows the canonical feature order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    slots: [Option<FeatureValue>; FeatureName::COUNT],
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a series, returning whatever the slot held before
    pub fn insert_series(
        &mut self,
        feature: SeriesFeature,
        series: TimeSeries,
    ) -> Option<FeatureValue> {
        self.slots[feature.name().index()].replace(FeatureValue::Series(series))
    }

    /// Store a metadata value in the slot of its field
    pub fn insert_scalar(&mut self, value: ScalarValue) -> Option<FeatureValue> {
        self.slots[value.feature().index()].replace(FeatureValue::Scalar(value))
    }

    pub fn get(&self, name: FeatureName) -> Option<&FeatureValue> {
        self.slots[name.index()].as_ref()
    }

    pub fn series(&self, feature: SeriesFeature) -> Option<&TimeSeries> {
        self.get(feature.name()).and_then(FeatureValue::as_series)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureName, &FeatureValue)> {
        FeatureName::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(name, slot)| slot.as_ref().map(|value| (name, value)))
    }

    pub fn names(&self) -> Vec<FeatureName> {
        self.iter().map(|(name, _)| name).collect()
    }

    /// Series slots holding the empty marker
    pub fn invalid_series(&self) -> Vec<FeatureName> {
        self.iter()
            .filter(|(_, value)| value.as_series().is_some_and(TimeSeries::is_empty))
            .map(|(name, _)| name)
            .collect()
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}
