use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::ShapeMismatch;

/// Tolerance used when checking that a distribution sums to one.
pub const DEFAULT_SUM_TOLERANCE: f64 = 1e-3;

// One list drives both the label enum and the distribution record, so the
// four class names exist in a single place.
macro_rules! diagnostic_classes {
    ($($variant:ident => $field:ident),+ $(,)?) => {
        /// Diagnostic class predicted for a scan.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum TumorType {
            $($variant),+
        }

        impl TumorType {
            /// Every label, in the order the classifier emits its scores.
            pub const ALL: [TumorType; diagnostic_classes!(@count $($variant)+)] =
                [$(TumorType::$variant),+];

            /// Wire name, identical to the matching field of [`Probabilities`].
            pub fn as_str(self) -> &'static str {
                match self {
                    $(TumorType::$variant => stringify!($field)),+
                }
            }
        }

        /// Probability mass per diagnostic class.
        ///
        /// Values are expected in `[0, 1]` and to sum to about one. Neither is
        /// enforced here; that is the producer's job.
        #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
        pub struct Probabilities {
            $(pub $field: f64),+
        }

        // Only objects are accepted: a sequence would bind values to classes
        // by position.
        impl<'de> Deserialize<'de> for Probabilities {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct ProbabilitiesVisitor;

                impl<'de> Visitor<'de> for ProbabilitiesVisitor {
                    type Value = Probabilities;

                    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        f.write_str("an object with one probability per tumor type")
                    }

                    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Probabilities, A::Error> {
                        $(let mut $field: Option<f64> = None;)+
                        while let Some(key) = map.next_key::<TumorType>()? {
                            match key {
                                $(TumorType::$variant => {
                                    if $field.is_some() {
                                        return Err(de::Error::duplicate_field(stringify!($field)));
                                    }
                                    $field = Some(map.next_value()?);
                                })+
                            }
                        }
                        Ok(Probabilities {
                            $($field: $field.ok_or_else(|| de::Error::missing_field(stringify!($field)))?),+
                        })
                    }
                }

                deserializer.deserialize_map(ProbabilitiesVisitor)
            }
        }

        impl Probabilities {
            pub fn get(&self, label: TumorType) -> f64 {
                match label {
                    $(TumorType::$variant => self.$field),+
                }
            }
        }
    };
    (@count $($t:tt)+) => { 0usize $(+ diagnostic_classes!(@one $t))+ };
    (@one $t:tt) => { 1usize };
}

diagnostic_classes! {
    Glioma => glioma,
    Meningioma => meningioma,
    Notumor => notumor,
    Pituitary => pituitary,
}

impl TumorType {
    /// Position of this label in the classifier's output row.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for TumorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TumorType {
    type Err = ShapeMismatch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| ShapeMismatch::new(format!("unknown tumor type `{}`", s)))
    }
}

impl Probabilities {
    /// `(label, value)` pairs in classifier order.
    pub fn iter(&self) -> impl Iterator<Item = (TumorType, f64)> + '_ {
        TumorType::ALL.into_iter().map(move |label| (label, self.get(label)))
    }

    /// Label with the greatest value. Ties go to the earlier label and NaN
    /// never beats a number.
    pub fn most_likely(&self) -> TumorType {
        let mut best = TumorType::ALL[0];
        let mut best_value = self.get(best);
        for (label, value) in self.iter().skip(1) {
            if value > best_value || (best_value.is_nan() && !value.is_nan()) {
                best = label;
                best_value = value;
            }
        }
        best
    }

    pub fn total(&self) -> f64 {
        self.iter().map(|(_, value)| value).sum()
    }

    /// Whether the values add up to one within `tolerance`. Advisory only.
    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.total() - 1.0).abs() <= tolerance
    }

    /// Value for `label` scaled to a percentage, for display.
    pub fn percent(&self, label: TumorType) -> f64 {
        self.get(label) * 100.0
    }
}

/// Predicted class paired with the full distribution it was picked from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    #[serde(rename = "type")]
    pub kind: TumorType,
    pub probabilities: Probabilities,
}

impl PredictionResult {
    pub fn new(kind: TumorType, probabilities: Probabilities) -> Self {
        Self {
            kind,
            probabilities,
        }
    }

    /// Labels the distribution with its most likely class.
    pub fn from_probabilities(probabilities: Probabilities) -> Self {
        Self::new(probabilities.most_likely(), probabilities)
    }

    /// Probability of the selected label.
    pub fn confidence(&self) -> f64 {
        self.probabilities.get(self.kind)
    }
}

impl<'de> Deserialize<'de> for PredictionResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(field_identifier, rename_all = "lowercase")]
        enum Field {
            Type,
            Probabilities,
        }

        struct PredictionResultVisitor;

        impl<'de> Visitor<'de> for PredictionResultVisitor {
            type Value = PredictionResult;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object with `type` and `probabilities`")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<PredictionResult, A::Error> {
                let mut kind = None;
                let mut probabilities = None;
                while let Some(key) = map.next_key::<Field>()? {
                    match key {
                        Field::Type => {
                            if kind.is_some() {
                                return Err(de::Error::duplicate_field("type"));
                            }
                            kind = Some(map.next_value()?);
                        }
                        Field::Probabilities => {
                            if probabilities.is_some() {
                                return Err(de::Error::duplicate_field("probabilities"));
                            }
                            probabilities = Some(map.next_value()?);
                        }
                    }
                }
                Ok(PredictionResult {
                    kind: kind.ok_or_else(|| de::Error::missing_field("type"))?,
                    probabilities: probabilities
                        .ok_or_else(|| de::Error::missing_field("probabilities"))?,
                })
            }
        }

        deserializer.deserialize_map(PredictionResultVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Probabilities {
        Probabilities {
            glioma: 0.01,
            meningioma: 0.9,
            notumor: 0.05,
            pituitary: 0.04,
        }
    }

    #[test]
    fn labels_match_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let fields = value.as_object().unwrap();
        assert_eq!(fields.len(), TumorType::ALL.len());
        for label in TumorType::ALL {
            assert!(fields.contains_key(label.as_str()), "missing {}", label);
            assert_eq!(
                serde_json::to_value(label).unwrap(),
                serde_json::Value::from(label.as_str())
            );
        }
    }

    #[test]
    fn index_follows_classifier_order() {
        let names: Vec<_> = TumorType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, ["glioma", "meningioma", "notumor", "pituitary"]);
        for (i, label) in TumorType::ALL.into_iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(TumorType::from_index(i), Some(label));
        }
        assert_eq!(TumorType::from_index(4), None);
    }

    #[test]
    fn parse_label() {
        assert_eq!("notumor".parse::<TumorType>().unwrap(), TumorType::Notumor);
        assert!("Glioma".parse::<TumorType>().is_err());
        assert!("unknown".parse::<TumorType>().is_err());
    }

    #[test]
    fn get_reads_matching_field() {
        let p = sample();
        assert_eq!(p.get(TumorType::Glioma), 0.01);
        assert_eq!(p.get(TumorType::Meningioma), 0.9);
        assert_eq!(p.get(TumorType::Notumor), 0.05);
        assert_eq!(p.get(TumorType::Pituitary), 0.04);
    }

    #[test]
    fn most_likely_picks_max() {
        assert_eq!(sample().most_likely(), TumorType::Meningioma);
    }

    #[test]
    fn most_likely_ties_and_nan() {
        let tied = Probabilities {
            glioma: 0.1,
            meningioma: 0.4,
            notumor: 0.1,
            pituitary: 0.4,
        };
        assert_eq!(tied.most_likely(), TumorType::Meningioma);

        let nan_first = Probabilities {
            glioma: f64::NAN,
            meningioma: 0.2,
            notumor: 0.7,
            pituitary: 0.1,
        };
        assert_eq!(nan_first.most_likely(), TumorType::Notumor);
    }

    #[test]
    fn normalization_is_advisory() {
        assert!(sample().is_normalized(DEFAULT_SUM_TOLERANCE));
        let skewed = Probabilities {
            glioma: 0.5,
            ..sample()
        };
        assert!(!skewed.is_normalized(DEFAULT_SUM_TOLERANCE));
        assert!(skewed.is_normalized(0.5));
    }

    #[test]
    fn records_only_decode_from_objects() {
        assert!(serde_json::from_str::<Probabilities>("[0.25,0.25,0.25,0.25]").is_err());
        assert!(serde_json::from_value::<Probabilities>(serde_json::json!([1, 0, 0, 0])).is_err());
        assert!(serde_json::from_str::<PredictionResult>(
            r#"["pituitary",{"glioma":0,"meningioma":0,"notumor":0,"pituitary":1}]"#
        )
        .is_err());

        let decoded: Probabilities = serde_json::from_str(
            r#"{"pituitary":0.04,"notumor":0.05,"meningioma":0.9,"glioma":0.01}"#,
        )
        .unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn percent_scales_for_display() {
        assert!((sample().percent(TumorType::Meningioma) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn result_label_is_a_distribution_key() {
        let result = PredictionResult::from_probabilities(sample());
        assert_eq!(result.kind, TumorType::Meningioma);
        assert_eq!(result.confidence(), 0.9);

        let explicit = PredictionResult::new(TumorType::Pituitary, sample());
        assert_eq!(explicit.confidence(), 0.04);
    }
}
