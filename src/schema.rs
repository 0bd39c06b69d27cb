//! The feature schema shared by the trainer and the prediction service.
//!
//! Feature order is a wire-level contract: the model is trained on vectors
//! assembled in this order and served requests are assembled the same way.
//! Everything that names or orders features goes through this module: the
//! CSV columns, the JSON request fields, and the artifact's recorded schema.

use serde::{Deserialize, Serialize};

/// Number of input features.
pub const FEATURE_COUNT: usize = 8;

/// One feature's two names: the dataset CSV column and the JSON wire field.
pub struct FeatureSpec {
    pub column: &'static str,
    pub field: &'static str,
}

/// All features, in model input order.
pub const FEATURES: [FeatureSpec; FEATURE_COUNT] = [
    FeatureSpec { column: "Pregnancies", field: "pregnancies" },
    FeatureSpec { column: "Glucose", field: "glucose" },
    FeatureSpec { column: "BloodPressure", field: "bloodPressure" },
    FeatureSpec { column: "SkinThickness", field: "skinThickness" },
    FeatureSpec { column: "Insulin", field: "insulin" },
    FeatureSpec { column: "BMI", field: "bmi" },
    FeatureSpec { column: "DiabetesPedigreeFunction", field: "diabetesPedigree" },
    FeatureSpec { column: "Age", field: "age" },
];

/// CSV label column (training only).
pub const LABEL_COLUMN: &str = "Outcome";

/// Wire field names in model input order, as stored in the artifact.
pub fn wire_names() -> Vec<String> {
    FEATURES.iter().map(|f| f.field.to_string()).collect()
}

/// One patient's measurements as received on the wire.
///
/// All eight fields are required and numeric; unknown fields are rejected so
/// a misspelled field fails loudly instead of silently dropping a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PatientSample {
    pub pregnancies: f64,
    pub glucose: f64,
    pub blood_pressure: f64,
    pub skin_thickness: f64,
    pub insulin: f64,
    pub bmi: f64,
    pub diabetes_pedigree: f64,
    pub age: f64,
}

impl PatientSample {
    /// Assemble the feature vector in the fixed model input order.
    pub fn to_features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.pregnancies,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree,
            self.age,
        ]
    }
}
