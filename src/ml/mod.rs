//! Model training, evaluation, and the persisted artifact.

pub mod artifact;
pub mod metrics;
pub mod network;
pub mod scaler;
pub mod trainer;

pub use artifact::RiskModel;
pub use metrics::EvalReport;
pub use scaler::StandardScaler;
pub use trainer::run_training;
