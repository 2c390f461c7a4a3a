mod artifact_gate;
mod evaluator;
pub mod metrics;
mod types;

pub use artifact_gate::{lock_artifact_from_str, ArtifactLock, LockError};
pub use evaluator::{
    check_metrics_finite, compare_candidates, compute_metrics, evaluate_promotion, pick_winner,
};
pub use metrics::{compute_metrics as compute_spec_metrics, Metrics, ProfitFactor};
pub use types::{
    PromotionCandidate, PromotionConfig, PromotionDecision, PromotionInput, PromotionMetrics,
    StressSuiteResult, TieBreakOrder, TieBreakRules,
};
