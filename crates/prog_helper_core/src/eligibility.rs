//! crates/prog_helper_core/src/eligibility.rs
//!
//! Post-assessment eligibility: a pure function of the registration timestamp
//! and the current time. Safe to call repeatedly, no side effects.

use chrono::{DateTime, Utc};

/// Minutes a user must have been registered before the post-assessment unlocks.
pub const MIN_MINUTES_REQUIRED: i64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct PostAssessmentEligibility {
    pub is_eligible: bool,
    pub minutes_since_registration: i64,
    pub min_minutes_required: i64,
    /// 0-100, capped.
    pub progress_percentage: u8,
}

/// Checks whether the user can take the post-assessment yet.
pub fn check_post_assessment_eligibility(
    registered_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> PostAssessmentEligibility {
    let minutes_since_registration = (now - registered_at).num_minutes().max(0);

    let progress = (minutes_since_registration as f64 / MIN_MINUTES_REQUIRED as f64) * 100.0;
    let progress_percentage = progress.min(100.0).round() as u8;

    PostAssessmentEligibility {
        is_eligible: minutes_since_registration >= MIN_MINUTES_REQUIRED,
        minutes_since_registration,
        min_minutes_required: MIN_MINUTES_REQUIRED,
        progress_percentage,
    }
}

/// Builds the user-facing message for the eligibility widget.
pub fn post_assessment_message(eligibility: &PostAssessmentEligibility) -> String {
    if eligibility.is_eligible {
        return "You're ready for post-assessment!".to_string();
    }

    let minutes_left = eligibility.min_minutes_required - eligibility.minutes_since_registration;
    format!(
        "Complete {} more minute{} to unlock post-assessment",
        minutes_left,
        if minutes_left > 1 { "s" } else { "" }
    )
}
