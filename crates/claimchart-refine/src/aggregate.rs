//! Unreviewed confidence and flag updates
//!
//! Commentary replies still carry an assessment. It is folded into the
//! element without review, and only in the pessimistic direction: confidence
//! can only drop and flags only accumulate.

use crate::types::Assessment;
use claimchart_domain::ClaimElement;

/// Copy of `element` with the assessment folded in
pub fn aggregate(element: &ClaimElement, assessment: &Assessment) -> ClaimElement {
    let mut next = element.clone();
    next.confidence = element.confidence.lowest(assessment.confidence);
    next.flags = element.flags.union(&assessment.flags);
    next
}
