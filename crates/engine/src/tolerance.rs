//! Variance computation and the tolerance policy.
//!
//! The reconciliation rule is pure: a confirmation computes
//! `variance = actual - expected` and asks the policy whether the variance is
//! acceptable. The policy is configuration, held by the engine, never
//! hardcoded per call site.

use crate::MoneyCents;

/// Difference between what a recipient counted and what they were supposed
/// to receive. Negative means a shortfall.
#[must_use]
pub fn variance(expected: MoneyCents, actual: MoneyCents) -> MoneyCents {
    actual - expected
}

/// Threshold below which a variance is accepted without raising a dispute.
///
/// The boundary is inclusive: a variance exactly at the cap is still within
/// tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TolerancePolicy {
    /// Accept any variance whose absolute value is at most this amount.
    Absolute(MoneyCents),
    /// Accept any variance whose absolute value is at most `bps` basis points
    /// of the expected amount (100 bps = 1%).
    Percent { bps: u32 },
}

impl TolerancePolicy {
    /// Returns `true` if `variance` is acceptable for `expected`.
    #[must_use]
    pub fn within(&self, variance: MoneyCents, expected: MoneyCents) -> bool {
        match *self {
            Self::Absolute(cap) => variance.abs() <= cap.abs(),
            Self::Percent { bps } => {
                // i128 keeps bps * expected exact for any representable amount.
                let allowed = i128::from(expected.minor().abs()) * i128::from(bps);
                i128::from(variance.minor().abs()) * 10_000 <= allowed
            }
        }
    }
}

impl Default for TolerancePolicy {
    /// A small absolute allowance: one major unit (100 minor units).
    fn default() -> Self {
        Self::Absolute(MoneyCents::new(100))
    }
}
