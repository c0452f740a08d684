//! Correctness verification for kernel outputs.
//!
//! Two independent checks decide whether a timing can be trusted:
//! [`compare`] checks the computed values against a reference within an
//! absolute tolerance, and [`check_guard`] checks that the sentinel region past
//! the output was not written. [`Verdict`] combines both into one of four
//! [`Outcome`]s, all reported distinctly.

use std::fmt;

use num::Float;

/// Default absolute tolerance between reference and candidate elements.
pub const DEFAULT_TOLERANCE: f32 = 0.5;

/// Returns `true` if `|reference[i] - candidate[i]| <= tolerance` for every
/// `i` in `0..count`.
///
/// NaN never passes. If either slice is shorter than `count` the comparison
/// cannot be made and `false` is returned.
pub fn compare<T: Float>(reference: &[T], candidate: &[T], count: usize, tolerance: T) -> bool {
    if reference.len() < count || candidate.len() < count {
        return false;
    }

    reference[..count]
        .iter()
        .zip(&candidate[..count])
        .fold(true, |ok, (&r, &c)| ok & ((r - c).abs() <= tolerance))
}

/// Returns `true` if every slot in `buffer[guard_offset..guard_offset + guard_len]`
/// still holds the `sentinel` bit pattern.
///
/// Comparison is bitwise, so a kernel that writes a NaN with a different
/// payload is still caught. A guard region that does not fit in the buffer
/// counts as violated.
pub fn check_guard(buffer: &[f32], guard_offset: usize, guard_len: usize, sentinel: u32) -> bool {
    match buffer.get(guard_offset..guard_offset + guard_len) {
        Some(guard) => guard.iter().all(|slot| slot.to_bits() == sentinel),
        None => false,
    }
}

/// One position where candidate and reference disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub index: usize,
    pub expected: f32,
    pub actual: f32,
}

/// Collects up to `limit` positions in `0..count` that fail the tolerance check.
pub fn mismatches(
    reference: &[f32],
    candidate: &[f32],
    count: usize,
    tolerance: f32,
    limit: usize,
) -> Vec<Mismatch> {
    reference
        .iter()
        .zip(candidate)
        .take(count)
        .enumerate()
        .filter(|(_, (&r, &c))| !((r - c).abs() <= tolerance))
        .take(limit)
        .map(|(index, (&expected, &actual))| Mismatch {
            index,
            expected,
            actual,
        })
        .collect()
}

/// Combined result of both correctness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub values_match: bool,
    pub guard_intact: bool,
}

impl Verdict {
    pub fn new(values_match: bool, guard_intact: bool) -> Self {
        Self {
            values_match,
            guard_intact,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match (self.values_match, self.guard_intact) {
            (true, true) => Outcome::Verified,
            (false, true) => Outcome::Mismatch,
            (true, false) => Outcome::GuardViolated,
            (false, false) => Outcome::MismatchAndGuardViolated,
        }
    }

    /// Only a match with an intact guard makes the timing trustworthy.
    pub fn is_trusted(&self) -> bool {
        self.outcome().is_trusted()
    }
}

/// The four distinguishable verification outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Values match and the guard is intact.
    Verified,
    /// Values differ; no out-of-bounds write detected.
    Mismatch,
    /// Values match, but the kernel wrote past its output.
    GuardViolated,
    /// Values differ and the kernel wrote past its output.
    MismatchAndGuardViolated,
}

impl Outcome {
    /// Whether a timing with this outcome may be presented as trustworthy.
    pub fn is_trusted(&self) -> bool {
        *self == Outcome::Verified
    }

    /// Short machine-friendly label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Verified => "verified",
            Outcome::Mismatch => "mismatch",
            Outcome::GuardViolated => "guard_violated",
            Outcome::MismatchAndGuardViolated => "mismatch_guard_violated",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Outcome::Verified => "Success",
            Outcome::Mismatch => "Fail, but no buffer overruns",
            Outcome::GuardViolated => "Success, but failed buffer overruns check",
            Outcome::MismatchAndGuardViolated => "Failed, and failed buffer overruns check",
        };
        f.write_str(text)
    }
}
