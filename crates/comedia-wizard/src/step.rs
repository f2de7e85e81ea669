//! Wizard steps and their linear transitions.
//!
//! The wizard is a fixed six-step line. Moving past either end is a no-op,
//! never a wrap-around.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Total number of steps in the wizard
pub const STEP_COUNT: u8 = 6;

/// One step of the analysis wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    /// Title and author
    Identification,
    /// Premise lines
    Premise,
    /// Rupture lines
    Rupture,
    /// Punchline lines
    Punchline,
    /// Perspective, attitude and concept
    PerspectiveConcept,
    /// Formulation and free notes
    FormulationNotes,
}

impl Step {
    /// All steps in wizard order
    pub const ALL: [Step; STEP_COUNT as usize] = [
        Step::Identification,
        Step::Premise,
        Step::Rupture,
        Step::Punchline,
        Step::PerspectiveConcept,
        Step::FormulationNotes,
    ];

    /// First step of the wizard
    #[inline]
    #[must_use]
    pub const fn first() -> Self {
        Step::Identification
    }

    /// Last step of the wizard; submission is only reachable from here
    #[inline]
    #[must_use]
    pub const fn last() -> Self {
        Step::FormulationNotes
    }

    /// One-based step number
    #[inline]
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Step::Identification => 1,
            Step::Premise => 2,
            Step::Rupture => 3,
            Step::Punchline => 4,
            Step::PerspectiveConcept => 5,
            Step::FormulationNotes => 6,
        }
    }

    /// Step for a one-based number, if in range
    #[must_use]
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.number() == number)
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Step::Identification => "Identification",
            Step::Premise => "Premise",
            Step::Rupture => "Rupture",
            Step::Punchline => "Punchline",
            Step::PerspectiveConcept => "Perspective & Concept",
            Step::FormulationNotes => "Formulation & Notes",
        }
    }

    /// Following step, clamped at the last one
    #[must_use]
    pub fn next(self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(self)
    }

    /// Preceding step, clamped at the first one
    #[must_use]
    pub fn previous(self) -> Self {
        self.number()
            .checked_sub(1)
            .and_then(Self::from_number)
            .unwrap_or(self)
    }

    /// Progress indicator value, `number / 6 * 100`
    #[must_use]
    pub fn progress_percent(self) -> f32 {
        f32::from(self.number()) / f32::from(STEP_COUNT) * 100.0
    }

    /// Whether submission can be triggered from this step
    #[inline]
    #[must_use]
    pub fn is_final(self) -> bool {
        self == Self::last()
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::first()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.label(), self.number(), STEP_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_round_trip() {
        for step in Step::ALL {
            assert_eq!(Step::from_number(step.number()), Some(step));
        }
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(7), None);
    }

    #[test]
    fn next_and_previous_clamp() {
        assert_eq!(Step::last().next(), Step::last());
        assert_eq!(Step::first().previous(), Step::first());
        assert_eq!(Step::Premise.next(), Step::Rupture);
        assert_eq!(Step::Premise.previous(), Step::Identification);
    }

    #[test]
    fn progress_matches_fraction() {
        assert!((Step::first().progress_percent() - 100.0 / 6.0).abs() < 1e-4);
        assert!((Step::Rupture.progress_percent() - 50.0).abs() < 1e-4);
        assert!((Step::last().progress_percent() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn display_includes_position() {
        assert_eq!(Step::PerspectiveConcept.to_string(), "Perspective & Concept (5/6)");
    }
}
