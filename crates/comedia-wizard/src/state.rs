//! In-memory wizard state and its pure step validation.

use crate::error::ValidationError;
use crate::lines::{LineSlots, Section};
use crate::record::{AnalysisId, AnalysisRecord, Field};
use crate::step::Step;
use std::collections::HashMap;

/// Everything the wizard holds between commands
///
/// Owned by exactly one controller; never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    current_step: Step,
    premise: LineSlots,
    rupture: LineSlots,
    punchline: LineSlots,
    fields: HashMap<Field, String>,
    editing: Option<AnalysisId>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: Step::first(),
            premise: LineSlots::with_empty_line(),
            rupture: LineSlots::with_empty_line(),
            punchline: LineSlots::with_empty_line(),
            fields: HashMap::new(),
            editing: None,
        }
    }
}

impl WizardState {
    /// Initial state: step 1, one empty line per section
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State repopulated from a stored record, positioned on step 1
    #[must_use]
    pub fn from_record(id: AnalysisId, record: &AnalysisRecord) -> Self {
        let mut state = Self {
            premise: LineSlots::from_block(&record.premisa),
            rupture: LineSlots::from_block(&record.ruptura),
            punchline: LineSlots::from_block(&record.remate),
            editing: Some(id),
            ..Self::default()
        };
        for field in Field::ALL {
            if let Some(value) = record.optional(field) {
                state.set_field(field, value);
            }
        }
        state
    }

    /// Current step
    #[inline]
    #[must_use]
    pub fn current_step(&self) -> Step {
        self.current_step
    }

    pub(crate) fn set_step(&mut self, step: Step) {
        self.current_step = step;
    }

    /// Lines of a section
    #[must_use]
    pub fn lines(&self, section: Section) -> &LineSlots {
        match section {
            Section::Premise => &self.premise,
            Section::Rupture => &self.rupture,
            Section::Punchline => &self.punchline,
        }
    }

    pub(crate) fn lines_mut(&mut self, section: Section) -> &mut LineSlots {
        match section {
            Section::Premise => &mut self.premise,
            Section::Rupture => &mut self.rupture,
            Section::Punchline => &mut self.punchline,
        }
    }

    /// Value of a flat field, empty when unset
    #[must_use]
    pub fn field(&self, field: Field) -> &str {
        self.fields.get(&field).map_or("", String::as_str)
    }

    /// Set a flat field; an empty value clears it
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
    }

    /// Identity of the record being edited, if any
    #[inline]
    #[must_use]
    pub fn editing(&self) -> Option<&AnalysisId> {
        self.editing.as_ref()
    }

    /// Check the precondition of `step` against this state
    pub fn validate(&self, step: Step) -> Result<(), ValidationError> {
        match step {
            Step::Identification => {
                if self.field(Field::Title).trim().is_empty() {
                    return Err(ValidationError::MissingTitle);
                }
                if self.field(Field::Author).trim().is_empty() {
                    return Err(ValidationError::MissingAuthor);
                }
                Ok(())
            }
            Step::Premise => self.require_lines(Section::Premise),
            Step::Rupture => self.require_lines(Section::Rupture),
            Step::Punchline => self.require_lines(Section::Punchline),
            Step::PerspectiveConcept | Step::FormulationNotes => Ok(()),
        }
    }

    fn require_lines(&self, section: Section) -> Result<(), ValidationError> {
        if self.lines(section).has_content() {
            Ok(())
        } else {
            Err(ValidationError::EmptySection(section))
        }
    }

    /// Build the submission payload
    ///
    /// Each section is reduced to its live non-blank lines joined by `\n`;
    /// all three joined blocks must be non-empty.
    pub fn assemble(&self) -> Result<AnalysisRecord, ValidationError> {
        let record = self.draft();
        for (section, block) in [
            (Section::Premise, &record.premisa),
            (Section::Rupture, &record.ruptura),
            (Section::Punchline, &record.remate),
        ] {
            if block.is_empty() {
                return Err(ValidationError::EmptySection(section));
            }
        }
        Ok(record)
    }

    /// Record as entered so far, without checking completeness
    #[must_use]
    pub fn draft(&self) -> AnalysisRecord {
        let optional = |field: Field| {
            let value = self.field(field).trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        AnalysisRecord {
            titulo: self.field(Field::Title).trim().to_string(),
            comediante: self.field(Field::Author).trim().to_string(),
            premisa: self.premise.joined(),
            ruptura: self.rupture.joined(),
            remate: self.punchline.joined(),
            perspectiva_categoria: optional(Field::PerspectiveCategory),
            perspectiva_justificacion: optional(Field::PerspectiveJustification),
            actitud: optional(Field::Attitude),
            concepto_categoria: optional(Field::ConceptCategory),
            desarrollo_idea: optional(Field::IdeaDevelopment),
            formulacion_categoria: optional(Field::FormulationCategory),
            formulacion_justificacion: optional(Field::FormulationJustification),
            notas: optional(Field::Notes),
        }
    }
}
