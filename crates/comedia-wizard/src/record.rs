//! Structured analysis records as exchanged with the backend.

use crate::step::Step;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend identity of a stored analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(String);

impl AnalysisId {
    /// Wrap a backend identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnalysisId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Assembled analysis, field names as the backend stores them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Joke title
    #[serde(default)]
    pub titulo: String,
    /// Comedian who performed the joke
    #[serde(default)]
    pub comediante: String,
    /// Joined premise lines
    #[serde(default)]
    pub premisa: String,
    /// Joined rupture lines
    #[serde(default)]
    pub ruptura: String,
    /// Joined punchline lines
    #[serde(default)]
    pub remate: String,
    /// Perspective category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspectiva_categoria: Option<String>,
    /// Why that perspective
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspectiva_justificacion: Option<String>,
    /// Comedian attitude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actitud: Option<String>,
    /// Concept category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concepto_categoria: Option<String>,
    /// How the idea develops
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desarrollo_idea: Option<String>,
    /// Formulation category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formulacion_categoria: Option<String>,
    /// Why that formulation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formulacion_justificacion: Option<String>,
    /// Free notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
}

impl AnalysisRecord {
    /// Read an optional flat field
    #[must_use]
    pub fn optional(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => Some(self.titulo.as_str()),
            Field::Author => Some(self.comediante.as_str()),
            Field::PerspectiveCategory => self.perspectiva_categoria.as_deref(),
            Field::PerspectiveJustification => self.perspectiva_justificacion.as_deref(),
            Field::Attitude => self.actitud.as_deref(),
            Field::ConceptCategory => self.concepto_categoria.as_deref(),
            Field::IdeaDevelopment => self.desarrollo_idea.as_deref(),
            Field::FormulationCategory => self.formulacion_categoria.as_deref(),
            Field::FormulationJustification => self.formulacion_justificacion.as_deref(),
            Field::Notes => self.notas.as_deref(),
        }
    }
}

/// Record as returned by the backend after create/update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    /// Backend identity
    pub id: AnalysisId,
    /// Stored content
    #[serde(flatten)]
    pub record: AnalysisRecord,
}

/// Flat (non-line) wizard fields of steps 1, 5 and 6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// `titulo`, required
    Title,
    /// `comediante`, required
    Author,
    /// `perspectiva_categoria`
    PerspectiveCategory,
    /// `perspectiva_justificacion`
    PerspectiveJustification,
    /// `actitud`
    Attitude,
    /// `concepto_categoria`
    ConceptCategory,
    /// `desarrollo_idea`
    IdeaDevelopment,
    /// `formulacion_categoria`
    FormulationCategory,
    /// `formulacion_justificacion`
    FormulationJustification,
    /// `notas`
    Notes,
}

impl Field {
    /// Every flat field
    pub const ALL: [Field; 10] = [
        Field::Title,
        Field::Author,
        Field::PerspectiveCategory,
        Field::PerspectiveJustification,
        Field::Attitude,
        Field::ConceptCategory,
        Field::IdeaDevelopment,
        Field::FormulationCategory,
        Field::FormulationJustification,
        Field::Notes,
    ];

    /// Step that renders this field
    #[must_use]
    pub const fn step(self) -> Step {
        match self {
            Field::Title | Field::Author => Step::Identification,
            Field::PerspectiveCategory
            | Field::PerspectiveJustification
            | Field::Attitude
            | Field::ConceptCategory
            | Field::IdeaDevelopment => Step::PerspectiveConcept,
            Field::FormulationCategory | Field::FormulationJustification | Field::Notes => {
                Step::FormulationNotes
            }
        }
    }

    /// Backend field name
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Field::Title => "titulo",
            Field::Author => "comediante",
            Field::PerspectiveCategory => "perspectiva_categoria",
            Field::PerspectiveJustification => "perspectiva_justificacion",
            Field::Attitude => "actitud",
            Field::ConceptCategory => "concepto_categoria",
            Field::IdeaDevelopment => "desarrollo_idea",
            Field::FormulationCategory => "formulacion_categoria",
            Field::FormulationJustification => "formulacion_justificacion",
            Field::Notes => "notas",
        }
    }

    /// Look a field up by its backend name
    #[must_use]
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.wire_name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Kinds of selectable category lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Perspective options
    Perspectiva,
    /// Attitude options
    Actitud,
    /// Concept options
    Concepto,
    /// Formulation options
    Formulacion,
}

impl CategoryKind {
    /// Every category kind
    pub const ALL: [CategoryKind; 4] = [
        CategoryKind::Perspectiva,
        CategoryKind::Actitud,
        CategoryKind::Concepto,
        CategoryKind::Formulacion,
    ];

    /// Path segment / `tipo` value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Perspectiva => "perspectiva",
            CategoryKind::Actitud => "actitud",
            CategoryKind::Concepto => "concepto",
            CategoryKind::Formulacion => "formulacion",
        }
    }

    /// Parse a `tipo` value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == value)
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable category option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Backend identity
    #[serde(default)]
    pub id: Option<String>,
    /// Kind of list this belongs to
    pub tipo: CategoryKind,
    /// Display value
    pub valor: String,
    /// Sort order
    #[serde(default)]
    pub orden: i32,
}

/// Filters of the analysis listing; unset filters are left out of the query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListFilter {
    /// Only analyses of this comedian
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comediante: Option<String>,
    /// Only this concept category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concepto_categoria: Option<String>,
    /// Only this perspective category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perspectiva_categoria: Option<String>,
    /// At most this many results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListFilter {
    /// Whether `record` passes the category and comedian filters
    ///
    /// The comedian filter is a case-insensitive substring match; `limit` is
    /// not considered.
    #[must_use]
    pub fn matches(&self, record: &AnalysisRecord) -> bool {
        let comedian = match self.comediante.as_deref() {
            Some(wanted) => record
                .comediante
                .to_lowercase()
                .contains(&wanted.to_lowercase()),
            None => true,
        };
        comedian
            && same(
                self.concepto_categoria.as_deref(),
                record.concepto_categoria.as_deref(),
            )
            && same(
                self.perspectiva_categoria.as_deref(),
                record.perspectiva_categoria.as_deref(),
            )
    }
}

fn same(wanted: Option<&str>, actual: Option<&str>) -> bool {
    wanted.is_none() || wanted == actual
}

/// Default number of similar analyses requested
pub const DEFAULT_SIMILAR_LIMIT: u32 = 10;

/// Category combination to look up similar analyses for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarQuery {
    /// Concept category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concepto_categoria: Option<String>,
    /// Perspective category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perspectiva_categoria: Option<String>,
    /// Formulation category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formulacion_categoria: Option<String>,
    /// At most this many results
    pub limit: u32,
}

impl Default for SimilarQuery {
    fn default() -> Self {
        Self {
            concepto_categoria: None,
            perspectiva_categoria: None,
            formulacion_categoria: None,
            limit: DEFAULT_SIMILAR_LIMIT,
        }
    }
}

impl SimilarQuery {
    /// Query built from the categories chosen in `record`
    #[must_use]
    pub fn for_record(record: &AnalysisRecord) -> Self {
        Self {
            concepto_categoria: record.concepto_categoria.clone(),
            perspectiva_categoria: record.perspectiva_categoria.clone(),
            formulacion_categoria: record.formulacion_categoria.clone(),
            ..Self::default()
        }
    }

    /// Whether no category is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.concepto_categoria.is_none()
            && self.perspectiva_categoria.is_none()
            && self.formulacion_categoria.is_none()
    }

    /// Number of categories `record` shares with the query
    #[must_use]
    pub fn shared_categories(&self, record: &AnalysisRecord) -> usize {
        [
            (&self.concepto_categoria, &record.concepto_categoria),
            (&self.perspectiva_categoria, &record.perspectiva_categoria),
            (&self.formulacion_categoria, &record.formulacion_categoria),
        ]
        .into_iter()
        .filter(|(wanted, actual)| wanted.is_some() && wanted == actual)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let record = AnalysisRecord {
            titulo: "t".into(),
            comediante: "c".into(),
            premisa: "p".into(),
            ruptura: "r".into(),
            remate: "m".into(),
            notas: Some("n".into()),
            ..AnalysisRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["notas"], "n");
        assert!(json.get("actitud").is_none());
    }

    #[test]
    fn stored_analysis_flattens_record() {
        let json = serde_json::json!({
            "id": "abc",
            "titulo": "t",
            "comediante": "c",
            "premisa": "p",
            "ruptura": "r",
            "remate": "m",
            "actitud": "ironica"
        });
        let stored: StoredAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(stored.id.as_str(), "abc");
        assert_eq!(stored.record.actitud.as_deref(), Some("ironica"));
    }

    #[test]
    fn field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_wire_name(field.wire_name()), Some(field));
        }
    }

    #[test]
    fn list_filter_skips_unset_fields() {
        let filter = ListFilter {
            comediante: Some("seinfeld".into()),
            limit: Some(5),
            ..ListFilter::default()
        };
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            serde_json::json!({"comediante": "seinfeld", "limit": 5})
        );

        let record = AnalysisRecord {
            comediante: "Jerry Seinfeld".into(),
            concepto_categoria: Some("rutina".into()),
            ..AnalysisRecord::default()
        };
        assert!(filter.matches(&record));
        let other_concept = ListFilter {
            concepto_categoria: Some("absurdo".into()),
            ..filter
        };
        assert!(!other_concept.matches(&record));
    }

    #[test]
    fn similar_query_counts_shared_categories() {
        let draft = AnalysisRecord {
            concepto_categoria: Some("rutina".into()),
            perspectiva_categoria: Some("observacional".into()),
            ..AnalysisRecord::default()
        };
        let query = SimilarQuery::for_record(&draft);
        assert!(!query.is_empty());
        assert_eq!(query.limit, DEFAULT_SIMILAR_LIMIT);
        assert_eq!(query.shared_categories(&draft), 2);
        assert_eq!(query.shared_categories(&AnalysisRecord::default()), 0);
        assert!(SimilarQuery::for_record(&AnalysisRecord::default()).is_empty());
    }

    #[test]
    fn category_kind_parses_tipo() {
        assert_eq!(CategoryKind::parse("concepto"), Some(CategoryKind::Concepto));
        assert_eq!(CategoryKind::parse("otro"), None);
    }
}
