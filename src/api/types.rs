//! Interpretation record and related wire types

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// How much attention a term deserves
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// A medical term with its plain-language definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Term {
    pub term: String,
    pub definition: String,
    pub importance: Importance,
}

/// One passage of the source document and its simplified rendering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub original: String,
    pub simplified: String,
    #[serde(default)]
    pub terms: Vec<Term>,
}

/// Plain-language analysis of one submitted document
///
/// Records returned by the client always have at least one section and a
/// confidence within `[0, 1]`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterpretationRecord {
    pub id: String,
    pub document_type: String,
    pub confidence: f64,
    pub processing_time_ms: u64,
    pub summary: String,
    pub sections: Vec<Section>,
    pub warnings: Vec<String>,
    pub next_steps: Vec<String>,
    pub medical_terms: Option<Vec<String>>,
}

impl InterpretationRecord {
    /// Confidence as a whole percentage
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }

    /// Every term across all sections, in document order
    pub fn glossary(&self) -> impl Iterator<Item = &Term> {
        self.sections.iter().flat_map(|s| s.terms.iter())
    }

    pub fn glossary_by_importance(&self, importance: Importance) -> Vec<&Term> {
        self.glossary()
            .filter(|t| t.importance == importance)
            .collect()
    }
}

/// Body of the interpretation object nested inside the wire record
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInterpretation {
    summary: String,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    medical_terms: Option<Vec<String>>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    next_steps: Vec<String>,
}

/// Record as the backend sends it
#[derive(Debug, Deserialize)]
pub(crate) struct WireRecord {
    id: String,
    interpretation: WireInterpretation,
    #[serde(alias = "documentType")]
    document_type: String,
    confidence: f64,
    #[serde(default, alias = "processingTime", alias = "processing_time_ms")]
    processing_time: u64,
}

impl TryFrom<WireRecord> for InterpretationRecord {
    type Error = ApiError;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        if wire.interpretation.sections.is_empty() {
            return Err(ApiError::Parse(format!(
                "interpretation {} has no sections",
                wire.id
            )));
        }
        if !(0.0..=1.0).contains(&wire.confidence) {
            return Err(ApiError::Parse(format!(
                "confidence {} is outside [0, 1]",
                wire.confidence
            )));
        }

        Ok(Self {
            id: wire.id,
            document_type: wire.document_type,
            confidence: wire.confidence,
            processing_time_ms: wire.processing_time,
            summary: wire.interpretation.summary,
            sections: wire.interpretation.sections,
            warnings: wire.interpretation.warnings,
            next_steps: wire.interpretation.next_steps,
            medical_terms: wire.interpretation.medical_terms,
        })
    }
}

/// Answer to a follow-up question
#[derive(Debug, Clone, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}

/// Signed-in user as returned by `/auth/profile`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "full_name")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileResponse {
    pub user: UserProfile,
}

/// One page of past interpretations
#[derive(Debug, Clone)]
pub struct InterpretationPage {
    pub items: Vec<InterpretationRecord>,
    pub total: Option<u64>,
    pub next: Option<String>,
}
