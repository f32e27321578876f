/**
 * Data Model
 *
 * DESIGN DECISION: Plain serializable data structs for every pipeline value
 * WHY: The pipeline stages (normalizer, extractors, merger, contradiction
 * engine, grounding, scorer) are pure functions over these types; keeping
 * fields public rather than hidden behind accessors keeps the inter-stage
 * plumbing simple, since nothing here is an invariant-bearing handle that
 * needs a constructor to enforce uniqueness.
 *
 * REASONING CHAIN:
 * 1. `Memory` is supplied by the caller and never mutated by the core
 * 2. `ExtractedFact` / `KnowledgeFact` are produced once per tier and merged
 * 3. `ContradictionDetail` and `VerificationReport` are the report surface
 * 4. Slot identity is just an interned `String` (see design notes) — no
 *    closed enum of slot names, since Tier-1.5 invents slots at runtime
 *
 * PATTERN: plain public-field data modelling for pure-function pipeline stages
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Verification mode: `strict` attempts a corrected rewrite of the draft,
/// `permissive` only reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Strict,
    Permissive,
}

impl std::str::FromStr for Mode {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Mode::Strict),
            "permissive" => Ok(Mode::Permissive),
            other => Err(crate::Error::InvalidMode(other.to_string())),
        }
    }
}

/// A trust-scored piece of grounding text supplied by the caller.
///
/// The core never mutates memories; list order only matters for
/// tie-breaking (first wins) when trust and timestamp are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Stable unique token. Generated if the caller omits it.
    pub id: String,
    /// Natural-language content of the memory.
    pub text: String,
    /// Trust in [0.0, 1.0]. Defaults to 1.0.
    pub trust: f64,
    /// Monotonic ordinal; `None` means "unknown" recency.
    pub timestamp: Option<i64>,
}

impl Memory {
    /// Construct a memory with an explicit id and full trust.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            trust: 1.0,
            timestamp: None,
        }
    }

    pub fn with_trust(mut self, trust: f64) -> Self {
        self.trust = trust;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Validate trust range; called at the `verify` boundary per the
    /// `InputMalformed` error taxonomy — never inside the pipeline itself.
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.trust) {
            return Err(crate::Error::InputMalformed(format!(
                "memory {} has trust {} outside [0.0, 1.0]",
                self.id, self.trust
            )));
        }
        Ok(())
    }
}

/// Byte offsets into the original (un-normalized) source text, used by the
/// corrector to rewrite the draft in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Which tier produced an `ExtractedFact`, and what inside that tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Origin {
    /// Tier-1 pattern match; carries the pattern family name.
    Pattern(String),
    /// Tier-1.5 knowledge inference; carries the verb category.
    Knowledge(VerbCategory),
    /// Tier-2 semantic matcher (used only for matching, never extraction,
    /// but the variant exists so `ExtractedFact::origin` stays exhaustive).
    Neural,
}

/// One atomic claim extracted from text (draft or memory).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFact {
    /// Canonical slot name (lowercase identifier), possibly invented at
    /// runtime by Tier-1.5 (see design notes on dynamic slot discovery).
    pub slot: String,
    /// Raw value exactly as it appeared in the source text.
    pub value: String,
    /// Lowercased, article-stripped form used for comparison. Deterministic
    /// function of `value` (see `normalizer::normalize_value`).
    pub normalized: String,
    /// Offsets into the original text, used for strict-mode rewrites.
    pub source_span: SourceSpan,
    pub origin: Origin,
}

/// Verb categories from the curated verb ontology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbCategory {
    Adoption,
    Migration,
    Deprecation,
    Tentative,
    Capability,
    Limitation,
    Assignment,
    Requirement,
    Preference,
    Creation,
}

impl VerbCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerbCategory::Adoption => "adoption",
            VerbCategory::Migration => "migration",
            VerbCategory::Deprecation => "deprecation",
            VerbCategory::Tentative => "tentative",
            VerbCategory::Capability => "capability",
            VerbCategory::Limitation => "limitation",
            VerbCategory::Assignment => "assignment",
            VerbCategory::Requirement => "requirement",
            VerbCategory::Preference => "preference",
            VerbCategory::Creation => "creation",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "adoption" => Some(VerbCategory::Adoption),
            "migration" => Some(VerbCategory::Migration),
            "deprecation" => Some(VerbCategory::Deprecation),
            "tentative" => Some(VerbCategory::Tentative),
            "capability" => Some(VerbCategory::Capability),
            "limitation" => Some(VerbCategory::Limitation),
            "assignment" => Some(VerbCategory::Assignment),
            "requirement" => Some(VerbCategory::Requirement),
            "preference" => Some(VerbCategory::Preference),
            "creation" => Some(VerbCategory::Creation),
            _ => None,
        }
    }
}

/// A Tier-1.5 inference: an entity from the taxonomy paired with the verb
/// category routed to it, within one clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeFact {
    /// Canonical entity name from the taxonomy (alias-resolved).
    pub entity: String,
    /// Taxonomy category (e.g. "database", "language").
    pub category: String,
    pub verb_category: VerbCategory,
    /// Position of the clause this fact was extracted from.
    pub clause_index: usize,
    /// Tentative (0.5) vs confirmed (1.0).
    pub confidence: f64,
    /// Set only for migration-fusion facts: `(from, to)` entity pair.
    /// `entity`/`category` describe the `to` side in that case.
    pub migration_from: Option<String>,
}

impl KnowledgeFact {
    pub fn tentative(
        entity: impl Into<String>,
        category: impl Into<String>,
        verb_category: VerbCategory,
        clause_index: usize,
    ) -> Self {
        Self {
            entity: entity.into(),
            category: category.into(),
            verb_category,
            clause_index,
            confidence: 0.5,
            migration_from: None,
        }
    }

    pub fn confirmed(
        entity: impl Into<String>,
        category: impl Into<String>,
        verb_category: VerbCategory,
        clause_index: usize,
    ) -> Self {
        Self {
            entity: entity.into(),
            category: category.into(),
            verb_category,
            clause_index,
            confidence: 1.0,
            migration_from: None,
        }
    }
}

/// How a slot was classified by the contradiction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotClass {
    KnownExclusive,
    Additive,
    Dynamic,
}

/// One resolved conflict on a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContradictionDetail {
    pub slot: String,
    /// Distinct normalized values in conflict, in first-seen order.
    pub values: Vec<String>,
    pub most_trusted_value: String,
    pub most_recent_value: String,
    pub action: String,
    /// `max(trust) - min(trust)` among the conflicting memories; drives
    /// `requires_disclosure` when it exceeds the configured threshold.
    pub trust_gap: f64,
}

/// The output contract: one verification report per `verify()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub passed: bool,
    pub corrected: Option<String>,
    /// Raw value strings for every draft claim that matched no memory.
    pub hallucinations: Vec<String>,
    /// Slot -> memory id that grounds it, or `None` if ungrounded.
    pub grounding_map: HashMap<String, Option<String>>,
    pub confidence: f64,
    pub contradiction_details: Vec<ContradictionDetail>,
    pub requires_disclosure: bool,
    pub facts_extracted: HashMap<String, ExtractedFact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_defaults_to_full_trust() {
        let m = Memory::new("m1", "User lives in Seattle");
        assert_eq!(m.trust, 1.0);
        assert!(m.timestamp.is_none());
    }

    #[test]
    fn memory_validate_rejects_out_of_range_trust() {
        let m = Memory::new("m1", "x").with_trust(1.5);
        assert!(m.validate().is_err());
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Strict".parse::<Mode>().unwrap(), Mode::Strict);
        assert_eq!("permissive".parse::<Mode>().unwrap(), Mode::Permissive);
        assert!("loose".parse::<Mode>().is_err());
    }

    #[test]
    fn verb_category_round_trips_through_str() {
        for cat in [
            VerbCategory::Adoption,
            VerbCategory::Migration,
            VerbCategory::Deprecation,
            VerbCategory::Tentative,
            VerbCategory::Capability,
            VerbCategory::Limitation,
            VerbCategory::Assignment,
            VerbCategory::Requirement,
            VerbCategory::Preference,
            VerbCategory::Creation,
        ] {
            assert_eq!(VerbCategory::from_str_opt(cat.as_str()), Some(cat));
        }
    }
}
