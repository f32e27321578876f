/**
 * GroundCheck — Top-Level Pipeline Orchestration
 *
 * DESIGN DECISION: One `GroundCheck` value holds the immutable ontology and
 * optional semantic matcher; `verify` is a plain method with no hidden
 * state mutated across calls
 * WHY: A verification call is pure and self-contained, and ontology tables
 * may be shared freely without locking — a struct that owns only read-only
 * data and an optional `Box<dyn SemanticMatcher>` satisfies that contract
 * directly, the same shape an immutable pattern library sits behind.
 *
 * REASONING CHAIN:
 * 1. `extract_claims`/`extract_knowledge_facts` are exposed standalone
 *    since embedders may want tier output without a full `verify()` call
 *    (e.g. to build the memory pool itself)
 * 2. `verify` runs every stage in order: normalize is implicit in the
 *    extractors, clause-split, Tier-1, Tier-1.5, merge, contradiction,
 *    ground/correct, score
 * 3. The SAME merge pipeline that processes the draft also processes each
 *    memory's own text, since contradiction detection and grounding both
 *    need each memory's *extracted facts*, not just its raw text
 * 4. Strict-mode correction only ever rewrites slots with zero or one
 *    distinct memory value (or the most-trusted value when memories
 *    disagree); `grounding_map` and `facts_extracted` always cover exactly
 *    the draft's own slot set
 * 5. Boundary validation (`InputMalformed`) runs before any pipeline stage
 *    touches the input
 *
 * PATTERN: pure top-level pipeline over immutable shared ontology
 */

use std::collections::HashMap;

use crate::clause::split_clauses;
use crate::confidence::score;
use crate::contradiction::{self, DEFAULT_TRUST_GAP_THRESHOLD};
use crate::error::{Error, Result};
use crate::ground::{self, SupportMatch};
use crate::matcher::SemanticMatcher;
use crate::merger::{merge, MergeResult};
use crate::ontology::Ontology;
use crate::tier1::{self, Tier1Patterns};
use crate::tier15;
use crate::types::{ExtractedFact, KnowledgeFact, Memory, Mode, VerificationReport};

/// Construction-time option bag carrying the two tunable knobs: whether a
/// semantic matcher will be injected, and the disclosure trust-gap
/// threshold.
#[derive(Debug, Clone)]
pub struct GroundCheckOptions {
    /// Caller promises a `SemanticMatcher` will be injected via
    /// [`GroundCheckOptions::with_matcher`] when true.
    pub neural: bool,
    /// Trust-gap above which a contradiction sets `requires_disclosure`.
    pub trust_gap_threshold: f64,
}

impl Default for GroundCheckOptions {
    fn default() -> Self {
        Self { neural: false, trust_gap_threshold: DEFAULT_TRUST_GAP_THRESHOLD }
    }
}

/// The verification core: immutable ontology plus an optional Tier-2
/// capability, shared freely across calls.
pub struct GroundCheck {
    ontology: Ontology,
    matcher: Option<Box<dyn SemanticMatcher>>,
    options: GroundCheckOptions,
    tier1_patterns: Tier1Patterns,
}

impl GroundCheck {
    /// Construct with the crate's shipped ontology and no semantic matcher.
    pub fn new(options: GroundCheckOptions) -> Result<Self> {
        if options.neural {
            return Err(Error::SemanticUnavailable);
        }
        Ok(Self {
            ontology: Ontology::load_default()?,
            matcher: None,
            options,
            tier1_patterns: Tier1Patterns::new(),
        })
    }

    /// Construct with an injected semantic matcher, satisfying `neural:
    /// true`.
    pub fn with_matcher(options: GroundCheckOptions, matcher: Box<dyn SemanticMatcher>) -> Result<Self> {
        if !options.neural {
            return Err(Error::InputMalformed(
                "a semantic matcher was supplied but neural=false".to_string(),
            ));
        }
        Ok(Self {
            ontology: Ontology::load_default()?,
            matcher: Some(matcher),
            options,
            tier1_patterns: Tier1Patterns::new(),
        })
    }

    /// Construct with caller-supplied ontology tables (used by embedders
    /// with their own domain ontology, and by tests).
    pub fn with_ontology(ontology: Ontology, options: GroundCheckOptions) -> Result<Self> {
        if options.neural {
            return Err(Error::SemanticUnavailable);
        }
        Ok(Self { ontology, matcher: None, options, tier1_patterns: Tier1Patterns::new() })
    }

    fn matcher_ref(&self) -> Option<&dyn SemanticMatcher> {
        self.matcher.as_deref()
    }

    /// Tier-1 + Tier-1.5 + merge over one piece of text, returning the
    /// primary slot -> fact claims and the discarded-but-retained evidence
    /// facts.
    fn extract_merged(&self, text: &str) -> MergeResult {
        let clauses = split_clauses(text);
        let tier1_facts = tier1::extract(&clauses, &self.tier1_patterns);
        let tier15_facts = tier15::extract(&clauses, &self.ontology);
        merge(tier1_facts, tier15_facts, &clauses, &self.ontology)
    }

    /// Tier-1 pattern extraction merged with Tier-1.5, so the returned map
    /// matches what `verify` treats as one text's claims.
    pub fn extract_claims(&self, text: &str) -> HashMap<String, ExtractedFact> {
        self.extract_merged(text).facts
    }

    /// Tier-1.5 knowledge inference only.
    pub fn extract_knowledge_facts(&self, text: &str) -> Vec<KnowledgeFact> {
        let clauses = split_clauses(text);
        tier15::extract(&clauses, &self.ontology)
    }

    /// Search `memories` for support for one `(slot, value)` claim.
    pub fn find_support(&self, slot: &str, value: &str, memories: &[Memory]) -> Option<SupportMatch> {
        for m in memories {
            m.validate().ok()?;
        }
        let merges: Vec<MergeResult> = memories.iter().map(|m| self.extract_merged(&m.text)).collect();
        let normalized = crate::normalizer::normalize_value(value);
        ground::find_support(slot, &normalized, memories, &merges, self.matcher_ref())
    }

    /// Run the full verification pipeline.
    pub fn verify(&self, draft: &str, memories: &[Memory], mode: Mode) -> Result<VerificationReport> {
        for m in memories {
            m.validate()?;
        }

        let draft_merge = self.extract_merged(draft);
        let memory_merges: Vec<MergeResult> = memories.iter().map(|m| self.extract_merged(&m.text)).collect();

        let contradiction_details =
            contradiction::detect(memories, &memory_merges, self.matcher_ref());

        let mut grounding_map: HashMap<String, Option<String>> = HashMap::new();
        let mut support_by_slot: HashMap<String, Option<SupportMatch>> = HashMap::new();
        let mut hallucinations: Vec<String> = Vec::new();

        let mut slots: Vec<&String> = draft_merge.facts.keys().collect();
        slots.sort();
        for slot in slots {
            let fact = &draft_merge.facts[slot];
            let support = ground::find_support(
                slot,
                &fact.normalized,
                memories,
                &memory_merges,
                self.matcher_ref(),
            );
            match &support {
                Some(s) => {
                    grounding_map.insert(slot.clone(), Some(s.memory_id.clone()));
                }
                None => {
                    grounding_map.insert(slot.clone(), None);
                    hallucinations.push(fact.value.clone());
                }
            }
            support_by_slot.insert(slot.clone(), support);
        }

        let score_result = score(
            &draft_merge.facts,
            &support_by_slot,
            memories,
            &memory_merges,
            &contradiction_details,
            self.options.trust_gap_threshold,
        );

        let corrected = if mode == Mode::Strict && !score_result.passed {
            let mut rewrites = Vec::new();
            for (slot, fact) in &draft_merge.facts {
                if support_by_slot.get(slot).and_then(|s| s.as_ref()).is_some() {
                    continue;
                }
                if let Some(replacement) = ground::replacement_value_for_slot(
                    slot,
                    memories,
                    &memory_merges,
                    &contradiction_details,
                ) {
                    rewrites.push((fact.source_span, replacement));
                }
            }
            ground::apply_rewrites(draft, rewrites)
        } else {
            None
        };

        Ok(VerificationReport {
            passed: score_result.passed,
            corrected,
            hallucinations,
            grounding_map,
            confidence: score_result.confidence,
            contradiction_details,
            requires_disclosure: score_result.requires_disclosure,
            facts_extracted: draft_merge.facts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gc() -> GroundCheck {
        GroundCheck::new(GroundCheckOptions::default()).unwrap()
    }

    #[test]
    fn empty_memories_pass_iff_draft_has_no_claims() {
        let gc = gc();
        let report = gc.verify("Hello there, how is it going", &[], Mode::Strict).unwrap();
        assert!(report.passed);
        assert!(report.facts_extracted.is_empty());

        let report = gc.verify("My name is Bob", &[], Mode::Strict).unwrap();
        assert!(!report.passed);
        assert_eq!(report.hallucinations, vec!["Bob".to_string()]);
    }

    #[test]
    fn scenario_employer_and_location_strict_rewrite() {
        let gc = gc();
        let memories = vec![
            Memory::new("m1", "User works at Microsoft").with_trust(0.9),
            Memory::new("m2", "User lives in Seattle").with_trust(0.8),
        ];
        let report = gc
            .verify("You work at Amazon and live in Seattle", &memories, Mode::Strict)
            .unwrap();
        assert!(!report.passed);
        assert_eq!(report.hallucinations, vec!["Amazon".to_string()]);
        assert_eq!(report.corrected.as_deref(), Some("You work at Microsoft and live in Seattle"));
        assert!((report.confidence - 0.65).abs() < 0.02, "confidence={}", report.confidence);
    }

    #[test]
    fn scenario_name_contradiction_requires_disclosure() {
        let gc = gc();
        let memories = vec![
            Memory::new("m1", "User is named Alice").with_trust(0.9),
            Memory::new("m2", "User is named Bob").with_trust(0.3),
        ];
        let report = gc.verify("Your name is Bob", &memories, Mode::Strict).unwrap();
        assert!(report.requires_disclosure);
        let detail = report
            .contradiction_details
            .iter()
            .find(|d| d.slot == "name")
            .unwrap();
        assert_eq!(detail.most_trusted_value, "alice");
    }

    #[test]
    fn scenario_database_knowledge_facts_no_migration() {
        let gc = gc();
        let facts = gc.extract_claims("we ended up going with Postgres after the whole MySQL disaster");
        // Both land on the "database" Tier-1 slot via slot aliasing; the
        // merger keeps the first (adoption) as the primary claim and
        // retains deprecation as evidence, so `facts_extracted`
        // exposes one claim while `extract_knowledge_facts` exposes both.
        assert!(facts.contains_key("database"));
        let kfacts = gc.extract_knowledge_facts("we ended up going with Postgres after the whole MySQL disaster");
        assert_eq!(kfacts.len(), 2);
        assert!(kfacts.iter().all(|f| f.migration_from.is_none()));
    }

    #[test]
    fn scenario_frontend_backend_clause_split() {
        let gc = gc();
        let facts = gc.extract_claims("frontend is React, backend is FastAPI");
        assert_eq!(facts.get("frontend").unwrap().value, "React");
        assert_eq!(facts.get("backend").unwrap().value, "FastAPI");
    }

    #[test]
    fn scenario_nyc_normalization_with_neural_grounds() {
        use crate::matcher::fixtures::ScriptedMatcher;
        use crate::matcher::{Entailment, EntailmentResult};

        let matcher = ScriptedMatcher {
            similarity: 0.9,
            entailment: EntailmentResult { label: Entailment::Neutral, confidence: 0.0 },
        };
        let gc = GroundCheck::with_matcher(
            GroundCheckOptions { neural: true, ..Default::default() },
            Box::new(matcher),
        )
        .unwrap();
        let memories = vec![Memory::new("m1", "User lives in New York City").with_trust(1.0)];
        let report = gc.verify("You live in NYC", &memories, Mode::Permissive).unwrap();
        assert!(report.passed);
    }

    #[test]
    fn scenario_max_retries_preserves_single_digit() {
        let gc = gc();
        let facts = gc.extract_claims("Max retries should be 5");
        assert_eq!(facts.get("max_retries").unwrap().value, "5");
    }

    #[test]
    fn grounding_map_and_facts_extracted_cover_same_slots() {
        let gc = gc();
        let memories = vec![Memory::new("m1", "User lives in Seattle").with_trust(1.0)];
        let report = gc
            .verify("You work at Amazon and live in Seattle", &memories, Mode::Permissive)
            .unwrap();
        let mut fact_slots: Vec<&String> = report.facts_extracted.keys().collect();
        let mut grounding_slots: Vec<&String> = report.grounding_map.keys().collect();
        fact_slots.sort();
        grounding_slots.sort();
        assert_eq!(fact_slots, grounding_slots);
    }

    #[test]
    fn neural_true_without_matcher_is_construction_error() {
        let err = GroundCheck::new(GroundCheckOptions { neural: true, ..Default::default() }).unwrap_err();
        assert_eq!(err, Error::SemanticUnavailable);
    }

    #[test]
    fn malformed_trust_is_rejected_before_pipeline_runs() {
        let gc = gc();
        let memories = vec![Memory::new("m1", "x").with_trust(5.0)];
        let err = gc.verify("My name is Bob", &memories, Mode::Strict).unwrap_err();
        assert!(matches!(err, Error::InputMalformed(_)));
    }

    #[test]
    fn idempotent_on_corrected_output() {
        let gc = gc();
        let memories = vec![
            Memory::new("m1", "User works at Microsoft").with_trust(0.9),
            Memory::new("m2", "User lives in Seattle").with_trust(0.8),
        ];
        let first = gc
            .verify("You work at Amazon and live in Seattle", &memories, Mode::Strict)
            .unwrap();
        let corrected = first.corrected.clone().unwrap();
        let second = gc.verify(&corrected, &memories, Mode::Strict).unwrap();
        assert!(second.passed);
    }
}
