/**
 * Fact Merger
 *
 * DESIGN DECISION: The merger, not the extractors, owns the Tier-1.5 ->
 * Tier-1 slot-alias table and the dedup/conflict-retention policy
 * WHY: Design notes ("Overlapping Tier-1/Tier-1.5 outputs") call this out
 * explicitly: each tier returns facts keyed by its own vocabulary, and one
 * clean interface collapses them, rather than scattering ad-hoc dedupe
 * through both extractors.
 *
 * REASONING CHAIN:
 * 1. Tier-1 facts are inserted first and always win a same-slot conflict
 * 2. A Tier-1.5 fact lands on a slot via `SlotAliases::slot_for_category`;
 *    if that slot is empty it becomes the primary claim
 * 3. If the slot is already claimed and the normalized value matches, the
 *    Tier-1.5 fact is pure duplication and is dropped
 * 4. If the slot is already claimed with a *different* normalized value,
 *    the Tier-1.5 fact is kept as contradiction evidence (not a second
 *    claim) so the contradiction engine still sees both values
 *
 * PATTERN: slot -> fact union with first-tier-wins precedence
 */

use std::collections::HashMap;

use crate::clause::Clause;
use crate::normalizer::normalize_value;
use crate::ontology::Ontology;
use crate::types::{ExtractedFact, KnowledgeFact, Origin, SourceSpan};

/// Output of merging one text's Tier-1 and Tier-1.5 extractions.
#[derive(Debug, Clone, Default)]
pub struct MergeResult {
    /// Primary slot -> fact claim, the surface grounding/correction acts on.
    pub facts: HashMap<String, ExtractedFact>,
    /// Tier-1.5 facts that lost a same-slot conflict against a Tier-1 fact,
    /// kept only so the contradiction engine can see the disagreement.
    pub evidence: Vec<ExtractedFact>,
}

fn clause_span(clauses: &[Clause], clause_index: usize) -> SourceSpan {
    clauses
        .iter()
        .find(|c| c.index == clause_index)
        .map(|c| SourceSpan::new(c.start, c.end))
        .unwrap_or(SourceSpan::new(0, 0))
}

/// Lower a Tier-1.5 inference into the same `ExtractedFact` shape Tier-1
/// produces, so the merger and everything downstream only deal in one type.
fn knowledge_fact_to_extracted(kf: &KnowledgeFact, clauses: &[Clause], ontology: &Ontology) -> (String, ExtractedFact) {
    let slot = ontology.slot_aliases.slot_for_category(&kf.category);
    let normalized = normalize_value(&kf.entity);
    let fact = ExtractedFact {
        slot: slot.clone(),
        value: kf.entity.clone(),
        normalized,
        source_span: clause_span(clauses, kf.clause_index),
        origin: Origin::Knowledge(kf.verb_category),
    };
    (slot, fact)
}

/// Union Tier-1 and Tier-1.5 output into one slot -> fact map.
/// `clauses` is the same clause list Tier-1.5 was run over, used only
/// to recover a byte span for facts that carry no span of their own.
pub fn merge(
    tier1_facts: Vec<ExtractedFact>,
    tier15_facts: Vec<KnowledgeFact>,
    clauses: &[Clause],
    ontology: &Ontology,
) -> MergeResult {
    let mut facts: HashMap<String, ExtractedFact> = HashMap::new();
    let mut evidence = Vec::new();

    for fact in tier1_facts {
        facts.entry(fact.slot.clone()).or_insert(fact);
    }

    for kf in &tier15_facts {
        let (slot, candidate) = knowledge_fact_to_extracted(kf, clauses, ontology);
        match facts.get(&slot) {
            None => {
                facts.insert(slot, candidate);
            }
            Some(existing) => {
                if existing.normalized != candidate.normalized {
                    evidence.push(candidate);
                }
                // same normalized value: pure duplication, discard.
            }
        }
    }

    MergeResult { facts, evidence }
}
