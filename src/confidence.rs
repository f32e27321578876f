/**
 * Scorer — Confidence and Disclosure
 *
 * DESIGN DECISION: Confidence is `Σ_grounded / (Σ_grounded + Σ_hallucinated)`,
 * never a subtractive ratio
 * WHY: A subtractive numerator (`Σ_grounded − Σ_hallucinated`) can go
 * negative whenever one highly-trusted contradicting memory outweighs a
 * single, more weakly-trusted grounded claim, and clamping that to zero
 * throws away exactly the information a "half-grounded" draft needs to
 * land mid-range instead of bottoming out.
 *
 * REASONING CHAIN:
 * 1. Grounded claims contribute the trust of their best supporting memory
 *    to `Σ_grounded`; a draft with zero hallucinations always lands at
 *    `Σ_grounded / Σ_grounded == 1.0` regardless of how trusted the
 *    supporting memories were — grounding is a pass/fail gate, not itself
 *    graded
 * 2. Hallucinated claims contribute half the highest trust among memories
 *    that assert *any* value on that slot (the nearest thing to "a
 *    contradicting memory"), or half of 1.0 when no memory touches the
 *    slot at all — a value-level mismatch here is weaker evidence than an
 *    actual matched entailment, so it costs half what a genuine grounding
 *    match would have been worth
 * 3. `passed` does not depend on confidence at all: it is `hallucinations
 *    is empty AND no ContradictionDetail references a draft-extracted slot`
 *    — a perfectly grounded draft can still fail if the memories backing
 *    it disagree with each other
 * 4. `requires_disclosure` is a pure function of the contradiction pass:
 *    any detail whose trust-gap exceeds the configured threshold (default
 *    0.3, kept as a tunable constant rather than hardcoded)
 * 5. An empty draft (`facts_extracted` empty) is the `ExtractionEmpty`
 *    informational case: `passed=true`, `confidence=1.0`, no
 *    disclosure — never an error
 *
 * PATTERN: trust-weighted aggregate scoring
 */

use std::collections::HashMap;

use crate::contradiction::max_trust_for_slot;
use crate::ground::SupportMatch;
use crate::merger::MergeResult;
use crate::types::{ContradictionDetail, ExtractedFact, Memory};

/// Result of scoring one `verify()` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreResult {
    pub confidence: f64,
    pub passed: bool,
    pub requires_disclosure: bool,
}

fn memory_trust(memories: &[Memory], id: &str) -> f64 {
    memories.iter().find(|m| m.id == id).map(|m| m.trust).unwrap_or(1.0)
}

/// Compute confidence, `passed`, and `requires_disclosure` for one
/// verification call.
///
/// `draft_facts` is the draft's own merged slot -> fact map.
/// `grounding` carries one entry per draft slot: `Some(support)` for a
/// grounded claim, `None` for a hallucination.
/// `contradictions` is the full contradiction-engine output over the
/// supplied memories, independent of the draft.
pub fn score(
    draft_facts: &HashMap<String, ExtractedFact>,
    grounding: &HashMap<String, Option<SupportMatch>>,
    memories: &[Memory],
    merges: &[MergeResult],
    contradictions: &[ContradictionDetail],
    trust_gap_threshold: f64,
) -> ScoreResult {
    if draft_facts.is_empty() {
        return ScoreResult { confidence: 1.0, passed: true, requires_disclosure: false };
    }

    let mut sum_grounded = 0.0;
    let mut sum_hallucinated = 0.0;
    let mut any_hallucination = false;

    for slot in draft_facts.keys() {
        match grounding.get(slot).and_then(|g| g.as_ref()) {
            Some(support) => {
                sum_grounded += memory_trust(memories, &support.memory_id);
            }
            None => {
                any_hallucination = true;
                let contradicting_trust = max_trust_for_slot(slot, memories, merges).unwrap_or(1.0);
                sum_hallucinated += contradicting_trust / 2.0;
            }
        }
    }

    let sum_all = sum_grounded + sum_hallucinated;
    let confidence = if sum_all <= 0.0 { 1.0 } else { (sum_grounded / sum_all).clamp(0.0, 1.0) };

    let draft_slots: Vec<&String> = draft_facts.keys().collect();
    let contradicts_draft = contradictions
        .iter()
        .any(|c| draft_slots.iter().any(|s| s.as_str() == c.slot));

    let passed = !any_hallucination && !contradicts_draft;
    let requires_disclosure = contradictions.iter().any(|c| c.trust_gap > trust_gap_threshold);

    ScoreResult { confidence, passed, requires_disclosure }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contradiction::DEFAULT_TRUST_GAP_THRESHOLD;
    use crate::ground::Strategy;
    use crate::types::{Origin, SourceSpan};

    fn draft_fact(slot: &str, value: &str) -> ExtractedFact {
        ExtractedFact {
            slot: slot.to_string(),
            value: value.to_string(),
            normalized: value.to_lowercase(),
            source_span: SourceSpan::new(0, 0),
            origin: Origin::Pattern("test".to_string()),
        }
    }

    #[test]
    fn empty_draft_is_fully_confident_and_passes() {
        let result = score(&HashMap::new(), &HashMap::new(), &[], &[], &[], DEFAULT_TRUST_GAP_THRESHOLD);
        assert_eq!(result.confidence, 1.0);
        assert!(result.passed);
        assert!(!result.requires_disclosure);
    }

    #[test]
    fn fully_grounded_draft_scores_full_confidence() {
        let mut facts = HashMap::new();
        facts.insert("location".to_string(), draft_fact("location", "Seattle"));
        let mut grounding = HashMap::new();
        grounding.insert(
            "location".to_string(),
            Some(SupportMatch { memory_id: "m1".to_string(), strategy: Strategy::Exact, score: 1.0 }),
        );
        let memories = vec![Memory::new("m1", "User lives in Seattle").with_trust(0.8)];
        let result = score(&facts, &grounding, &memories, &[], &[], DEFAULT_TRUST_GAP_THRESHOLD);
        assert_eq!(result.confidence, 1.0);
        assert!(result.passed);
    }

    #[test]
    fn half_grounded_draft_scores_mid_range_not_zero() {
        let mut facts = HashMap::new();
        facts.insert("employer".to_string(), draft_fact("employer", "Amazon"));
        facts.insert("location".to_string(), draft_fact("location", "Seattle"));
        let mut grounding = HashMap::new();
        grounding.insert("employer".to_string(), None);
        grounding.insert(
            "location".to_string(),
            Some(SupportMatch { memory_id: "m2".to_string(), strategy: Strategy::Exact, score: 1.0 }),
        );
        let memories = vec![
            Memory::new("m1", "User works at Microsoft").with_trust(0.9),
            Memory::new("m2", "User lives in Seattle").with_trust(0.8),
        ];
        let result = score(&facts, &grounding, &memories, &[], &[], DEFAULT_TRUST_GAP_THRESHOLD);
        assert!(!result.passed);
        assert!(
            (result.confidence - 0.64).abs() < 1e-9,
            "confidence={}",
            result.confidence
        );
    }

    #[test]
    fn any_hallucination_fails_the_report() {
        let mut facts = HashMap::new();
        facts.insert("employer".to_string(), draft_fact("employer", "Amazon"));
        let mut grounding = HashMap::new();
        grounding.insert("employer".to_string(), None);
        let memories = vec![Memory::new("m1", "User works at Microsoft").with_trust(0.9)];
        let result = score(&facts, &grounding, &memories, &[], &[], DEFAULT_TRUST_GAP_THRESHOLD);
        assert!(!result.passed);
        assert!(result.confidence < 1.0);
    }

    #[test]
    fn contradiction_on_draft_slot_fails_even_if_grounded() {
        let mut facts = HashMap::new();
        facts.insert("name".to_string(), draft_fact("name", "Bob"));
        let mut grounding = HashMap::new();
        grounding.insert(
            "name".to_string(),
            Some(SupportMatch { memory_id: "m2".to_string(), strategy: Strategy::Exact, score: 1.0 }),
        );
        let memories = vec![
            Memory::new("m1", "User is named Alice").with_trust(0.9),
            Memory::new("m2", "User is named Bob").with_trust(0.3),
        ];
        let contradictions = vec![ContradictionDetail {
            slot: "name".to_string(),
            values: vec!["alice".to_string(), "bob".to_string()],
            most_trusted_value: "alice".to_string(),
            most_recent_value: "bob".to_string(),
            action: "keep most trusted".to_string(),
            trust_gap: 0.6,
        }];
        let result = score(&facts, &grounding, &memories, &[], &contradictions, DEFAULT_TRUST_GAP_THRESHOLD);
        assert!(!result.passed);
        assert!(result.requires_disclosure);
    }

    #[test]
    fn disclosure_only_fires_above_threshold() {
        let mut facts = HashMap::new();
        facts.insert("location".to_string(), draft_fact("location", "Seattle"));
        let mut grounding = HashMap::new();
        grounding.insert(
            "location".to_string(),
            Some(SupportMatch { memory_id: "m1".to_string(), strategy: Strategy::Exact, score: 1.0 }),
        );
        let memories = vec![Memory::new("m1", "User lives in Seattle").with_trust(1.0)];

        // A contradiction on an unrelated slot, below the threshold.
        let below = vec![ContradictionDetail {
            slot: "x".to_string(),
            values: vec!["a".to_string(), "b".to_string()],
            most_trusted_value: "a".to_string(),
            most_recent_value: "b".to_string(),
            action: "keep most trusted".to_string(),
            trust_gap: 0.1,
        }];
        let result = score(&facts, &grounding, &memories, &[], &below, DEFAULT_TRUST_GAP_THRESHOLD);
        assert!(!result.requires_disclosure);

        let above = vec![ContradictionDetail { trust_gap: 0.5, ..below[0].clone() }];
        let result = score(&facts, &grounding, &memories, &[], &above, DEFAULT_TRUST_GAP_THRESHOLD);
        assert!(result.requires_disclosure);
    }
}
