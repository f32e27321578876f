/**
 * Contradiction Engine
 *
 * DESIGN DECISION: Classify every slot into exactly one of three disjoint
 * groups before looking at values, rather than inferring conflict-worthiness
 * from the values themselves
 * WHY: The KNOWN_EXCLUSIVE/ADDITIVE/DYNAMIC line is drawn on the slot
 * identity, not the data — `hobby` never contradicts no matter how many
 * distinct values it holds, while `employer` always does with two. This is
 * a lookup into two static sets plus a fallthrough, not an open type system.
 *
 * REASONING CHAIN:
 * 1. KNOWN_EXCLUSIVE reuses Tier-1's own named-slot table (`tier1::
 *    named_slot_names`) plus the fixed Tier-1.5 `decision` slot — the same
 *    vocabulary a subject can only hold one value for is, unsurprisingly,
 *    the vocabulary Tier-1 already has named triggers for
 * 2. ADDITIVE is the short fixed list of multi-valued facts
 * 3. DYNAMIC is the fallthrough: conflict only when no semantic matcher is
 *    present (differing values always conflict) or the matcher reports
 *    entailment-contradiction at confidence >= 0.55 between the pair of
 *    memory texts that disagree
 * 4. `most_trusted_value`/`most_recent_value` tie-break so first
 *    occurrence in the memory list wins any remaining tie
 *
 * PATTERN: static slot classification + per-slot conflict resolution
 */

use std::collections::HashMap;

use crate::matcher::{Entailment, SemanticMatcher};
use crate::merger::MergeResult;
use crate::tier1;
use crate::types::{ContradictionDetail, Memory, SlotClass};

// Programming languages are additive (using several is normal), never
// exclusive. The merger's `SlotAliases` rewrites the Tier-1.5 "language"
// category onto "programming_language" before a fact ever reaches this
// classifier (ontology.rs, `SlotAliases::default_table`), so both the
// pre- and post-alias spellings must be listed here or a language
// disagreement gets classified Dynamic.
const ADDITIVE_SLOTS: &[&str] = &["skill", "hobby", "language", "programming_language", "tool", "project"];

/// Default trust-gap threshold above which `requires_disclosure` is set.
pub const DEFAULT_TRUST_GAP_THRESHOLD: f64 = 0.3;

/// Confidence floor for a dynamic-slot semantic contradiction.
const DYNAMIC_ENTAILMENT_THRESHOLD: f64 = 0.55;

/// Classify a slot name into its contradiction-engine group.
pub fn classify_slot(slot: &str) -> SlotClass {
    if ADDITIVE_SLOTS.contains(&slot) {
        SlotClass::Additive
    } else if tier1::named_slot_names().contains(&slot) || slot == "decision" {
        SlotClass::KnownExclusive
    } else {
        SlotClass::Dynamic
    }
}

struct Contribution<'a> {
    trust: f64,
    timestamp: Option<i64>,
    normalized: String,
    text: &'a str,
}

fn select_most_trusted<'a>(entries: &[&'a Contribution<'a>]) -> &'a Contribution<'a> {
    let mut best = entries[0];
    for &e in &entries[1..] {
        if e.trust > best.trust {
            best = e;
        } else if e.trust == best.trust {
            let et = e.timestamp.unwrap_or(i64::MIN);
            let bt = best.timestamp.unwrap_or(i64::MIN);
            if et > bt {
                best = e;
            }
        }
    }
    best
}

fn select_most_recent<'a>(entries: &[&'a Contribution<'a>]) -> &'a Contribution<'a> {
    let mut best = entries[0];
    for &e in &entries[1..] {
        let et = e.timestamp.unwrap_or(i64::MIN);
        let bt = best.timestamp.unwrap_or(i64::MIN);
        if et > bt {
            best = e;
        } else if et == bt && e.trust > best.trust {
            best = e;
        }
    }
    best
}

fn action_text(slot: &str, class: SlotClass) -> String {
    match class {
        SlotClass::KnownExclusive => format!(
            "slot '{slot}' can only hold one value; keeping the most trusted memory's value"
        ),
        SlotClass::Dynamic => format!(
            "slot '{slot}' has semantically conflicting memories; keeping the most trusted memory's value"
        ),
        SlotClass::Additive => unreachable!("additive slots are never flagged"),
    }
}

/// Does any pair of memory texts among `entries` (for the same slot) show
/// entailment-contradiction at or above the dynamic threshold?
fn dynamic_semantic_conflict(entries: &[&Contribution], matcher: &dyn SemanticMatcher) -> bool {
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            if entries[i].normalized == entries[j].normalized {
                continue;
            }
            let a = matcher.entails(entries[i].text, entries[j].text);
            let b = matcher.entails(entries[j].text, entries[i].text);
            for r in [a, b] {
                if r.label == Entailment::Contradict && r.confidence >= DYNAMIC_ENTAILMENT_THRESHOLD {
                    return true;
                }
            }
        }
    }
    false
}

fn build_contributions<'a>(memories: &'a [Memory], merges: &'a [MergeResult]) -> HashMap<String, Vec<Contribution<'a>>> {
    let mut by_slot: HashMap<String, Vec<Contribution>> = HashMap::new();
    for (memory, merge) in memories.iter().zip(merges.iter()) {
        for fact in merge.facts.values() {
            by_slot.entry(fact.slot.clone()).or_default().push(Contribution {
                trust: memory.trust,
                timestamp: memory.timestamp,
                normalized: fact.normalized.clone(),
                text: memory.text.as_str(),
            });
        }
        for fact in &merge.evidence {
            by_slot.entry(fact.slot.clone()).or_default().push(Contribution {
                trust: memory.trust,
                timestamp: memory.timestamp,
                normalized: fact.normalized.clone(),
                text: memory.text.as_str(),
            });
        }
    }
    by_slot
}

/// Highest trust among memories asserting any value on `slot`, used by the
/// scorer to weight a hallucinated claim's negative contribution when that
/// slot is itself in conflict.
pub fn max_trust_for_slot(slot: &str, memories: &[Memory], merges: &[MergeResult]) -> Option<f64> {
    assert_eq!(memories.len(), merges.len());
    build_contributions(memories, merges)
        .get(slot)
        .map(|entries| entries.iter().map(|e| e.trust).fold(f64::MIN, f64::max))
}

/// Detect contradictions across a set of memories, given each memory's
/// already-merged facts (Tier-1/Tier-1.5 union). `evidence` facts
/// (Tier-1.5 facts that lost an intra-memory conflict) are included as
/// additional contributions so the engine sees values Tier-1 alone would
/// have hidden.
pub fn detect(
    memories: &[Memory],
    merges: &[MergeResult],
    matcher: Option<&dyn SemanticMatcher>,
) -> Vec<ContradictionDetail> {
    assert_eq!(memories.len(), merges.len());

    let by_slot = build_contributions(memories, merges);

    let mut details = Vec::new();
    let mut slots: Vec<&String> = by_slot.keys().collect();
    slots.sort();
    for slot in slots {
        let entries = &by_slot[slot];
        let class = classify_slot(slot);
        if class == SlotClass::Additive {
            continue;
        }

        let mut values: Vec<String> = Vec::new();
        for e in entries {
            if !values.contains(&e.normalized) {
                values.push(e.normalized.clone());
            }
        }
        if values.len() < 2 {
            continue;
        }

        if class == SlotClass::Dynamic {
            let refs: Vec<&Contribution> = entries.iter().collect();
            let conflict = match matcher {
                None => true,
                Some(m) => dynamic_semantic_conflict(&refs, m),
            };
            if !conflict {
                continue;
            }
        }

        let refs: Vec<&Contribution> = entries.iter().collect();
        let trusted = select_most_trusted(&refs);
        let recent = select_most_recent(&refs);
        let max_trust = refs.iter().map(|e| e.trust).fold(f64::MIN, f64::max);
        let min_trust = refs.iter().map(|e| e.trust).fold(f64::MAX, f64::min);
        let trust_gap = max_trust - min_trust;

        details.push(ContradictionDetail {
            slot: slot.clone(),
            values,
            most_trusted_value: trusted.normalized.clone(),
            most_recent_value: recent.normalized.clone(),
            action: action_text(slot, class),
            trust_gap,
        });
    }

    details
}
