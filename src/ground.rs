/**
 * Grounding & Correction
 *
 * DESIGN DECISION: A fixed five-strategy cascade, tried strategy-by-strategy
 * across all candidate memories, rather than candidate-by-candidate across
 * strategies
 * WHY: The cascade tries "exact, normalization, fuzzy, synonym, embedding" in
 * order and stops at the first success; trying strategies outer means a
 * weak exact match across many memories is preferred over a strong fuzzy
 * match, which is the intent of listing them in a strictness-descending
 * order in the first place.
 *
 * REASONING CHAIN:
 * 1. `candidates` is every memory whose merged facts carry the draft's slot
 *    — slot membership, not value similarity, narrows the set first
 * 2. Each strategy is tried over every candidate; the first strategy with
 *    any hit wins, and among its hits the most-trusted memory is preferred
 *    (ties broken by first-in-list, mirroring `Memory`'s own tie-break)
 * 3. `embedding` is skipped entirely when no matcher is injected — not a
 *    failed strategy, simply absent from the cascade (design notes,
 *    "Semantic-matcher pluggability")
 * 4. Strict-mode rewrite is a single right-to-left span substitution so
 *    earlier byte offsets in the same draft stay valid across multiple
 *    corrections
 *
 * PATTERN: ordered strategy cascade
 */

use crate::matcher::SemanticMatcher;
use crate::merger::MergeResult;
use crate::types::{ContradictionDetail, ExtractedFact, Memory};

/// Which of the five strategies produced a grounding match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Exact,
    Normalization,
    Fuzzy,
    Synonym,
    Embedding,
}

/// One grounding result: the memory that supports a claim, which strategy
/// found it, and that strategy's match score.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportMatch {
    pub memory_id: String,
    pub strategy: Strategy,
    pub score: f64,
}

const ALIASES: &[(&str, &str)] = &[
    ("nyc", "new york city"),
    ("ny", "new york city"),
    ("la", "los angeles"),
    ("sf", "san francisco"),
    ("us", "united states"),
    ("usa", "united states"),
    ("uk", "united kingdom"),
    ("swe", "software engineer"),
    ("sde", "software engineer"),
    ("pm", "product manager"),
    ("ceo", "chief executive officer"),
    ("cto", "chief technology officer"),
    ("vp", "vice president"),
];

/// Equivalence groups for the synonym strategy: job-title synonyms and
/// education verbs, plus a few common employer name variants.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["engineer", "developer", "programmer", "software engineer"],
    &["manager", "lead", "team lead"],
    &["graduated from", "studied at", "attended"],
    &["google", "alphabet"],
    &["meta", "facebook"],
];

fn apply_alias(value: &str) -> &str {
    ALIASES
        .iter()
        .find(|(abbrev, _)| *abbrev == value)
        .map(|(_, full)| *full)
        .unwrap_or(value)
}

fn normalization_match(a: &str, b: &str) -> bool {
    apply_alias(a) == apply_alias(b)
}

fn synonym_match(a: &str, b: &str) -> bool {
    SYNONYM_GROUPS
        .iter()
        .any(|group| group.contains(&a) && group.contains(&b))
}

/// Classic Levenshtein edit distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = tmp;
        }
    }
    row[b.len()]
}

fn fuzzy_tolerance(len: usize) -> usize {
    2.max(len / 6)
}

fn fuzzy_match(a: &str, b: &str) -> bool {
    let tolerance = fuzzy_tolerance(a.chars().count());
    edit_distance(a, b) <= tolerance
}

const EMBEDDING_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Candidate memory + the fact it carries on the slot under test.
struct Candidate<'a> {
    memory: &'a Memory,
    fact: &'a ExtractedFact,
}

fn candidates_for_slot<'a>(slot: &str, memories: &'a [Memory], merges: &'a [MergeResult]) -> Vec<Candidate<'a>> {
    memories
        .iter()
        .zip(merges.iter())
        .filter_map(|(memory, merge)| merge.facts.get(slot).map(|fact| Candidate { memory, fact }))
        .collect()
}

fn pick_most_trusted<'a>(hits: &[&'a Candidate<'a>]) -> &'a Candidate<'a> {
    let mut best = hits[0];
    for &c in &hits[1..] {
        if c.memory.trust > best.memory.trust {
            best = c;
        }
    }
    best
}

/// Try to ground `value_normalized` (on `slot`) against the memories,
/// returning the first strategy (in cascade order) that finds a match.
pub fn find_support(
    slot: &str,
    value_normalized: &str,
    memories: &[Memory],
    merges: &[MergeResult],
    matcher: Option<&dyn SemanticMatcher>,
) -> Option<SupportMatch> {
    let candidates = candidates_for_slot(slot, memories, merges);
    if candidates.is_empty() {
        return None;
    }

    let exact: Vec<&Candidate> = candidates.iter().filter(|c| c.fact.normalized == value_normalized).collect();
    if !exact.is_empty() {
        let best = pick_most_trusted(&exact);
        return Some(SupportMatch { memory_id: best.memory.id.clone(), strategy: Strategy::Exact, score: 1.0 });
    }

    let normalized: Vec<&Candidate> =
        candidates.iter().filter(|c| normalization_match(value_normalized, &c.fact.normalized)).collect();
    if !normalized.is_empty() {
        let best = pick_most_trusted(&normalized);
        return Some(SupportMatch { memory_id: best.memory.id.clone(), strategy: Strategy::Normalization, score: 1.0 });
    }

    let fuzzy: Vec<&Candidate> =
        candidates.iter().filter(|c| fuzzy_match(value_normalized, &c.fact.normalized)).collect();
    if !fuzzy.is_empty() {
        let best = pick_most_trusted(&fuzzy);
        let distance = edit_distance(value_normalized, &best.fact.normalized) as f64;
        let len = value_normalized.chars().count().max(1) as f64;
        let score = (1.0 - distance / len).max(0.0);
        return Some(SupportMatch { memory_id: best.memory.id.clone(), strategy: Strategy::Fuzzy, score });
    }

    let synonym: Vec<&Candidate> =
        candidates.iter().filter(|c| synonym_match(value_normalized, &c.fact.normalized)).collect();
    if !synonym.is_empty() {
        let best = pick_most_trusted(&synonym);
        return Some(SupportMatch { memory_id: best.memory.id.clone(), strategy: Strategy::Synonym, score: 1.0 });
    }

    if let Some(m) = matcher {
        let embedded: Vec<(&Candidate, f64)> = candidates
            .iter()
            .map(|c| (c, m.similarity(value_normalized, &c.fact.normalized)))
            .filter(|(_, score)| *score >= EMBEDDING_SIMILARITY_THRESHOLD)
            .collect();
        if let Some((best, score)) = embedded.iter().max_by(|(a, _), (b, _)| {
            a.memory.trust.partial_cmp(&b.memory.trust).unwrap_or(std::cmp::Ordering::Equal)
        }) {
            return Some(SupportMatch { memory_id: best.memory.id.clone(), strategy: Strategy::Embedding, score: *score });
        }
    }

    None
}

/// Build the strict-mode corrected draft, or `None` if there is nothing to
/// rewrite.
///
/// `rewrites` is `(span, replacement)` pairs already resolved by the caller
/// (one per hallucinated slot with a usable replacement value); applied
/// right-to-left so earlier spans stay valid.
pub fn apply_rewrites(draft: &str, mut rewrites: Vec<(crate::types::SourceSpan, String)>) -> Option<String> {
    if rewrites.is_empty() {
        return None;
    }
    rewrites.sort_by_key(|(span, _)| span.start);
    let mut out = draft.to_string();
    for (span, replacement) in rewrites.into_iter().rev() {
        let original_first_char = out[span.start..span.end].chars().next();
        let replacement = match original_first_char {
            Some(c) if c.is_uppercase() => capitalize_first(&replacement),
            _ => replacement,
        };
        out.replace_range(span.start..span.end, &replacement);
    }
    Some(out)
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// For a hallucinated slot, pick the replacement value a strict-mode rewrite
/// should substitute: the slot's value from `contradiction_details` when the
/// memories themselves disagree (also flags `requires_disclosure`, which
/// the caller has already set from the contradiction pass), otherwise the
/// single non-conflicting value the candidate memories agree on.
pub fn replacement_value_for_slot(
    slot: &str,
    memories: &[Memory],
    merges: &[MergeResult],
    contradiction_details: &[ContradictionDetail],
) -> Option<String> {
    if let Some(detail) = contradiction_details.iter().find(|d| d.slot == slot) {
        return Some(detail.most_trusted_value.clone());
    }
    let candidates = candidates_for_slot(slot, memories, merges);
    let mut distinct: Vec<&str> = Vec::new();
    for c in &candidates {
        if !distinct.contains(&c.fact.normalized.as_str()) {
            distinct.push(&c.fact.normalized);
        }
    }
    match distinct.len() {
        1 => candidates.first().map(|c| c.fact.value.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Origin, SourceSpan};
    use std::collections::HashMap;

    fn memory(id: &str, text: &str, trust: f64) -> Memory {
        Memory::new(id, text).with_trust(trust)
    }

    fn merge_with(slot: &str, value: &str, normalized: &str) -> MergeResult {
        let mut facts = HashMap::new();
        facts.insert(
            slot.to_string(),
            ExtractedFact {
                slot: slot.to_string(),
                value: value.to_string(),
                normalized: normalized.to_string(),
                source_span: SourceSpan::new(0, 0),
                origin: Origin::Pattern("test".to_string()),
            },
        );
        MergeResult { facts, evidence: vec![] }
    }

    #[test]
    fn exact_strategy_wins_when_available() {
        let memories = vec![memory("m1", "User lives in Seattle", 1.0)];
        let merges = vec![merge_with("location", "Seattle", "seattle")];
        let hit = find_support("location", "seattle", &memories, &merges, None).unwrap();
        assert_eq!(hit.strategy, Strategy::Exact);
        assert_eq!(hit.memory_id, "m1");
    }

    #[test]
    fn normalization_strategy_resolves_abbreviation() {
        let memories = vec![memory("m1", "User lives in New York City", 1.0)];
        let merges = vec![merge_with("location", "New York City", "new york city")];
        let hit = find_support("location", "nyc", &memories, &merges, None).unwrap();
        assert_eq!(hit.strategy, Strategy::Normalization);
    }

    #[test]
    fn fuzzy_strategy_tolerates_small_typo() {
        let memories = vec![memory("m1", "User lives in Seattle", 1.0)];
        let merges = vec![merge_with("location", "Seattle", "seattle")];
        let hit = find_support("location", "seatle", &memories, &merges, None).unwrap();
        assert_eq!(hit.strategy, Strategy::Fuzzy);
    }

    #[test]
    fn no_candidates_for_slot_returns_none() {
        let memories = vec![memory("m1", "User lives in Seattle", 1.0)];
        let merges = vec![merge_with("location", "Seattle", "seattle")];
        assert!(find_support("employer", "amazon", &memories, &merges, None).is_none());
    }

    #[test]
    fn rewrites_apply_right_to_left_and_preserve_casing() {
        let draft = "You work at Amazon and live in Chicago";
        let amazon_start = draft.find("Amazon").unwrap();
        let chicago_start = draft.find("Chicago").unwrap();
        let rewrites = vec![
            (SourceSpan::new(amazon_start, amazon_start + 6), "microsoft".to_string()),
            (SourceSpan::new(chicago_start, chicago_start + 7), "seattle".to_string()),
        ];
        let corrected = apply_rewrites(draft, rewrites).unwrap();
        assert_eq!(corrected, "You work at Microsoft and live in Seattle");
    }
}
