/**
 * Tier-1.5 Knowledge Extractor
 *
 * DESIGN DECISION: Run entity and verb passes over clause token windows,
 * then route/inherit/suppress per a seven-step pipeline, rather than a
 * single combined regex pass
 * WHY: Tier-1.5 infers facts patterns miss ("we ended up going with
 * Postgres after the whole MySQL disaster" has no copula or named slot for
 * Tier-1 to latch onto); splitting entity detection from verb detection
 * lets routing, inheritance, negative-context, tentative-override and
 * migration-fusion each be one clear, testable step
 *
 * REASONING CHAIN:
 * 1. (a) entity pass and (b) verb pass are independent token-window scans
 *    over the SAME clause, producing position-tagged hits
 * 2. (c) routing attaches each verb to its nearest entity (right first,
 *    then left) within the clause
 * 3. (d) a clause with entities but no verb inherits the previous clause's
 *    verb category — this only looks at the immediately preceding clause
 * 4. (e) negative-sentiment proximity emits `deprecation` without needing
 *    a verb hit at all, independent of (a)-(d)
 * 5. (f) "considering"/"might"/... before an adoption/migration verb
 *    downgrades the category to `tentative`
 * 6. (g) migration fusion ("migrated from X to Y" / "X -> Y") replaces any
 *    adoption(Y)/deprecation(X) emitted on the SAME clause with one fused
 *    migration fact — spec's worked invariant for `KnowledgeFact`
 *
 * PATTERN: position-tagged multi-pass clause pipeline
 */

use crate::clause::Clause;
use crate::ontology::Ontology;
use crate::types::{KnowledgeFact, VerbCategory};

const NEGATIVE_TOKENS: &[&str] = &["disaster", "failed", "broke", "nightmare", "headache"];
const TENTATIVE_CUES: &[&str] = &["considering", "might", "thinking about", "may", "possibly"];

#[derive(Debug, Clone, Copy)]
struct EntityHit {
    word_start: usize,
    word_end: usize,
}

#[derive(Debug, Clone, Copy)]
struct VerbHit {
    word_start: usize,
    word_end: usize,
    category: VerbCategory,
}

fn words_of(clause_text: &str) -> Vec<&str> {
    clause_text.split_whitespace().collect()
}

fn bare(w: &str) -> String {
    w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

/// Step (a): entity pass.
fn scan_entities(words: &[String], ontology: &Ontology) -> Vec<(EntityHit, String, String)> {
    let refs: Vec<&str> = words.iter().map(|s| s.as_str()).collect();
    let mut hits = Vec::new();
    let mut i = 0;
    while i < refs.len() {
        if let Some((len, canonical, category)) = ontology.entities.match_at(&refs, i) {
            hits.push((EntityHit { word_start: i, word_end: i + len }, canonical, category));
            i += len;
        } else {
            i += 1;
        }
    }
    hits
}

/// Step (b): verb pass.
fn scan_verbs(words: &[String], ontology: &Ontology) -> Vec<VerbHit> {
    let refs: Vec<&str> = words.iter().map(|s| s.as_str()).collect();
    let mut hits = Vec::new();
    let mut i = 0;
    while i < refs.len() {
        if let Some((len, category)) = ontology.verbs.match_at(&refs, i) {
            hits.push(VerbHit { word_start: i, word_end: i + len, category });
            i += len;
        } else {
            i += 1;
        }
    }
    hits
}

/// Step (f): tentative override. Checks whether a tentative cue phrase
/// appears anywhere before the verb hit within the clause.
fn is_tentative_context(words: &[String], verb_start: usize) -> bool {
    let prefix = words[..verb_start].join(" ").to_lowercase();
    TENTATIVE_CUES.iter().any(|cue| prefix.contains(cue))
}

/// Step (g): migration fusion via "X -> Y" or "X => Y" arrow notation,
/// tried independently of the verb ontology's "migrated from"/"moved
/// from" phrases (which `scan_verbs` already finds as a Migration verb).
fn find_arrow_migration(words: &[String], ontology: &Ontology) -> Option<(String, String)> {
    let refs: Vec<&str> = words.iter().map(|s| s.as_str()).collect();
    for (i, w) in refs.iter().enumerate() {
        if *w == "->" || *w == "=>" {
            if i == 0 || i + 1 >= refs.len() {
                continue;
            }
            let from = ontology.entities.resolve_alias(bare(refs[i - 1]).as_str());
            let to = ontology.entities.resolve_alias(bare(refs[i + 1]).as_str());
            if ontology.entities.match_at(&[from.as_str()], 0).is_some()
                && ontology.entities.match_at(&[to.as_str()], 0).is_some()
            {
                return Some((from, to));
            }
        }
    }
    None
}

/// Extract all Tier-1.5 facts from a full, already clause-split text.
pub fn extract(clauses: &[Clause], ontology: &Ontology) -> Vec<KnowledgeFact> {
    let mut facts = Vec::new();
    let mut last_verb_category: Option<VerbCategory> = None;

    for clause in clauses {
        let words: Vec<String> = words_of(&clause.text).iter().map(|w| bare(w)).collect();
        if words.is_empty() {
            continue;
        }

        let mut clause_facts: Vec<KnowledgeFact> = Vec::new();
        let entity_hits = scan_entities(&words, ontology);
        let verb_hits = scan_verbs(&words, ontology);

        // Step (g), arrow notation: fuses immediately, consumes both entities.
        let mut fused_entities: Vec<usize> = Vec::new();
        if let Some((from, to)) = find_arrow_migration(&words, ontology) {
            let to_category = ontology
                .entities
                .match_at(&[to.as_str()], 0)
                .map(|(_, _, cat)| cat)
                .unwrap_or_default();
            let mut kf = KnowledgeFact::confirmed(to.clone(), to_category, VerbCategory::Migration, clause.index);
            kf.migration_from = Some(from);
            clause_facts.push(kf);
            fused_entities = (0..entity_hits.len()).collect();
        }

        // Step (g), verbal "migrated from X to Y": every migration phrase in
        // the verb ontology ends in "from" ("migrated from", "moved from",
        // ...), so both X and Y sit AFTER the verb hit, in order — X is the
        // nearest entity that follows, Y is the next one after that.
        for vh in &verb_hits {
            if vh.category != VerbCategory::Migration {
                continue;
            }
            let mut after: Vec<(usize, &(EntityHit, String, String))> = entity_hits
                .iter()
                .enumerate()
                .filter(|(_, (h, _, _))| h.word_start >= vh.word_end)
                .collect();
            after.sort_by_key(|(_, (h, _, _))| h.word_start);
            let from_entity = after.first().copied();
            let to_entity = after.get(1).copied();
            if let (Some((fi, (_, from_name, _))), Some((ti, (_, to_name, to_cat)))) =
                (from_entity, to_entity)
            {
                let category = if is_tentative_context(&words, vh.word_start) {
                    VerbCategory::Tentative
                } else {
                    VerbCategory::Migration
                };
                let mut kf = if category == VerbCategory::Tentative {
                    KnowledgeFact::tentative(to_name.clone(), to_cat.clone(), category, clause.index)
                } else {
                    KnowledgeFact::confirmed(to_name.clone(), to_cat.clone(), category, clause.index)
                };
                kf.migration_from = Some(from_name.clone());
                clause_facts.push(kf);
                fused_entities.push(fi);
                fused_entities.push(ti);
            }
        }

        // Step (c): routing non-migration verbs to nearest entity.
        for vh in &verb_hits {
            if vh.category == VerbCategory::Migration {
                continue;
            }
            let right = entity_hits
                .iter()
                .enumerate()
                .filter(|(idx, (h, _, _))| h.word_start >= vh.word_end && !fused_entities.contains(idx))
                .min_by_key(|(_, (h, _, _))| h.word_start);
            let left = entity_hits
                .iter()
                .enumerate()
                .filter(|(idx, (h, _, _))| h.word_end <= vh.word_start && !fused_entities.contains(idx))
                .max_by_key(|(_, (h, _, _))| h.word_start);
            let chosen = right.or(left);
            if let Some((ei, (_, name, category))) = chosen {
                let mut category_out = vh.category;
                if matches!(category_out, VerbCategory::Adoption | VerbCategory::Migration)
                    && is_tentative_context(&words, vh.word_start)
                {
                    category_out = VerbCategory::Tentative;
                }
                let fact = if category_out == VerbCategory::Tentative {
                    KnowledgeFact::tentative(name.clone(), category.clone(), category_out, clause.index)
                } else {
                    KnowledgeFact::confirmed(name.clone(), category.clone(), category_out, clause.index)
                };
                clause_facts.push(fact);
                fused_entities.push(ei);
                last_verb_category = Some(vh.category);
            }
        }

        // Step (d): verb-context inheritance for entities with no routed verb.
        if verb_hits.is_empty() {
            if let Some(inherited) = last_verb_category {
                for (ei, (_, name, category)) in entity_hits.iter().enumerate() {
                    if fused_entities.contains(&ei) {
                        continue;
                    }
                    clause_facts.push(KnowledgeFact::tentative(
                        name.clone(),
                        category.clone(),
                        inherited,
                        clause.index,
                    ));
                }
            }
        }

        // Step (e): negative-context detection, independent of verb hits.
        let has_negative = words.iter().any(|w| NEGATIVE_TOKENS.contains(&w.as_str()));
        if has_negative {
            for (ei, (_, name, category)) in entity_hits.iter().enumerate() {
                if fused_entities.contains(&ei) {
                    continue;
                }
                let already_has_fact = clause_facts.iter().any(|f| f.entity == *name);
                if !already_has_fact {
                    clause_facts.push(KnowledgeFact::confirmed(
                        name.clone(),
                        category.clone(),
                        VerbCategory::Deprecation,
                        clause.index,
                    ));
                }
            }
        }

        facts.extend(clause_facts);
    }

    facts
}
