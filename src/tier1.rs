/**
 * Tier-1 Pattern Extractor
 *
 * DESIGN DECISION: Nine named pattern families, tried in fixed order, each
 * emitting zero or more `ExtractedFact`s per clause, all matched through
 * precompiled `regex::Regex` patterns built once in `Tier1Patterns::new()`
 * WHY: Family 1 (named-slot copular) is the only family permitted to emit
 * more than one fact per clause, everything else consumes the whole clause
 * on first match; pattern compilation is the same one-time-cost-then-reuse
 * shape as `verification/claim_parser.rs`'s `ClaimParser`, which precompiles
 * its trigger regexes once and reuses them across every call
 *
 * REASONING CHAIN:
 * 1. Family 1 needs a per-slot trigger-phrase table, not just literal
 *    "<noun> is", because scenario 1's "You work at Amazon and live in
 *    Seattle" only parses as employer/location facts if "works at" and
 *    "lives in" are registered synonyms for the copula on those two slots
 * 2. Families 2/3/4/5/7/8/9 all key off a *concrete* subject noun phrase;
 *    when a clause's subject is a bare pronoun (`we`, `I`, `you`...) these
 *    families decline to fire — that case is Tier-1.5's job
 * 3. Family 6 (Decision) is the one family defined with a pronoun subject
 *    ("We/They/I agreed/decided/chose/picked to use <Value>"); its slot is
 *    the fixed name `decision` since there is no subject noun to slugify
 * 4. A concrete subject slugifies to a slot name (`"Max retries"` ->
 *    `max_retries`), matching scenario 6 literally
 * 5. The question-word blocklist runs once, before any family is tried
 *
 * PATTERN: ordered rule families over clauses, regex-matched
 */

use regex::Regex;

use crate::clause::Clause;
use crate::normalizer::normalize_value;
use crate::types::{ExtractedFact, Origin, SourceSpan};

const QUESTION_WORDS: &[&str] = &["what", "who", "why", "when", "where", "how"];

/// Slot name -> trigger phrases that stand in for the copula on that slot,
/// tried longest-first. Every slot also implicitly accepts bare "is"/"are"/
/// "am" when preceded by the slot's own noun phrase.
const NAMED_SLOTS: &[(&str, &[&str])] = &[
    ("employer", &["works at", "work at", "works for", "work for", "is employed at", "is employed by", "employer"]),
    ("location", &["lives in", "live in", "resides in", "reside in", "is located in", "location"]),
    ("name", &["is named", "is called", "name"]),
    ("title", &["title"]),
    ("occupation", &["occupation"]),
    ("age", &["age"]),
    ("school", &["attends", "studies at", "goes to", "school"]),
    ("degree", &["has a degree in", "majored in", "degree"]),
    ("favorite_color", &["favorite color", "favourite color"]),
    ("coffee", &["drinks", "coffee"]),
    ("hobby", &["enjoys", "hobby"]),
    ("pet", &["pet"]),
    ("project", &["is working on", "works on", "project"]),
    ("graduation_year", &["graduated in", "graduation year"]),
    ("programming_experience", &["programming experience"]),
    ("role", &["role"]),
    ("team", &["team"]),
    ("department", &["department"]),
    ("manager", &["manager"]),
    ("salary", &["salary"]),
    ("phone", &["phone number", "phone"]),
    ("email", &["email address", "email"]),
    ("nickname", &["nickname"]),
    ("timezone", &["timezone", "time zone"]),
    ("native_language", &["native language"]),
    ("alma_mater", &["alma mater"]),
    ("major", &["major"]),
    ("marital_status", &["marital status"]),
    ("hometown", &["hometown", "home town"]),
    ("gender", &["gender"]),
    ("eye_color", &["eye color"]),
    ("hair_color", &["hair color"]),
    ("height", &["height"]),
    ("weight", &["weight"]),
    ("username", &["username"]),
    ("zodiac_sign", &["zodiac sign"]),
];

const NON_COPULAR_VERBS: &[&str] = &[
    " uses ", " handles ", " supports ", " runs ", " manufactures ",
    " chose ", " picked ", " selected ",
];

const REQUIREMENT_VERBS: &[&str] = &[" requires ", " needs ", " demands "];

const DECISION_SUBJECTS: &[&str] = &["we", "they", "i"];
const DECISION_VERBS: &[&str] = &["agreed to use", "decided to use", "chose to use", "picked to use"];

const PRESCRIPTIVE_VERBS: &[&str] = &[" should be ", " must be ", " needs to be "];

const PASSIVE_VERBS: &[&str] = &[
    " is handled via ", " is handled by ", " is handled with ",
    " is managed via ", " is managed by ", " is managed with ",
    " is done via ", " is done by ", " is done with ",
    " is served via ", " is served by ", " is served with ",
];

const CONFIG_VERBS: &[&str] = &[" is set to ", " configured as ", " equals "];

fn boundary_regex(trigger: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b", regex::escape(trigger))).expect("static trigger literal")
}

fn alternation_regex(phrases: &[&str]) -> Regex {
    let pattern = phrases.iter().map(|p| regex::escape(p)).collect::<Vec<_>>().join("|");
    Regex::new(&pattern).expect("static phrase alternation")
}

/// Precompiled trigger-phrase patterns for every Tier-1 family, built once
/// and reused across every `extract` call, mirroring how `ClaimParser`
/// precompiles its claim-extraction regexes in its constructor.
pub struct Tier1Patterns {
    named_slots: Vec<(&'static str, Vec<Regex>)>,
    bare_subject_copular: Regex,
    possessive_have: Regex,
    non_copular_verb: Regex,
    requirement: Regex,
    decision: Regex,
    prescriptive: Regex,
    passive: Regex,
    config_equality: Regex,
}

impl Tier1Patterns {
    pub fn new() -> Self {
        let named_slots = NAMED_SLOTS
            .iter()
            .map(|(slot, triggers)| (*slot, triggers.iter().map(|t| boundary_regex(t)).collect()))
            .collect();
        Self {
            named_slots,
            bare_subject_copular: alternation_regex(&[" is ", " are ", " am "]),
            possessive_have: alternation_regex(&[" has ", " have "]),
            non_copular_verb: alternation_regex(NON_COPULAR_VERBS),
            requirement: alternation_regex(REQUIREMENT_VERBS),
            decision: alternation_regex(DECISION_VERBS),
            prescriptive: alternation_regex(PRESCRIPTIVE_VERBS),
            passive: alternation_regex(PASSIVE_VERBS),
            config_equality: alternation_regex(CONFIG_VERBS),
        }
    }
}

impl Default for Tier1Patterns {
    fn default() -> Self {
        Self::new()
    }
}

/// For a per-slot trigger list, return the span of the first trigger (in
/// list order) present anywhere in `haystack`, at a word boundary.
fn first_present(regs: &[Regex], haystack: &str) -> Option<(usize, usize)> {
    for r in regs {
        if let Some(m) = r.find(haystack) {
            return Some((m.start(), m.end()));
        }
    }
    None
}

fn is_interrogative(clause_text: &str) -> bool {
    let lower = clause_text.to_lowercase();
    let first_word = lower.split_whitespace().next().unwrap_or("");
    QUESTION_WORDS.contains(&first_word) || lower.trim_end().ends_with('?')
}

fn fact(slot: &str, value: &str, clause: &Clause, value_start: usize, value_end: usize, pattern: &str) -> Option<ExtractedFact> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(ExtractedFact {
        slot: slot.to_string(),
        value: value.to_string(),
        normalized: normalize_value(value),
        source_span: SourceSpan::new(value_start, value_end),
        origin: Origin::Pattern(pattern.to_string()),
    })
}

/// Trim leading connective/punctuation noise and trailing clause
/// punctuation from a raw value slice, returning the trimmed value plus its
/// adjusted byte span (relative to the same base the input span used).
fn trim_value_span(text: &str, mut start: usize, mut end: usize) -> (String, usize, usize) {
    let slice = &text[start..end];
    let lead_trim = slice.len() - slice.trim_start().len();
    start += lead_trim;
    let trimmed = &text[start..end];
    let trail_trim = trimmed.len() - trimmed.trim_end_matches(|c: char| c.is_whitespace() || c == '.' || c == ',' || c == ';').len();
    end -= trail_trim;
    (text[start..end].to_string(), start, end)
}

fn slugify_subject(subject: &str) -> Option<String> {
    let cleaned = normalize_value(subject);
    if cleaned.is_empty() {
        return None;
    }
    let word_count = cleaned.split_whitespace().count();
    if word_count == 0 || word_count > 4 {
        return None;
    }
    Some(cleaned.replace(' ', "_"))
}

const PRONOUNS: &[&str] = &["i", "you", "we", "they", "he", "she", "it"];

fn is_bare_pronoun_subject(subject: &str) -> bool {
    let words: Vec<&str> = subject.split_whitespace().collect();
    words.len() == 1 && PRONOUNS.contains(&words[0].to_lowercase().as_str())
}

/// Family 1: named-slot copular. Scans the clause for every configured
/// slot trigger, then, taking the leftmost non-overlapping match of each
/// kind in order, slices values between consecutive matches. Multiple
/// facts per clause are permitted here.
fn extract_named_slot_copular(clause: &Clause, patterns: &Tier1Patterns) -> Vec<ExtractedFact> {
    let lower = clause.text.to_lowercase();
    let mut matches: Vec<(usize, usize, &str)> = Vec::new();

    for (slot, regs) in &patterns.named_slots {
        if let Some((start, end)) = first_present(regs, &lower) {
            matches.push((start, end, slot));
        }
    }
    if matches.is_empty() {
        return Vec::new();
    }
    matches.sort_by_key(|&(start, _, _)| start);
    // Drop matches that start inside an earlier match's span.
    let mut deduped: Vec<(usize, usize, &str)> = Vec::new();
    for m in matches {
        if let Some(&(_, prev_end, _)) = deduped.last() {
            if m.0 < prev_end {
                continue;
            }
        }
        deduped.push(m);
    }

    let mut out = Vec::new();
    for (i, &(_, match_end, slot)) in deduped.iter().enumerate() {
        let value_end = deduped
            .get(i + 1)
            .map(|&(next_start, _, _)| next_start)
            .unwrap_or(clause.text.len());
        if match_end >= value_end {
            continue;
        }
        // Strip a leading connective ("and"/"but"/",") from the next
        // value's start, handled naturally by trim_value_span's whitespace
        // trim plus an explicit connective skip.
        let mut vs = match_end;
        let raw_ahead = &clause.text[vs..value_end];
        let ahead_trimmed = raw_ahead.trim_start();
        let skip = raw_ahead.len() - ahead_trimmed.len();
        vs += skip;
        for conj in ["and ", "but ", "is ", "are ", "am "] {
            if clause.text[vs..value_end].to_lowercase().starts_with(conj) {
                vs += conj.len();
            }
        }
        let (value, vstart, vend) = trim_value_span(&clause.text, vs, value_end);
        // A dangling coordinating conjunction before the next slot's
        // trigger ("...Amazon and live in...") belongs to the boundary, not
        // to this value.
        let (value, vend) = strip_trailing_connective(&clause.text, &value, vstart, vend);
        if let Some(f) = fact(slot, &value, clause, clause.start + vstart, clause.start + vend, "named_slot_copular") {
            out.push(f);
        }
    }
    out
}

/// Strip a trailing standalone "and"/"but"/"or" word (and the whitespace
/// before it) from a value slice, returning the adjusted value and end
/// offset (relative to the same base `start`/`end` used).
fn strip_trailing_connective(text: &str, value: &str, start: usize, end: usize) -> (String, usize) {
    let lower = value.to_lowercase();
    for conj in ["and", "but", "or"] {
        if let Some(stripped) = lower.strip_suffix(conj) {
            if stripped.ends_with(char::is_whitespace) || stripped.is_empty() {
                let new_len = value.len() - conj.len();
                let new_value = value[..new_len].trim_end();
                let new_end = start + new_value.len();
                return (new_value.to_string(), new_end);
            }
        }
    }
    let _ = text;
    (value.to_string(), end)
}

fn extract_bare_subject_copular(clause: &Clause, patterns: &Tier1Patterns) -> Option<ExtractedFact> {
    let lower = clause.text.to_lowercase();
    let m = patterns.bare_subject_copular.find(&lower)?;
    let (start, end) = (m.start(), m.end());
    let subject = clause.text[..start].trim();
    if subject.is_empty() || is_bare_pronoun_subject(subject) {
        return None;
    }
    // Reject articles leading the subject (family 2 is explicitly "without article").
    let first = subject.split_whitespace().next().unwrap_or("").to_lowercase();
    if ["a", "an", "the"].contains(&first.as_str()) {
        return None;
    }
    let slot = slugify_subject(subject)?;
    let (value, vs, ve) = trim_value_span(&clause.text, end, clause.text.len());
    fact(&slot, &value, clause, clause.start + vs, clause.start + ve, "bare_subject_copular")
}

fn extract_possessive_have(clause: &Clause, patterns: &Tier1Patterns) -> Option<ExtractedFact> {
    let lower = clause.text.to_lowercase();
    let m = patterns.possessive_have.find(&lower)?;
    let (start, end) = (m.start(), m.end());
    let subject = clause.text[..start].trim();
    if subject.is_empty() || is_bare_pronoun_subject(subject) {
        return None;
    }
    let slot = slugify_subject(subject)?;
    let (value, vs, ve) = trim_value_span(&clause.text, end, clause.text.len());
    fact(&slot, &value, clause, clause.start + vs, clause.start + ve, "possessive_have")
}

fn extract_non_copular_verb(clause: &Clause, patterns: &Tier1Patterns) -> Option<ExtractedFact> {
    let lower = clause.text.to_lowercase();
    let m = patterns.non_copular_verb.find(&lower)?;
    let (start, end) = (m.start(), m.end());
    let subject = clause.text[..start].trim();
    if subject.is_empty() || is_bare_pronoun_subject(subject) {
        return None;
    }
    let slot = slugify_subject(subject)?;
    let (value, vs, ve) = trim_value_span(&clause.text, end, clause.text.len());
    fact(&slot, &value, clause, clause.start + vs, clause.start + ve, "non_copular_verb")
}

fn extract_requirement(clause: &Clause, patterns: &Tier1Patterns) -> Option<ExtractedFact> {
    let lower = clause.text.to_lowercase();
    let m = patterns.requirement.find(&lower)?;
    let (start, end) = (m.start(), m.end());
    let subject = clause.text[..start].trim();
    if subject.is_empty() || is_bare_pronoun_subject(subject) {
        return None;
    }
    let slot = slugify_subject(subject)?;
    let (value, vs, ve) = trim_value_span(&clause.text, end, clause.text.len());
    fact(&slot, &value, clause, clause.start + vs, clause.start + ve, "requirement")
}

fn extract_decision(clause: &Clause, patterns: &Tier1Patterns) -> Option<ExtractedFact> {
    let lower = clause.text.to_lowercase();
    let first_word = lower.split_whitespace().next().unwrap_or("");
    if !DECISION_SUBJECTS.contains(&first_word) {
        return None;
    }
    let m = patterns.decision.find(&lower)?;
    let end = m.end();
    let (value, vs, ve) = trim_value_span(&clause.text, end, clause.text.len());
    fact("decision", &value, clause, clause.start + vs, clause.start + ve, "decision")
}

fn extract_prescriptive(clause: &Clause, patterns: &Tier1Patterns) -> Option<ExtractedFact> {
    let lower = clause.text.to_lowercase();
    if let Some(m) = patterns.prescriptive.find(&lower) {
        let (start, end) = (m.start(), m.end());
        let subject = clause.text[..start].trim();
        if subject.is_empty() {
            return None;
        }
        let slot = slugify_subject(subject)?;
        let (value, vs, ve) = trim_value_span(&clause.text, end, clause.text.len());
        return fact(&slot, &value, clause, clause.start + vs, clause.start + ve, "prescriptive");
    }
    // "Always|Never <verb> <Value>" leading form.
    let first_word = lower.split_whitespace().next().unwrap_or("");
    if first_word == "always" || first_word == "never" {
        // Skip "Always"/"Never", then skip one more word (the verb).
        let after_first = clause.text.find(' ').map(|p| p + 1)?;
        let rest = &clause.text[after_first..];
        let verb_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let value_rel_start = after_first + verb_len;
        let (value, vs, ve) = trim_value_span(&clause.text, value_rel_start, clause.text.len());
        return fact(first_word, &value, clause, clause.start + vs, clause.start + ve, "prescriptive_always_never");
    }
    None
}

fn extract_passive(clause: &Clause, patterns: &Tier1Patterns) -> Option<ExtractedFact> {
    let lower = clause.text.to_lowercase();
    let m = patterns.passive.find(&lower)?;
    let (start, end) = (m.start(), m.end());
    let subject = clause.text[..start].trim();
    if subject.is_empty() || is_bare_pronoun_subject(subject) {
        return None;
    }
    let slot = slugify_subject(subject)?;
    let (value, vs, ve) = trim_value_span(&clause.text, end, clause.text.len());
    fact(&slot, &value, clause, clause.start + vs, clause.start + ve, "passive")
}

fn extract_config_equality(clause: &Clause, patterns: &Tier1Patterns) -> Option<ExtractedFact> {
    let lower = clause.text.to_lowercase();
    let m = patterns.config_equality.find(&lower)?;
    let (start, end) = (m.start(), m.end());
    let subject = clause.text[..start].trim();
    if subject.is_empty() || is_bare_pronoun_subject(subject) {
        return None;
    }
    let slot = slugify_subject(subject)?;
    let (value, vs, ve) = trim_value_span(&clause.text, end, clause.text.len());
    fact(&slot, &value, clause, clause.start + vs, clause.start + ve, "config_equality")
}

/// Run all nine Tier-1 families over one clause. Family 1 may emit several
/// facts; families 2-9 try in fixed order and the first to match the clause
/// consumes it.
pub fn extract_clause(clause: &Clause, patterns: &Tier1Patterns) -> Vec<ExtractedFact> {
    if is_interrogative(&clause.text) {
        return Vec::new();
    }

    let named = extract_named_slot_copular(clause, patterns);
    if !named.is_empty() {
        return named;
    }

    let single = extract_bare_subject_copular(clause, patterns)
        .or_else(|| extract_possessive_have(clause, patterns))
        .or_else(|| extract_non_copular_verb(clause, patterns))
        .or_else(|| extract_requirement(clause, patterns))
        .or_else(|| extract_decision(clause, patterns))
        .or_else(|| extract_prescriptive(clause, patterns))
        .or_else(|| extract_passive(clause, patterns))
        .or_else(|| extract_config_equality(clause, patterns));

    single.into_iter().collect()
}

/// Run Tier-1 over every clause of the (already split) text.
pub fn extract(clauses: &[Clause], patterns: &Tier1Patterns) -> Vec<ExtractedFact> {
    clauses.iter().flat_map(|c| extract_clause(c, patterns)).collect()
}

/// The full list of built-in named slots (for the contradiction engine's
/// KNOWN_EXCLUSIVE classification).
pub fn named_slot_names() -> Vec<&'static str> {
    NAMED_SLOTS.iter().map(|(slot, _)| *slot).collect()
}
