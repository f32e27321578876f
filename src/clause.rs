/**
 * Clause Splitter
 *
 * DESIGN DECISION: Split on structural punctuation first, then a small
 * heuristic for coordinating conjunctions, never crossing a sentence
 * boundary
 * WHY: Tier-1 families match one fact per clause; a sentence like "frontend
 * is React, backend is FastAPI" only yields two facts if the clause
 * splitter separates them
 *
 * REASONING CHAIN:
 * 1. Sentence boundaries (`.`/`!`/`?`) always terminate splitting — a
 *    decimal point (`v3.11`) is not a sentence boundary
 * 2. Commas split clauses only outside quoted spans and balanced parens
 * 3. Semicolons always split, regardless of quoting
 * 4. `and`/`or`/`but` split only when heuristically followed by a new
 *    subject+verb (explicit or elided-subject verb) — not every "and"
 *    joins two clauses ("fish and chips" should not split)
 * 5. Every clause keeps its 0-based ordinal index and its byte span in the
 *    original text, both needed by Tier-1.5's position-aware rules
 *
 * PATTERN: heuristic grammar splitting
 */

const VERB_INDICATORS: &[&str] = &[
    "is", "are", "am", "was", "were", "be", "has", "have", "had", "do", "does", "did", "will",
    "would", "can", "could", "should", "must", "need", "needs", "require", "requires", "demand",
    "demands", "use", "uses", "handles", "handle", "supports", "support", "runs", "run",
    "manufactures", "manufacture", "chose", "picked", "selected", "pick", "choose", "select",
    "agreed", "decided", "decide", "agree", "lives", "live", "works", "work", "sees", "see",
    "likes", "like", "wants", "want", "knows", "know",
];

const PRONOUNS: &[&str] = &["i", "you", "we", "they", "he", "she", "it"];

/// One sub-clause of the input text, with its ordinal position and the
/// byte span it occupies in the original (unmodified) source string.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub text: String,
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

/// Split `text` into ordinal, position-tagged clauses.
pub fn split_clauses(text: &str) -> Vec<Clause> {
    let mut clauses = Vec::new();
    let mut next_index = 0usize;
    for (offset, sentence) in split_sentences(text) {
        next_index = split_sentence_into_clauses(sentence, offset, next_index, &mut clauses);
    }
    clauses
}

/// Split `text` on sentence-terminal `.`/`!`/`?`, returning each sentence
/// with the byte offset where it begins in `text`. A `.` between two
/// digits (`v3.11`) is not treated as a terminator.
fn split_sentences(text: &str) -> Vec<(usize, &str)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let n = chars.len();
    let mut result = Vec::new();
    let mut start = 0usize;
    let mut i = 0;

    while i < n {
        let (pos, c) = chars[i];
        if c == '.' || c == '!' || c == '?' {
            let prev_digit = i > 0 && chars[i - 1].1.is_ascii_digit();
            let next_digit = i + 1 < n && chars[i + 1].1.is_ascii_digit();
            if c == '.' && prev_digit && next_digit {
                i += 1;
                continue;
            }
            let mut j = i + 1;
            while j < n && matches!(chars[j].1, '.' | '!' | '?') {
                j += 1;
            }
            let sentence = &text[start..pos];
            if !sentence.trim().is_empty() {
                result.push((start, sentence));
            }
            let mut k = j;
            while k < n && chars[k].1.is_whitespace() {
                k += 1;
            }
            start = chars.get(k).map(|&(p, _)| p).unwrap_or(text.len());
            i = k;
            continue;
        }
        i += 1;
    }

    if start < text.len() {
        let rest = &text[start..];
        if !rest.trim().is_empty() {
            result.push((start, rest));
        }
    }

    result
}

/// Byte-indexed whitespace-delimited words within `s`.
fn word_spans(s: &str) -> Vec<(usize, usize, &str)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in s.char_indices() {
        if c.is_whitespace() {
            if let Some(st) = start {
                spans.push((st, i, &s[st..i]));
                start = None;
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        spans.push((st, s.len(), &s[st..]));
    }
    spans
}

fn bare_word(w: &str) -> String {
    w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

/// Heuristic: does the conjunction introduce a new subject+verb (either an
/// explicit pronoun/noun followed by a verb, or a verb directly, for an
/// elided shared subject — "You work at Amazon and live in Seattle")?
fn conjunction_is_clause_boundary(rest: &[&str]) -> bool {
    if rest.is_empty() {
        return false;
    }
    let first = bare_word(rest[0]);
    if VERB_INDICATORS.contains(&first.as_str()) {
        return true;
    }
    if PRONOUNS.contains(&first.as_str()) {
        if let Some(second) = rest.get(1) {
            let second = bare_word(second);
            if VERB_INDICATORS.contains(&second.as_str()) {
                return true;
            }
        }
    }
    false
}

fn split_sentence_into_clauses(
    sentence: &str,
    sentence_offset: usize,
    start_index: usize,
    out: &mut Vec<Clause>,
) -> usize {
    let chars: Vec<(usize, char)> = sentence.char_indices().collect();
    let n = chars.len();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut quote_char = '"';
    let mut cuts: Vec<(usize, usize)> = Vec::new();

    let mut i = 0;
    while i < n {
        let (pos, c) = chars[i];
        if in_quote {
            if c == quote_char {
                in_quote = false;
            }
            i += 1;
            continue;
        }
        match c {
            '"' | '\'' => {
                in_quote = true;
                quote_char = c;
            }
            '(' | '[' => depth += 1,
            ')' | ']' => depth = (depth - 1).max(0),
            ',' if depth == 0 => cuts.push((pos, pos + c.len_utf8())),
            ';' => cuts.push((pos, pos + c.len_utf8())),
            _ => {}
        }
        i += 1;
    }

    let words = word_spans(sentence);
    for (wi, &(wstart, wend, word)) in words.iter().enumerate() {
        let lw = bare_word(word);
        if lw == "and" || lw == "or" || lw == "but" {
            let rest: Vec<&str> = words[wi + 1..].iter().map(|&(_, _, w)| w).collect();
            if conjunction_is_clause_boundary(&rest) {
                cuts.push((wstart, wend));
            }
        }
    }

    cuts.sort_unstable();
    cuts.dedup();

    let mut index = start_index;
    let mut prev_end = 0usize;
    for (cs, ce) in cuts {
        push_trimmed_clause(sentence, sentence_offset, prev_end, cs, &mut index, out);
        prev_end = ce;
    }
    push_trimmed_clause(sentence, sentence_offset, prev_end, sentence.len(), &mut index, out);

    index
}

fn push_trimmed_clause(
    sentence: &str,
    sentence_offset: usize,
    range_start: usize,
    range_end: usize,
    index: &mut usize,
    out: &mut Vec<Clause>,
) {
    if range_start >= range_end {
        return;
    }
    let raw = &sentence[range_start..range_end];
    let trim_start = raw.len() - raw.trim_start().len();
    let trim_end = raw.trim_end().len();
    if trim_start >= trim_end {
        return;
    }
    let clause_start = range_start + trim_start;
    let clause_end = range_start + trim_end;
    out.push(Clause {
        text: sentence[clause_start..clause_end].to_string(),
        index: *index,
        start: sentence_offset + clause_start,
        end: sentence_offset + clause_end,
    });
    *index += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_comma() {
        let clauses = split_clauses("frontend is React, backend is FastAPI");
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].text, "frontend is React");
        assert_eq!(clauses[1].text, "backend is FastAPI");
        assert_eq!(clauses[1].index, 1);
    }

    #[test]
    fn splits_on_conjunction_with_elided_subject() {
        let clauses = split_clauses("You work at Amazon and live in Seattle");
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].text, "You work at Amazon");
        assert_eq!(clauses[1].text, "live in Seattle");
    }

    #[test]
    fn does_not_split_bare_and_without_verb() {
        let clauses = split_clauses("I like fish and chips");
        assert_eq!(clauses.len(), 1);
    }

    #[test]
    fn never_crosses_sentence_boundary() {
        let clauses = split_clauses("I work at Amazon. I live in Seattle, too.");
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].index, 0);
        assert_eq!(clauses[1].index, 1);
    }

    #[test]
    fn preserves_decimal_point_within_sentence() {
        let clauses = split_clauses("Running v3.11 in production");
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].text, "Running v3.11 in production");
    }

    #[test]
    fn comma_inside_parens_does_not_split() {
        let clauses = split_clauses("the tool (fast, reliable) works well");
        assert_eq!(clauses.len(), 1);
    }

    #[test]
    fn clause_spans_point_back_into_source() {
        let text = "frontend is React, backend is FastAPI";
        let clauses = split_clauses(text);
        for c in &clauses {
            assert_eq!(&text[c.start..c.end], c.text);
        }
    }
}
