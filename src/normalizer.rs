/**
 * Normalizer — Total, Span-Preserving Text Normalization
 *
 * DESIGN DECISION: Emit a token stream with source offsets alongside the
 * normalized string, rather than normalizing in place
 * WHY: Early normalization loses offsets; the corrector (ground.rs) needs
 * to rewrite the *original* draft text, not a normalized copy, so every
 * downstream consumer that needs to point back at source text works off
 * spans computed here, not off the normalized string's own indices.
 *
 * REASONING CHAIN:
 * 1. Lowercase + article/possessive stripping + whitespace collapse is a
 *    total function — the normalizer never fails on any input
 * 2. Decimal numerics (`99.9%`, `v3.11`) must tokenize as single tokens;
 *    a trailing sentence period is punctuation, an internal period is not
 * 3. Tokens carry byte offsets into the *original* string so Tier-1.5's
 *    entity/verb window scan and the corrector's span rewrite both have
 *    something to anchor on
 * 4. `normalize_value` is the deterministic per-value function the
 *    `ExtractedFact` invariant requires: `normalize(f.value) == f.normalized`
 *
 * PATTERN: total-function normalizer, span-preserving token
 * stream (design notes, "Text-span preservation for rewrites")
 */

const ARTICLES: &[&str] = &["a", "an", "the"];
const POSSESSIVES: &[&str] = &["my", "your", "our", "their", "his", "her", "its"];

/// One token of source text with its byte offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub raw: String,
    pub normalized: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    fn is_word(&self) -> bool {
        self.raw.chars().next().map(|c| c.is_alphanumeric()).unwrap_or(false)
    }
}

/// Result of normalizing one string: the normalized text plus a parallel
/// token stream with source spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub text: String,
    pub tokens: Vec<Token>,
}

/// Split `text` into word tokens (alphanumeric runs, decimal points kept
/// when followed by a digit, a trailing `%` folded into the token) and
/// single-character punctuation tokens, each carrying its byte span.
///
/// Total: every byte of `text` is covered by whitespace or exactly one
/// token.
pub fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let n = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < n {
        let (start, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_alphanumeric() {
            let mut j = i + 1;
            loop {
                if j >= n {
                    break;
                }
                let (_, cj) = chars[j];
                if cj.is_alphanumeric() {
                    j += 1;
                    continue;
                }
                if cj == '.' && j + 1 < n && chars[j + 1].1.is_ascii_digit() {
                    j += 1;
                    continue;
                }
                if cj == '%' {
                    j += 1;
                }
                break;
            }
            let end = if j < n { chars[j].0 } else { text.len() };
            let raw = text[start..end].to_string();
            let normalized = raw.to_lowercase();
            tokens.push(Token { raw, normalized, start, end });
            i = j;
        } else {
            let end = if i + 1 < n { chars[i + 1].0 } else { text.len() };
            let raw = text[start..end].to_string();
            let normalized = raw.to_lowercase();
            tokens.push(Token { raw, normalized, start, end });
            i += 1;
        }
    }

    tokens
}

/// Strip leading/trailing punctuation from a word, preserving internal
/// decimal points and a trailing `%`.
fn strip_sentence_punct(word: &str) -> &str {
    let mut start = word.len();
    for (i, c) in word.char_indices() {
        if c.is_alphanumeric() {
            start = i;
            break;
        }
    }
    if start == word.len() {
        return "";
    }
    let mut end = start;
    for (i, c) in word[start..].char_indices() {
        if c.is_alphanumeric() || c == '%' || c == '.' {
            end = start + i + c.len_utf8();
        }
    }
    // Trim a trailing internal '.' that turned out to be sentence
    // punctuation (not followed by a digit) picked up by the loop above.
    let mut slice = &word[start..end];
    while slice.ends_with('.') {
        slice = &slice[..slice.len() - 1];
    }
    slice
}

/// Deterministic normalization of a single value/phrase: lowercase, strip a
/// leading article or possessive pronoun that opens the phrase, collapse
/// whitespace, and drop sentence punctuation while preserving decimals.
///
/// This is the function the `ExtractedFact` invariant refers to:
/// `normalize_value(f.value) == f.normalized` must always hold.
pub fn normalize_value(value: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for (idx, raw_word) in value.split_whitespace().enumerate() {
        let stripped = strip_sentence_punct(raw_word);
        if stripped.is_empty() {
            continue;
        }
        let lowered = stripped.to_lowercase();
        if idx == 0 && (ARTICLES.contains(&lowered.as_str()) || POSSESSIVES.contains(&lowered.as_str())) {
            continue;
        }
        out.push(lowered);
    }
    out.join(" ")
}

/// Normalize a full string (e.g. a clause or draft) into normalized text
/// plus its source-span token stream. The normalized text is a best-effort
/// whole-string normalization (lowercase, collapsed whitespace, leading
/// article/possessive stripped); per-value normalization for extracted
/// facts goes through [`normalize_value`] instead, since a fact's value may
/// be a short sub-span with its own leading article.
pub fn normalize(text: &str) -> Normalized {
    let tokens = tokenize(text);
    let word_tokens: Vec<&Token> = tokens.iter().filter(|t| t.is_word()).collect();

    let mut words: Vec<String> = Vec::new();
    for (idx, tok) in word_tokens.iter().enumerate() {
        if idx == 0
            && (ARTICLES.contains(&tok.normalized.as_str())
                || POSSESSIVES.contains(&tok.normalized.as_str()))
        {
            continue;
        }
        words.push(tok.normalized.clone());
    }

    Normalized { text: words.join(" "), tokens }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_leading_article() {
        assert_eq!(normalize_value("The Database"), "database");
        assert_eq!(normalize_value("My Employer"), "employer");
        assert_eq!(normalize_value("Amazon"), "amazon");
    }

    #[test]
    fn preserves_decimal_numerics() {
        assert_eq!(normalize_value("99.9%"), "99.9%");
        assert_eq!(normalize_value("v3.11"), "v3.11");
    }

    #[test]
    fn strips_trailing_sentence_period_but_keeps_internal() {
        assert_eq!(normalize_value("Seattle."), "seattle");
        assert_eq!(normalize_value("v3.11."), "v3.11");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_value("New   York    City"), "new york city");
    }

    #[test]
    fn normalize_value_is_deterministic() {
        assert_eq!(normalize_value("Postgres"), normalize_value("Postgres"));
        assert_eq!(normalize_value("Postgres"), normalize_value("postgres"));
    }

    #[test]
    fn tokenize_covers_whole_string_with_spans() {
        let text = "You work at Amazon.";
        let tokens = tokenize(text);
        for tok in &tokens {
            assert_eq!(&text[tok.start..tok.end], tok.raw);
        }
        assert!(tokens.iter().any(|t| t.normalized == "amazon"));
    }

    #[test]
    fn normalize_whole_string_strips_one_leading_article() {
        let n = normalize("The cat sat on a the mat");
        assert!(n.text.starts_with("cat"));
    }
}
