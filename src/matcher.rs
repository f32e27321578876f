/**
 * Semantic Matcher Capability
 *
 * DESIGN DECISION: A three-method trait object, never a baked-in embedding
 * library
 * WHY: The core must compile and run without Tier-2 at all, and neural
 * features degrade gracefully when absent — optionality is structural,
 * since the matcher is caller-supplied, not crate-internal.
 *
 * REASONING CHAIN:
 * 1. Tier-2 is capability-only: it is never an extraction source, only a
 *    matching/entailment oracle used by grounding and the dynamic
 *    contradiction fallthrough
 * 2. The three methods are deliberately narrow and Result-free: an
 *    implementation may be expensive but never throws
 * 3. `GroundCheck::new` with `{neural: true}` and no injected matcher is a
 *    construction-time `SemanticUnavailable` error, not a runtime one
 *
 * PATTERN: capability trait over concrete dependency
 */

use std::fmt;

/// Result of comparing a premise against a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entailment {
    Entail,
    Neutral,
    Contradict,
}

/// An entailment judgment with its confidence in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntailmentResult {
    pub label: Entailment,
    pub confidence: f64,
}

/// Optional Tier-2 capability. Callers that construct `GroundCheck` with
/// `neural: true` must inject an implementation; the core only ever calls
/// it as a fallback inside the grounding cascade and the dynamic
/// contradiction fallthrough — never as an extraction source.
pub trait SemanticMatcher: fmt::Debug {
    /// Deterministic, finite embedding of `text`.
    fn embed(&self, text: &str) -> Vec<f32>;
    /// Cosine similarity in `[0.0, 1.0]` between two embeddings' source texts.
    fn similarity(&self, a: &str, b: &str) -> f64;
    /// Entailment judgment between a premise and a hypothesis.
    fn entails(&self, premise: &str, hypothesis: &str) -> EntailmentResult;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A scripted matcher for tests: fixed similarity, fixed entailment,
    /// embeddings unused by the cascade tests that need only `similarity`.
    #[derive(Debug)]
    pub struct ScriptedMatcher {
        pub similarity: f64,
        pub entailment: EntailmentResult,
    }

    impl SemanticMatcher for ScriptedMatcher {
        fn embed(&self, text: &str) -> Vec<f32> {
            vec![text.len() as f32]
        }

        fn similarity(&self, _a: &str, _b: &str) -> f64 {
            self.similarity
        }

        fn entails(&self, _premise: &str, _hypothesis: &str) -> EntailmentResult {
            self.entailment
        }
    }
}
