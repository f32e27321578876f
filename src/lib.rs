/**
 * GroundCheck
 *
 * DESIGN DECISION: Modular pipeline architecture with one module per
 * pipeline stage, in the same separation-of-concerns shape this codebase's
 * earlier pattern-matching core used
 * WHY: Each stage (normalizer, clause splitter, the two extraction tiers,
 * the merger, the contradiction engine, grounding/correction, the scorer)
 * is independently testable and independently replaceable, the way a
 * Rust core meant to sit behind multiple language bindings needs its
 * internals to be.
 *
 * REASONING CHAIN:
 * 1. A verification call is a pure pipeline: normalize -> split into
 *    clauses -> Tier-1 pattern extraction -> Tier-1.5 knowledge inference
 *    -> merge -> contradiction detection -> grounding & correction ->
 *    confidence/disclosure scoring
 * 2. `error.rs` centralizes the error taxonomy so only boundary-condition
 *    failures ever propagate out of a verification call
 * 3. `types.rs` holds every data-model struct as a plain serializable
 *    value, since nothing in the pipeline is an invariant-bearing handle
 * 4. `ontology.rs` loads the verb/entity/slot-alias tables once into an
 *    immutable value threaded through the pipeline explicitly, never a
 *    process-wide singleton (design notes, "Mutable global state")
 * 5. `matcher.rs` is a narrow, Result-free capability trait so the core
 *    compiles and runs correctly with no semantic backend at all
 *
 * # Examples
 *
 * ```rust
 * use groundcheck::{GroundCheck, GroundCheckOptions, Memory, Mode};
 *
 * let gc = GroundCheck::new(GroundCheckOptions::default()).unwrap();
 * let memories = vec![
 *     Memory::new("m1", "User works at Microsoft").with_trust(0.9),
 *     Memory::new("m2", "User lives in Seattle").with_trust(0.8),
 * ];
 * let report = gc
 *     .verify("You work at Amazon and live in Seattle", &memories, Mode::Strict)
 *     .unwrap();
 * assert!(!report.passed);
 * assert_eq!(report.hallucinations, vec!["Amazon".to_string()]);
 * ```
 */

pub mod clause;
pub mod confidence;
pub mod contradiction;
pub mod error;
pub mod ground;
pub mod matcher;
pub mod merger;
pub mod normalizer;
pub mod ontology;
pub mod tier1;
pub mod tier15;
pub mod types;
pub mod verify;

pub use confidence::ScoreResult;
pub use contradiction::DEFAULT_TRUST_GAP_THRESHOLD;
pub use error::{Error, Result};
pub use ground::{Strategy, SupportMatch};
pub use matcher::{Entailment, EntailmentResult, SemanticMatcher};
pub use ontology::{EntityTaxonomy, Ontology, SlotAliases, VerbOntology};
pub use types::{
    ContradictionDetail, ExtractedFact, KnowledgeFact, Memory, Mode, Origin, SlotClass,
    SourceSpan, VerbCategory, VerificationReport,
};
pub use verify::{GroundCheck, GroundCheckOptions};

/// Crate version, exposed for embedders that want to log or assert on it
/// (the same reason the earlier pattern-matching core exposed one).
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Returns the library version as a semantic version string.
pub fn version() -> String {
    format!("{}.{}.{}", VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string() {
        assert_eq!(version(), "0.1.0");
    }

    #[test]
    fn public_api_constructs_and_verifies() {
        let gc = GroundCheck::new(GroundCheckOptions::default()).unwrap();
        let report = gc.verify("My favorite color is blue", &[], Mode::Permissive).unwrap();
        assert!(!report.passed);
        assert_eq!(report.hallucinations, vec!["blue".to_string()]);
    }
}
