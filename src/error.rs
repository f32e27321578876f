/**
 * Error Handling Module
 *
 * DESIGN DECISION: Centralized error types using thiserror for consistent error semantics
 * WHY: A verification library must never panic on caller input; every boundary failure
 * comes back as a Result so embedders (CLI, MCP server, IDE plugin) can recover.
 *
 * REASONING CHAIN:
 * 1. A single verification call must stay pure: internal regex/ontology mismatches
 *    degrade silently (the claim is just not extracted), they never become an Error
 * 2. Only boundary-condition errors propagate: malformed input, missing ontology
 *    resources, a neural option requested with no matcher injected
 * 3. thiserror derives Display without hand-written boilerplate
 * 4. Error conversion (From trait) enables the ? operator across ontology loading
 *
 * PATTERN: Pattern-001 (Rust Core + Language Bindings)
 */

use thiserror::Error;

/// Primary error type for the GroundCheck core library.
///
/// Variants map directly onto the error taxonomy from the design: input
/// validation failures, ontology loading failures, and the construction-time
/// check that a semantic matcher was supplied when requested. There is no
/// variant for "extraction failed" or "no match found" — those are
/// `ExtractionEmpty` / `null` results, not errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Draft or memory text failed basic structural validation, or a field
    /// was out of its documented range (e.g. `trust` outside [0.0, 1.0]).
    #[error("malformed input: {0}")]
    InputMalformed(String),

    /// Requested verification mode is not one of `strict` / `permissive`.
    #[error("unknown verification mode: {0}")]
    InvalidMode(String),

    /// An ontology file was absent or failed to parse at construction time.
    /// The core refuses to start rather than run with a partial ontology.
    #[error("ontology missing or unparseable: {0}")]
    OntologyMissing(String),

    /// `neural: true` was requested but no `SemanticMatcher` was injected.
    #[error("semantic matcher unavailable: neural mode requires an injected matcher")]
    SemanticUnavailable,

    /// Unexpected internal error (should not occur in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for GroundCheck operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::OntologyMissing(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::OntologyMissing(err.to_string())
    }
}
