/**
 * Ontology Tables — Verb Categories, Entity Taxonomy, Slot Aliases
 *
 * DESIGN DECISION: Load ontology tables once into immutable structs and
 * thread them through the pipeline as an explicit value, rather than a
 * process-wide singleton
 * WHY: Keeps tests hermetic and lets unit tests override the ontology per
 * call instead of reaching for a `static`.
 *
 * REASONING CHAIN:
 * 1. Tier-1.5 needs two lookups per clause: "is this token window a known
 *    entity" and "is this token window a known verb phrase"
 * 2. Both lookups are longest-match-wins over multi-word phrases, so the
 *    tables are stored pre-sorted by descending word count
 * 3. Entity aliases ("postgres" -> "postgresql") must resolve before the
 *    category lookup, and duplicate entity names across categories are
 *    resolved first-seen
 * 4. `SlotAliases` is not one of the two on-disk JSON files; it is
 *    compiled-in table data owned by the merger
 * 5. Malformed ontology entries are skipped with a one-line `eprintln!`
 *    warning rather than failing the whole load
 *
 * PATTERN: immutable shared value over process singleton (design notes)
 */

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::VerbCategory;

const DEFAULT_VERB_ONTOLOGY_JSON: &str =
    include_str!("ontology_data/verb_ontology.json");
const DEFAULT_ENTITY_TAXONOMY_JSON: &str =
    include_str!("ontology_data/entity_taxonomy.json");

/// Verb-phrase -> category table, longest-match-first.
#[derive(Debug, Clone)]
pub struct VerbOntology {
    /// (phrase, word_count, category), sorted by word_count descending.
    phrases: Vec<(String, usize, VerbCategory)>,
}

impl VerbOntology {
    fn from_json(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, Vec<String>> = serde_json::from_str(raw)
            .map_err(|e| Error::OntologyMissing(format!("verb_ontology.json: {e}")))?;

        let mut phrases = Vec::new();
        for (category_name, phrase_list) in parsed {
            let category = match VerbCategory::from_str_opt(&category_name) {
                Some(c) => c,
                None => {
                    eprintln!(
                        "groundcheck: skipping unknown verb category '{category_name}' in ontology"
                    );
                    continue;
                }
            };
            for phrase in phrase_list {
                let phrase = phrase.trim().to_lowercase();
                if phrase.is_empty() {
                    eprintln!("groundcheck: skipping empty verb phrase under '{category_name}'");
                    continue;
                }
                let word_count = phrase.split_whitespace().count();
                phrases.push((phrase, word_count, category));
            }
        }
        phrases.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(Self { phrases })
    }

    /// Longest matching verb phrase starting at token index `start` in
    /// `words` (lowercased), up to length 4 ("ended up going with").
    pub fn match_at(&self, words: &[&str], start: usize) -> Option<(usize, VerbCategory)> {
        for (phrase, word_count, category) in &self.phrases {
            if *word_count == 0 || *word_count > 4 {
                continue;
            }
            if start + word_count > words.len() {
                continue;
            }
            let candidate = words[start..start + word_count].join(" ");
            if candidate == *phrase {
                return Some((*word_count, *category));
            }
        }
        None
    }
}

/// Entity-name -> category table with alias resolution, longest-match-first.
#[derive(Debug, Clone)]
pub struct EntityTaxonomy {
    /// (canonical_name, word_count, category), sorted by word_count descending.
    entities: Vec<(String, usize, String)>,
    /// alias -> canonical name.
    aliases: HashMap<String, String>,
}

impl EntityTaxonomy {
    fn from_json(raw: &str) -> Result<Self> {
        #[derive(serde::Deserialize)]
        struct Raw {
            #[serde(default)]
            categories: HashMap<String, Vec<String>>,
            #[serde(default)]
            aliases: HashMap<String, String>,
        }
        let parsed: Raw = serde_json::from_str(raw)
            .map_err(|e| Error::OntologyMissing(format!("entity_taxonomy.json: {e}")))?;

        let mut seen: HashMap<String, String> = HashMap::new();
        let mut entities = Vec::new();
        for (category, names) in parsed.categories {
            for name in names {
                let name = name.trim().to_lowercase();
                if name.is_empty() {
                    eprintln!("groundcheck: skipping empty entity name under '{category}'");
                    continue;
                }
                if seen.contains_key(&name) {
                    // first-seen wins
                    continue;
                }
                seen.insert(name.clone(), category.clone());
                let word_count = name.split_whitespace().count();
                entities.push((name, word_count, category.clone()));
            }
        }
        entities.sort_by(|a, b| b.1.cmp(&a.1));

        let aliases = parsed
            .aliases
            .into_iter()
            .map(|(alias, canonical)| (alias.trim().to_lowercase(), canonical.trim().to_lowercase()))
            .collect();

        Ok(Self { entities, aliases })
    }

    fn category_of(&self, canonical: &str) -> Option<&str> {
        self.entities
            .iter()
            .find(|(name, _, _)| name == canonical)
            .map(|(_, _, cat)| cat.as_str())
    }

    /// Resolve an alias to its canonical entity name (or return the input
    /// lowercased unchanged if it isn't an alias).
    pub fn resolve_alias(&self, name: &str) -> String {
        let lowered = name.to_lowercase();
        self.aliases.get(&lowered).cloned().unwrap_or(lowered)
    }

    /// Longest matching entity (alias-expanded) starting at token index
    /// `start` in `words` (lowercased), up to window length 4.
    pub fn match_at(&self, words: &[&str], start: usize) -> Option<(usize, String, String)> {
        for window in (1..=4).rev() {
            if start + window > words.len() {
                continue;
            }
            let candidate = words[start..start + window].join(" ");
            let resolved = self.resolve_alias(&candidate);
            if let Some(category) = self.category_of(&resolved) {
                return Some((window, resolved, category.to_string()));
            }
        }
        None
    }
}

/// Category -> Tier-1 slot name mapping, used by the fact merger to collapse
/// Tier-1.5 inferences onto the same slot vocabulary Tier-1 produces.
#[derive(Debug, Clone)]
pub struct SlotAliases {
    table: HashMap<String, String>,
}

impl SlotAliases {
    fn default_table() -> HashMap<String, String> {
        [
            ("database", "database"),
            ("language", "programming_language"),
            ("framework", "framework"),
            ("cloud", "cloud_provider"),
            ("tool", "tool"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Map a Tier-1.5 taxonomy category to the Tier-1 slot it aliases to,
    /// falling back to the category name itself when no explicit alias
    /// exists.
    pub fn slot_for_category(&self, category: &str) -> String {
        self.table
            .get(category)
            .cloned()
            .unwrap_or_else(|| category.to_string())
    }
}

/// The three ontology tables, loaded once and shared immutably across a
/// verification call.
#[derive(Debug, Clone)]
pub struct Ontology {
    pub verbs: VerbOntology,
    pub entities: EntityTaxonomy,
    pub slot_aliases: SlotAliases,
}

impl Ontology {
    /// Load the ontology tables shipped with the crate.
    pub fn load_default() -> Result<Self> {
        Self::from_json(DEFAULT_VERB_ONTOLOGY_JSON, DEFAULT_ENTITY_TAXONOMY_JSON)
    }

    /// Load ontology tables from caller-supplied JSON text. Used by
    /// embedders that ship their own domain ontology, and by unit tests
    /// that want a minimal fixture ontology.
    pub fn from_json(verb_json: &str, entity_json: &str) -> Result<Self> {
        Ok(Self {
            verbs: VerbOntology::from_json(verb_json)?,
            entities: EntityTaxonomy::from_json(entity_json)?,
            slot_aliases: SlotAliases {
                table: SlotAliases::default_table(),
            },
        })
    }
}
