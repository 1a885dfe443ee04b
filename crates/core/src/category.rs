//! Conversation Categories
//!
//! The static catalogue of conversation domains a user can pick from, and the
//! generation strategy bound to each of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a conversation domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryId {
    History,
    Complex,
    Love,
    Tense,
    Random,
}

impl CategoryId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryId::History => "history",
            CategoryId::Complex => "complex",
            CategoryId::Love => "love",
            CategoryId::Tense => "tense",
            CategoryId::Random => "random",
        }
    }

    /// Returns the generation strategy for this category.
    ///
    /// Factual and random categories go to the fast model, only history gets
    /// web-search grounding. Relational and emotionally loaded categories go to
    /// the deliberate model with an extended reasoning budget.
    pub fn strategy(&self) -> GenerationStrategy {
        match self {
            CategoryId::History => GenerationStrategy::Swift {
                search_grounding: true,
            },
            CategoryId::Random => GenerationStrategy::Swift {
                search_grounding: false,
            },
            CategoryId::Complex | CategoryId::Love | CategoryId::Tense => {
                GenerationStrategy::Deliberate
            }
        }
    }

    /// The static configuration entry for this category.
    pub fn config(&self) -> &'static Category {
        // CATEGORIES is ordered and complete, the lookup cannot miss.
        match self {
            CategoryId::History => &CATEGORIES[0],
            CategoryId::Complex => &CATEGORIES[1],
            CategoryId::Love => &CATEGORIES[2],
            CategoryId::Tense => &CATEGORIES[3],
            CategoryId::Random => &CATEGORIES[4],
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown category: '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for CategoryId {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATEGORIES
            .iter()
            .map(|c| c.id)
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// How a topic is generated for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStrategy {
    /// Lighter, faster model. Grounding on web search when requested.
    Swift { search_grounding: bool },
    /// Heavier model with an extended internal reasoning budget.
    Deliberate,
}

impl GenerationStrategy {
    pub fn search_grounding(&self) -> bool {
        matches!(
            self,
            GenerationStrategy::Swift {
                search_grounding: true
            }
        )
    }

    pub fn extended_reasoning(&self) -> bool {
        matches!(self, GenerationStrategy::Deliberate)
    }

    /// Text shown in place of an empty generation.
    pub fn fallback_text(&self) -> &'static str {
        match self {
            GenerationStrategy::Swift { .. } => {
                "Désolé, je n'ai pas pu générer de contenu pour le moment."
            }
            GenerationStrategy::Deliberate => "Désolé, la réflexion a pris trop de temps.",
        }
    }
}

/// Immutable description of a conversation domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    /// Fragment substituted verbatim into the generation template.
    pub prompt_topic: &'static str,
}

impl Category {
    /// Label of the generate button.
    pub fn call_to_action(&self) -> &'static str {
        match self.id {
            CategoryId::Random => "Surprenez-moi",
            _ => "Générer un sujet",
        }
    }

    /// Headline shown before the first generation.
    pub fn invitation(&self) -> &'static str {
        match self.id {
            CategoryId::Random => "Laissez le hasard vous surprendre",
            _ => "Prêt à explorer un nouveau sujet ?",
        }
    }

    /// Message shown while a topic is being generated.
    pub fn loading_hint(&self) -> &'static str {
        match self.id {
            CategoryId::History => "Recherche de faits historiques...",
            _ => "Création d'un sujet unique...",
        }
    }
}

/// All categories, in display order.
pub static CATEGORIES: [Category; 5] = [
    Category {
        id: CategoryId::History,
        label: "Histoire & Faits",
        description: "Des faits réels et surprenants pour nourrir l'échange.",
        icon: "landmark",
        prompt_topic: "un fait historique méconnu, surprenant ou controversé, et ce qu'il révèle de notre époque",
    },
    Category {
        id: CategoryId::Complex,
        label: "Sujets Complexes",
        description: "Philosophie, éthique et dilemmes de société.",
        icon: "brain",
        prompt_topic: "un dilemme éthique, philosophique ou sociétal complexe, sans réponse évidente",
    },
    Category {
        id: CategoryId::Love,
        label: "Amour & Relations",
        description: "Couple, amitié, famille : ce qui nous lie.",
        icon: "heart",
        prompt_topic: "les relations amoureuses, l'amitié ou les liens familiaux et leurs paradoxes",
    },
    Category {
        id: CategoryId::Tense,
        label: "Sujets Sensibles",
        description: "Les débats qui divisent, abordés avec nuance.",
        icon: "flame",
        prompt_topic: "un sujet de société clivant ou tabou, à aborder avec nuance et respect",
    },
    Category {
        id: CategoryId::Random,
        label: "Aléatoire",
        description: "Un thème inattendu, choisi au hasard.",
        icon: "dice",
        prompt_topic: "un thème totalement inattendu, insolite ou décalé, choisi au hasard",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swift_strategy_for_general_knowledge_categories() {
        for id in [CategoryId::History, CategoryId::Random] {
            let strategy = id.strategy();
            assert!(matches!(strategy, GenerationStrategy::Swift { .. }));
            assert!(!strategy.extended_reasoning());
            assert_eq!(strategy.search_grounding(), id == CategoryId::History);
        }
    }

    #[test]
    fn test_deliberate_strategy_for_relational_categories() {
        for id in [CategoryId::Complex, CategoryId::Love, CategoryId::Tense] {
            let strategy = id.strategy();
            assert_eq!(strategy, GenerationStrategy::Deliberate);
            assert!(strategy.extended_reasoning());
            assert!(!strategy.search_grounding());
        }
    }

    #[test]
    fn test_history_is_the_only_grounded_category() {
        let grounded: Vec<CategoryId> = CATEGORIES
            .iter()
            .map(|c| c.id)
            .filter(|id| id.strategy().search_grounding())
            .collect();
        assert_eq!(grounded, vec![CategoryId::History]);
    }

    #[test]
    fn test_config_lookup_matches_id() {
        for category in CATEGORIES.iter() {
            assert_eq!(category.id.config(), category);
            assert!(!category.prompt_topic.is_empty());
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("history".parse::<CategoryId>(), Ok(CategoryId::History));
        assert_eq!(" Random ".parse::<CategoryId>(), Ok(CategoryId::Random));
        assert_eq!(
            "poetry".parse::<CategoryId>(),
            Err(UnknownCategory("poetry".to_string()))
        );
    }

    #[test]
    fn test_serde_uses_lowercase_ids() {
        assert_eq!(
            serde_json::to_string(&CategoryId::Tense).unwrap(),
            "\"tense\""
        );
        let id: CategoryId = serde_json::from_str("\"love\"").unwrap();
        assert_eq!(id, CategoryId::Love);
    }

    #[test]
    fn test_labels_depend_on_category() {
        assert_eq!(CategoryId::Random.config().call_to_action(), "Surprenez-moi");
        assert_eq!(CategoryId::Love.config().call_to_action(), "Générer un sujet");
        assert_eq!(
            CategoryId::History.config().loading_hint(),
            "Recherche de faits historiques..."
        );
        assert_eq!(
            CategoryId::Tense.config().loading_hint(),
            "Création d'un sujet unique..."
        );
    }
}
