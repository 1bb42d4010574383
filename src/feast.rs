//! One "generate, then rank" interaction and the pairing of its results.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api_connection::ChatProvider;
use crate::config::ModelSettings;
use crate::error::FlowError;
use crate::recipe_generator::{generate_recipes, GenerateRecipeInput, Recipe};
use crate::recipe_ranker::{rank_recipes, RankRecipesInput, RankedRecipe};

pub const DIETARY_OPTIONS: &[&str] = &["vegetarian", "vegan", "gluten-free", "dairy-free"];
pub const CUISINE_OPTIONS: &[&str] = &["Italian", "Mexican", "Indian", "Chinese", "American"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeastRequest {
    pub ingredients: String,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub cuisine_preferences: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct FeastOutcome {
    pub recipes: Vec<Recipe>,
    pub rankings: Vec<RankedRecipe>,
}

/// A recipe with the ranking entry matched to it, if any.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RecipeCard {
    pub recipe: Recipe,
    pub ranking: Option<RankedRecipe>,
}

/// Splits on commas and trims. Empty entries are kept.
pub fn split_ingredients(text: &str) -> Vec<String> {
    text.split(',').map(|item| item.trim().to_string()).collect()
}

pub fn recipe_summaries(recipes: &[Recipe]) -> Vec<String> {
    recipes.iter().map(Recipe::summary).collect()
}

fn as_preference(list: &[String]) -> Option<Vec<String>> {
    if list.is_empty() {
        None
    } else {
        Some(list.to_vec())
    }
}

/// Generates recipes, then ranks them. Ranking is skipped when nothing was generated.
pub async fn run_feast(
    provider: &dyn ChatProvider,
    settings: &ModelSettings,
    request: &FeastRequest,
) -> Result<FeastOutcome, FlowError> {
    let generated = generate_recipes(
        provider,
        settings,
        &GenerateRecipeInput {
            ingredients: request.ingredients.clone(),
        },
    )
    .await?;
    info!(count = generated.recipes.len(), "recipes generated");

    if generated.recipes.is_empty() {
        return Ok(FeastOutcome::default());
    }

    let rankings = rank_recipes(
        provider,
        settings,
        &RankRecipesInput {
            ingredients: split_ingredients(&request.ingredients),
            recipes: recipe_summaries(&generated.recipes),
            dietary_restrictions: as_preference(&request.dietary_restrictions),
            cuisine_preferences: as_preference(&request.cuisine_preferences),
        },
    )
    .await?;

    Ok(FeastOutcome {
        recipes: generated.recipes,
        rankings,
    })
}

fn names_match(recipe: &Recipe, ranked: &RankedRecipe) -> bool {
    let name = recipe.name.trim().to_lowercase();
    let label = ranked.recipe.trim().to_lowercase();
    label == name || label.starts_with(&format!("{name}:"))
}

impl FeastOutcome {
    /// Pairs every recipe with a ranking: by name first, then by position for
    /// recipes whose name no entry mentions. Each ranking is used at most once.
    pub fn cards(&self) -> Vec<RecipeCard> {
        let mut claimed = vec![false; self.rankings.len()];
        let mut matched: Vec<Option<usize>> = Vec::with_capacity(self.recipes.len());

        for recipe in &self.recipes {
            let hit = self
                .rankings
                .iter()
                .enumerate()
                .find(|(i, ranked)| !claimed[*i] && names_match(recipe, ranked))
                .map(|(i, _)| i);
            if let Some(i) = hit {
                claimed[i] = true;
            }
            matched.push(hit);
        }

        for (index, slot) in matched.iter_mut().enumerate() {
            if slot.is_none() && index < claimed.len() && !claimed[index] {
                claimed[index] = true;
                *slot = Some(index);
            }
        }

        self.recipes
            .iter()
            .zip(matched)
            .map(|(recipe, slot)| RecipeCard {
                recipe: recipe.clone(),
                ranking: slot.map(|i| self.rankings[i].clone()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(name: &str) -> Recipe {
        Recipe {
            name: name.to_string(),
            instructions: format!("Cook the {name}."),
            required_ingredients: vec![],
        }
    }

    fn ranked(label: &str, rank: f64) -> RankedRecipe {
        RankedRecipe {
            recipe: label.to_string(),
            rank,
            reason: String::new(),
            nutrition: None,
        }
    }

    #[test]
    fn split_trims_and_keeps_empty_entries() {
        assert_eq!(
            split_ingredients(" chicken, rice ,broccoli "),
            vec!["chicken", "rice", "broccoli"]
        );
        assert_eq!(split_ingredients("eggs,, ,milk"), vec!["eggs", "", "", "milk"]);
        assert_eq!(split_ingredients(""), vec![""]);
    }

    #[test]
    fn reordered_rankings_match_by_name() {
        let outcome = FeastOutcome {
            recipes: vec![recipe("Soup"), recipe("Stew")],
            rankings: vec![ranked("stew", 8.0), ranked("Soup: Cook the Soup.", 5.0)],
        };
        let cards = outcome.cards();
        assert_eq!(cards[0].ranking.as_ref().unwrap().rank, 5.0);
        assert_eq!(cards[1].ranking.as_ref().unwrap().rank, 8.0);
    }

    #[test]
    fn unmatched_names_fall_back_to_position() {
        let outcome = FeastOutcome {
            recipes: vec![recipe("Soup"), recipe("Stew"), recipe("Salad")],
            rankings: vec![ranked("Recipe one", 4.0), ranked("Stew", 9.0)],
        };
        let cards = outcome.cards();
        assert_eq!(cards[0].ranking.as_ref().unwrap().recipe, "Recipe one");
        assert_eq!(cards[1].ranking.as_ref().unwrap().recipe, "Stew");
        assert!(cards[2].ranking.is_none());
    }

    #[test]
    fn positional_slot_taken_by_name_is_not_reused() {
        let outcome = FeastOutcome {
            recipes: vec![recipe("Soup"), recipe("Stew")],
            rankings: vec![ranked("Stew", 9.0)],
        };
        let cards = outcome.cards();
        assert!(cards[0].ranking.is_none());
        assert_eq!(cards[1].ranking.as_ref().unwrap().rank, 9.0);
    }
}
