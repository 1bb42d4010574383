use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::ops::Range;
use tracing::{info, warn};

use crate::api_connection::endpoints::{JsonSchema, JsonSchemaDefinition};
use crate::api_connection::ChatProvider;
use crate::config::ModelSettings;
use crate::error::FlowError;
use crate::prompt::{invoke, StructuredPrompt};

pub const RANK_FLOW: &str = "rankRecipes";

pub const CALORIES_RANGE: Range<u32> = 200..700;
pub const PROTEIN_G_RANGE: Range<u32> = 10..40;
pub const CARBS_G_RANGE: Range<u32> = 20..70;
pub const FAT_G_RANGE: Range<u32> = 5..25;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RankRecipesInput {
    pub ingredients: Vec<String>,
    /// Recipe summaries, one per generated recipe.
    pub recipes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_preferences: Option<Vec<String>>,
}

impl RankRecipesInput {
    fn dietary(&self) -> Option<&[String]> {
        non_empty(&self.dietary_restrictions)
    }

    fn cuisine(&self) -> Option<&[String]> {
        non_empty(&self.cuisine_preferences)
    }
}

fn non_empty(list: &Option<Vec<String>>) -> Option<&[String]> {
    list.as_deref().filter(|items| !items.is_empty())
}

/// Placeholder nutrition figures. Not derived from the recipe.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct NutritionEstimate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RankedRecipe {
    /// The model's rendering of the recipe, usually its name.
    pub recipe: String,
    /// 0 to 10, higher is a better match. Not range-checked.
    pub rank: f64,
    pub reason: String,
    // Whatever the model says about nutrition is discarded.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionEstimate>,
}

/// Accepts both a bare array and the `{"rankings": [...]}` object the schema asks for.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RankingsOutput {
    Bare(Vec<RankedRecipe>),
    Wrapped { rankings: Vec<RankedRecipe> },
}

impl RankingsOutput {
    fn into_vec(self) -> Vec<RankedRecipe> {
        match self {
            RankingsOutput::Bare(rankings) | RankingsOutput::Wrapped { rankings } => rankings,
        }
    }
}

fn get_rank_recipes_json_schema() -> JsonSchemaDefinition {
    let ranking_schema = JsonSchema::object(
        vec![
            ("recipe", JsonSchema::string("The recipe.")),
            (
                "rank",
                JsonSchema::number(
                    "The rank of the recipe based on relevance and completeness of ingredients. Higher is better.",
                ),
            ),
            ("reason", JsonSchema::string("The reason for the ranking.")),
        ],
        &["recipe", "rank", "reason"],
    );

    JsonSchemaDefinition {
        name: "rank_recipes_schema".to_string(),
        strict: Some(true),
        schema: JsonSchema::object(
            vec![(
                "rankings",
                JsonSchema::array(ranking_schema, "One entry per recipe."),
            )],
            &["rankings"],
        ),
    }
}

pub fn build_rank_prompt(input: &RankRecipesInput) -> StructuredPrompt {
    let mut user = String::from(
        "You are a recipe ranking expert. Given the following ingredients and recipes, rank the recipes based on how well they match the ingredients.\n\nIngredients:\n",
    );
    for ingredient in &input.ingredients {
        let _ = writeln!(user, "{ingredient}");
    }
    user.push_str("\nRecipes:\n");
    for recipe in &input.recipes {
        let _ = writeln!(user, "{recipe}");
    }

    let dietary = input.dietary();
    let cuisine = input.cuisine();
    if let Some(restrictions) = dietary {
        let _ = writeln!(user, "\nDietary restrictions:");
        for restriction in restrictions {
            let _ = writeln!(user, "{restriction}");
        }
    }
    if let Some(preferences) = cuisine {
        let _ = writeln!(user, "\nCuisine preferences:");
        for preference in preferences {
            let _ = writeln!(user, "{preference}");
        }
    }

    user.push_str(
        "\nRank each recipe based on relevance and completeness of ingredients. The rank should be a number between 0 and 10, where 10 is the best match.\nAlso provide a reason for the ranking.\n",
    );
    if dietary.is_some() || cuisine.is_some() {
        user.push_str(
            "Rank recipes that violate a listed restriction or ignore the listed preferences lower.\n",
        );
    }
    user.push_str(
        "\nReturn a JSON object with the following format:\n{\"rankings\": [{\n  \"recipe\": \"recipe name\",\n  \"rank\": rank,\n  \"reason\": \"reason for ranking\"\n}]}",
    );

    StructuredPrompt {
        name: RANK_FLOW,
        system: "/no_thinking
You rank recipes. Respond ONLY with JSON, without explanatory text or markdown formatting."
            .to_string(),
        user,
        schema: get_rank_recipes_json_schema(),
    }
}

/// Draws one set of placeholder nutrition values.
pub fn placeholder_nutrition<R: Rng + ?Sized>(rng: &mut R) -> NutritionEstimate {
    NutritionEstimate {
        calories: Some(rng.gen_range(CALORIES_RANGE)),
        protein: Some(rng.gen_range(PROTEIN_G_RANGE)),
        carbs: Some(rng.gen_range(CARBS_G_RANGE)),
        fat: Some(rng.gen_range(FAT_G_RANGE)),
    }
}

pub fn assign_placeholder_nutrition<R: Rng + ?Sized>(rankings: &mut [RankedRecipe], rng: &mut R) {
    for ranked in rankings.iter_mut() {
        ranked.nutrition = Some(placeholder_nutrition(rng));
    }
}

/// Asks the model to rank recipe summaries against the available ingredients and
/// preferences, then attaches placeholder nutrition to every entry.
pub async fn rank_recipes(
    provider: &dyn ChatProvider,
    settings: &ModelSettings,
    input: &RankRecipesInput,
) -> Result<Vec<RankedRecipe>, FlowError> {
    let output: RankingsOutput = invoke(provider, settings, &build_rank_prompt(input)).await?;
    let mut rankings = output.into_vec();

    if rankings.len() != input.recipes.len() {
        warn!(
            expected = input.recipes.len(),
            received = rankings.len(),
            "ranking count differs from recipe count"
        );
    }

    let mut rng = StdRng::from_entropy();
    assign_placeholder_nutrition(&mut rankings, &mut rng);
    info!(count = rankings.len(), "recipes ranked");
    Ok(rankings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> RankRecipesInput {
        RankRecipesInput {
            ingredients: vec!["chicken".to_string(), "rice".to_string()],
            recipes: vec!["Fried Rice: Fry it.".to_string()],
            dietary_restrictions: None,
            cuisine_preferences: None,
        }
    }

    #[test]
    fn prompt_lists_ingredients_and_recipes_one_per_line() {
        let prompt = build_rank_prompt(&sample_input());
        assert!(prompt
            .user
            .contains("Ingredients:\nchicken\nrice\n\nRecipes:\nFried Rice: Fry it.\n"));
    }

    #[test]
    fn empty_preference_lists_count_as_absent() {
        let input = RankRecipesInput {
            dietary_restrictions: Some(vec![]),
            cuisine_preferences: Some(vec![]),
            ..sample_input()
        };
        let prompt = build_rank_prompt(&input);
        assert!(!prompt.user.contains("Dietary restrictions"));
        assert!(!prompt.user.contains("Cuisine preferences"));
    }

    #[test]
    fn only_present_sections_are_rendered() {
        let input = RankRecipesInput {
            cuisine_preferences: Some(vec!["Mexican".to_string()]),
            ..sample_input()
        };
        let prompt = build_rank_prompt(&input);
        assert!(!prompt.user.contains("Dietary restrictions"));
        assert!(prompt.user.contains("Cuisine preferences:\nMexican\n"));
    }

    #[test]
    fn both_output_shapes_are_accepted() {
        let bare: RankingsOutput =
            serde_json::from_str(r#"[{"recipe": "A", "rank": 7.5, "reason": "ok"}]"#).unwrap();
        let wrapped: RankingsOutput = serde_json::from_str(
            r#"{"rankings": [{"recipe": "A", "rank": 7.5, "reason": "ok"}]}"#,
        )
        .unwrap();
        assert_eq!(bare.into_vec(), wrapped.into_vec());
    }

    #[test]
    fn model_nutrition_is_ignored() {
        let output: RankingsOutput = serde_json::from_str(
            r#"[{"recipe": "A", "rank": 3, "reason": "meh", "nutrition": {"calories": 9999.5}}]"#,
        )
        .unwrap();
        assert_eq!(output.into_vec()[0].nutrition, None);
    }

    #[test]
    fn placeholder_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let n = placeholder_nutrition(&mut rng);
            assert!(CALORIES_RANGE.contains(&n.calories.unwrap()));
            assert!(PROTEIN_G_RANGE.contains(&n.protein.unwrap()));
            assert!(CARBS_G_RANGE.contains(&n.carbs.unwrap()));
            assert!(FAT_G_RANGE.contains(&n.fat.unwrap()));
        }
    }
}
