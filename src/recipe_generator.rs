use serde::{Deserialize, Serialize};

use crate::api_connection::endpoints::{JsonSchema, JsonSchemaDefinition};
use crate::api_connection::ChatProvider;
use crate::config::ModelSettings;
use crate::error::FlowError;
use crate::prompt::{invoke, StructuredPrompt};

pub const GENERATE_FLOW: &str = "generateRecipe";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GenerateRecipeInput {
    /// Comma-separated list of available ingredients, as typed by the user.
    pub ingredients: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    pub instructions: String,
    pub required_ingredients: Vec<String>,
}

impl Recipe {
    /// `"<name>: <instructions>"`, the form the ranking prompt receives.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.name, self.instructions)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GenerateRecipeOutput {
    pub recipes: Vec<Recipe>,
}

fn get_generate_recipe_json_schema() -> JsonSchemaDefinition {
    let recipe_schema = JsonSchema::object(
        vec![
            ("name", JsonSchema::string("The name of the recipe.")),
            (
                "instructions",
                JsonSchema::string("The instructions for the recipe."),
            ),
            (
                "requiredIngredients",
                JsonSchema::array(
                    JsonSchema::string("An ingredient."),
                    "The list of ingredients required for the recipe.",
                ),
            ),
        ],
        &["name", "instructions", "requiredIngredients"],
    );

    JsonSchemaDefinition {
        name: "generate_recipe_schema".to_string(),
        strict: Some(true),
        schema: JsonSchema::object(
            vec![(
                "recipes",
                JsonSchema::array(recipe_schema, "The suggested recipes."),
            )],
            &["recipes"],
        ),
    }
}

pub fn build_generate_prompt(input: &GenerateRecipeInput) -> StructuredPrompt {
    let user = format!(
        "You are a world-class chef. Given the following ingredients, suggest a few recipes.

Ingredients: {}

Return a JSON array of recipes. Each recipe should have a name, instructions, and a list of requiredIngredients.",
        input.ingredients
    );

    StructuredPrompt {
        name: GENERATE_FLOW,
        system: "/no_thinking
You are a recipe suggestion assistant. Respond ONLY with a JSON object of the form {\"recipes\": [{\"name\": string, \"instructions\": string, \"requiredIngredients\": [string]}]}.
Do not include any explanatory text or markdown formatting before or after the JSON object."
            .to_string(),
        user,
        schema: get_generate_recipe_json_schema(),
    }
}

/// Asks the model for recipes that use the given ingredients.
pub async fn generate_recipes(
    provider: &dyn ChatProvider,
    settings: &ModelSettings,
    input: &GenerateRecipeInput,
) -> Result<GenerateRecipeOutput, FlowError> {
    invoke(provider, settings, &build_generate_prompt(input)).await
}
