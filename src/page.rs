//! HTML rendering of the single page.

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;

use crate::feast::{RecipeCard, CUISINE_OPTIONS, DIETARY_OPTIONS};
use crate::recipe_ranker::NutritionEstimate;
use crate::session::Session;

pub const IDLE_LABEL: &str = "Generate Recipes";
pub const WORKING_LABEL: &str = "Generating...";

const STYLE: &str = "body{font-family:sans-serif;max-width:56rem;margin:2.5rem auto;padding:0 1rem}\
.grid{display:grid;grid-template-columns:repeat(auto-fit,minmax(20rem,1fr));gap:1.5rem}\
.card{border:1px solid #ddd;border-radius:.5rem;padding:1rem}\
.muted{color:#666;font-size:.875rem}\
.error{color:#a00}\
textarea,select{width:100%}\
button{margin-top:1.5rem;border-radius:9999px;padding:.75rem 2rem;font-weight:600}";

pub fn render_page(session: &Session) -> String {
    let request = session.last_request();
    let ingredients = request.map(|r| r.ingredients.as_str()).unwrap_or_default();
    let dietary: &[String] = request.map(|r| r.dietary_restrictions.as_slice()).unwrap_or(&[]);
    let cuisine: &[String] = request.map(|r| r.cuisine_preferences.as_slice()).unwrap_or(&[]);

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>Fridge Feast</title><style>{STYLE}</style></head>\n<body>\n<h1>Fridge Feast</h1>\n<form method=\"post\" action=\"/generate\">\n<div class=\"grid\">\n"
    );

    let _ = write!(
        html,
        "<section class=\"card\"><h2>Ingredients</h2><p class=\"muted\">Enter ingredients, separated by commas.</p>\
<textarea name=\"ingredients\" rows=\"4\" placeholder=\"e.g., chicken, rice, broccoli\">{}</textarea></section>\n",
        encode_text(ingredients)
    );

    html.push_str(
        "<section class=\"card\"><h2>Preferences</h2><p class=\"muted\">Set your dietary restrictions and cuisine preferences.</p>\n",
    );
    render_select(&mut html, "dietary", "Dietary Restrictions", DIETARY_OPTIONS, dietary);
    render_select(&mut html, "cuisine", "Cuisine Preferences", CUISINE_OPTIONS, cuisine);
    html.push_str("</section>\n");

    if let Some(outcome) = session.displayed_outcome() {
        if !outcome.recipes.is_empty() {
            html.push_str(
                "<section class=\"card\"><h2>Generated Recipes</h2><p class=\"muted\">Here are some recipes based on your ingredients and preferences.</p>\n",
            );
            for card in outcome.cards() {
                render_card(&mut html, &card);
            }
            html.push_str("</section>\n");
        }
    }
    html.push_str("</div>\n");

    if session.last_error().is_some() {
        html.push_str("<p class=\"error\">Recipe generation failed. Please try again.</p>\n");
    }

    if session.is_generating() {
        let _ = write!(html, "<button type=\"submit\" disabled>{WORKING_LABEL}</button>\n");
    } else {
        let _ = write!(html, "<button type=\"submit\">{IDLE_LABEL}</button>\n");
    }
    html.push_str("</form>\n</body>\n</html>\n");
    html
}

fn render_select(html: &mut String, name: &str, label: &str, options: &[&str], selected: &[String]) {
    let _ = write!(
        html,
        "<label for=\"{name}\">{label}</label>\n<select multiple id=\"{name}\" name=\"{name}\">\n"
    );
    for option in options {
        let marker = if selected.iter().any(|s| s == option) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            html,
            "<option value=\"{}\"{marker}>{}</option>",
            encode_double_quoted_attribute(option),
            encode_text(option)
        );
    }
    html.push_str("</select>\n");
}

fn render_card(html: &mut String, card: &RecipeCard) {
    let recipe = &card.recipe;
    let _ = write!(
        html,
        "<article class=\"recipe\"><h3>{}</h3>\n",
        encode_text(&recipe.name)
    );
    if let Some(ranked) = &card.ranking {
        let _ = write!(
            html,
            "<p class=\"muted\">Rank: {} - {}</p>\n",
            ranked.rank,
            encode_text(&ranked.reason)
        );
        if let Some(nutrition) = &ranked.nutrition {
            let _ = write!(html, "<p class=\"muted\">{}</p>\n", nutrition_line(nutrition));
        }
    }
    let _ = write!(
        html,
        "<p>{}</p>\n<p><strong>Required Ingredients:</strong></p>\n<ul>\n",
        encode_text(&recipe.instructions)
    );
    for ingredient in &recipe.required_ingredients {
        let _ = writeln!(html, "<li>{}</li>", encode_text(ingredient));
    }
    html.push_str("</ul></article>\n");
}

/// `"Calories: c, Protein: pg, Carbs: cg, Fat: fg"`; missing values render empty.
pub fn nutrition_line(nutrition: &NutritionEstimate) -> String {
    fn show(value: Option<u32>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }
    format!(
        "Calories: {}, Protein: {}g, Carbs: {}g, Fat: {}g",
        show(nutrition.calories),
        show(nutrition.protein),
        show(nutrition.carbs),
        show(nutrition.fat)
    )
}
