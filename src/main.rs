use anyhow::{Context, Result};
use fridge_feast::cli::{parse_args, Command};
use fridge_feast::config::AppConfig;
use fridge_feast::feast::{run_feast, FeastRequest};
use fridge_feast::page::nutrition_line;
use fridge_feast::server::{serve, AppState};
use fridge_feast::telemetry::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env before clap reads the environment
    init_tracing();

    let cli_args = parse_args();
    let config = AppConfig::from_cli(&cli_args);
    let provider = config
        .build_provider()
        .with_context(|| format!("Failed to set up chat provider '{}'", config.provider))?;
    info!(
        provider = provider.provider_name(),
        model = %config.model.model,
        "chat provider ready"
    );

    match cli_args.command {
        Command::Serve { bind } => {
            serve(bind, AppState::new(provider, config.model))
                .await
                .with_context(|| format!("Server on {} stopped with an error", bind))?;
        }
        Command::Suggest {
            ingredients,
            dietary_restrictions,
            cuisine_preferences,
        } => {
            let request = FeastRequest {
                ingredients,
                dietary_restrictions,
                cuisine_preferences,
            };
            let outcome = run_feast(provider.as_ref(), &config.model, &request)
                .await
                .context("Recipe suggestion failed")?;

            if outcome.recipes.is_empty() {
                println!("No recipes suggested.");
            }
            for card in outcome.cards() {
                println!("\n{}", card.recipe.name);
                if let Some(ranked) = &card.ranking {
                    println!("  Rank: {} - {}", ranked.rank, ranked.reason);
                    if let Some(nutrition) = &ranked.nutrition {
                        println!("  {}", nutrition_line(nutrition));
                    }
                }
                println!("  {}", card.recipe.instructions);
                println!("  Required Ingredients:");
                for ingredient in &card.recipe.required_ingredients {
                    println!("   - {}", ingredient);
                }
            }
        }
    }

    Ok(())
}
