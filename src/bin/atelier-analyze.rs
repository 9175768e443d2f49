// atelier-analyze - run the outfit analysis pipeline on a local photo

use anyhow::Context;
use atelier::orchestration::{
    AnalysisMode, AnalysisResponse, AtelierConfig, Orchestrator, Upload, decode_data_url,
};
use clap::Parser;
use std::path::PathBuf;
use termimad::{MadSkin, crossterm::style::Color};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Analyze an outfit photo and get styling advice", long_about = None)]
struct Args {
    /// Photo to analyze (png, jpg, jpeg, gif, webp)
    image: PathBuf,

    /// What you want advice on
    #[arg(short, long)]
    query: Option<String>,

    /// quick skips trend research and uses faster models
    #[arg(short, long, default_value = "deep")]
    mode: AnalysisMode,

    /// Config file (defaults to ./atelier.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the raw JSON response
    #[arg(long)]
    json: bool,

    /// Write the generated outfit image here
    #[arg(long)]
    save_image: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("atelier={}", log_level).into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AtelierConfig::load(args.config.as_deref())?;
    let orchestrator = Orchestrator::from_config(&config)?;

    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let upload = Upload {
        image: Some(bytes),
        content_type: None,
        filename: Some(args.image.to_string_lossy().into_owned()),
        query: args.query.clone(),
        mode: args.mode,
    };

    let response = orchestrator.analyze(upload).await?;

    if let Some(path) = &args.save_image {
        save_image(&response, path).await?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_report(&response, args.save_image.as_ref());
    }

    Ok(())
}

async fn save_image(response: &AnalysisResponse, path: &PathBuf) -> anyhow::Result<()> {
    let Some(url) = &response.generated_image_url else {
        eprintln!("⚠ No generated image to save");
        return Ok(());
    };
    let (_, bytes) = decode_data_url(url).context("Generated image is not a base64 data URL")?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn print_report(response: &AnalysisResponse, saved_to: Option<&PathBuf>) {
    let skin = create_markdown_skin();
    skin.print_text(&render_markdown(response));

    if !response.stage_errors.is_empty() {
        println!();
        for error in &response.stage_errors {
            println!("❌ {}: {}", error.stage, error.message);
        }
    }

    match (&response.generated_image_url, &response.image_generation_error) {
        (Some(_), _) => match saved_to {
            Some(path) => println!("\n🖼  Outfit image saved to {}", path.display()),
            None => println!("\n🖼  Outfit image generated (use --save-image to keep it)"),
        },
        (None, Some(error)) => println!("\n⚠ Image generation failed: {}", error),
        (None, None) => {}
    }
}

fn render_markdown(response: &AnalysisResponse) -> String {
    let mut text = format!("# Outfit analysis ({} mode)\n\n", response.analysis_mode);

    text.push_str("## What you're wearing\n\n");
    match &response.visual_analysis {
        Some(v) => {
            text.push_str(&format!("* **Style:** {}\n", v.gender_style));
            text.push_str(&format!("* **Cut:** {}\n", v.cut));
            text.push_str(&format!("* **Color:** {}\n", v.color));
            text.push_str(&format!("* **Fabric:** {}\n", v.fabric));
            text.push_str(&format!("* **Occasion:** {}\n\n", v.occasion));
        }
        None => text.push_str("*Visual analysis unavailable*\n\n"),
    }

    if let Some(trends) = &response.trend_summary {
        text.push_str("## Trends\n\n");
        text.push_str(trends);
        text.push_str("\n\n");
    }

    text.push_str("## Styling advice\n\n");
    text.push_str(response.final_report.as_deref().unwrap_or("*No advice available*"));
    text.push('\n');
    text
}

fn create_markdown_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.headers[0].set_fg(Color::Magenta);
    skin.headers[1].set_fg(Color::Cyan);
    skin.bold.set_fg(Color::White);
    skin.italic.set_fg(Color::DarkGrey);
    skin
}
