use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "senera", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select items and save a collage; prints the response as JSON.
    Collage(CollageArgs),
    /// Build a collage and render an outfit from it.
    Outfit(OutfitArgs),
    /// Print the collage layout plan as JSON.
    Plan(PlanArgs),
}

#[derive(Args, Debug)]
struct Common {
    /// Inventory JSON (array of wardrobe items).
    #[arg(long)]
    inventory: PathBuf,

    /// Owner whose items are considered.
    #[arg(long)]
    owner: u64,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the uploads directory photos are read from and outputs written to.
    #[arg(long)]
    uploads_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CollageArgs {
    #[command(flatten)]
    common: Common,

    /// Target tags JSON (facet -> values); skips prompt interpretation.
    #[arg(long, conflicts_with = "prompt", required_unless_present = "prompt")]
    tags: Option<PathBuf>,

    /// Free-text style request.
    #[arg(long)]
    prompt: Option<String>,

    /// Also copy the collage PNG here.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct OutfitArgs {
    #[command(flatten)]
    common: Common,

    /// Free-text style request.
    #[arg(long)]
    prompt: String,

    /// Backend to try first (dalle, pollinations, huggingface, replicate).
    #[arg(long)]
    backend: Option<senera::BackendKind>,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    common: Common,

    /// Target tags JSON (facet -> values).
    #[arg(long)]
    tags: PathBuf,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Collage(args) => cmd_collage(args),
        Command::Outfit(args) => cmd_outfit(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(common: &Common) -> anyhow::Result<senera::EngineConfig> {
    let mut config = senera::EngineConfig::load(common.config.as_deref())?;
    if let Some(dir) = &common.uploads_dir {
        config.uploads_dir = dir.clone();
    }
    Ok(config)
}

fn build_engine(
    common: &Common,
    config: &senera::EngineConfig,
) -> anyhow::Result<senera::OutfitEngine> {
    let inventory = senera::MemoryInventory::from_json_file(&common.inventory)?;
    tracing::debug!(items = inventory.len(), "inventory loaded");
    Ok(senera::OutfitEngine::from_config(
        config,
        Box::new(inventory),
    )?)
}

fn read_tags(path: &Path) -> anyhow::Result<senera::TargetTagSet> {
    let bytes = std::fs::read(path).with_context(|| format!("read tags '{}'", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).with_context(|| "parse tags JSON")?;
    Ok(senera::TargetTagSet::from_payload(
        &value,
        &senera::TagVocabulary::standard(),
    )?)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_collage(args: CollageArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    let engine = build_engine(&args.common, &config)?;
    let owner = senera::OwnerId(args.common.owner);

    let response = match (&args.tags, &args.prompt) {
        (Some(tags), _) => engine.collage_for_tags(read_tags(tags)?, owner)?,
        (None, Some(prompt)) => engine.generate_collage(prompt, owner)?,
        (None, None) => anyhow::bail!("either --tags or --prompt is required"),
    };

    if let Some(out) = &args.out {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::copy(&response.collage_path, out)
            .with_context(|| format!("write png '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }
    print_json(&response)
}

fn cmd_outfit(args: OutfitArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    let engine = build_engine(&args.common, &config)?;
    let owner = senera::OwnerId(args.common.owner);

    match engine.generate_complete_outfit(&args.prompt, owner, args.backend) {
        Ok(response) => print_json(&response),
        Err(err) => {
            tracing::error!(
                kind = ?err.kind(),
                detail = err.detail().unwrap_or(""),
                "outfit generation failed"
            );
            Err(err.into())
        }
    }
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    let inventory = senera::MemoryInventory::from_json_file(&args.common.inventory)?;
    let target = read_tags(&args.tags)?;
    let selection = senera::select(
        &target,
        &inventory,
        senera::OwnerId(args.common.owner),
        config.selection.max_per_category,
        &config.selection.weights,
    )?;
    let plan = senera::plan(&selection, &config.layout)?;
    print_json(&plan)
}
