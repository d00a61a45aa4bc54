use std::io::Read;
use std::path::PathBuf;

use agora_editor_core::render_delta_to_html;
use agora_richtext::{
    ContentConfig, ContentError, ContentNode, FontBounds, Payload, StoredContent,
    render_payload_to_html, serialize_tree_with,
};
use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde_json::Value;

#[derive(Parser)]
#[command(author, version, about = "Forum rich-text content tool")]
#[command(propagate_version = true)]
struct Cli {
    /// Smallest font size kept when sanitizing, in px
    #[arg(long, global = true, env = "AGORA_FONT_MIN")]
    font_min: Option<u32>,

    /// Largest font size kept when sanitizing, in px
    #[arg(long, global = true, env = "AGORA_FONT_MAX")]
    font_max: Option<u32>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render stored content to HTML
    Render {
        /// JSON file to read, stdin if omitted or "-"
        input: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = RenderMode::Payload)]
        mode: RenderMode,
    },
    /// Rewrite any accepted content shape as a full stored record
    Normalize {
        input: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },
    /// Validate a payload or stored record without repairing it
    Check { input: Option<PathBuf> },
    /// Print the plain text of stored content
    Text { input: Option<PathBuf> },
    /// Convert a pasted content tree into a stored record
    Paste { input: Option<PathBuf> },
}

#[derive(Clone, Copy, ValueEnum)]
enum RenderMode {
    /// Display markup for posts: one span per styled run
    Payload,
    /// Editor markup from the delta: paragraphs, lists and headers
    Editor,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_miette();
    init_tracing(&cli.log);

    let bounds = font_bounds(&cli);
    tracing::debug!(min = bounds.min, max = bounds.max, "font bounds");

    let output = match cli.command {
        Commands::Render { input, mode } => render(&read_input(input.as_ref())?, mode, bounds)?,
        Commands::Normalize { input, pretty } => {
            normalize(&read_input(input.as_ref())?, pretty, bounds)?
        }
        Commands::Check { input } => check(&read_input(input.as_ref())?)?,
        Commands::Text { input } => text(&read_input(input.as_ref())?, bounds)?,
        Commands::Paste { input } => paste(&read_input(input.as_ref())?, bounds)?,
    };
    println!("{output}");
    Ok(())
}

fn font_bounds(cli: &Cli) -> FontBounds {
    // clap already read the same env vars; start from defaults and overlay
    let defaults = ContentConfig::default().font_bounds;
    FontBounds::new(
        cli.font_min.unwrap_or(defaults.min),
        cli.font_max.unwrap_or(defaults.max),
    )
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .into_diagnostic()
                .wrap_err("Failed to read stdin")?;
            Ok(raw)
        }
    }
}

fn render(raw: &str, mode: RenderMode, bounds: FontBounds) -> Result<String> {
    let stored = StoredContent::from_json_str(raw, bounds)?;
    let html = match mode {
        RenderMode::Payload => render_payload_to_html(&stored.content_rich),
        RenderMode::Editor => match render_delta_to_html(&stored.content_delta) {
            html if html.is_empty() && !stored.content_text.is_empty() => {
                tracing::info!("editor render empty, using payload markup");
                render_payload_to_html(&stored.content_rich)
            }
            html => html,
        },
    };
    Ok(html)
}

fn normalize(raw: &str, pretty: bool, bounds: FontBounds) -> Result<String> {
    let stored = StoredContent::from_json_str(raw, bounds)?;
    if pretty {
        serde_json::to_string_pretty(&stored)
            .map_err(ContentError::from)
            .map_err(Into::into)
    } else {
        Ok(stored.to_json()?)
    }
}

/// Strict validation: a payload (bare or under `contentRich`) must decode and
/// hold the run invariants as written.
fn check(raw: &str) -> Result<String> {
    let value: Value = serde_json::from_str(raw).map_err(ContentError::from)?;
    let rich = value
        .get("contentRich")
        .filter(|rich| !rich.is_null())
        .cloned()
        .unwrap_or(value);
    let payload: Payload = serde_json::from_value(rich).map_err(ContentError::from)?;
    payload.check().map_err(ContentError::from)?;
    Ok(format!(
        "ok: {} chars in {} runs",
        payload.len_chars(),
        payload.runs.len()
    ))
}

fn text(raw: &str, bounds: FontBounds) -> Result<String> {
    Ok(StoredContent::from_json_str(raw, bounds)?.content_text)
}

fn paste(raw: &str, bounds: FontBounds) -> Result<String> {
    let node: ContentNode = serde_json::from_str(raw)
        .map_err(ContentError::from)
        .wrap_err("Input is not a content tree")?;
    let payload = serialize_tree_with(&node, bounds);
    Ok(StoredContent::from_payload(&payload, bounds).to_json()?)
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(3)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}

fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .compact()
                .with_filter(env_filter),
        )
        .init();
}
