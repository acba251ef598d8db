//! # Scribe - Rich-Text Editor Core
//!
//! Command-line front end for the editor core: canonicalize HTML, inspect
//! the document tree, replay toolbar actions and publish posts.
//!
//! ## Quick Start
//!
//! ```bash
//! # Canonical HTML for a stored post
//! cargo run -- normalize post.html
//!
//! # Apply toolbar actions to the whole document
//! cargo run -- edit post.html -a format.bold -a block.h2
//!
//! # Upload images and create a post
//! cargo run -- publish post.html --title "Hello" --category rust --image cover.png
//! ```

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scribe_core::{Config, Keymap, Session, ToolbarAction};
use scribe_publish::{
    BlogClient, GalleryEvent, ImageFile, ImageGallery, PostDraft, PostStatus, StaticToken,
};

/// Scribe - rich-text editor core
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-serialize HTML in canonical form
    Normalize {
        /// Input file, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Print the document tree as JSON
    Outline {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Apply toolbar actions to the whole document and print the HTML
    Edit {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Action such as `format.bold`, `block.h2` or `style.color=#333`
        #[arg(short, long = "action", value_name = "ACTION")]
        actions: Vec<String>,
    },

    /// List keyboard shortcuts
    Keys,

    /// Fetch a stored post and print its canonical HTML
    Fetch {
        /// Post id
        id: String,

        /// Backend base URL (overrides config)
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },

    /// Upload images and submit a post
    Publish {
        /// HTML body
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long)]
        title: String,

        #[arg(long)]
        category: String,

        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// `draft` or `published`
        #[arg(long, default_value = "draft")]
        status: PostStatus,

        /// Gallery images, in order
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,

        /// Index of the preview image
        #[arg(long)]
        preview: Option<usize>,

        /// Update this post instead of creating one
        #[arg(long)]
        id: Option<String>,

        /// Manual retries after a failed upload batch
        #[arg(long, default_value_t = 0)]
        retries: u32,

        /// Backend base URL (overrides config)
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over -v
    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(filter)
        .init();

    tracing::info!("Starting Scribe v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    match args.command {
        Command::Normalize { input } => {
            println!("{}", normalize(&read_input(input.as_deref())?));
        }
        Command::Outline { input } => {
            let tree = scribe_html::deserialize(&read_input(input.as_deref())?);
            println!("{}", serde_json::to_string_pretty(&tree.outline())?);
        }
        Command::Edit { input, actions } => {
            let html = read_input(input.as_deref())?;
            println!("{}", apply_actions(&config, &html, &actions)?);
        }
        Command::Keys => {
            for (key, action) in Keymap::from_config(&config).describe() {
                println!("{key:<16} {action}");
            }
        }
        Command::Fetch { id, api_url } => {
            let mut config = config;
            if let Some(url) = api_url {
                config.api.base_url = url;
            }
            fetch(&config, &id).await?;
        }
        Command::Publish {
            input,
            title,
            category,
            tags,
            status,
            images,
            preview,
            id,
            retries,
            api_url,
        } => {
            let mut config = config;
            if let Some(url) = api_url {
                config.api.base_url = url;
            }
            let mut draft = PostDraft::new(title, String::new());
            draft.category = category;
            draft.status = status;
            for tag in &tags {
                draft.add_tag(tag);
            }
            let request = PublishRequest {
                input,
                images,
                preview,
                id,
                retries,
            };
            publish(&config, draft, request).await?;
        }
    }

    Ok(())
}

/// Reads a file, or stdin for `None`/`-`.
fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e)),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn normalize(html: &str) -> String {
    let mut tree = scribe_doc::DocumentTree::new();
    let report = scribe_html::deserialize_into(&mut tree, html);
    if !report.is_lossless() {
        tracing::warn!("Unsupported markup downgraded: {}", report.degraded.join(", "));
    }
    scribe_html::serialize(&tree)
}

/// Runs each action over the whole document, in order.
fn apply_actions(config: &Config, html: &str, actions: &[String]) -> anyhow::Result<String> {
    let mut session = Session::with_config(&config.editor);
    session.load_html(html);
    for raw in actions {
        let action = ToolbarAction::parse(raw)?;
        session.select_all();
        if !session.dispatch(&action)? {
            tracing::info!("{} changed nothing", action.display_name());
        }
    }
    Ok(session.html().to_string())
}

fn token(config: &Config) -> anyhow::Result<StaticToken> {
    Ok(StaticToken::from_env_or(
        "SCRIBE_TOKEN",
        config.api.token.as_deref(),
    )?)
}

async fn fetch(config: &Config, id: &str) -> anyhow::Result<()> {
    let client = BlogClient::new(&config.api, token(config)?)?;
    let post = client.get_post(id).await?;

    let mut session = Session::with_config(&config.editor);
    let report = session.load_html(&post.content);
    if !report.is_lossless() {
        tracing::warn!("Unsupported markup downgraded: {}", report.degraded.join(", "));
    }

    let (tx, _rx) = mpsc::unbounded_channel();
    let mut gallery = ImageGallery::new(&config.upload, tx);
    gallery.load_urls(post.image_gallery.clone(), post.preview_image.as_deref());

    eprintln!("{} ({:?}, {} images)", post.title, post.status, gallery.len());
    println!("{}", session.html());
    Ok(())
}

struct PublishRequest {
    input: PathBuf,
    images: Vec<PathBuf>,
    preview: Option<usize>,
    id: Option<String>,
    retries: u32,
}

async fn publish(config: &Config, mut draft: PostDraft, request: PublishRequest) -> anyhow::Result<()> {
    let mut session = Session::with_config(&config.editor);
    let report = session.load_html(&read_input(Some(&request.input))?);
    if !report.is_lossless() {
        tracing::warn!("Unsupported markup downgraded: {}", report.degraded.join(", "));
    }
    draft.content_html = session.html().to_string();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut gallery = ImageGallery::new(&config.upload, tx);
    let mut files = Vec::with_capacity(request.images.len());
    for path in &request.images {
        files.push(ImageFile::read(path).await?);
    }
    let accepted = gallery.add_files(files);
    if accepted < request.images.len() {
        tracing::warn!("Skipped {} file(s) that are not images", request.images.len() - accepted);
    }
    if let Some(index) = request.preview {
        gallery.set_preview(index)?;
    }

    let client = BlogClient::new(&config.api, token(config)?)?;
    let mut outcome = gallery.auto_upload_pending(&client).await;
    let mut attempts = 0;
    while let Err(e) = &outcome {
        if attempts >= request.retries || !e.is_retryable() {
            break;
        }
        attempts += 1;
        tracing::warn!("Retrying upload ({}/{}): {}", attempts, request.retries, e);
        outcome = gallery.retry_failed(&client).await;
    }
    outcome?;

    while let Ok(event) = rx.try_recv() {
        if let GalleryEvent::Uploaded { index, url } = event {
            tracing::info!("Image {} uploaded: {}", index, url);
        }
    }

    let payload = draft.to_payload(&gallery)?;
    let post = match &request.id {
        Some(id) => client.update_post(id, &payload).await?,
        None => client.create_post(&payload).await?,
    };
    println!("{}", serde_json::to_string_pretty(&post)?);
    Ok(())
}
