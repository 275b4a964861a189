use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use route_tree::config::load_config;
use route_tree::lifecycle::{build_registry, load_tree};
use route_tree::observability::init_logging;
use route_tree::routing::{ParameterSources, RouteRegistry};
use route_tree::sitemap::sitemap_entries;

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Management CLI for the localized route tree", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "admin-secret-key")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status and expansion warnings
    Status,
    /// List registered routes
    Routes {
        /// Expand locally from a site config instead of asking the server
        #[arg(long)]
        local: Option<PathBuf>,
    },
    /// Show sitemap entries
    Sitemap {
        /// Expand locally from a site config instead of asking the server
        #[arg(long)]
        local: Option<PathBuf>,
    },
    /// Delete the route cache and drop the active route set
    ClearCache,
    /// Clear the cache and expand again
    Rebuild,
    /// Expand the tree offline and write the route cache
    Compile {
        #[arg(short, long, default_value = "site.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Routes { local: Some(config) } => {
            let registry = local_registry(config)?;
            let compiled = registry.get_or_build()?;
            println!("{}", serde_json::to_string_pretty(compiled.routes.as_slice())?);
            return Ok(());
        }
        Commands::Sitemap { local: Some(config) } => {
            let site = load_config(config)?;
            let registry = local_registry(config)?;
            let compiled = registry.get_or_build()?;
            let entries = sitemap_entries(&compiled.tree, &compiled.routes, &site.sitemap)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }
        Commands::Compile { config } => {
            return compile(config);
        }
        _ => {}
    }

    let client = reqwest::Client::new();
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Routes { .. } => client.get(format!("{}/admin/routes", cli.url)),
        Commands::Sitemap { .. } => client.get(format!("{}/admin/sitemap", cli.url)),
        Commands::ClearCache => client.post(format!("{}/admin/cache/clear", cli.url)),
        Commands::Rebuild => client.post(format!("{}/admin/cache/rebuild", cli.url)),
        Commands::Compile { .. } => return Ok(()),
    }
    .headers(headers)
    .send()
    .await?;
    print_response(res).await
}

fn local_registry(config: &Path) -> Result<RouteRegistry, Box<dyn std::error::Error>> {
    let mut site = load_config(config)?;
    // Listing never touches the cache.
    site.cache.enabled = false;
    let tree = load_tree(&site)?;
    let sources = ParameterSources::from_tree(&tree);
    Ok(build_registry(&site, tree, sources))
}

fn compile(config: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut site = load_config(config)?;
    init_logging(&site.observability);
    site.cache.enabled = true;

    let tree = load_tree(&site)?;
    let sources = ParameterSources::from_tree(&tree);
    let registry = build_registry(&site, tree, sources);
    // Always expand; a stale blob must not short-circuit compilation.
    let compiled = registry.rebuild()?;

    for issue in &compiled.issues {
        eprintln!("warning: {issue}");
    }
    println!(
        "Compiled {} routes into {}",
        compiled.routes.len(),
        site.cache.path
    );
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
