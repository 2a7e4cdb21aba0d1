//! Orgdir CLI - serve and query the organization directory

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use orgdir_core::api::{self, AppState};
use orgdir_core::config::Config;
use orgdir_core::domain::organization::{
    Organization, OrganizationFilter, OrganizationService, PageRequest, PaginatedResult,
    parse_lat_lon,
};
use orgdir_core::storage::{Database, DatabaseConfig};
use orgdir_core::Error;
use tracing::info;

#[derive(Parser)]
#[command(name = "orgdir")]
#[command(author, version, about = "Organization directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Database file (overrides configuration)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (defaults to server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (defaults to server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show one organization
    Get {
        /// Organization ID
        id: i64,
    },

    /// Search organizations
    Find(FindArgs),

    /// Check configuration and database health
    Doctor,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct FindArgs {
    /// Organizations in this building
    #[arg(long)]
    building_id: Option<i64>,

    /// Organizations directly linked to this industry
    #[arg(long)]
    industry_id: Option<i64>,

    /// Substring of the organization name
    #[arg(long)]
    name: Option<String>,

    /// Substring of the industry name (also matches sub-industries)
    #[arg(long)]
    industry_name: Option<String>,

    /// Substring of the building address
    #[arg(long)]
    address: Option<String>,

    /// Latitude of the search point
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude of the search point
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Polygon vertex as lat,lon (repeat for each vertex)
    #[arg(long = "polygon", value_parser = parse_polygon_point, allow_hyphen_values = true)]
    polygon: Vec<(f64, f64)>,

    /// Polygon as WKT, e.g. "POLYGON((lon lat, ...))"
    #[arg(long)]
    polygon_wkt: Option<String>,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Page size (defaults to search.default_items_per_page)
    #[arg(long)]
    items_per_page: Option<u32>,
}

impl FindArgs {
    fn filter(&self) -> OrganizationFilter {
        OrganizationFilter {
            building_id: self.building_id,
            industry_id: self.industry_id,
            organization_name: self.name.clone(),
            industry_name: self.industry_name.clone(),
            address: self.address.clone(),
            lat: self.lat,
            lon: self.lon,
            polygon: (!self.polygon.is_empty()).then(|| self.polygon.clone()),
            polygon_wkt: self.polygon_wkt.clone(),
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List all configuration values
    List,
    /// Get a configuration value
    Get {
        /// Configuration key, e.g. server.port
        key: String,
    },
    /// Show the configuration file path
    Path,
}

fn parse_polygon_point(value: &str) -> Result<(f64, f64), String> {
    parse_lat_lon(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("orgdir=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => cmd_config(action),
        Commands::Doctor => cmd_doctor(cli.database, cli.quiet).await,
        Commands::Serve { host, port } => {
            let config = load_config(cli.database)?;
            cmd_serve(config, host, port).await
        }
        Commands::Get { id } => {
            let config = load_config(cli.database)?;
            cmd_get(&config, id, cli.format).await
        }
        Commands::Find(args) => {
            let config = load_config(cli.database)?;
            cmd_find(&config, &args, cli.format, cli.quiet).await
        }
    }
}

fn load_config(database: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    if let Some(path) = database {
        config.database.path = Some(path);
    }
    Ok(config)
}

async fn open_database(config: &Config) -> anyhow::Result<Database> {
    Database::new(DatabaseConfig::from_settings(&config.database)).await
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_serve(config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let database = open_database(&config).await?;
    let service = OrganizationService::new(database.pool().clone(), config.search.clone());
    let router = api::router(AppState::new(service, database.clone()));

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!(database = %database.path().display(), "Database ready");

    api::serve(listener, router, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown requested");
    })
    .await?;

    database.close().await;
    Ok(())
}

async fn cmd_get(config: &Config, id: i64, format: OutputFormat) -> anyhow::Result<()> {
    let database = open_database(config).await?;
    let service = OrganizationService::new(database.pool().clone(), config.search.clone());

    let organization = service
        .find_organization_by_id(id)
        .await?
        .ok_or(Error::OrganizationNotFound(id))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&organization)?),
        OutputFormat::Text => print_organization(&organization),
    }

    database.close().await;
    Ok(())
}

async fn cmd_find(
    config: &Config,
    args: &FindArgs,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let database = open_database(config).await?;
    let service = OrganizationService::new(database.pool().clone(), config.search.clone());

    let page = PageRequest::new(
        args.page,
        args.items_per_page
            .unwrap_or(config.search.default_items_per_page),
    );
    let result = service.find_organizations(args.filter(), page).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_page(&result, quiet),
    }

    database.close().await;
    Ok(())
}

fn cmd_config(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(database: Option<PathBuf>, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Orgdir Health Check");
        println!("===================");
        println!();
    }

    let config = match load_config(database) {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            config
        }
        Err(e) => {
            println!("[!!] Configuration: Error - {}", e);
            anyhow::bail!("configuration is invalid");
        }
    };

    if !quiet {
        match Config::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: Error - {}", e),
        }
    }

    let mut all_ok = true;

    match open_database(&config).await {
        Ok(db) => {
            if !quiet {
                println!("[OK] Database: {}", db.path().display());
            }

            match db.health_check().await {
                Ok(()) => {
                    if !quiet {
                        println!("[OK] Database: Responding");
                    }
                }
                Err(e) => {
                    all_ok = false;
                    println!("[!!] Database: Error - {}", e);
                }
            }

            match db.migration_status().await {
                Ok(status) if !status.needs_migration => {
                    if !quiet {
                        println!("[OK] Schema: version {}", status.current_version);
                    }
                }
                Ok(status) => {
                    all_ok = false;
                    println!(
                        "[!!] Schema: version {} (expected {})",
                        status.current_version, status.target_version
                    );
                }
                Err(e) => {
                    all_ok = false;
                    println!("[!!] Schema: Error - {}", e);
                }
            }

            db.close().await;
        }
        Err(e) => {
            all_ok = false;
            println!("[!!] Database: Error - {:#}", e);
        }
    }

    if !all_ok {
        anyhow::bail!("health check failed");
    }

    if !quiet {
        println!();
        println!("All checks passed.");
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_organization(org: &Organization) {
    println!("{} (#{})", org.name, org.id);
    println!(
        "  Building: {} (#{}) at {}, {}",
        org.building.address,
        org.building.id,
        org.building.coordinates.lat,
        org.building.coordinates.lon
    );
    if !org.phones.is_empty() {
        println!("  Phones: {}", org.phones.join(", "));
    }
    if !org.industries.is_empty() {
        println!("  Industries: {}", org.industries.join(", "));
    }
}

fn print_page(result: &PaginatedResult<Organization>, quiet: bool) {
    if result.items.is_empty() {
        if !quiet {
            println!("No organizations found.");
        }
        return;
    }

    for org in &result.items {
        if quiet {
            println!("{}\t{}", org.id, org.name);
        } else {
            print_organization(org);
        }
    }

    if !quiet {
        println!();
        println!(
            "Page {}: {} shown{}",
            result.page,
            result.items.len(),
            if result.has_more {
                ", more results on the next page"
            } else {
                ""
            }
        );
    }
}
