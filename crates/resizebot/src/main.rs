use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, error, info};
use resizebot_core::audit::SqliteAuditStore;
use resizebot_core::config::{BotConfig, config_base_dir, load_config};
use resizebot_core::logging::init_logger;
use resizebot_core::profile::{SiteProfile, resolve_profiles};
use resizebot_core::resize::ImageCrateResizer;
use resizebot_core::runner::{connect_sites, purge_work_dir, run_forever, run_sweep};

const RESTART_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(
    name = "resizebot",
    version,
    about = "Shrinks oversized non-free images on request"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH", default_value = "resizebot.toml")]
    config: PathBuf,
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        value_parser = parse_level_filter,
        help = "Overrides RUST_LOG"
    )]
    log_level: Option<LevelFilter>,
    #[arg(long, global = true, value_name = "PATH", help = "Append log output to a file")]
    error_log: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sweep every enabled site forever, restarting after failures
    Run,
    /// Sweep every enabled site once
    Sweep(SweepArgs),
    /// Print the resolved site profiles
    Sites,
    Db(DbArgs),
}

#[derive(Debug, Args)]
struct SweepArgs {
    #[arg(long, help = "Print the sweep report as JSON")]
    json: bool,
}

#[derive(Debug, Args)]
struct DbArgs {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    /// Create the audit table
    Init,
    /// Show the most recent resize attempts
    Recent {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

struct Runtime {
    config: BotConfig,
    base_dir: PathBuf,
}

impl Runtime {
    fn load(config_path: &Path) -> Result<Self> {
        Ok(Self {
            config: load_config(config_path)?,
            base_dir: config_base_dir(config_path),
        })
    }

    fn work_dir(&self) -> PathBuf {
        self.config.work_dir(&self.base_dir)
    }

    fn open_audit(&self) -> Result<SqliteAuditStore> {
        SqliteAuditStore::open(&self.config.db_path(&self.base_dir))
    }

    fn profiles(&self) -> Result<Vec<SiteProfile>> {
        resolve_profiles(&self.config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    let runtime = Runtime::load(&cli.config)?;

    match cli.command {
        Commands::Run => run_supervised(&runtime),
        Commands::Sweep(args) => run_single_sweep(&runtime, args),
        Commands::Sites => run_sites(&runtime),
        Commands::Db(DbArgs { command }) => match command {
            DbSubcommand::Init => run_db_init(&runtime),
            DbSubcommand::Recent { limit } => run_db_recent(&runtime, limit),
        },
    }
}

/// `RUST_LOG` may come from either `.env` file, so they load first.
fn init_logging(cli: &Cli) -> Result<()> {
    load_env_files(&cli.config);
    init_logger(cli.log_level, cli.error_log.as_deref())
}

/// `.env` from the working directory, then the one beside the config file,
/// which wins.
fn load_env_files(config_path: &Path) {
    dotenvy::dotenv().ok();
    let project_env = config_base_dir(config_path).join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path_override(&project_env);
    }
}

fn run_supervised(runtime: &Runtime) -> Result<()> {
    loop {
        match run_once_forever(runtime) {
            Ok(()) => info!("runner stopped"),
            Err(run_error) => error!("runner failed: {run_error:#}"),
        }
        info!("restarting in {}s", RESTART_DELAY.as_secs());
        thread::sleep(RESTART_DELAY);
    }
}

fn run_once_forever(runtime: &Runtime) -> Result<()> {
    let mut sessions = connect_sites(&runtime.config, runtime.profiles()?)?;
    let mut audit = runtime.open_audit()?;
    run_forever(
        &mut sessions,
        &ImageCrateResizer::default(),
        &mut audit,
        &runtime.work_dir(),
        runtime.config.sleep_interval(),
    )
}

fn run_single_sweep(runtime: &Runtime, args: SweepArgs) -> Result<()> {
    let mut sessions = connect_sites(&runtime.config, runtime.profiles()?)?;
    let mut audit = runtime.open_audit()?;
    let work_dir = runtime.work_dir();
    std::fs::create_dir_all(&work_dir)
        .with_context(|| format!("failed to create {}", normalize_path(&work_dir)))?;

    let report = run_sweep(
        &mut sessions,
        &ImageCrateResizer::default(),
        &mut audit,
        &work_dir,
    );
    let purged = purge_work_dir(&work_dir)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for site in &report.sites {
        println!("site: {}", site.site);
        if let Some(scan_error) = &site.scan_error {
            println!("  scan_error: {scan_error}");
            continue;
        }
        println!("  discovered: {}", site.discovered);
        for page in &site.pages {
            println!("  {}: {}", page.title, page.outcome.as_str());
        }
        for (title, reason) in &site.failed {
            println!("  {title}: skipped ({reason})");
        }
        println!("  requests: {}", site.requests);
    }
    println!("processed: {}", report.processed());
    println!("succeeded: {}", report.succeeded());
    println!("failures: {}", report.failures());
    println!("purged_files: {purged}");
    Ok(())
}

fn run_sites(runtime: &Runtime) -> Result<()> {
    for profile in runtime.profiles()? {
        println!("site: {}", profile.key);
        println!("  api_url: {}", profile.api_url);
        println!("  template: {}", profile.template_name);
        println!("  aliases: {}", profile.template_aliases.join(", "));
        println!("  pattern: {}", profile.trigger_pattern.as_str());
        println!("  log_section: {}", profile.log_section);
    }
    Ok(())
}

fn run_db_init(runtime: &Runtime) -> Result<()> {
    let db_path = runtime.config.db_path(&runtime.base_dir);
    let store = SqliteAuditStore::open(&db_path)?;
    println!("db_path: {}", normalize_path(&db_path));
    println!("rows: {}", store.count()?);
    Ok(())
}

fn run_db_recent(runtime: &Runtime, limit: usize) -> Result<()> {
    let store = runtime.open_audit()?;
    let rows = store.recent(limit)?;
    if rows.is_empty() {
        println!("<no resize attempts recorded>");
    }
    for row in rows {
        println!("{}", row.record);
    }
    Ok(())
}

fn parse_level_filter(value: &str) -> Result<LevelFilter, String> {
    value
        .parse::<LevelFilter>()
        .map_err(|_| format!("unknown log level: {value}"))
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
