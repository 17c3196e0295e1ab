//! BoardSight - business intelligence over monday.com boards
//!
//! A CLI tool that syncs a Deals board and a Work Orders board, cleans and
//! aligns them, and answers leadership questions through an LLM agent
//! with analysis tools.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing credentials, failed sync, LLM failure, etc.)

mod agent;
mod align;
mod analysis;
mod cli;
mod config;
mod models;
mod monday;
mod normalize;
mod report;
mod session;
mod sync;

use agent::tools::TOOLS;
use agent::BiAgent;
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use monday::MondayClient;
use normalize::KeywordRules;
use report::{render_dashboard, HeadlineMetrics};
use session::SessionState;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging so its verbose flag sets the level
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("BoardSight v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "Deals board: {:?}, Work Orders board: {:?}",
        config.monday.deals_board_id, config.monday.orders_board_id
    );

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .boardsight.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Set deals_board_id and orders_board_id under [monday] to get started.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Sync the boards, show the dashboard, then answer questions. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    // Credentials and board IDs are checked before any network call
    let Some(monday_key) = non_empty(args.monday_api_key.as_deref()) else {
        eprintln!("❌ Missing monday.com API key. Set MONDAY_API_KEY or pass --monday-api-key.");
        return Ok(1);
    };

    let (Some(deals_board), Some(orders_board)) = (
        non_empty(config.monday.deals_board_id.as_deref()),
        non_empty(config.monday.orders_board_id.as_deref()),
    ) else {
        eprintln!(
            "❌ Both board IDs are required. Pass --deals-board and --orders-board or set them in {}.",
            DEFAULT_CONFIG_FILE
        );
        return Ok(1);
    };

    let llm_key = non_empty(args.llm_api_key.as_deref());
    if args.uses_agent() && llm_key.is_none() {
        eprintln!("❌ Missing LLM API key. Set GROQ_API_KEY or pass --llm-api-key.");
        return Ok(1);
    }

    // Step 1: Sync both boards
    println!("🔄 Syncing monday.com boards...");
    let client =
        MondayClient::new(monday_key, &config.monday).context("Failed to create monday.com client")?;
    let rules = KeywordRules::from(&config.normalize);
    let mut state = SessionState::new();

    let spinner = sync_spinner(args.quiet);
    let synced = sync::synchronize(&client, deals_board, orders_board, &rules, &mut state).await;
    spinner.finish_and_clear();

    match synced {
        Ok(report) => println!(
            "✅ Synced {} deals ({} columns) and {} work orders ({} columns)",
            report.deal_rows, report.deal_columns, report.order_rows, report.order_columns
        ),
        Err(e) => {
            warn!("Sync failed: {}", e);
            eprintln!("❌ Sync failed: {}. Check the board IDs and API key.", e);
            return Ok(1);
        }
    }

    // Step 2: Dashboard
    let metrics = HeadlineMetrics::from_state(&state, &config.general.focus_sector);
    println!("\n{}", render_dashboard(&metrics));

    // Step 3: Optional audit export
    if let Some(ref path) = args.export {
        let content = match args.format {
            OutputFormat::Json => report::generate_json_export(&state, &metrics)?,
            OutputFormat::Markdown => report::generate_markdown_export(&state, &metrics),
        };
        report::write_export(path, &content)?;
        println!("📝 Export saved to: {}", path.display());
    }

    if args.no_agent {
        print_tool_outputs(&state);
        return Ok(0);
    }

    // Step 4: Questions
    let Some(llm_key) = llm_key else {
        println!("💡 Use --ask \"question\" or --chat to query the data.");
        return Ok(0);
    };

    println!("🤖 Model: {}", config.model.name);
    let mut agent = BiAgent::new(config.agent_config(), llm_key.to_string())?;

    if let Some(ref question) = args.ask {
        let answer = agent.ask(&state, question).await?;
        println!("\n{}\n", answer);
    } else if args.chat {
        run_chat(&mut agent, &state).await?;
    }

    Ok(0)
}

/// Interactive question loop on stdin. History is kept across questions.
async fn run_chat(agent: &mut BiAgent, state: &SessionState) -> Result<()> {
    println!("\n💬 Ask about your pipeline and execution. Type 'exit' to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let question = line.trim();

        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        match agent.ask(state, question).await {
            Ok(answer) => println!("\n{}\n", answer),
            Err(e) => {
                error!("Question failed: {}", e);
                eprintln!("❌ {:#}\n", e);
            }
        }
    }

    debug!("Chat ended with {} messages in history", agent.history_len());
    Ok(())
}

/// Handle --no-agent: run every analysis tool and print its output.
fn print_tool_outputs(state: &SessionState) {
    println!("🔍 Analysis (no LLM call):\n");
    for tool in TOOLS {
        println!("   {}:", tool.name);
        println!("   {}\n", (tool.handler)(state, ""));
    }
}

/// Spinner shown while both boards are fetched.
fn sync_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Fetching Deals and Work Orders...");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is installed, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", DEFAULT_CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
