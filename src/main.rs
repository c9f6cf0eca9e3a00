use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing_subscriber::EnvFilter;

use prbell_core::{to_json_pretty, OutputFormat, PrbellConfig, Provider};
use prbell_notify::dispatch::{redact, WebhookDispatcher};
use prbell_review::github::GitHubClient;
use prbell_review::pipeline::{map_degradations, ReminderPipeline};

const CONFIG_FILE: &str = ".prbell.toml";

#[derive(Parser)]
#[command(
    name = "prbell",
    version,
    about = "Pull request review reminders for Slack and Microsoft Teams",
    long_about = "prbell finds open pull requests that are still waiting on a review and\n\
                   posts one reminder, mentioning every requested reviewer, to a Slack or\n\
                   Microsoft Teams incoming webhook.\n\n\
                   Examples:\n  \
                     prbell run                       Send the reminder\n  \
                     prbell run --dry-run             Print the webhook payload instead\n  \
                     prbell preview                   Show the message body\n  \
                     prbell init                      Create a .prbell.toml\n  \
                     prbell doctor                    Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .prbell.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable summaries (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,

    #[command(flatten)]
    overrides: Overrides,
}

/// Settings that override `.prbell.toml`.
#[derive(Args)]
struct Overrides {
    /// GitHub token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Repository in owner/repo form
    #[arg(long, global = true, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, global = true, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// Incoming webhook URL
    #[arg(long, global = true, env = "PRBELL_WEBHOOK_URL", hide_env_values = true)]
    webhook_url: Option<String>,

    /// Chat provider: slack or msteams
    #[arg(long, global = true, env = "PRBELL_PROVIDER")]
    provider: Option<String>,

    /// Slack channel
    #[arg(long, global = true, env = "PRBELL_CHANNEL")]
    channel: Option<String>,

    /// login:mentionId pairs separated by commas
    #[arg(long, global = true, env = "PRBELL_PROVIDER_MAP")]
    provider_map: Option<String>,

    /// Pull requests with this label are skipped
    #[arg(long, global = true, env = "PRBELL_IGNORE_LABEL")]
    ignore_label: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Find pull requests awaiting review and send the reminder
    #[command(long_about = "Find pull requests awaiting review and send the reminder.\n\n\
        Lists open pull requests and the review-required search concurrently, keeps\n\
        those that still have requested reviewers and lack the ignore label, and\n\
        posts a single message to the webhook. Nothing is sent when no pull request\n\
        qualifies.\n\n\
        Examples:\n  prbell run\n  prbell run --provider msteams --webhook-url https://...\n  prbell run --dry-run --format json")]
    Run {
        /// Print the webhook payload instead of posting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the reminder message without sending it
    #[command(long_about = "Print the reminder message without sending it.\n\n\
        Runs the same fetch and filtering as `run` but never calls the webhook,\n\
        so no webhook URL is required.")]
    Preview,
    /// Create a default .prbell.toml configuration file
    #[command(long_about = "Create a default .prbell.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .prbell.toml already exists.")]
    Init,
    /// Check your prbell setup and environment
    #[command(long_about = "Check your prbell setup and environment.\n\n\
        Reports on the config file, repository, GitHub token, provider, channel,\n\
        webhook URL and provider map. Use --format json for machine-readable output.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m🔔\x1b[0m \x1b[1mprbell\x1b[0m v{version}: review reminders for your team chat\n");

        println!("Quick start:");
        println!("  \x1b[36mprbell init\x1b[0m        Create a .prbell.toml config file");
        println!("  \x1b[36mprbell preview\x1b[0m     See what would be sent");
        println!("  \x1b[36mprbell run\x1b[0m         Send the reminder\n");

        println!("All commands:");
        println!("  \x1b[32mrun\x1b[0m       Send the review reminder");
        println!("  \x1b[32mpreview\x1b[0m   Print the message without sending");
        println!("  \x1b[32mdoctor\x1b[0m    Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("prbell v{version}: review reminders for your team chat\n");

        println!("Quick start:");
        println!("  prbell init        Create a .prbell.toml config file");
        println!("  prbell preview     See what would be sent");
        println!("  prbell run         Send the reminder\n");

        println!("All commands:");
        println!("  run       Send the review reminder");
        println!("  preview   Print the message without sending");
        println!("  doctor    Check your setup and environment");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'prbell <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,prbell={level},prbell_review={level},prbell_notify={level},prbell_triage={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<PrbellConfig> {
    let mut config = match path {
        Some(path) => PrbellConfig::from_file(path)
            .wrap_err_with(|| format!("loading {}", path.display()))?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                PrbellConfig::from_file(default_path).wrap_err(CONFIG_FILE)?
            } else {
                PrbellConfig::default()
            }
        }
    };

    if let Some(token) = &overrides.github_token {
        config.github.token = Some(token.clone());
    }
    if let Some(repository) = &overrides.repository {
        config.github.repository = Some(repository.clone());
    }
    if let Some(api_url) = &overrides.api_url {
        config.github.api_url = api_url.clone();
    }
    if let Some(url) = &overrides.webhook_url {
        config.notify.webhook_url = Some(url.clone());
    }
    if let Some(provider) = &overrides.provider {
        config.notify.provider = Provider::from(provider.clone());
    }
    if let Some(channel) = &overrides.channel {
        config.notify.channel = Some(channel.clone());
    }
    if let Some(map) = &overrides.provider_map {
        config.notify.github_provider_map = Some(map.clone());
    }
    if let Some(label) = &overrides.ignore_label {
        config.notify.ignore_label = Some(label.clone());
    }

    Ok(config)
}

fn build_pipeline(config: &PrbellConfig) -> Result<ReminderPipeline> {
    let client = GitHubClient::new(&config.github)?;
    Ok(ReminderPipeline::new(&config.notify, Box::new(client))?)
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(
    config: &PrbellConfig,
    config_path: Option<&Path>,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    let path = config_path.unwrap_or(Path::new(CONFIG_FILE));
    if path.exists() {
        checks.push(CheckResult::pass("config_file", path.display().to_string()));
    } else {
        checks.push(CheckResult::info(
            "config_file",
            format!("{} not found, using defaults", path.display()),
        ));
    }

    match config.github.owner_repo() {
        Ok((owner, repo)) => checks.push(CheckResult::pass("repository", format!("{owner}/{repo}"))),
        Err(e) => checks.push(CheckResult::fail(
            "repository",
            e.to_string(),
            "Pass --repository owner/repo or set GITHUB_REPOSITORY",
        )),
    }

    if config.github.token.as_deref().is_some_and(|t| !t.is_empty()) {
        checks.push(CheckResult::pass("github_token", "token set"));
    } else {
        checks.push(CheckResult::fail(
            "github_token",
            "not set",
            "Set GITHUB_TOKEN or pass --github-token",
        ));
    }

    checks.push(CheckResult::info("api_url", config.github.api_url.clone()));

    let provider = &config.notify.provider;
    if provider.is_supported() {
        checks.push(CheckResult::pass("provider", provider.to_string()));
    } else {
        checks.push(CheckResult::fail(
            "provider",
            format!("unsupported provider '{provider}'"),
            "Use slack or msteams",
        ));
    }

    if *provider == Provider::Slack {
        match config.notify.channel.as_deref().filter(|c| !c.is_empty()) {
            Some(channel) => checks.push(CheckResult::pass("channel", channel)),
            None => checks.push(CheckResult::fail(
                "channel",
                "not set",
                "Slack needs a channel. Pass --channel or set [notify] channel",
            )),
        }
    }

    match config.notify.webhook_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => checks.push(CheckResult::pass("webhook_url", redact(url))),
        None => checks.push(CheckResult::fail(
            "webhook_url",
            "not set",
            "Set PRBELL_WEBHOOK_URL or pass --webhook-url",
        )),
    }

    let malformed = map_degradations(&config.notify);
    if malformed.is_empty() {
        checks.push(CheckResult::pass("provider_map", "ok"));
    } else {
        let entries: Vec<String> = malformed.iter().map(|d| d.to_string()).collect();
        checks.push(CheckResult::info("provider_map", entries.join("; ")));
    }

    if let Some(label) = config.notify.ignore_label() {
        checks.push(CheckResult::info("ignore_label", label));
    }

    match format {
        OutputFormat::Json => {
            let version = env!("CARGO_PKG_VERSION");
            let json = serde_json::json!({
                "version": version,
                "checks": checks,
            });
            println!("{}", to_json_pretty(&json)?);
        }
        OutputFormat::Text => {
            let version = env!("CARGO_PKG_VERSION");
            println!("prbell v{version}: Environment Check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<14} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r##"# prbell Configuration
# Values here are overridden by environment variables and CLI flags.

[github]
# repository = "owner/repo"
# api_url = "https://api.github.com"
# per_page = 100
# The token is best supplied via GITHUB_TOKEN.

[notify]
# provider = "slack"            # or "msteams"
# channel = "#code-review"      # Slack only
# The webhook URL is best supplied via PRBELL_WEBHOOK_URL.
# webhook_url = "https://hooks.slack.com/services/..."
# github_provider_map = "alice:U012AB3CD,bob:U045EF6GH"
# ignore_label = "do-not-remind"
"##;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(format = %cli.format, "parsed arguments");

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Run { dry_run }) => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            config.validate(!dry_run)?;
            let pipeline = build_pipeline(&config)?;

            if dry_run {
                let prepared = pipeline.prepare().await?;
                match cli.format {
                    OutputFormat::Json => {
                        let json = serde_json::json!({
                            "report": prepared.report,
                            "envelope": prepared.envelope,
                        });
                        println!("{}", to_json_pretty(&json)?);
                    }
                    OutputFormat::Text => match &prepared.envelope {
                        Some(envelope) => println!(
                            "{}",
                            to_json_pretty(envelope)?
                        ),
                        None => println!("No pull requests need review."),
                    },
                }
                return Ok(());
            }

            let Some(webhook_url) = config.notify.webhook_url.as_deref() else {
                miette::bail!("webhook URL not set");
            };
            let dispatcher = WebhookDispatcher::new()?;
            let report = pipeline.run(&dispatcher, webhook_url).await?;

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", to_json_pretty(&report)?);
                }
                OutputFormat::Text => print!("{report}"),
            }
        }
        Some(Command::Preview) => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            config.validate(false)?;
            let prepared = build_pipeline(&config)?.prepare().await?;

            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "report": prepared.report,
                        "body": prepared.body,
                    });
                    println!("{}", to_json_pretty(&json)?);
                }
                OutputFormat::Text => {
                    if prepared.body.is_empty() {
                        println!("No pull requests need review.");
                    } else {
                        print!("{}", prepared.body);
                    }
                    for d in &prepared.report.degradations {
                        eprintln!("warning: {d}");
                    }
                }
            }
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Doctor) => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            run_doctor(&config, cli.config.as_deref(), cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "prbell", &mut std::io::stdout());
        }
    }

    Ok(())
}
