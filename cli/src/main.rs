//! paramgate CLI — driving adapter for the paramgate policy engine.
//!
//! Subcommands:
//! - `check <policy>` — validate that the policy's rules compile
//! - `validate <policy> <url>...` — print whether each URL is permitted
//! - `normalize <policy> <url>...` — print each URL with disallowed pairs stripped
//! - `explain <policy> <url> [--json]` — print how every pair was judged

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use paramgate::Validator;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "paramgate")]
#[command(about = "Validate and normalize URL query parameters against a policy")]
struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the policy's rules compile
    Check {
        /// Policy file (.yaml, .yml or .json)
        policy: PathBuf,
    },
    /// Print whether each URL is permitted
    Validate {
        policy: PathBuf,
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print each URL with disallowed parameters removed
    Normalize {
        policy: PathBuf,
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Show how every parameter of a URL was judged
    Explain {
        policy: PathBuf,
        url: String,
        /// Emit the trace as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Check { policy } => cmd_check(&policy),
        Command::Validate { policy, urls } => cmd_validate(&policy, &urls),
        Command::Normalize { policy, urls } => cmd_normalize(&policy, &urls),
        Command::Explain { policy, url, json } => cmd_explain(&policy, &url, json),
    }
}

fn cmd_check(path: &Path) -> Result<(), String> {
    let validator = load_policy(path)?.build()?;
    println!("Rules valid ({} groups)", validator.rules().len());
    Ok(())
}

fn cmd_validate(path: &Path, urls: &[String]) -> Result<(), String> {
    let validator = load_policy(path)?.build()?;
    let rejected = urls
        .iter()
        .filter(|url| {
            let valid = validator.validate_url(url);
            println!("{}\t{url}", if valid { "valid" } else { "invalid" });
            !valid
        })
        .count();
    if rejected > 0 {
        return Err(format!("{rejected} of {} URLs rejected", urls.len()));
    }
    Ok(())
}

fn cmd_normalize(path: &Path, urls: &[String]) -> Result<(), String> {
    let validator = load_policy(path)?.build()?;
    for url in urls {
        println!("{}", validator.normalize_url(url));
    }
    Ok(())
}

fn cmd_explain(path: &Path, url: &str, json: bool) -> Result<(), String> {
    let validator = load_policy(path)?.build()?;
    let trace = validator.explain_url(url);
    if json {
        let out = serde_json::to_string_pretty(&trace).map_err(|e| format!("JSON encode error: {e}"))?;
        println!("{out}");
    } else {
        println!("{trace}");
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Policy loading
// ═══════════════════════════════════════════════════════════════════════════════

/// On-disk policy: rule text plus the bundled plugins to enable.
#[derive(Debug, Deserialize)]
struct Policy {
    rules: Rules,
    /// Bundled plugin names, in dispatch order.
    #[serde(default)]
    plugins: Vec<String>,
}

/// One rule string, or a list of groups joined with `;`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Rules {
    Text(String),
    Groups(Vec<String>),
}

impl Policy {
    fn rule_text(&self) -> String {
        match &self.rules {
            Rules::Text(text) => text.clone(),
            Rules::Groups(groups) => groups.join(";"),
        }
    }

    fn build(&self) -> Result<Validator, String> {
        let mut builder = Validator::builder();
        for name in &self.plugins {
            let plugin = paramgate_plugins::plugin_by_name(name)
                .ok_or_else(|| format!("unknown plugin \"{name}\""))?;
            builder = builder.plugins([plugin]);
        }
        builder
            .build(&self.rule_text())
            .map_err(|e| format!("rules invalid: {e}"))
    }
}

fn load_policy(path: &Path) -> Result<Policy, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read \"{}\": {e}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let policy = parse_policy(&content, is_json)?;
    tracing::debug!(
        path = %path.display(),
        format = if is_json { "json" } else { "yaml" },
        plugins = ?policy.plugins,
        "policy loaded"
    );
    Ok(policy)
}

fn parse_policy(content: &str, is_json: bool) -> Result<Policy, String> {
    if is_json {
        serde_json::from_str(content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(content).map_err(|e| format!("YAML parse error: {e}"))
    }
}
