mod cli;

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use magickit::{
    config::ini::IniConfig,
    logger,
    printer::StatusPrinter,
    tools::{self, Address},
    Config, ErrorInfo, LogFormat, Response,
};
use tracing::{debug, info};

use cli::{Command, HashAlgorithm};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let cfg = Config::load();
    let mut log = cfg.log_config()?;
    if let Some(level) = &args.log_level {
        log.level = level.clone();
    }
    if let Some(format) = &args.log_format {
        log.format = format.parse::<LogFormat>()?;
    }
    if let Some(file) = &args.log_file {
        log.file = Some(file.clone());
    }
    logger::init(&log)?;
    debug!(config = %cfg.config_path.display(), "configuration loaded");

    // Shell selection reads SHELL_NAME from the environment
    if let Some(shell) = cfg.get("SHELL_NAME").filter(|s| !s.eq_ignore_ascii_case("auto")) {
        std::env::set_var("SHELL_NAME", shell);
    }
    let json_indent = cfg.get_usize("MAGICKIT_JSON_INDENT").unwrap_or(2);

    match args.command {
        Command::Exec {
            indent,
            timeout,
            retries,
            summary,
            command,
        } => {
            let response = run_exec(&cfg, command, timeout, retries).await?;
            if summary {
                StatusPrinter::default().print(&response);
            } else {
                println!("{}", response.to_json(indent_option(indent.unwrap_or(json_indent)))?);
            }
            if !response.success() {
                std::process::exit(1);
            }
        }
        Command::Now { format } => {
            let fmt = format.as_deref().unwrap_or(tools::time::DEFAULT_FORMAT);
            println!("{}", tools::time::now_string(fmt));
        }
        Command::Hash { algorithm, text } => {
            let out = match algorithm {
                HashAlgorithm::Md5 => tools::encode::md5_hex(&text),
                HashAlgorithm::Sha256 => tools::encode::sha256_hex(&text),
                HashAlgorithm::Base64 => tools::encode::base64_encode(&text),
            };
            println!("{out}");
        }
        Command::Addr { address } => {
            let addr = Address::parse(&address)?;
            println!("{}", render(&addr, json_indent)?);
        }
        Command::Ini { file } => {
            let ini = IniConfig::load(&file).with_context(|| format!("reading {}", file.display()))?;
            println!("{}", render(&ini.to_value(), json_indent)?);
        }
    }
    Ok(())
}

fn indent_option(indent: usize) -> Option<usize> {
    (indent > 0).then_some(indent)
}

fn render<T: serde::Serialize>(value: &T, indent: usize) -> Result<String> {
    Ok(match indent_option(indent) {
        Some(width) => tools::json::to_string_indented(value, width)?,
        None => tools::json::to_json_string(value)?,
    })
}

/// Run `command` under the retry policy. The time limit applies to each
/// attempt and kills the shell when it passes.
async fn run_exec(cfg: &Config, command: String, timeout: Option<f64>, retries: Option<u32>) -> Result<Response<String>> {
    let mut retry = cfg.retry_policy().name(command.as_str());
    retry = match retries {
        Some(extra) => retry.attempts(extra.saturating_add(1)),
        None if cfg.get("MAGICKIT_RETRY_ATTEMPTS").is_some() => retry,
        None => retry.attempts(1),
    };
    info!(command = %command, attempts = retry.max_attempts(), "running command");

    let limit = timeout
        .map(|secs| Duration::try_from_secs_f64(secs).map_err(|e| anyhow!("invalid --timeout {secs}: {e}")))
        .transpose()?;
    let cmd: &str = &command;
    let start = Instant::now();
    let outcome = retry
        .run_async(|| tools::command::execute_checked_async(cmd, limit))
        .await
        .map_err(|e| ErrorInfo::from_error(&e));

    let response = Response::from_outcome(outcome, start.elapsed());
    Ok(match timeout {
        Some(secs) => response.with_metadata("timeout_secs", secs),
        None => response,
    })
}
