use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use linkback_sender::{
    EndpointResult, FailureReason, LinkbackRequest, PingbackOutcome, PingbackSender, SenderConfig,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_args(args: &ArgMatches) -> Self {
        match args.get_one::<String>("format").map(String::as_str) {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// A finished pingback attempt, as reported to the user.
#[derive(Debug, Serialize)]
pub struct PingbackReport<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub outcome: &'a PingbackOutcome,
}

/// Install the fmt subscriber. Notice-level failures surface at the default
/// verbosity; `--quiet` leaves only errors.
pub fn init_logging(args: &ArgMatches) {
    let level = if args.get_flag("quiet") {
        tracing::Level::ERROR
    } else {
        match args.get_count("verbose") {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the sender configuration from the global flags.
pub fn build_config(args: &ArgMatches) -> anyhow::Result<SenderConfig> {
    let profile = args
        .get_one::<String>("profile")
        .map(String::as_str)
        .unwrap_or("linkback");
    let mut config = SenderConfig::preset(profile)
        .with_context(|| format!("Unknown profile '{}'", profile))?;

    if let Some(user_agent) = args.get_one::<String>("user-agent") {
        config = config.with_user_agent(user_agent.clone());
    }
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        config = config.with_timeout(Duration::from_secs(*timeout));
    }

    Ok(config)
}

// Helper functions for batch handler

/// Load and parse target URLs from a file
pub fn load_targets_from_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let path = PathBuf::from(expanded);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read targets file {}", path.display()))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        bail!("No valid URLs found in {}", path.display());
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // Try to parse as-is
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{}  Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

/// Build the request list for `batch`, from a file or by scanning the source.
pub async fn collect_requests(
    sender: &PingbackSender,
    source: &Url,
    targets_file: Option<&PathBuf>,
    scan: bool,
    include_internal: bool,
) -> anyhow::Result<Vec<LinkbackRequest>> {
    let targets: Vec<Url> = if let Some(path) = targets_file {
        load_targets_from_file(path)?
            .iter()
            .map(|raw| Url::parse(raw).with_context(|| format!("Invalid target URL '{}'", raw)))
            .collect::<anyhow::Result<_>>()?
    } else if scan {
        sender
            .outbound_links(source, include_internal)
            .await
            .with_context(|| format!("Failed to scan {} for links", source))?
    } else {
        bail!("Either --targets-file or --scan must be provided");
    };

    Ok(targets
        .into_iter()
        .map(|target| LinkbackRequest {
            source: source.clone(),
            target,
        })
        .collect())
}

pub fn render_outcome(request: &LinkbackRequest, outcome: &PingbackOutcome) -> String {
    match outcome {
        PingbackOutcome::Success => format!(
            "{} {} {}",
            "✓".green().bold(),
            request.target.as_str().bright_white(),
            "pinged".green()
        ),
        PingbackOutcome::Failure(FailureReason::NoEndpoint) => format!(
            "{} {} {}",
            "–".yellow(),
            request.target.as_str().bright_white(),
            "no pingback endpoint".yellow()
        ),
        PingbackOutcome::Failure(FailureReason::Remote { code, description }) => format!(
            "{} {} {}",
            "✗".red().bold(),
            request.target.as_str().bright_white(),
            format!("error {}: {}", code, description).red()
        ),
    }
}

pub fn report_json(results: &[(LinkbackRequest, PingbackOutcome)]) -> anyhow::Result<String> {
    let reports: Vec<PingbackReport<'_>> = results
        .iter()
        .map(|(request, outcome)| PingbackReport {
            source: request.source.as_str(),
            target: request.target.as_str(),
            outcome,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&reports)?)
}

/// Returns whether the pingback succeeded.
pub async fn handle_send(args: &ArgMatches) -> anyhow::Result<bool> {
    let config = build_config(args)?;
    let format = OutputFormat::from_args(args);
    let source = args.get_one::<Url>("source").context("--source is required")?;
    let target = args.get_one::<Url>("target").context("--target is required")?;

    let sender = PingbackSender::new(config)?;
    let request = LinkbackRequest {
        source: source.clone(),
        target: target.clone(),
    };
    let outcome = sender.send(&request).await;

    let success = outcome.is_success();
    let results = vec![(request, outcome)];
    match format {
        OutputFormat::Json => println!("{}", report_json(&results)?),
        OutputFormat::Text => {
            for (request, outcome) in &results {
                println!("{}", render_outcome(request, outcome));
            }
        }
    }

    Ok(success)
}

/// Returns whether an endpoint was found.
pub async fn handle_discover(args: &ArgMatches) -> anyhow::Result<bool> {
    let config = build_config(args)?;
    let format = OutputFormat::from_args(args);
    let url = args.get_one::<Url>("url").context("--url is required")?;

    let sender = PingbackSender::new(config)?;
    let result = sender.discover_endpoint(url.as_str()).await;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "url": url.as_str(),
                "endpoint": result.endpoint(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => match &result {
            EndpointResult::Found(endpoint) => {
                println!("{} {}", "✓".green().bold(), endpoint.bright_white())
            }
            EndpointResult::NotFound => {
                println!("{} {}", "–".yellow(), "no pingback endpoint".yellow())
            }
        },
    }

    Ok(matches!(result, EndpointResult::Found(_)))
}

/// Returns whether every pingback succeeded.
pub async fn handle_batch(args: &ArgMatches) -> anyhow::Result<bool> {
    let config = build_config(args)?;
    let format = OutputFormat::from_args(args);
    let quiet = args.get_flag("quiet");
    let source = args.get_one::<Url>("source").context("--source is required")?;
    let targets_file = args.get_one::<PathBuf>("targets-file");
    let scan = args.get_flag("scan");
    let include_internal = args.get_flag("include-internal");
    let concurrency = *args.get_one::<usize>("concurrency").unwrap_or(&4);

    let sender = PingbackSender::new(config)?;
    let requests =
        collect_requests(&sender, source, targets_file, scan, include_internal).await?;

    if requests.is_empty() {
        if !quiet {
            println!("{} No outbound links found on {}", "ℹ".blue(), source);
        }
        return Ok(true);
    }

    if !quiet && format == OutputFormat::Text {
        println!(
            "\n🔗 Sending {} pingback(s) from {}",
            requests.len(),
            source.as_str().bright_white()
        );
        println!("Workers: {}\n", concurrency);
    }

    let results = sender.send_all(requests, concurrency).await;
    let succeeded = results.iter().filter(|(_, o)| o.is_success()).count();

    match format {
        OutputFormat::Json => println!("{}", report_json(&results)?),
        OutputFormat::Text => {
            for (request, outcome) in &results {
                println!("{}", render_outcome(request, outcome));
            }
            if !quiet {
                println!(
                    "\n{} {}/{} pingback(s) delivered",
                    "📊".bold(),
                    succeeded.to_string().cyan(),
                    results.len().to_string().cyan()
                );
            }
        }
    }

    Ok(succeeded == results.len())
}
