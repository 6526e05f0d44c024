mod filename;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use calendar_engine::{
    build_google_calendar_url, build_ics, export_event, EngineConfig, ExportOptions,
    ParseContext, RawEventInput,
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::filename::ics_file_name;

#[derive(Parser)]
#[command(
    name = "calexport",
    version,
    about = "Turn loosely formatted event text into .ics files and calendar links"
)]
struct Cli {
    /// JSON config file (timezone, product_id, default_title)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// IANA timezone for times without an offset (overrides the config)
    #[arg(short, long, global = true)]
    timezone: Option<String>,

    /// Evaluate as if the current time were this RFC 3339 instant
    #[arg(long, global = true)]
    now: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved time range as JSON
    Resolve(EventArgs),
    /// Render an .ics document
    Ics {
        #[command(flatten)]
        event: EventArgs,

        /// Write to this file instead of stdout
        #[arg(short, long, conflicts_with = "out_dir")]
        output: Option<PathBuf>,

        /// Write to <DIR>/<title>.ics
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Print a Google Calendar link
    Link(EventArgs),
    /// Print the range, .ics document and link together as JSON
    Export(EventArgs),
}

#[derive(Args)]
struct EventArgs {
    /// Read the event from an extraction JSON file ('-' for stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Event title
    #[arg(long)]
    title: Option<String>,

    /// Start date or date-time
    #[arg(long)]
    start: Option<String>,

    /// End date or date-time
    #[arg(long)]
    end: Option<String>,

    /// Mark the event as all-day
    #[arg(long)]
    all_day: bool,

    /// Event location
    #[arg(long)]
    location: Option<String>,

    /// Event description
    #[arg(long)]
    description: Option<String>,
}

impl EventArgs {
    /// The event from `--input` (if any) with individual flags layered on top.
    fn load(&self) -> Result<RawEventInput> {
        let mut event = match &self.input {
            Some(path) => {
                let json = read_input(path)?;
                RawEventInput::from_json_str(&json)
                    .with_context(|| format!("failed to parse event from {}", path.display()))?
            }
            None => RawEventInput::default(),
        };

        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(start) = &self.start {
            event.start = start.clone();
        }
        if let Some(end) = &self.end {
            event.end = Some(end.clone());
        }
        if self.all_day {
            event.all_day = Some(true);
        }
        if let Some(location) = &self.location {
            event.location = Some(location.clone());
        }
        if let Some(description) = &self.description {
            event.description = Some(description.clone());
        }

        if event.start.trim().is_empty() {
            bail!("no event start given: pass --start or an --input file with a \"start\" field");
        }
        Ok(event)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.timezone.as_deref())?;
    let now = match &cli.now {
        Some(now) => DateTime::parse_from_rfc3339(now)
            .with_context(|| format!("invalid --now '{now}'"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let ctx = config.parse_context(now)?;
    let opts = config.export_options();
    tracing::debug!(timezone = %ctx.timezone, %now, "engine configured");

    match &cli.command {
        Commands::Resolve(args) => cmd_resolve(args, &ctx),
        Commands::Ics {
            event,
            output,
            out_dir,
        } => cmd_ics(event, output.as_deref(), out_dir.as_deref(), &ctx, &opts),
        Commands::Link(args) => cmd_link(args, &ctx, &opts),
        Commands::Export(args) => cmd_export(args, &ctx, &opts),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>, timezone: Option<&str>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            EngineConfig::from_json_str(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(timezone) = timezone {
        config.timezone = timezone.to_string();
    }
    config.validate()?;
    Ok(config)
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read event from stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn cmd_resolve(args: &EventArgs, ctx: &ParseContext) -> Result<()> {
    let event = args.load()?;
    let range = event.resolve(ctx).context("could not resolve event time")?;
    println!("{}", serde_json::to_string_pretty(&range)?);
    Ok(())
}

fn cmd_ics(
    args: &EventArgs,
    output: Option<&Path>,
    out_dir: Option<&Path>,
    ctx: &ParseContext,
    opts: &ExportOptions,
) -> Result<()> {
    let event = args.load()?;
    let ics = build_ics(&event, ctx, opts).context("could not resolve event time")?;

    let target = match (output, out_dir) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, Some(dir)) => Some(dir.join(ics_file_name(event.display_title(opts)))),
        (None, None) => None,
    };
    match target {
        Some(path) => {
            fs::write(&path, ics.as_str())
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote calendar file");
            println!("{}", path.display());
        }
        None => {
            io::stdout()
                .write_all(ics.as_str().as_bytes())
                .context("failed to write to stdout")?;
        }
    }
    Ok(())
}

fn cmd_link(args: &EventArgs, ctx: &ParseContext, opts: &ExportOptions) -> Result<()> {
    let event = args.load()?;
    let url = build_google_calendar_url(&event, ctx, opts).context("could not resolve event time")?;
    println!("{url}");
    Ok(())
}

fn cmd_export(args: &EventArgs, ctx: &ParseContext, opts: &ExportOptions) -> Result<()> {
    let event = args.load()?;
    let export = export_event(&event, ctx, opts).context("could not resolve event time")?;
    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}
