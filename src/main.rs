use clap::{Parser, Subcommand, builder::styling};
use etl_system::{EndpointConfig, SinkType, SourceType, cli};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// ETL System: drain a message source into a sink
#[derive(Parser)]
#[command(name = "etl", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to load environment from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline from a source to a sink
    Run {
        /// Pipeline config file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source type
        #[arg(long, value_enum)]
        source: Option<SourceType>,

        /// Source argument, repeat for several (e.g. the file path)
        #[arg(long = "source-arg")]
        source_args: Vec<String>,

        /// Name used for the source in logs
        #[arg(long, default_value = "Source")]
        source_name: String,

        /// Sink type
        #[arg(long, value_enum)]
        sink: Option<SinkType>,

        /// Sink argument, repeat for several (e.g. database then table)
        #[arg(long = "sink-arg")]
        sink_args: Vec<String>,

        /// Name used for the sink in logs
        #[arg(long, default_value = "Sink")]
        sink_name: String,

        /// Delete all rows of the storage table before running
        #[arg(long)]
        cleanup: bool,

        /// Number of runs; each run moves one message from an infinite source
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,
    },

    /// Print the rows of a storage table
    Rows {
        /// Database file
        location: PathBuf,

        /// Table name
        #[arg(default_value = "msg_table")]
        table: String,
    },
}

fn endpoint(name: String, kind: Option<impl ToString>, args: Vec<String>) -> Option<EndpointConfig> {
    kind.map(|kind| EndpointConfig {
        name,
        kind: kind.to_string(),
        args,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::from_filename(&cli.env);

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if let Err(e) = dotenv {
        log::debug!("No environment loaded from {}: {}", cli.env, e);
    }

    match cli.command {
        Commands::Run {
            config,
            source,
            source_args,
            source_name,
            sink,
            sink_args,
            sink_name,
            cleanup,
            iterations,
        } => {
            let config = cli::resolve_config(
                config.as_deref(),
                endpoint(source_name, source, source_args),
                endpoint(sink_name, sink, sink_args),
            )?;

            if let (Some(src), Some(tgt)) = (&config.source, &config.sink) {
                log::info!(
                    "Running {} → {}",
                    src.kind.bright_black(),
                    tgt.kind.bright_black()
                );
            }

            let count = cli::run_pipeline(&config, cleanup, iterations)?;
            log::info!("Done, {} message(s) written", count.cyan());
        }
        Commands::Rows { location, table } => {
            log::info!(
                "Checking data in {} table {}",
                location.display().bright_black(),
                table.cyan()
            );
            let mut stdout = std::io::stdout().lock();
            let count = cli::dump_rows(&location, &table, &mut stdout)?;
            log::info!("{} row(s)", count);
        }
    }

    Ok(())
}
