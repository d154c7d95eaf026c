use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use rclink::{commands, diagnostics};

/// Exit code for runtime failures such as unreadable files.
const EXIT_RUNTIME_ERROR: u8 = 3;

#[derive(Parser)]
#[command(name = "rclink", version, about = "Reference links and scripture citations for resource containers")]
struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Commands,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List explicit links and implicit citations in a container's content files
    Links {
        /// Container root directory or zip archive.
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Parse one link token, e.g. `[[en/gen/ulb/01:02-06]]`
    Parse {
        /// The link token to parse.
        token: String,
    },
    /// Find implicit scripture citations in prose
    Scan {
        /// File to scan; reads stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Strictly validate a container and summarize its projects
    Verify {
        /// Container root directory or zip archive.
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Links { dir } => commands::links(dir, cli.json),
        Commands::Parse { token } => commands::parse(token, cli.json),
        Commands::Scan { file } => commands::scan(file.as_deref(), cli.json).map(|()| return ExitCode::SUCCESS),
        Commands::Verify { dir } => commands::verify(dir, cli.json),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        },
    };
}

/// Install a stderr subscriber. `RUST_LOG` directives are honoured and the
/// `-v` count raises the floor: WARN, INFO, DEBUG, then TRACE.
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    return;
}
