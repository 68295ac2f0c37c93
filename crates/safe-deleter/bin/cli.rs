use clap::{
    builder::{styling::AnsiColor, Styles},
    ArgAction, Parser, Subcommand,
};
use safe_deleter::cmd::{
    chains::ChainsCommand,
    delete::DeleteCommand,
    favorites::{FavoriteCommand, FavoritesCommand},
    label::LabelCommand,
    queue::QueueCommand,
    safes::SafesCommand,
};
use safe_deleter_cli_runner::CliRunner;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// The verbosity level.
pub type Verbosity = u8;

#[derive(Debug, Parser)]
#[command(
    name = "safe-deleter",
    about = "View and delete queued Safe multisig transactions.",
    version,
    term_width = 80,
    styles = get_color_style()
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level of the log messages.
    ///
    /// Pass multiple times to increase the verbosity (e.g. -v, -vv, -vvv).
    /// Warnings are always shown. `RUST_LOG` takes precedence.
    #[arg(help_heading = "Display options", global = true, short, long, verbatim_doc_comment, action = ArgAction::Count)]
    verbosity: Verbosity,
}

impl Cli {
    pub fn run(self) -> eyre::Result<()> {
        init_tracing(self.verbosity)?;

        let runner = CliRunner::try_default_runtime()?;
        match self.command {
            Commands::Chains(chains) => runner.run_command_until_exit(|ctx| chains.execute(ctx)),
            Commands::Safes(safes) => runner.run_command_until_exit(|ctx| safes.execute(ctx)),
            Commands::Queue(queue) => runner.run_command_until_exit(|ctx| queue.execute(ctx)),
            Commands::Delete(delete) => runner.run_command_until_exit(|ctx| delete.execute(ctx)),
            Commands::Favorites(favorites) => {
                runner.run_command_until_exit(|ctx| favorites.execute(ctx))
            }
            Commands::Favorite(favorite) => {
                runner.run_command_until_exit(|ctx| favorite.execute(ctx))
            }
            Commands::Label(label) => runner.run_command_until_exit(|ctx| label.execute(ctx)),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(name = "chains")]
    Chains(ChainsCommand),

    #[command(name = "safes")]
    Safes(SafesCommand),

    #[command(name = "queue")]
    Queue(QueueCommand),

    #[command(name = "delete")]
    Delete(DeleteCommand),

    #[command(name = "favorites")]
    Favorites(FavoritesCommand),

    #[command(name = "favorite")]
    Favorite(FavoriteCommand),

    #[command(name = "label")]
    Label(LabelCommand),
}

fn init_tracing(verbosity: Verbosity) -> eyre::Result<()> {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| eyre::eyre!(e))
}

fn get_color_style() -> Styles {
    Styles::styled()
        .usage(AnsiColor::Green.on_default().bold().underline())
        .header(AnsiColor::Yellow.on_default().bold().underline())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}
