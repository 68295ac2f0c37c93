use clap::Parser;
use colored::Colorize;
use prettytable::{row, Table};
use safe_deleter_cli_runner::CliContext;
use safe_multisig::{ChainRegistry, Favorites, FavoriteSafe, SafeLabels};

use crate::{
    cmd::utils::safe_display,
    common::{DatadirCliArgs, SafeCliArgs},
    utils::print_success_message,
};

#[derive(Debug, Parser)]
#[clap(about = "List favorite Safes, grouped by chain.")]
pub struct FavoritesCommand {
    #[clap(flatten)]
    dirs: DatadirCliArgs,
}

impl FavoritesCommand {
    pub async fn execute(self, _ctx: CliContext) -> eyre::Result<()> {
        let favorites = Favorites::load(self.dirs.favorites_store());
        let labels = SafeLabels::load(self.dirs.labels_store());

        if favorites.list().is_empty() {
            println!("{}", "No favorites yet.".bright_cyan().bold());
            return Ok(());
        }

        let registry = ChainRegistry::default();
        let mut table = Table::new();
        table.add_row(row!["Chain", "Safe", "Queue"]);
        for (chain, entries) in favorites.grouped() {
            let descriptor = registry.get(chain)?;
            for fav in entries {
                let display = match &fav.label {
                    Some(label) => format!("{} ({})", label, fav.safe_address),
                    None => safe_display(&labels, fav.safe_address),
                };
                table.add_row(row![
                    descriptor.display_name,
                    display,
                    descriptor.queue_url(fav.safe_address),
                ]);
            }
        }
        table.printstd();

        Ok(())
    }
}

#[derive(Debug, Parser)]
#[clap(about = "Star or unstar a Safe.")]
pub struct FavoriteCommand {
    #[clap(flatten)]
    target: SafeCliArgs,

    #[arg(long, help = "Optional label stored with the favorite.")]
    label: Option<String>,

    #[clap(flatten)]
    dirs: DatadirCliArgs,
}

impl FavoriteCommand {
    pub async fn execute(self, _ctx: CliContext) -> eyre::Result<()> {
        let Self { target, label, dirs } = self;

        let mut favorites = Favorites::load(dirs.favorites_store());
        let entry = FavoriteSafe {
            label: label.map(|label| label.trim().to_string()).filter(|label| !label.is_empty()),
            ..FavoriteSafe::new(target.chain, target.safe)
        };

        if favorites.toggle(entry) {
            print_success_message(&format!("★ Added {} on {} to favorites", target.safe, target.chain));
        } else {
            print_success_message(&format!("Removed {} on {} from favorites", target.safe, target.chain));
        }

        Ok(())
    }
}
