use alloy_primitives::Address;
use clap::Parser;
use colored::Colorize;
use itertools::Itertools;
use prettytable::{row, Table};
use safe_deleter_cli_runner::CliContext;
use safe_multisig::{fetch_all_owner_safes, Favorites, SafeLabels};

use crate::{
    cmd::utils::safe_display,
    common::{parse_address, DatadirCliArgs, ServiceCliArgs},
    utils::{print_loading_until_async, print_notice},
};

#[derive(Debug, Parser)]
#[clap(about = "List the Safes owned by an address on every supported chain.")]
pub struct SafesCommand {
    #[arg(value_name = "OWNER", value_parser = parse_address, help = "The owner address.")]
    owner: Address,

    #[clap(flatten)]
    service: ServiceCliArgs,

    #[clap(flatten)]
    dirs: DatadirCliArgs,
}

impl SafesCommand {
    pub async fn execute(self, _ctx: CliContext) -> eyre::Result<()> {
        let Self { owner, service, dirs } = self;

        let client = service.client();
        let summary =
            print_loading_until_async("Loading Safes", fetch_all_owner_safes(&client, owner)).await;

        if let Some(notice) = &summary.notice {
            print_notice(notice);
            println!("{} {}", "Failed chains:".bright_red(), summary.failed.iter().join(", "));
        }

        if !summary.has_safes() {
            println!("{}", "No Safes found for this owner.".bright_cyan().bold());
            return Ok(());
        }

        let favorites = Favorites::load(dirs.favorites_store());
        let labels = SafeLabels::load(dirs.labels_store());
        let registry = client.registry();

        let mut table = Table::new();
        table.add_row(row!["Chain", "Safe", "★", "Queue"]);
        for (chain, safes) in &summary.safes {
            let descriptor = registry.get(*chain)?;
            for safe in safes {
                let star = if favorites.is_favorite(*chain, *safe) { "★" } else { "" };
                table.add_row(row![
                    descriptor.display_name,
                    safe_display(&labels, *safe),
                    star,
                    descriptor.queue_url(*safe),
                ]);
            }
        }
        table.printstd();

        Ok(())
    }
}
