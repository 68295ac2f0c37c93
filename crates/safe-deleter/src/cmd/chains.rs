use clap::Parser;
use prettytable::{row, Table};
use safe_deleter_cli_runner::CliContext;

use crate::common::ServiceCliArgs;

#[derive(Debug, Parser)]
#[clap(about = "List the supported chains.")]
pub struct ChainsCommand {
    #[clap(flatten)]
    service: ServiceCliArgs,
}

impl ChainsCommand {
    pub async fn execute(self, _ctx: CliContext) -> eyre::Result<()> {
        let registry = self.service.registry();

        let mut table = Table::new();
        table.add_row(row!["Key", "Chain ID", "Name", "Short", "Transaction service", "Explorer"]);
        for chain in registry.iter() {
            table.add_row(row![
                chain.key,
                chain.chain_id,
                chain.display_name,
                chain.short_name,
                chain.api_base_url,
                chain.explorer_base_url,
            ]);
        }
        table.printstd();

        Ok(())
    }
}
