use alloy_primitives::Address;
use clap::Parser;
use safe_deleter_cli_runner::CliContext;
use safe_multisig::SafeLabels;

use crate::{
    common::{parse_address, DatadirCliArgs},
    utils::print_success_message,
};

#[derive(Debug, Parser)]
#[clap(about = "Name a Safe address. An empty label removes it.")]
pub struct LabelCommand {
    #[arg(value_name = "SAFE", value_parser = parse_address, help = "The Safe address.")]
    safe: Address,

    #[arg(value_name = "LABEL", default_value = "", help = "The label to show instead of the address.")]
    label: String,

    #[clap(flatten)]
    dirs: DatadirCliArgs,
}

impl LabelCommand {
    pub async fn execute(self, _ctx: CliContext) -> eyre::Result<()> {
        let Self { safe, label, dirs } = self;

        let mut labels = SafeLabels::load(dirs.labels_store());
        labels.set_label(safe, &label);

        match labels.get_label(safe) {
            Some(label) => print_success_message(&format!("✅ {} is now labelled {}", safe, label)),
            None => print_success_message(&format!("✅ Removed the label of {}", safe)),
        }

        Ok(())
    }
}
