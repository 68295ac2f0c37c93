use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use itertools::Itertools;
use prettytable::{row, Table};
use safe_deleter_cli_runner::CliContext;
use safe_multisig::{
    consts::RATE_LIMIT_RETRY_DELAY, utils::shorten_hex, LoadOutcome, QueueReconciler,
    ReqwestTransport, SafeLabels, WalletCapabilities,
};
use tracing::debug;

use crate::{
    cmd::utils::{age_label, eligibility_label, proposer_label, safe_display},
    common::{DatadirCliArgs, SafeCliArgs, ServiceCliArgs, WalletCliArgs},
    utils::{print_loading_until_async, print_notice},
};

#[derive(Debug, Parser)]
#[clap(about = "Show the queued transactions of a Safe.")]
pub struct QueueCommand {
    #[clap(flatten)]
    target: SafeCliArgs,

    #[arg(long, help = "Keep loading pages until the whole queue is shown.")]
    all: bool,

    #[clap(flatten)]
    wallet: WalletCliArgs,

    #[clap(flatten)]
    service: ServiceCliArgs,

    #[clap(flatten)]
    dirs: DatadirCliArgs,
}

impl QueueCommand {
    pub async fn execute(self, _ctx: CliContext) -> eyre::Result<()> {
        let Self { target, all, wallet, service, dirs } = self;

        let wallet = wallet.wallet()?;
        let client = Arc::new(service.client());
        let chain = client.registry().get(target.chain)?.clone();
        let labels = SafeLabels::load(dirs.labels_store());

        println!(
            "{}{} on {}",
            "Queue of ".bright_cyan(),
            safe_display(&labels, target.safe).bold(),
            chain.display_name.bold()
        );

        let mut queue = QueueReconciler::new(client, target.chain, target.safe);
        load_until_settled(&mut queue, 0).await?;
        while all && queue.has_more() {
            debug!(loaded = queue.transactions().len(), "Loading next page");
            if !load_more_until_settled(&mut queue).await? {
                break;
            }
        }

        if let Some(nonce) = queue.safe_nonce() {
            println!("{}{}", "Safe nonce: ".bright_cyan(), nonce);
        }

        if queue.transactions().is_empty() {
            println!("{}", "No queued transactions.".bright_cyan().bold());
            return Ok(());
        }

        let owner = wallet.as_ref().and_then(|wallet| wallet.address());
        let eligibility = queue.eligibility(owner);
        let now = Utc::now();

        let mut table = Table::new();
        table.add_row(row!["Nonce", "Safe tx hash", "Proposer", "Age", "Deletable"]);
        // competing proposals share a nonce, show it once per group
        for (nonce, txs) in &queue.transactions().iter().group_by(|tx| tx.nonce) {
            for (i, tx) in txs.enumerate() {
                let nonce = if i == 0 { nonce.to_string() } else { String::new() };
                table.add_row(row![
                    nonce,
                    shorten_hex(&tx.safe_tx_hash.to_string(), 8, 6),
                    proposer_label(tx),
                    age_label(tx, now),
                    eligibility_label(eligibility[&tx.safe_tx_hash]),
                ]);
            }
        }
        table.printstd();

        if queue.has_more() {
            println!("{}", "More transactions are queued. Pass --all to load them.".bright_black());
        }
        if owner.is_some() && queue.has_eligible(owner) {
            println!(
                "\n{} safe-deleter delete {} {} <SAFE_TX_HASH>",
                "Delete one of yours with:".bright_cyan(),
                target.chain,
                target.safe
            );
        }
        println!("{}{}", "Open in the Safe app: ".bright_cyan(), chain.queue_url(target.safe));

        Ok(())
    }
}

/// Loads `offset`, polling again while the service keeps rate limiting.
pub(crate) async fn load_until_settled(
    queue: &mut QueueReconciler<ReqwestTransport>,
    offset: u64,
) -> eyre::Result<()> {
    loop {
        match print_loading_until_async("Loading queue", queue.load_page(offset)).await {
            LoadOutcome::Loaded { .. } => return Ok(()),
            LoadOutcome::RateLimited => wait_for_retry(queue).await,
            LoadOutcome::Failed(notice) => {
                print_notice(&notice);
                eyre::bail!(notice.message);
            }
        }
    }
}

async fn load_more_until_settled(queue: &mut QueueReconciler<ReqwestTransport>) -> eyre::Result<bool> {
    loop {
        let outcome = print_loading_until_async("Loading more", queue.load_more()).await;
        match outcome {
            None => return Ok(false),
            Some(LoadOutcome::Loaded { received, .. }) => return Ok(received > 0),
            Some(LoadOutcome::RateLimited) => wait_for_retry(queue).await,
            Some(LoadOutcome::Failed(notice)) => {
                print_notice(&notice);
                eyre::bail!(notice.message);
            }
        }
    }
}

async fn wait_for_retry(queue: &QueueReconciler<ReqwestTransport>) {
    if let Some(message) = queue.retry_notice() {
        println!("{}", message.yellow());
    }
    tokio::time::sleep(RATE_LIMIT_RETRY_DELAY).await;
}
