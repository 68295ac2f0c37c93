use std::sync::Arc;

use alloy_primitives::B256;
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use safe_deleter_cli_runner::CliContext;
use safe_multisig::{
    authorization_token, DeleteRequestTypedData, DeletionAuthorizer, Eligibility, QueueReconciler,
    SafeLabels, WalletCapabilities,
};

use crate::{
    cmd::{
        queue::load_until_settled,
        utils::{eligibility_label, proposer_label, safe_display},
    },
    common::{parse_safe_tx_hash, DatadirCliArgs, SafeCliArgs, ServiceCliArgs, WalletCliArgs},
    utils::{print_loading_until_async, print_notice, read_user_confirmation, ExecuteError},
};

#[derive(Debug, Parser)]
#[clap(about = "Delete a queued transaction you proposed.")]
pub struct DeleteCommand {
    #[clap(flatten)]
    target: SafeCliArgs,

    #[arg(value_name = "SAFE_TX_HASH", value_parser = parse_safe_tx_hash, help = "Hash of the queued transaction.")]
    safe_tx_hash: B256,

    #[arg(long, short, help = "Skip the confirmation prompt.")]
    yes: bool,

    #[arg(
        long,
        help = "Print the EIP-712 payload for signing with an external wallet and exit.",
        conflicts_with = "yes"
    )]
    typed_data: bool,

    #[clap(flatten)]
    wallet: WalletCliArgs,

    #[clap(flatten)]
    service: ServiceCliArgs,

    #[clap(flatten)]
    dirs: DatadirCliArgs,
}

impl DeleteCommand {
    pub async fn execute(self, _ctx: CliContext) -> eyre::Result<()> {
        let Self { target, safe_tx_hash, yes, typed_data, wallet, service, dirs } = self;

        let client = Arc::new(service.client());
        let chain = client.registry().get(target.chain)?.clone();

        if typed_data {
            let unix_seconds = u64::try_from(Utc::now().timestamp())?;
            let payload = DeleteRequestTypedData {
                chain_id: chain.chain_id,
                safe: target.safe,
                safe_tx_hash,
                totp: authorization_token(unix_seconds),
            };
            println!("{}", serde_json::to_string_pretty(&payload.to_json())?);
            return Ok(());
        }

        let wallet = wallet.wallet()?;
        let mut queue = QueueReconciler::new(client.clone(), target.chain, target.safe);

        // Without a wallet the attempt fails before anything is sent.
        if let Some(wallet) = &wallet {
            load_until_settled(&mut queue, 0).await?;

            let labels = SafeLabels::load(dirs.labels_store());
            println!("{}{}", "Safe: ".bright_cyan(), safe_display(&labels, target.safe));
            println!("{}{}", "Chain: ".bright_cyan(), chain.display_name);

            match queue.find(safe_tx_hash) {
                Some(tx) => {
                    let eligibility = queue.eligibility(wallet.address())[&safe_tx_hash];
                    println!("{}{}", "Nonce: ".bright_cyan(), tx.nonce);
                    println!("{}{}", "Proposer: ".bright_cyan(), proposer_label(tx));
                    println!("{}{}", "Deletable: ".bright_cyan(), eligibility_label(eligibility));
                    if eligibility == Eligibility::NotYours {
                        println!(
                            "{}",
                            "This wallet did not propose the transaction, the service will likely refuse."
                                .yellow()
                        );
                    }
                }
                None => println!(
                    "{}",
                    "Transaction is not in the queue, it may already be removed.".yellow()
                ),
            }
            println!("{}{}", "Link: ".bright_cyan(), chain.queue_tx_url(target.safe, safe_tx_hash));
        }

        let mut authorizer = DeletionAuthorizer::new(client);
        authorizer.confirm(safe_tx_hash);

        if wallet.is_some() && !yes {
            let confirmed = match read_user_confirmation("Delete this transaction?") {
                Ok(confirmed) => confirmed,
                Err(ExecuteError::UserCancelled) => false,
                Err(ExecuteError::Other(e)) => return Err(e),
            };
            if !confirmed {
                authorizer.cancel();
                println!("{}", "Nothing was deleted.".bright_cyan());
                return Ok(());
            }
        }

        let wallet = wallet.as_ref().map(|wallet| wallet as &dyn WalletCapabilities);
        let outcome = print_loading_until_async(
            "Waiting for the transaction service",
            authorizer.delete_pending(&mut queue, wallet),
        )
        .await;

        let Some(outcome) = outcome else {
            eyre::bail!("No transaction pending deletion");
        };

        let notice = outcome.notice();
        print_notice(&notice);
        if notice.is_error() {
            eyre::bail!(notice.message);
        }

        Ok(())
    }
}
