use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use safe_multisig::{
    store::format_safe_display, utils::format_age, Eligibility, KeyValueStore, QueuedTransaction,
    SafeLabels,
};

pub(crate) fn eligibility_label(eligibility: Eligibility) -> ColoredString {
    match eligibility {
        Eligibility::Yours => "yours".bright_green().bold(),
        Eligibility::NotYours => "not yours".bright_red(),
        Eligibility::Unknown => "unknown".bright_black(),
    }
}

/// The proposer column: the address entitled to delete, marked when it is a delegate.
pub(crate) fn proposer_label(tx: &QueuedTransaction) -> String {
    match (tx.proposed_by_delegate, tx.proposer) {
        (Some(delegate), _) => format!("{} (delegate)", delegate),
        (None, Some(proposer)) => proposer.to_string(),
        (None, None) => "--".to_string(),
    }
}

pub(crate) fn age_label(tx: &QueuedTransaction, now: DateTime<Utc>) -> String {
    format_age(tx.submission_date, now)
}

pub(crate) fn safe_display<S: KeyValueStore>(labels: &SafeLabels<S>, safe: Address) -> String {
    format_safe_display(&safe.to_string(), labels.get_label(safe))
}
