use std::{
    future::Future,
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use safe_multisig::{Notice, NoticeLevel};

#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("User cancelled")]
    UserCancelled,

    #[error("Other error: {0}")]
    Other(#[from] eyre::Error),
}

pub fn print_success_message(message: &str) {
    println!("\n{}", message.bright_green().bold());
}

pub fn print_error_message(message: &str) {
    println!("\n{}", message.bright_red().bold());
}

/// Prints a notice the way its level asks for.
pub fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => print_success_message(&format!("✅ {}", notice)),
        NoticeLevel::Error => print_error_message(&format!("❌ {}", notice)),
    }
}

/// Asks a yes/no question. Ctrl-c during the prompt is reported as [ExecuteError::UserCancelled].
pub fn read_user_confirmation(prompt: &str) -> Result<bool, ExecuteError> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e: dialoguer::Error| match e {
            dialoguer::Error::IO(e) => match e.kind() {
                std::io::ErrorKind::Interrupted => ExecuteError::UserCancelled,
                _ => ExecuteError::Other(e.into()),
            },
        })
}

/// Runs a loading animation until a future completes
pub async fn print_loading_until_async<F, T>(message: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    let message = message.to_string();

    std::thread::spawn(move || {
        let spinner = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
        let mut i = 0;
        let mut stdout = std::io::stdout();

        while running_clone.load(Ordering::Relaxed) {
            print!("\r{} {} ", message, spinner[i]);
            stdout.flush().ok();
            std::thread::sleep(Duration::from_millis(100));
            i = (i + 1) % spinner.len();
        }

        print!("\r{}\r", " ".repeat(message.chars().count() + 2));
        stdout.flush().ok();
    });

    let result = future.await;

    running.store(false, Ordering::Relaxed);
    // give the animation thread time to clear its line
    tokio::time::sleep(Duration::from_millis(100)).await;

    result
}
