use crate::cli::Cli;
use crate::config::AppDefaults;
use crate::errors::{AppError, AppResult};
use crate::export::{normalize_dir, run_export};
use crate::gmail::GmailClient;
use crate::oauth::{authorize, GMAIL_READONLY};
use anyhow::Result;
use chrono::Local;
use oauth2::Scope;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::info;

pub async fn run(_cli: Cli) -> Result<()> {
    let defaults = AppDefaults::load()?;
    let access_token = match &defaults.access_token {
        Some(token) => {
            info!("Using access token from GMAIL_ACCESS_TOKEN");
            token.clone()
        }
        None => authorize(&[Scope::new(GMAIL_READONLY.into())]).await?.access_token,
    };
    let client = GmailClient::new(&defaults.api_base, &access_token);

    let (dir, count) = {
        let mut input = io::stdin().lock();
        let mut output = io::stdout();
        let dir = prompt_directory(&mut input, &mut output)?;
        (dir, prompt_count(&mut input, &mut output)?)
    };

    let before = Local::now();
    println!("Started at {}.", before.format("%Y-%m-%d %H:%M:%S"));

    let summary = run_export(&client, &defaults.user_id, &dir, count).await?;

    let after = Local::now();
    let took = (after - before).to_std().unwrap_or_default();
    println!(
        "Finished at {}.\nTook {:.3}s for {} message(s).",
        after.format("%Y-%m-%d %H:%M:%S"),
        took.as_secs_f64(),
        summary.files.len()
    );

    Ok(())
}

/// Ask for the export directory. Must be absolute; the result always ends in
/// a separator.
pub fn prompt_directory<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> AppResult<String> {
    let answer = prompt(
        input,
        output,
        "Specify a directory for downloaded emails (absolute path): ",
    )?;
    if answer.is_empty() {
        return Err(AppError::Input("no directory given".into()));
    }
    if !Path::new(&answer).is_absolute() {
        return Err(AppError::Input(format!("{answer:?} is not an absolute path")));
    }
    Ok(normalize_dir(&answer))
}

/// Ask for how many messages to export (a positive integer).
pub fn prompt_count<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> AppResult<u32> {
    let answer = prompt(input, output, "Enter a number of emails to download: ")?;
    match answer.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::Input(format!(
            "{answer:?} is not a positive number of emails"
        ))),
    }
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> AppResult<String> {
    let stdio = |e| AppError::io("<stdio>", e);
    output.write_all(question.as_bytes()).map_err(stdio)?;
    output.flush().map_err(stdio)?;

    let mut line = String::new();
    if input.read_line(&mut line).map_err(stdio)? == 0 {
        return Err(AppError::Input("unexpected end of input".into()));
    }
    Ok(line.trim().to_string())
}
