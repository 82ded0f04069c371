use std::fs;
use std::io::Write;
use std::path::PathBuf;

use gmail_export::decode::decode;
use gmail_export::export::file_name;
use gmail_export::types::Message;

/// Decode a saved `users.messages.get?format=full` response without touching
/// the network. The body goes to stdout, the derived file name to stderr.
fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("message.json"));

    let raw = fs::read(&path)?;
    let message: Message = serde_json::from_slice(&raw)?;
    let body = decode(&message.payload)?;

    eprintln!("{}.html", file_name(&message));
    std::io::stdout().write_all(&body)?;
    Ok(())
}
