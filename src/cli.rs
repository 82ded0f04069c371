use clap::Parser;

/// Export recent Gmail messages as HTML files.
///
/// The target directory and the number of messages are asked for
/// interactively.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {}
