use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arkivbot")]
#[command(author, version, about = "Telegram bot that archives document uploads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot and web server
    Run,

    /// Print the metadata store contents and exit
    ListFiles,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
