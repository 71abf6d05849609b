use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lotus-core")]
#[command(about = "Lotus Core - Tenant Catalog and Payment Ledger API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the resolved configuration and exit
    Config,
}
