//! Command-line interface definitions.
//!
//! Invoked with no arguments the binary performs a full pipeline run:
//! collect every outlet, persist, translate what is missing, write the
//! digest. The subcommands cover the two auxiliary workflows — inspecting
//! the store and re-rendering the digest without collecting.

use clap::{Parser, Subcommand};

/// Coleta notícias sobre a China e gera o resumo HTML diário.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the SQLite database file
    #[arg(long, global = true, default_value = "news.db")]
    pub db_path: String,

    /// Path of the generated HTML digest
    #[arg(short, long, global = true, default_value = "newsflow_diario.html")]
    pub output: String,

    /// Digest window in hours
    #[arg(long, global = true, default_value_t = 24)]
    pub hours: i64,

    /// Skip the Portuguese translation pass
    #[arg(long, global = true)]
    pub no_translate: bool,

    /// Commit and push the repository after a successful run
    #[arg(long)]
    pub git_push: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print recently collected articles from the store
    List {
        /// Filter by source id (globaltimes, xinhua_chinabiz, scmp_china)
        #[arg(long)]
        source: Option<String>,

        /// Maximum number of rows
        #[arg(long, default_value_t = 50)]
        limit: i64,

        /// Emit JSON instead of the plain-text listing
        #[arg(long)]
        json: bool,
    },

    /// Re-render the digest from the store without collecting
    Export,
}
