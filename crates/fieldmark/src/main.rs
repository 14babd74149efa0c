//! Fieldmark CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "fieldmark")]
#[command(version)]
#[command(about = "Template-field compiler for rich-text documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a template and write its field artifacts
    Prepare {
        /// Input template XML
        template: String,

        /// Field delimiter pair, e.g. "[]"
        #[arg(long)]
        delimiters: Option<String>,

        /// Embedding delimiter pair, e.g. "{}" (pass "" to disable the layer)
        #[arg(long)]
        embedding: Option<String>,

        /// Write the compiled template to FILE instead of <stem>.compiled.xml
        #[arg(short = 'o', long)]
        output: Option<String>,

        /// Skip the logic tree artifact
        #[arg(long)]
        no_logic_tree: bool,

        /// Also write the flat preview document and its field map
        #[arg(long)]
        preview: bool,
    },

    /// Normalize a template without compiling it
    Normalize {
        /// Input template XML
        template: String,

        /// Field delimiter pair, e.g. "[]"
        #[arg(long)]
        delimiters: Option<String>,

        /// Embedding delimiter pair, e.g. "{}" (pass "" to disable the layer)
        #[arg(long)]
        embedding: Option<String>,

        /// Write the normalized template to FILE instead of <stem>.normalized.xml
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Print the extracted-fields JSON for a template
    Fields {
        /// Input template XML
        template: String,

        /// Field delimiter pair, e.g. "[]"
        #[arg(long)]
        delimiters: Option<String>,

        /// Embedding delimiter pair, e.g. "{}" (pass "" to disable the layer)
        #[arg(long)]
        embedding: Option<String>,
    },

    /// Print the reduced logic tree for a template
    Logic {
        /// Input template XML
        template: String,

        /// Field delimiter pair, e.g. "[]"
        #[arg(long)]
        delimiters: Option<String>,

        /// Embedding delimiter pair, e.g. "{}" (pass "" to disable the layer)
        #[arg(long)]
        embedding: Option<String>,
    },

    /// Print the generated interview script for a template
    Script {
        /// Input template XML
        template: String,

        /// Field delimiter pair, e.g. "[]"
        #[arg(long)]
        delimiters: Option<String>,

        /// Embedding delimiter pair, e.g. "{}" (pass "" to disable the layer)
        #[arg(long)]
        embedding: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldmark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare {
            template,
            delimiters,
            embedding,
            output,
            no_logic_tree,
            preview,
        } => commands::prepare::execute(commands::prepare::PrepareArgs {
            template,
            delimiters,
            embedding,
            output,
            logic_tree: !no_logic_tree,
            preview,
        }),
        Commands::Normalize {
            template,
            delimiters,
            embedding,
            output,
        } => commands::normalize::execute(commands::normalize::NormalizeArgs {
            template,
            delimiters,
            embedding,
            output,
        }),
        Commands::Fields {
            template,
            delimiters,
            embedding,
        } => commands::fields::execute(&template, delimiters.as_deref(), embedding.as_deref()),
        Commands::Logic {
            template,
            delimiters,
            embedding,
        } => commands::logic::execute(&template, delimiters.as_deref(), embedding.as_deref()),
        Commands::Script {
            template,
            delimiters,
            embedding,
        } => commands::script::execute(&template, delimiters.as_deref(), embedding.as_deref()),
    }
}
