use crate::config::{EngineConfig, DEFAULT_API_PORT};
use crate::context::ResolutionContext;
use crate::driver::ReplacementDriver;
use crate::error::{QuickfillError, Result};
use crate::models::{AiProvider, Snippet};
use crate::server::{start_api_server, AppState};
use crate::services::{Services, StdinPrompter};
use crate::storage::{find_snippet, Store};
use crate::surface::PlainField;
use crate::template::TemplateEngine;
use crate::transfer::{self, ConflictPolicy};
use crate::trigger::{Detection, TriggerDetector};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "quickfill: type a shortcut, get the whole text"
)]
pub struct Quickfill {
    #[clap(short, long, help = "Show where the database lives and what it holds")]
    pub config: bool,

    #[clap(subcommand)]
    pub commands: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a snippet
    Add {
        #[clap(long, short = 's', help = "Shortcut that triggers the snippet")]
        shortcut: String,

        #[clap(long, short = 't', help = "The snippet template")]
        text: String,

        #[clap(long, help = "Category to file the snippet under")]
        category: Option<String>,
    },
    /// Update an existing snippet by shortcut
    Update {
        #[clap(long, short = 's', help = "Shortcut of the snippet to update")]
        shortcut: String,

        #[clap(long, short = 't', help = "New snippet template")]
        text: String,

        #[clap(long, help = "New category")]
        category: Option<String>,
    },
    /// Delete a snippet by shortcut
    Delete {
        #[clap(long, short, help = "Shortcut of the snippet to delete")]
        shortcut: String,
    },
    /// List snippets
    List {
        #[clap(long, help = "Only show this category")]
        category: Option<String>,
    },
    /// Manage custom variables
    #[command(subcommand)]
    Var(VarCommand),
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Choose the AI provider and set its API key
    Ai {
        #[clap(long, help = "openai, claude or deepseek")]
        provider: AiProvider,

        #[clap(long, help = "API key for the provider")]
        key: Option<String>,
    },
    /// Expand a template and print the result
    Expand { template: String },
    /// Write snippets or variables as JSON
    Export {
        what: Collection,

        #[clap(long, short, help = "File to write instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Read snippets or variables from a JSON export
    Import {
        what: Collection,

        file: PathBuf,

        #[clap(
            long = "on-conflict",
            default_value = "keep-existing",
            help = "keep-existing, keep-new or keep-both"
        )]
        on_conflict: ConflictPolicy,
    },
    /// Type lines into a scratch field and watch shortcuts expand
    Try,
    /// Run the HTTP API
    Serve {
        #[clap(long, short, default_value_t = DEFAULT_API_PORT)]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum VarCommand {
    /// Set a variable
    Set {
        name: String,
        value: String,

        #[clap(long = "rename-from", help = "Previous name of the variable")]
        rename_from: Option<String>,
    },
    /// Delete a variable
    Delete { name: String },
    /// List variables
    List,
}

#[derive(Subcommand)]
pub enum CategoryCommand {
    /// Add a category
    Add { name: String },
    /// List categories
    List,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Collection {
    Snippets,
    Variables,
}

/// Run one parsed command line against the default store
pub async fn run(cli: Quickfill) -> Result<()> {
    let store = Arc::new(Store::open_default());

    if cli.config {
        print_config(&store)?;
    }

    let Some(command) = cli.commands else {
        return Ok(());
    };

    match command {
        Commands::Add {
            shortcut,
            text,
            category,
        } => {
            let mut snippet = Snippet::new(shortcut, text);
            snippet.id.clear();
            snippet.category = category;
            let saved = store.save_snippet(snippet)?;
            println!("Added snippet '{}'", saved.shortcut);
        }
        Commands::Update {
            shortcut,
            text,
            category,
        } => {
            let snippets = store.load_snippets()?;
            let mut snippet = find_snippet(&snippets, &shortcut)
                .cloned()
                .ok_or_else(|| QuickfillError::NotFound(format!("snippet '{}'", shortcut)))?;
            snippet.text = text;
            if category.is_some() {
                snippet.category = category;
            }
            store.save_snippet(snippet)?;
            println!("Updated snippet '{}'", shortcut);
        }
        Commands::Delete { shortcut } => {
            let snippets = store.load_snippets()?;
            let snippet = find_snippet(&snippets, &shortcut)
                .ok_or_else(|| QuickfillError::NotFound(format!("snippet '{}'", shortcut)))?;
            store.delete_snippet(&snippet.id)?;
            println!("Deleted snippet '{}'", shortcut);
        }
        Commands::List { category } => list_snippets(&store, category.as_deref())?,
        Commands::Var(command) => run_var(&store, command)?,
        Commands::Category(command) => run_category(&store, command)?,
        Commands::Ai { provider, key } => {
            let mut config = store.load_ai_config()?;
            if key.is_some() {
                config.set_api_key(provider, key);
            }
            config.selected_provider = Some(provider);
            store.save_ai_config(config)?;
            println!("AI provider set to {}", provider);
        }
        Commands::Expand { template } => {
            let services = Services::system().with_prompter(StdinPrompter);
            let engine = engine_for(&store, services)?;
            println!("{}", engine.expand(&template).await);
        }
        Commands::Export { what, output } => {
            let json = match what {
                Collection::Snippets => transfer::export_snippets(&store.load_snippets()?)?,
                Collection::Variables => {
                    transfer::export_variables(&store.load_custom_variables()?)?
                }
            };
            match output {
                Some(path) => {
                    fs::write(&path, json)?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Import {
            what,
            file,
            on_conflict,
        } => {
            let json = fs::read_to_string(&file)?;
            let report = match what {
                Collection::Snippets => transfer::import_snippets(&store, &json, on_conflict)?,
                Collection::Variables => transfer::import_variables(&store, &json, on_conflict)?,
            };
            println!(
                "Imported {} entries ({} conflicts, {})",
                report.imported, report.conflicts, on_conflict
            );
        }
        Commands::Try => try_in_scratch_field(&store).await?,
        Commands::Serve { port } => {
            let state = AppState::new(store, Services::system(), EngineConfig::default())?;
            start_api_server(Arc::new(state), port).await?;
        }
    }

    Ok(())
}

fn engine_for(store: &Store, services: Services) -> Result<Arc<TemplateEngine>> {
    let context = Arc::new(ResolutionContext::from_store(store)?);
    Ok(Arc::new(TemplateEngine::new(
        context,
        services,
        EngineConfig::default(),
    )))
}

fn print_config(store: &Store) -> Result<()> {
    let data = store.load()?;
    println!("Database: {}", store.path().display());
    println!(
        "{} snippets, {} categories, {} variables",
        data.snippets.len(),
        data.categories.len(),
        data.custom_variables.len()
    );
    match data.ai.selected_provider {
        Some(provider) => println!("AI provider: {}", provider),
        None => println!("AI provider: not configured"),
    }
    Ok(())
}

fn list_snippets(store: &Store, category: Option<&str>) -> Result<()> {
    let snippets = store.load_snippets()?;
    let shown: Vec<_> = snippets
        .iter()
        .filter(|s| category.map_or(true, |c| s.category.as_deref() == Some(c)))
        .collect();

    if shown.is_empty() {
        println!("No snippets found");
        return Ok(());
    }
    for snippet in shown {
        let category = snippet.category.as_deref().unwrap_or("-");
        println!("{:<16} {:<12} {}", snippet.shortcut, category, snippet.preview(50));
    }
    Ok(())
}

fn run_var(store: &Store, command: VarCommand) -> Result<()> {
    match command {
        VarCommand::Set {
            name,
            value,
            rename_from,
        } => {
            store.save_custom_variable(&name, &value, rename_from.as_deref())?;
            println!("Saved variable '{}'", name);
        }
        VarCommand::Delete { name } => {
            store.delete_custom_variable(&name)?;
            println!("Deleted variable '{}'", name);
        }
        VarCommand::List => {
            for (name, value) in store.load_custom_variables()? {
                println!("{{{}}} = {}", name, value);
            }
        }
    }
    Ok(())
}

fn run_category(store: &Store, command: CategoryCommand) -> Result<()> {
    match command {
        CategoryCommand::Add { name } => {
            store.save_category(&name)?;
            println!("Added category '{}'", name);
        }
        CategoryCommand::List => {
            for category in store.load_categories()? {
                println!("{}", category);
            }
        }
    }
    Ok(())
}

/// Each stdin line becomes the content of a fresh plain field, as if typed.
/// Prompts read their answer from the next line.
async fn try_in_scratch_field(store: &Store) -> Result<()> {
    let services = Services::system().with_prompter(StdinPrompter);
    let engine = engine_for(store, services)?;
    let detector = TriggerDetector::new(Arc::new(ReplacementDriver::new(engine)));

    while let Some(line) = read_stdin_line().await? {
        let mut field = PlainField::with_value(line);
        match detector.on_edit(&mut field).await {
            Detection::Replaced { shortcut, .. } => {
                println!("[{}] {}", shortcut, field.render_with_caret());
            }
            _ => println!("{}", field.render_with_caret()),
        }
    }
    Ok(())
}

async fn read_stdin_line() -> Result<Option<String>> {
    let line = tokio::task::spawn_blocking(|| -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        Ok((read > 0).then(|| line.trim_end_matches(['\r', '\n']).to_string()))
    })
    .await
    .map_err(|e| QuickfillError::Other(e.to_string()))??;
    Ok(line)
}
