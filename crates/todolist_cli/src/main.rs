//! Terminal front end for the to-do list.
//!
//! # Responsibility
//! - Resolve config, start logging, open the database.
//! - Seed an empty store on first listing and print the filtered rows.

use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use todolist_core::db::open_db;
use todolist_core::{
    init_logging, AppConfig, HttpSeedFetcher, Presenter, SqliteTaskRepository, TaskDraft, TaskId,
    TaskStore, TodoView,
};

#[derive(Parser, Debug)]
#[command(name = "todolist", version, about = "Local to-do list seeded from a remote feed")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Print tasks newest first, seeding an empty store first.
    List { search: Option<String> },
    /// Create a task.
    Add {
        title: String,
        #[arg(default_value = "")]
        description: String,
    },
    /// Replace title and description of a task.
    Edit {
        id: TaskId,
        title: String,
        #[arg(default_value = "")]
        description: String,
    },
    /// Flip the completion flag of a task.
    Toggle { id: TaskId },
    /// Delete one task.
    Delete { id: TaskId },
    /// Delete every task; the next listing seeds again.
    Reset,
    /// Print the share text of a task.
    Share { id: TaskId },
}

/// Prints progress and errors to stderr; rows are printed by the caller.
struct ConsoleView;

impl TodoView for ConsoleView {
    fn show_progress(&mut self, shown: bool) {
        if shown {
            eprintln!("Fetching tasks...");
        }
    }

    fn update_table(&mut self) {}

    fn show_error(&mut self, message: &str) {
        eprintln!("Could not load tasks: {message}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command.unwrap_or(Commands::List { search: None })) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    if let Err(err) = init_logging(&config.log_level, &config.log_dir.to_string_lossy()) {
        eprintln!("warning: logging disabled: {err}");
    }

    let conn = open_db(&config.db_path)?;
    let repo = SqliteTaskRepository::try_new(&conn)?;
    let fetcher = Arc::new(HttpSeedFetcher::new(config.todos_endpoint.clone())?);
    let mut presenter = Presenter::new(TaskStore::new(repo), fetcher, ConsoleView);
    info!("event=cli_start module=core status=ok");

    match command {
        Commands::List { search } => {
            presenter.load_trackers();
            presenter.wait_for_seed();
            if let Some(search) = search {
                presenter.update_search_text(&search);
            }
            if presenter.count() == 0 {
                println!("No tasks.");
            }
            for task in presenter.list_all() {
                let mark = if task.is_completed { 'x' } else { ' ' };
                println!(
                    "[{mark}] {}  {}  {}",
                    task.created_date_label(),
                    task.id,
                    task.title
                );
            }
        }
        Commands::Add { title, description } => {
            let task = presenter.create_task(TaskDraft::new(title, description))?;
            println!("Created {}", task.id);
        }
        Commands::Edit {
            id,
            title,
            description,
        } => presenter.edit_task(id, TaskDraft::new(title, description))?,
        Commands::Toggle { id } => presenter.toggle_completed(id)?,
        Commands::Delete { id } => presenter.delete_task(id)?,
        Commands::Reset => presenter.reset_all()?,
        Commands::Share { id } => match presenter.store().get(id)? {
            Some(task) => println!("{}", task.share_text()),
            None => return Err(format!("task not found: {id}").into()),
        },
    }
    Ok(())
}
