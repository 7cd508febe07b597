use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    BookBrowser, ControllerDeps, DeleteOutcome, EditSessionController, HttpBookCollection,
    SaveOutcome,
};
use shared::domain::{Book, BookId, BookPatch};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use config::load_settings;
use terminal::{ConsoleNotifier, LoggedDialog, StdinPrompt};

#[derive(Parser, Debug)]
struct Args {
    /// Overrides `server_url` from browser.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        stock: Option<i64>,
    },
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        stock: Option<i64>,
    },
    Delete {
        #[arg(long)]
        id: i64,
        /// Skip the confirmation question.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }

    let collection = Arc::new(HttpBookCollection::new(&settings.server_url)?);
    let assume_yes = matches!(args.command, Command::Delete { yes: true, .. });
    let deps = ControllerDeps {
        collection: collection.clone(),
        prompt: Arc::new(StdinPrompt::new(assume_yes)),
        notifier: Arc::new(ConsoleNotifier),
        dialog: Arc::new(LoggedDialog),
    };
    let mut controller = EditSessionController::new(deps, settings.controller_settings());
    let mut browser = BookBrowser::new(collection);
    info!(server_url = %settings.server_url, "browser: connected");

    match args.command {
        Command::List { search } => {
            let rows = browser.search(search.unwrap_or_default()).await?;
            for book in rows {
                print_book(book);
            }
        }
        Command::Create { title, stock } => {
            controller.begin_create().await?;
            controller
                .stage_edit(BookPatch {
                    title: Some(title),
                    stock,
                })
                .await?;
            finish_save(&mut controller).await?;
        }
        Command::Edit { id, title, stock } => {
            let patch = BookPatch { title, stock };
            if patch.is_empty() {
                bail!("nothing to change: pass --title and/or --stock");
            }
            let selected = select(&mut browser, BookId(id)).await?;
            controller.begin_edit(Some(&selected)).await?;
            controller.stage_edit(patch).await?;
            finish_save(&mut controller).await?;
        }
        Command::Delete { id, .. } => {
            let selected = select(&mut browser, BookId(id)).await?;
            match controller.confirm_delete(Some(&selected)).await? {
                DeleteOutcome::Deleted(_) | DeleteOutcome::Declined => {}
                DeleteOutcome::NoSelection => bail!("book {id} not found"),
                DeleteOutcome::Failed(error) => return Err(error.into()),
            }
        }
    }

    Ok(())
}

async fn select(browser: &mut BookBrowser, book_id: BookId) -> Result<Book> {
    browser.refresh().await?;
    browser
        .select_book(book_id)
        .cloned()
        .ok_or_else(|| anyhow!("book {} not found", book_id.0))
}

/// Saves the open session. A one-shot command cannot keep a failed dialog
/// open, so the session is cancelled and the failure returned.
async fn finish_save(controller: &mut EditSessionController) -> Result<()> {
    match controller.save().await? {
        SaveOutcome::Created(book) | SaveOutcome::Updated(book) => {
            info!(book_id = book.id.0, "browser: saved");
            print_book(&book);
        }
        SaveOutcome::UpdateQueued => controller.settle_deferred_updates().await,
        SaveOutcome::Failed(failure) => {
            controller.cancel().await?;
            return Err(failure.into());
        }
    }
    Ok(())
}

fn print_book(book: &Book) {
    println!("{:>5}  {:<40}  {:>6}", book.id.0, book.title, book.stock);
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
