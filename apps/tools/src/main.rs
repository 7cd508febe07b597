use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use server_api::ApiContext;
use shared::{domain::Book, protocol::CreateBookRequest};
use storage::Storage;

const SAMPLE_CATALOGUE: &[(&str, i64)] = &[
    ("Wuthering Heights", 12),
    ("Jane Eyre", 11),
    ("The Raven", 333),
    ("Eleonora", 555),
    ("Catweazle", 22),
];

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/books.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fills an empty store with a small sample catalogue.
    Seed,
    AddBook {
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = 0)]
        stock: i64,
    },
    ListBooks {
        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open {}", cli.database_url))?;

    match cli.command {
        Command::Seed => {
            let seeded = seed(&storage).await?;
            if seeded.is_empty() {
                println!(
                    "store already holds {} books, nothing seeded",
                    storage.count_books().await?
                );
            }
            for book in &seeded {
                print_book(book);
            }
        }
        Command::AddBook { title, stock } => {
            let book = add_book(storage, title, stock).await?;
            println!("created book_id={}", book.id.0);
        }
        Command::ListBooks { search } => {
            for book in list_books(&storage, search.as_deref()).await? {
                print_book(&book);
            }
        }
    }

    Ok(())
}

async fn seed(storage: &Storage) -> Result<Vec<Book>> {
    if storage.count_books().await? > 0 {
        return Ok(Vec::new());
    }
    let mut seeded = Vec::with_capacity(SAMPLE_CATALOGUE.len());
    for (title, stock) in SAMPLE_CATALOGUE {
        seeded.push(storage.create_book(title, *stock).await?);
    }
    Ok(seeded)
}

async fn add_book(storage: Storage, title: String, stock: i64) -> Result<Book> {
    let ctx = ApiContext { storage };
    Ok(server_api::create_book(&ctx, CreateBookRequest { title, stock }).await?)
}

async fn list_books(storage: &Storage, search: Option<&str>) -> Result<Vec<Book>> {
    let filter = search.map(str::trim).filter(|s| !s.is_empty());
    storage.list_books(filter).await
}

fn print_book(book: &Book) {
    println!("{:>5}  {:<40}  {:>6}", book.id.0, book.title, book.stock);
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
