use std::error::Error;

use clap::{Args, Parser, Subcommand};
use ledger::{
    Amount, Category, CategoryStore, Clock, Currency, Expense, ExpenseStore, LocalCategoryStore,
    LocalExpenseStore, RemoteCategoryStore, RemoteExpenseStore, SqlTable, dates,
};
use migration::{Migrator, MigratorTrait};

use settings::{Backend, Overrides, Settings};

mod settings;

type AppResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "tener")]
#[command(about = "Operator shell over the expense ledger storage")]
struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the database connection string.
    #[arg(long)]
    database_url: Option<String>,
    /// Override the log level.
    #[arg(long)]
    level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations.
    Migrate,
    AddCategory(CategoryArgs),
    DeleteCategory(CategoryArgs),
    Categories(VaultArgs),
    AddExpense(ExpenseArgs),
    DeleteExpense(DeleteExpenseArgs),
    /// Expenses dated inside an inclusive window.
    Query(QueryArgs),
    /// Per-month per-category sums over the last months.
    Sums(SumsArgs),
}

#[derive(Args, Debug)]
struct VaultArgs {
    #[arg(long, env = "TENER_VAULT")]
    vault: String,
}

#[derive(Args, Debug)]
struct CategoryArgs {
    #[command(flatten)]
    vault: VaultArgs,
    #[arg(long, env = "TENER_USER", default_value = "operator")]
    user: String,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct ExpenseArgs {
    #[command(flatten)]
    vault: VaultArgs,
    #[arg(long, env = "TENER_USER", default_value = "operator")]
    user: String,
    #[arg(long)]
    name: String,
    /// Business date, `YYYY-MM-DD`; defaults to today.
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    category: String,
    /// Decimal amount, e.g. `24.99`.
    #[arg(long)]
    amount: String,
    #[arg(long, default_value = "PLN")]
    currency: String,
}

#[derive(Args, Debug)]
struct DeleteExpenseArgs {
    #[command(flatten)]
    vault: VaultArgs,
    #[arg(long)]
    sort_key: String,
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[command(flatten)]
    vault: VaultArgs,
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    /// Restrict to these categories; repeatable.
    #[arg(long = "category")]
    categories: Vec<String>,
}

#[derive(Args, Debug)]
struct SumsArgs {
    #[command(flatten)]
    vault: VaultArgs,
    #[arg(long, default_value_t = 1)]
    months: u32,
}

struct Stores {
    clock: Clock,
    expenses: Box<dyn ExpenseStore>,
    categories: Box<dyn CategoryStore>,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    let settings = Settings::load(Overrides {
        config: cli.config.as_deref(),
        database_url: cli.database_url.as_deref(),
        level: cli.level.as_deref(),
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tener={level},ledger={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    if let Command::Migrate = cli.command {
        let database = sea_orm::Database::connect(&settings.storage.database_url).await?;
        Migrator::up(&database, None).await?;
        tracing::info!(url = %settings.storage.database_url, "migrations applied");
        return Ok(());
    }

    let stores = open(&settings).await?;
    run(cli.command, &stores).await
}

async fn open(settings: &Settings) -> AppResult<Stores> {
    let clock = Clock::from_name(&settings.app.timezone)?;
    let options = settings.storage.options(clock);

    let stores = match settings.storage.backend {
        Backend::Memory => {
            tracing::info!("using the in-process store");
            Stores {
                clock,
                expenses: Box::new(LocalExpenseStore::new(options)),
                categories: Box::new(LocalCategoryStore::new()),
            }
        }
        Backend::Sqlite => {
            tracing::info!(url = %settings.storage.database_url, "connecting to the item table");
            let database = sea_orm::Database::connect(&settings.storage.database_url).await?;
            Migrator::up(&database, None).await?;
            let table = SqlTable::new(database);
            Stores {
                clock,
                expenses: Box::new(RemoteExpenseStore::new(table.clone(), options)),
                categories: Box::new(RemoteCategoryStore::new(table, options)),
            }
        }
    };
    Ok(stores)
}

async fn run(command: Command, stores: &Stores) -> AppResult<()> {
    match command {
        Command::Migrate => {}
        Command::AddCategory(args) => {
            let category = stores
                .categories
                .create(&args.vault.vault, Category::new(&args.name)?, &args.user)
                .await?;
            println!("{}", category.name);
        }
        Command::DeleteCategory(args) => {
            stores
                .categories
                .delete(&args.vault.vault, &args.name)
                .await?;
        }
        Command::Categories(args) => {
            for category in stores.categories.find_all(&args.vault).await? {
                println!("{}\t{}", category.name, category.created_by);
            }
        }
        Command::AddExpense(args) => {
            let date = args
                .date
                .unwrap_or_else(|| stores.clock.today().format(dates::DATE_FORMAT).to_string());
            let expense = Expense::with_clock(
                &stores.clock,
                &args.name,
                &date,
                &args.category,
                args.amount.parse::<Amount>()?,
                Currency::try_from(args.currency.as_str())?,
            )?;
            let expense = stores
                .expenses
                .create(&args.vault.vault, expense, &args.user)
                .await?;
            println!("{}", expense.sort_key);
        }
        Command::DeleteExpense(args) => {
            stores
                .expenses
                .delete(&args.vault.vault, &args.sort_key)
                .await?;
        }
        Command::Query(args) => {
            let expenses = stores
                .expenses
                .query(
                    &args.vault.vault,
                    dates::parse_date(&args.from)?,
                    dates::parse_date(&args.to)?,
                    &args.categories,
                )
                .await?;
            for expense in expenses {
                println!(
                    "{}\t{}\t{}\t{} {}",
                    expense.sort_key, expense.name, expense.category, expense.amount, expense.currency
                );
            }
        }
        Command::Sums(args) => {
            let mut sums = stores
                .expenses
                .monthly_sums(&args.vault.vault, args.months)
                .await?;
            sums.sort_by(|a, b| (&a.month, &a.category).cmp(&(&b.month, &b.category)));
            for sum in sums {
                println!("{}\t{}\t{}", sum.month, sum.category, sum.sum);
            }
        }
    }
    Ok(())
}
