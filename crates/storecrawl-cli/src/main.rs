//! storecrawl - query Google Play and F-Droid from the command line.
//!
//! Records are printed to stdout as pretty JSON; logs go to stderr (and to
//! a daily log file when `log_dir` is configured).

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storecrawl_core::auth::SessionStore;
use storecrawl_core::{
    AppStore, ClientError, Config, CredentialStore, Credentials, FDroidClient, HttpTransport,
    PlayClient, Store,
};

// ============================================================================
// Constants
// ============================================================================

const EMAIL_VAR: &str = "STORECRAWL_EMAIL";
const PASSWORD_VAR: &str = "STORECRAWL_PASSWORD";

const LOG_FILE_PREFIX: &str = "storecrawl.log";

const USAGE: &str = "\
Usage: storecrawl <command>

Commands:
  login                                             log in to Google Play and remember the session
  details <store> <package>                         print one app
  categories <store>                                print the top-level categories
  subcategories <store> <category>                  print the subcategories of a category
  discover <store> <category> <subcategory> [pages] print discovered apps, page by page

<store> is `play` or `fdroid`.";

/// Initialize the tracing subscriber for logging
///
/// The returned guard flushes the log file and must live until exit.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

fn parse_store(arg: &str) -> Result<Store> {
    match arg.to_ascii_lowercase().as_str() {
        "play" | "googleplay" | "google-play" => Ok(Store::GooglePlay),
        "fdroid" | "f-droid" => Ok(Store::FDroid),
        other => anyhow::bail!("Unknown store '{}' (expected `play` or `fdroid`)", other),
    }
}

fn arg(args: &[String], index: usize, name: &str) -> Result<String> {
    args.get(index)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Missing <{}>\n\n{}", name, USAGE))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

// ============================================================================
// Clients
// ============================================================================

fn session_store(config: &Config) -> Result<SessionStore> {
    Ok(SessionStore::new(config.cache_dir()?))
}

fn play_client(config: &Config, credentials: Credentials) -> Result<PlayClient> {
    let transport = HttpTransport::new(config.timeout())?;
    Ok(PlayClient::new(
        transport,
        config.device_profile()?,
        config.locale.clone(),
        credentials,
        Some(session_store(config)?),
    ))
}

/// Credentials for non-interactive commands: environment first, then the
/// configured account with its keychain password and saved session.
fn stored_credentials(config: &Config) -> Result<Credentials> {
    let account = std::env::var(EMAIL_VAR)
        .ok()
        .or_else(|| config.last_account.clone())
        .ok_or_else(|| anyhow::anyhow!("No Google Play account. Run `storecrawl login` first."))?;

    let password = match std::env::var(PASSWORD_VAR) {
        Ok(password) => password,
        Err(_) => CredentialStore::get_password(&account).unwrap_or_else(|e| {
            warn!(error = %e, "No keychain password, relying on the saved session");
            String::new()
        }),
    };

    let mut credentials = Credentials::new(account.clone(), password);
    if let Some(token) = session_store(config)?.load(&account)? {
        credentials = credentials.with_token(token);
    }
    Ok(credentials)
}

fn open_store(config: &Config, store: Store) -> Result<Box<dyn AppStore>> {
    match store {
        Store::GooglePlay => Ok(Box::new(play_client(config, stored_credentials(config)?)?)),
        Store::FDroid => {
            let transport = HttpTransport::new(config.timeout())?;
            Ok(Box::new(
                FDroidClient::new(transport)?.with_concurrency(config.fdroid_concurrency),
            ))
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn login(config: &mut Config) -> Result<()> {
    let account = match std::env::var(EMAIL_VAR) {
        Ok(account) => account,
        Err(_) => {
            let default = config.last_account.clone().unwrap_or_default();
            let entered = prompt(&format!("Google account [{}]: ", default))?;
            if entered.is_empty() {
                default
            } else {
                entered
            }
        }
    };
    if account.is_empty() {
        anyhow::bail!("No account given");
    }

    let password = match std::env::var(PASSWORD_VAR) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let client = play_client(config, Credentials::new(account.clone(), password.clone()))?;
    client.login().await.context("Google Play login failed")?;

    if let Err(e) = CredentialStore::store(&account, &password) {
        warn!(error = %e, "Could not store the password in the keychain");
    }
    config.last_account = Some(account.clone());
    config.save()?;

    info!(account = %account, "Logged in");
    eprintln!("Logged in as {}", account);
    Ok(())
}

async fn find_category(store: &dyn AppStore, wanted: &str) -> Result<storecrawl_core::Category> {
    let categories = store.categories().await?;
    categories
        .records
        .into_iter()
        .find(|c| c.id.eq_ignore_ascii_case(wanted) || c.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| anyhow::anyhow!("No category '{}' in {}", wanted, store.store()))
}

async fn discover(
    store: &dyn AppStore,
    category: &str,
    subcategory: &str,
    max_pages: usize,
) -> Result<()> {
    let category = find_category(store, category).await?;
    let subcategories = store.subcategories(&category, false).await?;
    let subcategory = subcategories
        .records
        .into_iter()
        .find(|s| s.id.eq_ignore_ascii_case(subcategory) || s.name.eq_ignore_ascii_case(subcategory))
        .ok_or_else(|| anyhow::anyhow!("No subcategory '{}' in {}", subcategory, category.name))?;

    let mut page = store.discover_apps(&subcategory).await?;
    print_json(&page)?;
    for _ in 1..max_pages {
        page = match store.next_page(&page).await {
            Ok(next) => next,
            Err(ClientError::Exhausted) => break,
            Err(e) => return Err(e.into()),
        };
        print_json(&page)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load()?;
    let _guard = init_tracing(&config);

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    match command.as_str() {
        "login" => login(&mut config).await,
        "details" => {
            let store = open_store(&config, parse_store(&arg(&args, 2, "store")?)?)?;
            let app = store.fetch_details(&arg(&args, 3, "package")?).await?;
            print_json(&app)
        }
        "categories" => {
            let store = open_store(&config, parse_store(&arg(&args, 2, "store")?)?)?;
            print_json(&store.categories().await?)
        }
        "subcategories" => {
            let store = open_store(&config, parse_store(&arg(&args, 2, "store")?)?)?;
            let category = find_category(store.as_ref(), &arg(&args, 3, "category")?).await?;
            print_json(&store.subcategories(&category, false).await?)
        }
        "discover" => {
            let store = open_store(&config, parse_store(&arg(&args, 2, "store")?)?)?;
            let max_pages = match args.get(5) {
                Some(pages) => pages
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page count '{}'", pages))?,
                None => usize::MAX,
            };
            discover(
                store.as_ref(),
                &arg(&args, 3, "category")?,
                &arg(&args, 4, "subcategory")?,
                max_pages,
            )
            .await
        }
        "-h" | "--help" | "help" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => anyhow::bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}
