use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::io::Write as _;
use std::path::PathBuf;

use gmail2md::auth::{token_manager::TokenManager, token_store};
use gmail2md::config::{load_config, resolve_output_dir};
use gmail2md::llm::openrouter::OpenRouterConverter;
use gmail2md::mail::gmail::GmailClient;
use gmail2md::mail::query::SearchCriteria;
use gmail2md::pipeline::{convert, download, fetch_ids};
use gmail2md::store::FsStore;

#[derive(Parser)]
#[command(name = "gmail2md")]
#[command(about = "Download Gmail emails and convert them to markdown essays", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download matching emails as normalized JSON records
    Download {
        /// Email sender (wildcards like *@domain.com are stripped)
        #[arg(long, short = 's')]
        sender: Option<String>,

        /// Subject line (partial match supported)
        #[arg(long, short = 'j')]
        subject: Option<String>,

        /// Emails after this date (YYYY/MM/DD or YYYY-MM-DD)
        #[arg(long, short = 'a')]
        after: Option<String>,

        /// Emails before this date (YYYY/MM/DD or YYYY-MM-DD)
        #[arg(long, short = 'b')]
        before: Option<String>,

        /// Emails from the last N days (overrides --after)
        #[arg(long, short = 'd')]
        days: Option<u64>,

        /// Custom Gmail query fragment, appended verbatim (advanced users)
        #[arg(long, short = 'q')]
        query: Option<String>,

        /// Output directory (default: ~/Documents/gmail_exports)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Maximum number of emails to download
        #[arg(long, short = 'm')]
        max_results: Option<usize>,

        /// Batch size for download progress reporting
        #[arg(long, default_value_t = download::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Preview what would be downloaded without writing anything
        #[arg(long, short = 'n')]
        dry_run: bool,

        /// Skip the confirmation prompt for an unscoped full-mailbox fetch
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Convert downloaded records to markdown essays
    Convert {
        /// Input directory with raw JSON records
        /// (default: <output>/raw_emails)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Output directory for markdown files
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Store the OAuth client secret in the keyring
    SetClientSecret {
        #[arg(long)]
        client_id: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::SetClientSecret { client_id } => {
            eprintln!("Paste client secret (end with Ctrl-D):");
            let mut secret = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
            token_store::save_client_secret(&client_id, secret.trim())?;
            println!("Saved client secret for client_id {}", client_id);
            Ok(())
        }

        Command::Download {
            sender,
            subject,
            after,
            before,
            days,
            query,
            output,
            max_results,
            batch_size,
            dry_run,
            force,
        } => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let output_dir = resolve_output_dir(&cfg, output);

            let criteria = SearchCriteria {
                sender,
                subject,
                after,
                before,
                query,
                days,
            }
            .resolve(chrono::Local::now().date_naive());
            let compiled = criteria.compile();
            println!("Gmail query: {compiled}");

            // An empty query means a full-mailbox fetch; never run one silently.
            if compiled.is_empty() && !force {
                println!("Warning: no search criteria specified. This will fetch ALL emails!");
                if !confirm("Continue? (y/N): ")? {
                    return Ok(());
                }
            }

            let token_mgr = TokenManager::from_config(&cfg)?;
            let access_token = token_mgr.get_access_token()?;
            let gmail = GmailClient::new(access_token)?;

            println!("Fetching email IDs...");
            let ids = fetch_ids::fetch_message_ids(&gmail, &compiled, max_results);
            println!("Total emails found: {}", ids.len());
            if ids.is_empty() {
                println!("No emails found matching criteria!");
                return Ok(());
            }

            if dry_run {
                download::preview_download(&gmail, &ids);
                return Ok(());
            }

            let store = FsStore::open(output_dir.join("raw_emails"))?;
            let report = download::download_batch(&gmail, &store, &ids, batch_size)?;
            println!(
                "Done. Downloaded: {}, skipped: {}, failed: {}",
                report.downloaded, report.skipped, report.failed
            );
            println!("Raw emails saved to {}", store.root().display());
            Ok(())
        }

        Command::Convert { input, output } => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let output_dir = resolve_output_dir(&cfg, output);
            let input_dir = input.unwrap_or_else(|| output_dir.join("raw_emails"));

            if !input_dir.exists() {
                return Err(anyhow!(
                    "Input directory does not exist: {}",
                    input_dir.display()
                ));
            }

            println!("Input directory: {}", input_dir.display());
            println!("Output directory: {}", output_dir.display());

            let converter = OpenRouterConverter::from_settings(&cfg.converter)?;
            let raw = FsStore::open(input_dir)?;
            let out = FsStore::open(output_dir.clone())?;

            convert::convert_records(&raw, &out, &converter)?;
            println!("Converted emails saved to {}", output_dir.display());
            Ok(())
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}
