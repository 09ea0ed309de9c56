//! SHADE CLI
//!
//! Command-line interface for the SHADE stealth address protocol.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shade_core::traits::AnnouncementLog;
use shade_core::types::{Address, StealthMetaAddress};
use shade_crypto::to_checksum_address;
use shade_registry::{FileAnnouncementLog, MemoryAnnouncementLog};
use shade_scanner::{ProgressCallback, ScanPosition, ScanSummary, Scanner, ScannerConfig};
use shade_stealth::{StealthPaymentBuilder, StealthWallet, WalletConfig, WalletKeyFile};

/// SHADE - Stealth addresses with view tags over secp256k1
#[derive(Parser)]
#[command(name = "shade")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new wallet key file
    Keygen {
        /// Output file for keys (JSON)
        #[arg(short, long, env = "SHADE_KEYS_FILE")]
        output: Option<PathBuf>,
        /// Label stored with the keys
        #[arg(short, long)]
        label: Option<String>,
        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Print the meta-address of a key file
    Show {
        /// Path to keys file
        #[arg(short, long, env = "SHADE_KEYS_FILE")]
        keys: PathBuf,
    },

    /// Create a stealth payment and append its announcement to the log
    Send {
        /// Recipient meta-address (st:eth:0x...)
        recipient: String,
        /// Path to the announcement log file
        #[arg(long, env = "SHADE_LOG_FILE")]
        log: PathBuf,
        /// Account appending the announcement
        #[arg(long, default_value = "0x0000000000000000000000000000000000000001")]
        from: String,
        /// Asset identifier for transfer metadata
        #[arg(long, requires = "amount")]
        asset: Option<String>,
        /// Amount for transfer metadata
        #[arg(long, requires = "asset")]
        amount: Option<u128>,
    },

    /// Scan the announcement log for payments
    Scan {
        /// Path to keys file
        #[arg(short, long, env = "SHADE_KEYS_FILE")]
        keys: PathBuf,
        /// Path to the announcement log file
        #[arg(long, env = "SHADE_LOG_FILE")]
        log: PathBuf,
        /// Checkpoint file; the scan resumes from it and updates it
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Entries read per batch
        #[arg(long, default_value_t = shade_core::constants::DEFAULT_SCAN_BATCH_SIZE)]
        batch_size: usize,
        /// Stop after the first discovery
        #[arg(long)]
        stop_on_first: bool,
        /// Print recovered stealth private keys
        #[arg(long)]
        reveal: bool,
    },

    /// Export the viewing key for delegated scanning
    ExportViewingKey {
        /// Path to keys file
        #[arg(short, long, env = "SHADE_KEYS_FILE")]
        keys: PathBuf,
        /// Output file (JSON); printed when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run benchmarks
    Bench {
        /// Number of announcements to generate
        #[arg(short, long, default_value = "10000")]
        count: usize,
        /// Disable parallel scanning
        #[arg(long)]
        sequential: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "shade_core=debug,shade_crypto=debug,shade_stealth=debug,shade_registry=debug,shade_scanner=debug,info"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    match cli.command {
        Commands::Keygen {
            output,
            label,
            force,
        } => cmd_keygen(output, label, force).await,
        Commands::Show { keys } => cmd_show(&keys).await,
        Commands::Send {
            recipient,
            log,
            from,
            asset,
            amount,
        } => cmd_send(&recipient, &log, &from, asset.zip(amount)).await,
        Commands::Scan {
            keys,
            log,
            checkpoint,
            batch_size,
            stop_on_first,
            reveal,
        } => {
            let mut config = ScannerConfig::new().batch_size(batch_size);
            if stop_on_first {
                config = config.stop_on_first();
            }
            cmd_scan(&keys, &log, checkpoint.as_deref(), config, reveal).await
        }
        Commands::ExportViewingKey { keys, output } => {
            cmd_export_viewing_key(&keys, output).await
        }
        Commands::Bench { count, sequential } => cmd_bench(count, !sequential).await,
    }
}

async fn load_wallet(path: &Path) -> Result<StealthWallet> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read keys file {}", path.display()))?;
    let file: WalletKeyFile =
        serde_json::from_str(&contents).context("Keys file is not valid JSON")?;
    let wallet: StealthWallet = StealthWallet::from_key_file(&file).context("Keys file is invalid")?;
    debug!(path = %path.display(), meta_address = %wallet.meta_address(), "Loaded wallet");
    Ok(wallet)
}

/// Generate a new wallet
async fn cmd_keygen(output: Option<PathBuf>, label: Option<String>, force: bool) -> Result<()> {
    println!("{}", "Generating SHADE keys...".cyan().bold());

    let wallet: StealthWallet = StealthWallet::generate_with_config(WalletConfig { label })?;
    let file = wallet.to_key_file()?;
    let json = serde_json::to_string_pretty(&file)?;

    if let Some(path) = output {
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} {}", "Keys saved to:".green(), path.display());
    } else {
        println!("\n{}", "Keys (JSON):".yellow().bold());
        println!("{}", json);
    }

    println!("\n{}", "Meta-address:".yellow().bold());
    println!("   {}", wallet.meta_address());
    println!("\n{}", "IMPORTANT: Keep your secret keys safe!".red().bold());
    println!("   The spending key controls funds. The viewing key reveals incoming payments.");

    Ok(())
}

/// Print the meta-address of a key file
async fn cmd_show(keys: &Path) -> Result<()> {
    let wallet = load_wallet(keys).await?;
    if let Some(label) = wallet.label() {
        println!("{} {}", "Label:".dimmed(), label);
    }
    println!("{} {}", "Scheme:".dimmed(), wallet.meta_address().scheme_id);
    println!("{}", wallet.meta_address());
    Ok(())
}

/// Create a stealth payment and publish its announcement
async fn cmd_send(
    recipient: &str,
    log_path: &Path,
    from: &str,
    transfer: Option<(String, u128)>,
) -> Result<()> {
    println!("{} {}", "Creating stealth payment to:".cyan().bold(), recipient);

    let meta: StealthMetaAddress = recipient.parse().context("Invalid meta-address")?;
    let caller: Address = from.parse().context("Invalid --from address")?;

    let mut builder = StealthPaymentBuilder::new().recipient(meta);
    if let Some((asset, amount)) = transfer {
        let asset: Address = asset.parse().context("Invalid --asset address")?;
        builder = builder.asset_transfer(asset, amount);
    }
    let payment = builder.build().context("Failed to create stealth payment")?;

    let log = FileAnnouncementLog::open(log_path)
        .await
        .with_context(|| format!("Failed to open log {}", log_path.display()))?;
    let offset = log
        .append(&caller, payment.announcement.clone())
        .await
        .context("Failed to append announcement")?;
    log.flush().await.context("Failed to save log")?;

    println!("\n{}", "Stealth payment created:".green().bold());
    println!(
        "   {} {}",
        "Address:".yellow(),
        to_checksum_address(&payment.stealth_address)
    );
    println!("   {} {}", "View tag:".dimmed(), payment.announcement.view_tag.to_hex());
    println!(
        "   {} {}",
        "Ephemeral key:".dimmed(),
        payment.announcement.ephemeral_public_key.to_hex()
    );
    println!("   {} {}", "Log offset:".dimmed(), offset);

    println!("\n{}", "Announcement (JSON):".yellow().bold());
    println!("{}", serde_json::to_string_pretty(&payment.announcement)?);

    Ok(())
}

/// Scan for payments
async fn cmd_scan(
    keys: &Path,
    log_path: &Path,
    checkpoint: Option<&Path>,
    config: ScannerConfig,
    reveal: bool,
) -> Result<()> {
    println!("{}", "Scanning for payments...".cyan().bold());

    let wallet = load_wallet(keys).await?;
    let log = FileAnnouncementLog::open(log_path)
        .await
        .with_context(|| format!("Failed to open log {}", log_path.display()))?;

    let position = match checkpoint {
        Some(path) if path.exists() => {
            let contents = tokio::fs::read_to_string(path).await?;
            serde_json::from_str(&contents).context("Checkpoint file is invalid")?
        }
        _ => ScanPosition::new(),
    };

    let total = log.len().await?;
    if total <= position.next_offset {
        println!("\n{}", "No new announcements to scan.".yellow());
        return Ok(());
    }
    println!("   Resuming at offset {} of {}", position.next_offset, total);

    let scanner: Scanner = Scanner::new(wallet.into_keys()).with_position(position);

    let pb = ProgressBar::new(total - scanner.position().next_offset);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    let bar = pb.clone();
    let callback: ProgressCallback = Box::new(move |progress| bar.set_position(progress.scanned));

    let discoveries = scanner
        .scan_with_progress(&log, config, callback)
        .await
        .context("Scan failed")?;
    pb.finish_and_clear();

    if discoveries.is_empty() {
        println!("\n{}", "No payments found.".yellow());
    } else {
        println!("\n{} payment(s) found:", discoveries.len().to_string().green());
        for discovery in &discoveries {
            let announcement = &discovery.entry.announcement;
            println!(
                "   {} {}",
                "Address:".green(),
                to_checksum_address(discovery.keys.address())
            );
            println!("      Log offset: {}", discovery.entry.offset);
            if let (Some(asset), Some(amount)) =
                (announcement.metadata.asset(), announcement.metadata.amount())
            {
                println!(
                    "      Asset: {}  Amount: 0x{}",
                    to_checksum_address(&asset),
                    hex::encode(amount)
                );
            }
            if reveal {
                println!(
                    "      {} {}",
                    "Private key:".red(),
                    discovery.keys.encoded_secret()?.to_hex()
                );
            }
        }
    }

    let summary = ScanSummary::from(scanner.stats());
    println!(
        "\n   {} scanned, {} skipped, {:.2}% filtered by view tag",
        summary.total_scanned, summary.skipped, summary.filter_efficiency
    );

    if let Some(path) = checkpoint {
        let json = serde_json::to_string_pretty(&scanner.position())?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write checkpoint {}", path.display()))?;
        println!("   Checkpoint saved to {}", path.display());
    }

    Ok(())
}

/// Export the viewing key
async fn cmd_export_viewing_key(keys: &Path, output: Option<PathBuf>) -> Result<()> {
    let wallet = load_wallet(keys).await?;
    let export = wallet.export_viewing_key()?;
    let json = serde_json::to_string_pretty(&export)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} {}", "Viewing key saved to:".green(), path.display());
        }
        None => println!("{}", json),
    }

    println!(
        "\n{}",
        "The viewing key reveals every incoming payment. Share it only with auditors you trust."
            .yellow()
    );
    Ok(())
}

/// Run benchmarks
async fn cmd_bench(count: usize, parallel: bool) -> Result<()> {
    println!("{} {} announcements", "Benchmarking with".cyan().bold(), count);

    println!("\n{}", "1. Generating keys...".dimmed());
    let start = std::time::Instant::now();
    let ours: StealthWallet = StealthWallet::generate()?;
    let theirs: StealthWallet = StealthWallet::generate()?;
    println!("   Key generation: {:?}", start.elapsed());

    println!("\n{}", "2. Creating announcements...".dimmed());
    let log = Arc::new(MemoryAnnouncementLog::with_capacity(count));
    let sender = Address::from_array([0x5E; 20]);

    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let start = std::time::Instant::now();
    let mut expected = 0;
    for i in 0..count {
        // One payment in a hundred is ours
        let meta = if i % 100 == 0 {
            expected += 1;
            ours.meta_address()
        } else {
            theirs.meta_address()
        };
        let payment = StealthPaymentBuilder::new().recipient(meta.clone()).build()?;
        log.append(&sender, payment.announcement).await?;
        pb.inc(1);
    }
    pb.finish();
    println!("   Created {} announcements: {:?}", count, start.elapsed());

    println!("\n{}", "3. Scanning...".dimmed());
    let scanner: Scanner = Scanner::new(ours.into_keys());
    let start = std::time::Instant::now();
    let discoveries = scanner
        .scan_with_config(log.as_ref(), ScannerConfig::new().parallel(parallel))
        .await?;
    let scan_time = start.elapsed();

    let rate = count as f64 / scan_time.as_secs_f64();
    println!("   Scanned {} announcements: {:?}", count, scan_time);
    println!("   Found {} payments", discoveries.len());

    println!("\n{}", "Results:".green().bold());
    println!("   Mode: {}", if parallel { "parallel" } else { "sequential" });
    println!("   Scan rate: {:.0} announcements/sec", rate);
    println!(
        "   Time per announcement: {:.2}µs",
        scan_time.as_micros() as f64 / count.max(1) as f64
    );

    if discoveries.len() == expected {
        println!("   {} All expected payments found!", "OK".green());
    } else {
        println!(
            "   {} Expected {}, found {}",
            "MISMATCH".red(),
            expected,
            discoveries.len()
        );
    }

    Ok(())
}
