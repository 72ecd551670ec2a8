mod convert;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use ofxify_core::{Column, RawSettings};
use ofxify_import::Markup;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Convert bank CSV exports into OFX or QFX statements.
#[derive(Parser, Debug)]
#[command(name = "ofxify", version, about)]
struct Cli {
    /// TOML file with institution, account and column settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit OFX 2.x XML instead of SGML
    #[arg(long)]
    xml: bool,

    /// Write statements here instead of next to each input
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    settings: SettingsArgs,

    /// CSV files to convert
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

/// Flags that override the config file, key for key.
#[derive(Args, Debug, Default)]
struct SettingsArgs {
    /// ofx or qfx
    #[arg(long)]
    format: Option<String>,
    #[arg(long)]
    currency: Option<String>,
    #[arg(long)]
    org_name: Option<String>,
    #[arg(long)]
    org_id: Option<String>,
    #[arg(long)]
    intuit_id: Option<String>,
    #[arg(long)]
    bank_id: Option<String>,
    #[arg(long)]
    account_id: Option<String>,
    #[arg(long)]
    account_type: Option<String>,
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    end_date: Option<String>,
    #[arg(long)]
    asof_date: Option<String>,
    /// Ledger balance
    #[arg(long, allow_hyphen_values = true)]
    balance: Option<String>,
    /// Available balance
    #[arg(long, allow_hyphen_values = true)]
    avail_balance: Option<String>,
    /// strftime layout of every date in the CSV and settings
    #[arg(long)]
    date_layout: Option<String>,
    /// Whether the first CSV line is a header
    #[arg(long)]
    has_header: Option<bool>,
    /// Column position, e.g. `--column amount=4` (1-based, repeatable)
    #[arg(long = "column", value_name = "NAME=INDEX", value_parser = parse_column)]
    columns: Vec<(Column, usize)>,
}

impl SettingsArgs {
    fn into_raw(self) -> RawSettings {
        RawSettings {
            org_name: self.org_name,
            org_id: self.org_id,
            intuit_id: self.intuit_id,
            bank_id: self.bank_id,
            account_id: self.account_id,
            account_type: self.account_type,
            currency: self.currency,
            date_layout: self.date_layout,
            start_date: self.start_date,
            end_date: self.end_date,
            asof_date: self.asof_date,
            balance: self.balance,
            avail_balance: self.avail_balance,
            has_header: self.has_header,
            format: self.format,
            columns: self.columns.into_iter().collect(),
        }
    }
}

fn parse_column(s: &str) -> Result<(Column, usize), String> {
    let (name, index) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=INDEX, got {s:?}"))?;
    let column = name.trim().parse::<Column>().map_err(|e| e.to_string())?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid index {index:?}: {e}"))?;
    Ok((column, index))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let markup = if cli.xml { Markup::Xml } else { Markup::Sgml };

    let settings = convert::resolve_settings(cli.config.as_deref(), cli.settings.into_raw())
        .context("invalid configuration")?;
    info!(
        org = %settings.institution.name,
        account = %settings.account,
        period = %settings.period,
        format = %settings.format,
        "settings resolved"
    );

    let mut failed = 0usize;
    for input in &cli.files {
        match convert::convert_file(input, &settings, markup, cli.output_dir.as_deref()) {
            Ok(done) => {
                for issue in &done.issues {
                    warn!(input = %input.display(), line = issue.line, "{}", issue.message);
                }
                if !done.unrecognized_types.is_empty() {
                    let kinds: Vec<_> =
                        done.unrecognized_types.iter().map(String::as_str).collect();
                    warn!(
                        input = %input.display(),
                        types = %kinds.join(", "),
                        "non-OFX transaction types passed through"
                    );
                }
                match done.totals {
                    Some(totals) => info!(
                        input = %input.display(),
                        output = %done.output.display(),
                        transactions = done.transactions,
                        credits = %totals.credits,
                        debits = %totals.debits,
                        issues = done.issues.len(),
                        "converted"
                    ),
                    None => warn!(
                        input = %input.display(),
                        output = %done.output.display(),
                        transactions = done.transactions,
                        issues = done.issues.len(),
                        "converted, but amounts are too large to total"
                    ),
                }
            }
            Err(err) => {
                error!(input = %input.display(), "{err:#}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} files failed to convert", cli.files.len());
    }
    Ok(())
}
