use anyhow::{bail, Context, Result};
use ofxify_core::{ConfigError, OutputFormat, RawSettings, Settings, StatementTotals};
use ofxify_import::{import, Markup, RowIssue};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub struct Conversion {
    pub output: PathBuf,
    pub transactions: usize,
    /// `None` when the amounts are too large to sum.
    pub totals: Option<StatementTotals>,
    pub issues: Vec<RowIssue>,
    /// Type column values that are not OFX codes, written as given.
    pub unrecognized_types: BTreeSet<String>,
}

/// Layers defaults, the optional config file and flag overrides, in that
/// order of increasing precedence.
pub fn resolve_settings(
    config: Option<&Path>,
    overrides: RawSettings,
) -> Result<Settings, ConfigError> {
    let mut raw = RawSettings::defaults();
    if let Some(path) = config {
        raw = raw.merge(RawSettings::load(path)?);
    }
    raw.merge(overrides).validate()
}

/// `dir/name.csv` becomes `dir/name.<format>`, or lands in `output_dir` when given.
pub fn output_path(input: &Path, format: OutputFormat, output_dir: Option<&Path>) -> PathBuf {
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(format.extension());
    dir.join(name)
}

pub fn convert_file(
    input: &Path,
    settings: &Settings,
    markup: Markup,
    output_dir: Option<&Path>,
) -> Result<Conversion> {
    let output = output_path(input, settings.format, output_dir);
    if output == input {
        bail!("refusing to overwrite input {}", input.display());
    }

    let data = fs::read(input).with_context(|| format!("unable to read {}", input.display()))?;
    let (statement, issues) = import::import_csv(data.as_slice(), settings)
        .with_context(|| format!("unable to parse {}", input.display()))?;
    let rendered = import::render(&statement, markup)
        .with_context(|| format!("unable to serialize {}", input.display()))?;

    info!(output = %output.display(), "writing statement");
    fs::write(&output, rendered)
        .with_context(|| format!("unable to write {}", output.display()))?;

    Ok(Conversion {
        output,
        transactions: statement.transactions.len(),
        totals: statement.totals(),
        issues,
        unrecognized_types: statement
            .unrecognized_types()
            .map(|kind| kind.code().to_string())
            .collect(),
    })
}
