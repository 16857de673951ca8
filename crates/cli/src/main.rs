// PriceLab CLI - margin/price calculator over a persisted working table

mod exit_codes;
mod render;
mod workspace;

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use pricelab_engine::model::{CalcMode, Field};
use pricelab_engine::presets::FeePresets;
use pricelab_engine::reducer::{ChangeSet, EditReport};
use pricelab_engine::session::Role;
use pricelab_engine::summary::summarize;
use pricelab_engine::transfer::TransferJoin;
use pricelab_engine::value::{format_number, CellValue};
use pricelab_io::{HistoryAction, StorageError, WorksheetStore};

use exit_codes::{
    storage_exit_code, EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_TRANSFER_EMPTY,
    EXIT_USAGE,
};
use workspace::Workspace;

/// Log filter variable; defaults to `warn`.
const LOG_ENV: &str = "PRICELAB_LOG";

#[derive(Parser)]
#[command(name = "plab")]
#[command(about = "Margin and selling-price calculator for two trading vendors")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a fresh session seeded with the sample table
    New,

    /// Print the working table and its totals
    Show {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a grid change-set
    #[command(after_help = "\
Examples:
  plab edit changes.json
  echo '{\"edited_rows\": {\"0\": {\"selling_price\": 1000}}}' | plab edit -")]
    Edit {
        /// Change-set JSON file, or - for stdin
        changes: String,
    },

    /// Set one cell (rows are numbered from 1 as displayed)
    #[command(after_help = "\
Examples:
  plab set 1 cost 1200
  plab set 2 fee_percent 13
  plab set 3 order 1
  plab set 1 reverse true")]
    Set {
        row: usize,
        field: Field,
        value: String,
    },

    /// Append blank rows
    Add {
        #[arg(default_value_t = 1)]
        count: usize,
    },

    /// Delete rows by displayed position
    Rm {
        #[arg(required = true)]
        rows: Vec<usize>,
    },

    /// Switch the margin basis (price or cost) and recompute
    Mode { mode: CalcMode },

    /// Switch vendor role (a or b)
    Role { role: Role },

    /// List accepted fee percentages, or replace them
    Presets {
        /// Comma-separated percentages; 0 is always kept
        #[arg(long, value_delimiter = ',')]
        set: Option<Vec<f64>>,
    },

    /// Write the working table to the store
    Save,

    /// Replace the working table with the stored one
    Load,

    /// Publish the working table to the counterparty's inbox
    Send,

    /// Take the counterparty's prices as costs
    Receive {
        /// How rows are paired with the counterparty's rows
        #[arg(long, default_value = "position")]
        join: TransferJoin,
    },

    /// Export the working table
    Export {
        /// Output file (default: Pricing_MMDD.xlsx)
        path: Option<PathBuf>,

        /// Output format (default: from extension, else xlsx)
        #[arg(long, short = 'f')]
        format: Option<ExportFormat>,
    },

    /// Replace the working table with a CSV file
    Import { path: PathBuf },

    /// List snapshots recorded on save/send/receive
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Print one snapshot in full
        #[arg(long, value_name = "ID")]
        show: Option<i64>,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum ExportFormat {
    Xlsx,
    Csv,
    Json,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  pricelab-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::New => cmd_new(),
        Commands::Show { json } => cmd_show(json),
        Commands::Edit { changes } => cmd_edit(&changes),
        Commands::Set { row, field, value } => cmd_set(row, field, value),
        Commands::Add { count } => cmd_add(count),
        Commands::Rm { rows } => cmd_rm(&rows),
        Commands::Mode { mode } => cmd_mode(mode),
        Commands::Role { role } => cmd_role(role),
        Commands::Presets { set } => cmd_presets(set),
        Commands::Save => cmd_save(),
        Commands::Load => cmd_load(),
        Commands::Send => cmd_send(),
        Commands::Receive { join } => cmd_receive(join),
        Commands::Export { path, format } => cmd_export(path, format),
        Commands::Import { path } => cmd_import(&path),
        Commands::History { limit, show, json } => cmd_history(limit, show, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(EXIT_PARSE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn storage(err: StorageError) -> Self {
        let hint = match &err {
            StorageError::Unavailable(_) => Some("check store_path in settings.toml".to_string()),
            _ => None,
        };
        Self { code: storage_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Table commands
// ============================================================================

fn cmd_new() -> Result<(), CliError> {
    let mut ws = Workspace::load();
    ws.pricing = Workspace::fresh_session(&ws.settings);
    ws.save()?;
    println!(
        "new session: {} rows, {}, {}",
        ws.pricing.table.len(),
        ws.pricing.mode,
        ws.pricing.role.display_name()
    );
    Ok(())
}

fn cmd_show(json: bool) -> Result<(), CliError> {
    let ws = Workspace::load();
    let summary = summarize(&ws.pricing.table);
    if json {
        let out = serde_json::json!({
            "role": ws.pricing.role,
            "mode": ws.pricing.mode,
            "rows": ws.pricing.table,
            "summary": summary,
        });
        let text = serde_json::to_string_pretty(&out).map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", text);
    } else {
        println!("{} | {}", ws.pricing.role.display_name(), ws.pricing.mode);
        print!("{}", render::table(&ws.pricing.table));
        println!("{}", render::summary(&summary));
    }
    Ok(())
}

fn cmd_edit(source: &str) -> Result<(), CliError> {
    let json = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::io(format!("failed to read stdin: {e}")))?;
        buf
    } else {
        std::fs::read_to_string(source).map_err(|e| CliError::io(format!("{source}: {e}")))?
    };
    let changes = ChangeSet::from_editor_json(&json).map_err(|e| {
        CliError::parse(e.to_string())
            .with_hint("expected {\"edited_rows\": {\"<row>\": {\"<field>\": value}}, \"added_rows\": [...]}")
    })?;

    let mut ws = Workspace::load();
    let report = ws.pricing.apply(&changes);
    ws.save()?;
    print_report(&report);
    Ok(())
}

fn cmd_set(row: usize, field: Field, value: String) -> Result<(), CliError> {
    let mut ws = Workspace::load();
    let rows = ws.pricing.table.len();
    if row == 0 || row > rows {
        return Err(CliError::args(format!("row {row} out of range (table has {rows} rows)")));
    }
    let changes = ChangeSet::new().edit(row - 1, field, CellValue::Text(value));
    let report = ws.pricing.apply(&changes);
    if let Some(rejected) = report.rejected.first() {
        return Err(CliError::args(format!("row {row} {field}: {}", rejected.rejection)));
    }
    ws.save()?;
    // An order edit re-sorts the table; the edited row is not at `row` any more.
    let updated = match field {
        Field::Order => String::new(),
        _ => ws
            .pricing
            .table
            .get(row - 1)
            .map(|r| format!(" (price {})", format_number(r.selling_price)))
            .unwrap_or_default(),
    };
    println!("row {row} {field} updated{updated}");
    Ok(())
}

fn cmd_add(count: usize) -> Result<(), CliError> {
    let mut ws = Workspace::load();
    let report = ws.pricing.apply(&ChangeSet::new().append_rows(count));
    ws.save()?;
    print_report(&report);
    Ok(())
}

fn cmd_rm(rows: &[usize]) -> Result<(), CliError> {
    let mut ws = Workspace::load();
    let len = ws.pricing.table.len();
    if let Some(bad) = rows.iter().find(|r| **r == 0 || **r > len) {
        return Err(CliError::args(format!("row {bad} out of range (table has {len} rows)")));
    }
    let indices: Vec<usize> = rows.iter().map(|r| r - 1).collect();
    ws.pricing.delete_rows(&indices);
    ws.save()?;
    println!("{} rows left", ws.pricing.table.len());
    Ok(())
}

fn cmd_mode(mode: CalcMode) -> Result<(), CliError> {
    let mut ws = Workspace::load();
    ws.pricing.set_mode(mode);
    ws.save()?;
    println!("mode: {}", mode);
    Ok(())
}

fn cmd_role(role: Role) -> Result<(), CliError> {
    let mut ws = Workspace::load();
    ws.pricing.role = role;
    ws.settings.role = role;
    ws.settings
        .save()
        .map_err(|e| CliError::io(format!("failed to save settings: {e}")))?;
    ws.save()?;
    println!(
        "role: {} (sends to {})",
        role.display_name(),
        role.counterparty().inbox_worksheet()
    );
    Ok(())
}

fn cmd_presets(set: Option<Vec<f64>>) -> Result<(), CliError> {
    let mut ws = Workspace::load();
    if let Some(values) = set {
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0 || **v >= 100.0) {
            return Err(CliError::args(format!("fee preset {bad} must be in [0, 100)")));
        }
        ws.settings.fee_presets = FeePresets::new(values);
        ws.settings
            .save()
            .map_err(|e| CliError::io(format!("failed to save settings: {e}")))?;
    }
    let list: Vec<String> = ws
        .settings
        .fee_presets
        .values()
        .iter()
        .map(|p| format_number(*p))
        .collect();
    println!("fee presets: {}", list.join(", "));
    Ok(())
}

fn print_report(report: &EditReport) {
    let mut lines = render::edit_report(report).into_iter();
    if let Some(first) = lines.next() {
        println!("{}", first);
    }
    for line in lines {
        eprintln!("warning: {}", line);
    }
}

// ============================================================================
// Store commands
// ============================================================================

fn cmd_save() -> Result<(), CliError> {
    let ws = Workspace::load();
    let mut store = ws.open_store()?;
    let worksheet = ws.settings.current_worksheet.clone();
    store.write(&worksheet, &ws.pricing.table).map_err(CliError::storage)?;
    let id = store
        .append_history(ws.pricing.role, HistoryAction::Save, &ws.pricing.table)
        .map_err(CliError::storage)?;
    println!("saved {} rows to {} (history #{})", ws.pricing.table.len(), worksheet, id);
    Ok(())
}

fn cmd_load() -> Result<(), CliError> {
    let mut ws = Workspace::load();
    let worksheet = ws.settings.current_worksheet.clone();

    // Failures leave the working table as it was.
    let store = ws
        .open_store()
        .map_err(|e| e.with_hint("working table left unchanged"))?;
    let table = store.read(&worksheet).map_err(|e| {
        tracing::warn!("load from '{worksheet}' failed: {e}");
        let hint = match &e {
            StorageError::NotFound(_) => "run `plab save` first; working table left unchanged",
            _ => "working table left unchanged",
        };
        CliError::storage(e).with_hint(hint)
    })?;
    if table.is_empty() {
        return Err(CliError::new(
            exit_codes::EXIT_STORAGE_NOT_FOUND,
            format!("worksheet '{worksheet}' is empty"),
        )
        .with_hint("working table left unchanged"));
    }

    ws.pricing.replace_table(table);
    ws.save()?;
    println!("loaded {} rows from {}", ws.pricing.table.len(), worksheet);
    Ok(())
}

fn cmd_send() -> Result<(), CliError> {
    let ws = Workspace::load();
    let mut store = ws.open_store()?;
    let inbox = ws.pricing.role.counterparty().inbox_worksheet();
    store.write(&inbox, &ws.pricing.table).map_err(CliError::storage)?;
    store
        .append_history(ws.pricing.role, HistoryAction::Send, &ws.pricing.table)
        .map_err(CliError::storage)?;
    println!("sent {} rows to {}", ws.pricing.table.len(), inbox);
    Ok(())
}

fn cmd_receive(join: TransferJoin) -> Result<(), CliError> {
    let mut ws = Workspace::load();
    let mut store = ws.open_store()?;
    let inbox = ws.pricing.role.inbox_worksheet();
    let counterpart = match store.read(&inbox) {
        Ok(table) => table,
        Err(StorageError::NotFound(_)) => {
            return Err(CliError::new(EXIT_TRANSFER_EMPTY, format!("nothing received in {inbox}"))
                .with_hint(format!(
                    "{} has to run `plab send` first",
                    ws.pricing.role.counterparty().display_name()
                )));
        }
        Err(e) => return Err(CliError::storage(e)),
    };

    let report = ws.pricing.receive_prices(&counterpart, join);
    store
        .append_history(ws.pricing.role, HistoryAction::Receive, &ws.pricing.table)
        .map_err(CliError::storage)?;
    ws.save()?;

    println!("updated {} rows from {} ({} join)", report.updated, inbox, join);
    if !report.unmatched.is_empty() {
        let rows: Vec<String> = report.unmatched.iter().map(|i| (i + 1).to_string()).collect();
        eprintln!("warning: rows without a counterpart price: {}", rows.join(", "));
    }
    Ok(())
}

fn cmd_history(limit: usize, show: Option<i64>, json: bool) -> Result<(), CliError> {
    let ws = Workspace::load();
    let store = ws.open_store()?;

    if let Some(id) = show {
        let entry = store
            .history_entry(id)
            .map_err(CliError::storage)?
            .ok_or_else(|| CliError::new(exit_codes::EXIT_STORAGE_NOT_FOUND, format!("no history entry #{id}")))?;
        if json {
            let text = serde_json::to_string_pretty(&entry).map_err(|e| CliError::general(e.to_string()))?;
            println!("{}", text);
        } else {
            let s = &entry.summary;
            println!("#{} {} {} by {}", s.id, s.recorded_at, s.action, s.role.display_name());
            print!("{}", render::table(&entry.table));
        }
        return Ok(());
    }

    let entries = store.list_history(limit).map_err(CliError::storage)?;
    if json {
        let text = serde_json::to_string_pretty(&entries).map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", text);
    } else if entries.is_empty() {
        println!("no history");
    } else {
        for s in &entries {
            println!(
                "#{:<4} {}  {:<7}  {} -> {}  {} rows",
                s.id,
                s.recorded_at,
                s.action,
                s.role.display_name(),
                s.counterparty.display_name(),
                s.rows
            );
        }
    }
    Ok(())
}

// ============================================================================
// File exchange
// ============================================================================

fn export_format(path: &Path, explicit: Option<ExportFormat>) -> ExportFormat {
    if let Some(format) = explicit {
        return format;
    }
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => ExportFormat::Csv,
        Some("json") => ExportFormat::Json,
        _ => ExportFormat::Xlsx,
    }
}

fn cmd_export(path: Option<PathBuf>, format: Option<ExportFormat>) -> Result<(), CliError> {
    let ws = Workspace::load();
    let path = path.unwrap_or_else(|| PathBuf::from(pricelab_io::xlsx::default_export_name()));
    let table = &ws.pricing.table;

    match export_format(&path, format) {
        ExportFormat::Xlsx => {
            let result = pricelab_io::xlsx::export(table, &path).map_err(CliError::io)?;
            println!("exported {} to {}", result.summary(), path.display());
        }
        ExportFormat::Csv => {
            pricelab_io::csv::export(table, &path).map_err(CliError::io)?;
            println!("exported {} rows to {}", table.len(), path.display());
        }
        ExportFormat::Json => {
            pricelab_io::json::export(table, &path).map_err(CliError::io)?;
            println!("exported {} rows to {}", table.len(), path.display());
        }
    }
    Ok(())
}

fn cmd_import(path: &Path) -> Result<(), CliError> {
    if !path.exists() {
        return Err(CliError::io(format!("{}: file not found", path.display())));
    }
    let table = pricelab_io::csv::import(path).map_err(|e| {
        CliError::parse(format!("{}: {}", path.display(), e))
            .with_hint("the first row must name columns, e.g. label,spec,cost,margin_percent")
    })?;

    let mut ws = Workspace::load();
    ws.pricing.replace_table(table);
    ws.save()?;
    println!("imported {} rows from {}", ws.pricing.table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_format_follows_extension() {
        assert_eq!(export_format(Path::new("a.CSV"), None), ExportFormat::Csv);
        assert_eq!(export_format(Path::new("a.json"), None), ExportFormat::Json);
        assert_eq!(export_format(Path::new("Pricing_0101.xlsx"), None), ExportFormat::Xlsx);
        assert_eq!(export_format(Path::new("noext"), None), ExportFormat::Xlsx);
        assert_eq!(
            export_format(Path::new("a.csv"), Some(ExportFormat::Json)),
            ExportFormat::Json
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
