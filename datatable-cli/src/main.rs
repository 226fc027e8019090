mod args;
mod error;
mod paths;
mod render;

use std::fs::{self, File};
use std::io::Read as _;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use datatable_lib::export::ExportOptions;
use datatable_lib::order::ReorderCommand;
use datatable_lib::pagination::PaginationOptions;
use datatable_lib::preferences::{PreferencesConfig, PreferencesStore, SqliteBackend};
use datatable_lib::{ColumnDef, DataTable, TableOptions};
use serde_json::Value;
use simplelog::{Config, LevelFilter, WriteLogger};

use args::Cli;
use error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs to the cache directory. A missing or unwritable directory disables
/// logging rather than failing the run.
fn init_logging(verbose: bool) {
    let Some(path) = paths::rotate_logs() else { return };
    let Ok(file) = File::create(&path) else { return };
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let _ = WriteLogger::init(level, Config::default(), file);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let records = read_records(&cli.input)?;
    log::info!("[cli] Loaded {} records from {}", records.len(), cli.input.display());

    let column_ids = if cli.columns.is_empty() {
        records
            .first()
            .and_then(Value::as_object)
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default()
    } else {
        cli.columns.clone()
    };
    if column_ids.is_empty() {
        return Err(CliError::InvalidInput("no columns to show".to_string()));
    }
    let columns: Vec<ColumnDef<Value>> = column_ids
        .iter()
        .map(|id| ColumnDef::new(id.as_str(), id.as_str()))
        .collect();

    let selecting = !cli.select.is_empty() || cli.select_page;
    let pagination = if cli.no_pagination {
        PaginationOptions::disabled()
    } else {
        PaginationOptions::client()
    };
    let options = TableOptions::default()
        .with_row_selection(selecting)
        .with_pagination(pagination)
        .with_export(ExportOptions::default().with_file_name(cli.export_name.clone()));

    let mut builder = DataTable::builder(columns).rows(records).options(options);
    if let Some(field) = cli.id_field.clone() {
        builder = builder.row_id(move |row: &Value, index| match row.get(&field) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Null) | None => index.to_string(),
            Some(other) => other.to_string(),
        });
    }
    if let Some(store) = open_store(&cli).await {
        builder = builder.with_preferences(&store, preferences_config(&cli)).await;
    }
    let mut table = builder.build();

    apply_actions(&mut table, &cli)?;

    println!("{}", render::render_page(&table));

    if let Some(dir) = &cli.export {
        fs::create_dir_all(dir)?;
        match table.write_csv(dir)? {
            Some(path) => println!("Exported {}", path.display()),
            None => println!("Nothing to export"),
        }
    }

    table.flush_preferences().await;
    Ok(())
}

/// Reads a JSON array of objects from a file, or stdin for `-`.
fn read_records(input: &Path) -> Result<Vec<Value>, CliError> {
    let text = if input.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        fs::read_to_string(input)?
    };
    parse_records(&text)
}

fn parse_records(text: &str) -> Result<Vec<Value>, CliError> {
    let Value::Array(records) = serde_json::from_str::<Value>(text)? else {
        return Err(CliError::InvalidInput("expected a JSON array".to_string()));
    };
    if let Some(position) = records.iter().position(|record| !record.is_object()) {
        return Err(CliError::InvalidInput(format!("record {position} is not an object")));
    }
    Ok(records)
}

fn preferences_config(cli: &Cli) -> PreferencesConfig {
    let mut config = PreferencesConfig::new(cli.table_id.clone())
        .with_scope(cli.scope)
        .with_persist_page_index(cli.persist_page);
    if let Some(user) = &cli.user {
        config = config.with_user_key(user.clone());
    }
    if let Some(org) = &cli.org {
        config = config.with_org_key(org.clone());
    }
    config
}

/// Opens the preferences database. Failures are logged and the run
/// continues without persistence.
async fn open_store(cli: &Cli) -> Option<PreferencesStore> {
    if cli.no_persist {
        return None;
    }
    let path = cli.db.clone().or_else(paths::preferences_db)?;
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match SqliteBackend::open(&path).await {
        Ok(backend) => {
            log::debug!("[cli] Preferences at {}", path.display());
            Some(PreferencesStore::new(backend))
        }
        Err(e) => {
            log::warn!("[cli] Preferences unavailable at {}: {}", path.display(), e);
            None
        }
    }
}

fn apply_actions(table: &mut DataTable<Value>, cli: &Cli) -> Result<(), CliError> {
    if cli.clear_filters {
        table.clear_filters();
    }
    for arg in &cli.filters {
        if !table.registry().contains(&arg.column) {
            return Err(CliError::InvalidArgument(format!("unknown column {:?}", arg.column)));
        }
        table.set_filter(&arg.column, arg.filter.clone());
    }
    if !cli.sorting.is_empty() {
        table.set_sorting(cli.sorting.clone());
    }

    for id in &cli.hide {
        if !table.set_column_visibility(id, false) {
            log::warn!("[cli] Column {:?} cannot be hidden", id);
        }
    }
    for id in &cli.show {
        table.set_column_visibility(id, true);
    }
    for pair in cli.order.windows(2) {
        table.reorder_column(&ReorderCommand::after(pair[1].clone(), pair[0].clone()));
    }

    if let Some(size) = cli.page_size {
        if size == 0 {
            return Err(CliError::InvalidArgument("page size must be positive".to_string()));
        }
        table.set_page_size(size);
    }
    if let Some(page) = cli.page {
        if page == 0 {
            return Err(CliError::InvalidArgument("pages start at 1".to_string()));
        }
        table.set_page_index(page - 1);
    }

    for id in &cli.select {
        if !table.is_row_selected(id) {
            table.toggle_row(id);
        }
    }
    if cli.select_page {
        table.toggle_all_page_rows();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records() {
        let records = parse_records(r#"[{"a": 1}, {"a": 2}]"#).unwrap();
        assert_eq!(records.len(), 2);

        assert!(matches!(parse_records(r#"{"a": 1}"#), Err(CliError::InvalidInput(_))));
        assert!(matches!(parse_records(r#"[{"a": 1}, 2]"#), Err(CliError::InvalidInput(_))));
        assert!(matches!(parse_records("not json"), Err(CliError::Json(_))));
    }

    #[test]
    fn test_apply_actions() {
        let cli = Cli::try_parse_from([
            "datatable",
            "rows.json",
            "--filter",
            "age:greater_than:30",
            "--sort",
            "age:desc",
            "--order",
            "age,name",
            "--page-size",
            "1",
            "--page",
            "2",
        ])
        .unwrap();
        let rows = parse_records(
            r#"[{"name": "Ada", "age": 36}, {"name": "Bob", "age": 20}, {"name": "Cy", "age": 45}]"#,
        )
        .unwrap();
        let mut table = DataTable::builder(vec![ColumnDef::new("name", "Name"), ColumnDef::new("age", "Age")])
            .rows(rows)
            .build();

        apply_actions(&mut table, &cli).unwrap();

        assert_eq!(table.column_order(), ["age", "name"]);
        let page: Vec<&Value> = table.page_rows();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["name"], "Ada");
        assert_eq!(table.pagination_state().page_index, 1);
    }

    #[test]
    fn test_apply_actions_rejects_unknown_filter_column() {
        let cli = Cli::try_parse_from(["datatable", "rows.json", "--filter", "nope:is_null"]).unwrap();
        let mut table = DataTable::builder(vec![ColumnDef::<Value>::new("name", "Name")]).build();
        assert!(matches!(apply_actions(&mut table, &cli), Err(CliError::InvalidArgument(_))));
    }
}
