use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;

use gridview::controller::Controller;
use gridview::domain::{AppConfig, GridError, Message};
use gridview::export::ExportScope;
use gridview::fixtures;
use gridview::loader;
use gridview::logging;
use gridview::model::{Model, Status};
use gridview::table::{DataTable, TableOptions};
use gridview::ui::TableUI;
use gridview::value::Record;

/// Interactive data tables in the terminal.
#[derive(Parser)]
#[command(name = "gridview", version, about)]
struct Args {
    #[command(subcommand)]
    dataset: Dataset,

    /// Rows per page, overrides the dataset default.
    #[arg(long)]
    page_size: Option<usize>,

    /// Show filter widgets below the column headers.
    #[arg(long)]
    column_search: bool,

    /// Write the filtered rows to a spreadsheet and exit without starting the viewer.
    #[arg(long, value_name = "PATH")]
    export: Option<String>,

    #[arg(long, value_name = "PATH", default_value = "gridview.log")]
    log_file: String,

    /// Key event poll interval in milliseconds.
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Widest column, in characters, for columns inferred from a file.
    #[arg(long, default_value_t = 40)]
    max_column_width: usize,
}

#[derive(Subcommand)]
enum Dataset {
    /// Generated payments with sub payments.
    Payments {
        #[arg(long, default_value_t = fixtures::DEFAULT_ROWS)]
        rows: usize,
        #[arg(long, default_value_t = fixtures::DEFAULT_SEED)]
        seed: u64,
    },
    /// A small static list of people.
    People,
    /// Departments with their employees as sub rows.
    Departments,
    /// A csv, parquet or arrow file.
    File { path: String },
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn expand_path(path: &str) -> Result<PathBuf, GridError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| GridError::LoadingFailed(e.to_string()))
}

fn run() -> Result<(), GridError> {
    let args = Args::parse();
    logging::init(&expand_path(&args.log_file)?, logging::DEFAULT_FILTER)?;

    let config = AppConfig {
        event_poll_time: args.poll_ms,
        max_column_width: args.max_column_width,
        ..AppConfig::default()
    };
    let export = args.export.as_deref().map(expand_path).transpose()?;
    let adjust = |options: TableOptions| {
        let column_search = options.enable_column_search || args.column_search;
        let options = options.enable_column_search(column_search);
        match args.page_size {
            Some(size) => options.page_size(size),
            None => options,
        }
    };

    match &args.dataset {
        Dataset::Payments { rows, seed } => {
            let table = DataTable::new(
                fixtures::payment_columns(),
                fixtures::generate_payments(*rows, *seed),
                adjust(fixtures::payment_options()),
            )
            .with_detail(fixtures::payment_details);
            launch("payments", table, &config, export)
        }
        Dataset::People => {
            let table = DataTable::new(
                fixtures::people_columns(),
                fixtures::people(),
                adjust(fixtures::people_options()),
            );
            launch("people", table, &config, export)
        }
        Dataset::Departments => {
            let table = DataTable::new(
                fixtures::department_columns(),
                fixtures::departments(),
                adjust(fixtures::department_options()),
            )
            .with_sub_rows(fixtures::org_children)
            .with_detail(fixtures::org_details);
            launch("departments", table, &config, export)
        }
        Dataset::File { path } => {
            let loaded = loader::load_file(expand_path(path)?, config.max_column_width)?;
            let options = TableOptions::default()
                .filter_column(String::new())
                .filter_placeholder(format!("Filter {}...", loaded.name))
                .enable_column_reordering(true);
            let table = DataTable::new(loaded.columns, loaded.records, adjust(options))
                .on_column_reorder(|order| info!("Column order: {order:?}"));
            launch(&loaded.name, table, &config, export)
        }
    }
}

/// Exports headless when `export` is set, otherwise runs the viewer until the user quits.
fn launch<R: Record>(
    name: &str,
    table: DataTable<R>,
    config: &AppConfig,
    export: Option<PathBuf>,
) -> Result<(), GridError> {
    if let Some(path) = export {
        let rows = table.export(ExportScope::Filtered, &path)?;
        println!("Exported {rows} rows to {}", path.display());
        return Ok(());
    }

    let mut model = Model::new(name, table, config);
    let mut ui = TableUI::new();
    let controller = Controller::new(config);

    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    model.update(Message::Resize(size.width as usize, size.height as usize))?;

    while model.status != Status::Exiting {
        terminal.draw(|f| ui.draw(&model, f))?;
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        };
    }

    ratatui::restore();
    info!("Bye");
    Ok(())
}
