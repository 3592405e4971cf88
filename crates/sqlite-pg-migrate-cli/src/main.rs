//! sqlite-pg-migrate CLI - SQLite to PostgreSQL migration.

use clap::Parser;
use sqlite_pg_migrate::{Config, MigrateError, MigrateOptions, Migrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "sqlite-pg-migrate")]
#[command(about = "SQLite to PostgreSQL migration")]
#[command(version)]
struct Cli {
    /// SQLite database file to import
    #[arg(short = 'f', long)]
    sqlite_file: PathBuf,

    /// PostgreSQL connection string for the database to import into
    #[arg(short = 'p', long)]
    postgres_url: String,

    /// Set log level to DEBUG
    #[arg(short, long)]
    debug: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// After import, show up to 10 rows of the imported data in each table
    #[arg(long)]
    show_sample_data: bool,

    /// Prior to import, drop tables in the target database that have the
    /// same name as tables in the source database
    #[arg(long)]
    drop_tables: bool,

    /// Drop all tables in the target database after import; useful for testing
    #[arg(long)]
    drop_tables_after_import: bool,

    /// Emit extracted CHECK constraints into the generated schema
    #[arg(long)]
    emit_checks: bool,

    /// Record source views in the summary (views are not translated)
    #[arg(long)]
    migrate_views: bool,

    /// Record source triggers in the summary (triggers are not translated)
    #[arg(long)]
    migrate_triggers: bool,

    /// Print the transfer summary as JSON on completion
    #[arg(long)]
    output_json: bool,

    /// Maximum simultaneous PostgreSQL connections (one COPY runs per
    /// connection)
    #[arg(long, default_value = "16")]
    max_pg_connections: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(cli.debug, &cli.log_format);

    let options = MigrateOptions {
        emit_checks: cli.emit_checks,
        migrate_views: cli.migrate_views,
        migrate_triggers: cli.migrate_triggers,
        drop_existing: cli.drop_tables,
        drop_after_import: cli.drop_tables_after_import,
        show_sample_data: cli.show_sample_data,
        max_pg_connections: cli.max_pg_connections,
    };

    let config = Config::new(cli.sqlite_file.display().to_string(), cli.postgres_url)
        .with_options(options);

    let migrator = Migrator::new(config).await?;
    info!("Starting migration of {:?}", cli.sqlite_file);

    match migrator.run().await {
        Ok(summary) => {
            if cli.output_json {
                println!("{}", summary.to_json()?);
            } else {
                println!("\nMigration completed!");
                println!("  Tables: {}", summary.tables.data.len());
                println!("  Rows: {}", summary.rows_loaded());
            }
            Ok(())
        }
        Err(e) => {
            // The partial summary shows which artifacts were reached
            // before the failure.
            if cli.output_json {
                if let Ok(json) = migrator.summary().to_json() {
                    eprintln!("{}", json);
                }
            }
            Err(e)
        }
    }
}

fn setup_logging(debug: bool, format: &str) {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
