//! Meja - spreadsheet viewer and format converter

mod config;
mod convert;
#[cfg(feature = "tui")]
mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use meja_core::{Locale, RefOption, SearchOptions, SearchSettings, Workbook};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::MejaConfig;

/// View, search and convert spreadsheets (CSV, XLSX, HTML, Markdown)
#[derive(Parser, Debug)]
#[command(name = "meja", version)]
struct Cli {
    /// Config file to use instead of the user config
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Locale for number and date formats (e.g. en-US, de-DE)
    #[arg(long, global = true, value_parser = parse_locale)]
    locale: Option<Locale>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert between formats, chosen by file extension
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// CSV field separator
        #[arg(long)]
        separator: Option<char>,
    },
    /// Print sheets, sizes, merged regions and frozen panes
    Info { file: PathBuf },
    /// Print every cell containing TEXT
    Find {
        file: PathBuf,
        text: String,
        #[arg(short, long)]
        ignore_case: bool,
        /// Match the whole cell text only
        #[arg(long)]
        complete: bool,
        /// Search formula text instead of displayed values
        #[arg(long)]
        formula: bool,
    },
    /// Open FILE in the terminal viewer
    #[cfg(feature = "tui")]
    View { file: PathBuf },
}

fn parse_locale(tag: &str) -> std::result::Result<Locale, String> {
    Locale::from_tag(tag).ok_or_else(|| format!("unknown locale: {tag}"))
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MEJA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let (mut config, warnings) = config::load_config(cli.config.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    if let Some(locale) = cli.locale {
        config.set_locale(locale);
    }

    if let Err(e) = run(cli.command, config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Command, mut config: MejaConfig) -> Result<()> {
    match command {
        Command::Convert {
            input,
            output,
            separator,
        } => {
            if separator.is_some() {
                config.csv.separator = separator;
            }
            convert::convert(&input, &output, &config)?;
            println!("Converted {} to {}", input.display(), output.display());
        }
        Command::Info { file } => {
            let workbook = convert::open(&file, &config)?;
            print_info(&workbook);
        }
        Command::Find {
            file,
            text,
            ignore_case,
            complete,
            formula,
        } => {
            let workbook = convert::open(&file, &config)?;
            let mut options = Vec::new();
            if ignore_case {
                options.push(SearchOptions::IgnoreCase);
            }
            if complete {
                options.push(SearchOptions::MatchCompleteText);
            }
            if formula {
                options.push(SearchOptions::SearchFormulaText);
            }
            let found = find(&workbook, &text, &SearchSettings::of(&options));
            if found == 0 {
                println!("No match for '{}'", text);
            }
        }
        #[cfg(feature = "tui")]
        Command::View { file } => view(&file, config)?,
    }
    Ok(())
}

fn print_info(workbook: &Workbook) {
    if let Some(location) = workbook.location() {
        println!("{}", location.display());
    }
    for handle in workbook.sheets() {
        let sheet = handle.read();
        println!(
            "{}: {} rows x {} columns",
            sheet.name(),
            sheet.row_count(),
            sheet.column_count()
        );
        for region in sheet.merged_regions() {
            println!("  merged {}", region);
        }
        let split = sheet.split();
        if split != (0, 0) {
            println!("  frozen {} rows, {} columns", split.0, split.1);
        }
        if let Some(row) = sheet.auto_filter_row() {
            println!("  auto filter on row {}", row + 1);
        }
    }
}

/// Print matches as `'Sheet'!A1<TAB>text`. Returns how many were found.
fn find(workbook: &Workbook, text: &str, settings: &SearchSettings) -> usize {
    let mut count = 0;
    for handle in workbook.sheets() {
        let sheet = handle.read();
        for pos in sheet.find_all(text, settings) {
            println!(
                "{}\t{}",
                pos.display_with(&[RefOption::WithSheet], sheet.name()),
                sheet.display(pos.row, pos.col)
            );
            count += 1;
        }
    }
    count
}

#[cfg(feature = "tui")]
fn view(file: &Path, config: MejaConfig) -> Result<()> {
    let mut app = if file.exists() {
        tui::App::open(file, config)?
    } else {
        let mut workbook = Workbook::new(config.locale);
        workbook
            .create_sheet("Sheet1")
            .context("could not create a sheet")?;
        tui::App::new(workbook, file.to_path_buf(), config)
    };
    tui::run(&mut app)
}
