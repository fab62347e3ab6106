use adhere_core::export::{export_gaps, export_measurements, export_refills, import_measurements};
use adhere_core::*;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "adhere")]
#[command(about = "Lab results and medication adherence tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Medications, refills and adherence
    Med {
        #[command(subcommand)]
        command: MedCommands,
    },

    /// Lab measurements (viral load, CD4 count)
    Lab {
        #[command(subcommand)]
        command: LabCommands,
    },

    /// Write measurements, refills and gaps as CSV files
    Export {
        /// Output directory (default: <data-dir>/export)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Uncovered days tolerated before a gap is reported
        #[arg(long)]
        tolerance: Option<u32>,
    },

    /// Load demonstration data
    Seed {
        /// Replace an existing, non-empty tracker
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum MedCommands {
    /// Start tracking a medication (records its first fill)
    Add {
        #[arg(long)]
        name: String,

        /// Start date, YYYY-MM-DD (default: today)
        #[arg(long)]
        start: Option<String>,

        /// Days of supply in the first fill
        #[arg(long, allow_negative_numbers = true)]
        supply: Option<i64>,
    },

    /// Record a refill
    Refill {
        /// Medication id or name
        medication: String,

        /// Fill date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Days of supply
        #[arg(long, allow_negative_numbers = true)]
        supply: Option<i64>,
    },

    /// Show supply status and adherence gaps for every medication
    Status {
        /// Judge coverage as of this date (default: today)
        #[arg(long)]
        as_of: Option<String>,

        #[arg(long)]
        tolerance: Option<u32>,
    },

    /// List adherence gaps for one medication
    Gaps {
        /// Medication id or name
        medication: String,

        #[arg(long)]
        tolerance: Option<u32>,
    },
}

#[derive(Subcommand)]
enum LabCommands {
    /// Record a lab result
    Record {
        /// Date of the draw, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Viral load (copies/mL)
        #[arg(long, allow_negative_numbers = true)]
        viral_load: Option<f64>,

        /// CD4 count (cells/mm³)
        #[arg(long, allow_negative_numbers = true)]
        cd4: Option<f64>,
    },

    /// Show recorded lab results (newest first)
    List {
        #[arg(long)]
        oldest_first: bool,
    },

    /// Import lab results from a CSV file
    Import { path: PathBuf },
}

fn main() -> ExitCode {
    adhere_core::logging::init_with_level("warn");

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let tracker_path = data_dir.join(TRACKER_FILE);

    match cli.command {
        Commands::Med { command } => match command {
            MedCommands::Add {
                name,
                start,
                supply,
            } => cmd_med_add(&tracker_path, &config, &name, start, supply),
            MedCommands::Refill {
                medication,
                date,
                supply,
            } => cmd_med_refill(&tracker_path, &config, &medication, date, supply),
            MedCommands::Status { as_of, tolerance } => {
                cmd_med_status(&tracker_path, &config, as_of, tolerance)
            }
            MedCommands::Gaps {
                medication,
                tolerance,
            } => cmd_med_gaps(&tracker_path, &config, &medication, tolerance),
        },
        Commands::Lab { command } => match command {
            LabCommands::Record {
                date,
                viral_load,
                cd4,
            } => cmd_lab_record(&tracker_path, date, viral_load, cd4),
            LabCommands::List { oldest_first } => cmd_lab_list(&tracker_path, oldest_first),
            LabCommands::Import { path } => cmd_lab_import(&tracker_path, &path),
        },
        Commands::Export { out_dir, tolerance } => {
            let out_dir = out_dir.unwrap_or_else(|| data_dir.join("export"));
            cmd_export(&tracker_path, &config, &out_dir, tolerance)
        }
        Commands::Seed { force } => cmd_seed(&tracker_path, force),
    }
}

fn cmd_med_add(
    tracker_path: &Path,
    config: &Config,
    name: &str,
    start: Option<String>,
    supply: Option<i64>,
) -> Result<()> {
    let start = date_or_today(start)?;
    let supply = supply.unwrap_or_else(|| i64::from(config.adherence.default_supply_days));
    note_unusual_supply(config, supply);

    let id = Tracker::update(tracker_path, |t| {
        t.medications.add_medication(name, start, supply)
    })?;

    println!("✓ Added {} ({} day supply from {})", name.trim(), supply, start);
    println!("  id: {}", id);
    Ok(())
}

fn cmd_med_refill(
    tracker_path: &Path,
    config: &Config,
    medication: &str,
    date: Option<String>,
    supply: Option<i64>,
) -> Result<()> {
    let date = date_or_today(date)?;
    let supply = supply.unwrap_or_else(|| i64::from(config.adherence.default_supply_days));
    note_unusual_supply(config, supply);

    let name = Tracker::update(tracker_path, |t| {
        let id = resolve_medication(&t.medications, medication)?;
        t.medications.add_refill(id, date, supply)?;
        Ok(t.medications.medication(id)?.name.clone())
    })?;

    println!("✓ Refill recorded for {}: {} day supply on {}", name, supply, date);
    Ok(())
}

fn cmd_med_status(
    tracker_path: &Path,
    config: &Config,
    as_of: Option<String>,
    tolerance: Option<u32>,
) -> Result<()> {
    let as_of = date_or_today(as_of)?;
    let tolerance = tolerance.unwrap_or(config.adherence.gap_tolerance_days);
    let tracker = Tracker::load(tracker_path)?;

    let summaries = tracker.medications.summaries(as_of, tolerance)?;
    if summaries.is_empty() {
        println!("No medications tracked.");
        return Ok(());
    }

    for summary in &summaries {
        display_summary(summary, tolerance);
    }
    Ok(())
}

fn cmd_med_gaps(
    tracker_path: &Path,
    config: &Config,
    medication: &str,
    tolerance: Option<u32>,
) -> Result<()> {
    let tolerance = tolerance.unwrap_or(config.adherence.gap_tolerance_days);
    let tracker = Tracker::load(tracker_path)?;

    let id = resolve_medication(&tracker.medications, medication)?;
    let gaps = tracker.medications.adherence_gaps(id, tolerance)?;
    let name = &tracker.medications.medication(id)?.name;

    if gaps.is_empty() {
        println!("No adherence gaps for {} (tolerance {} days)", name, tolerance);
        return Ok(());
    }

    println!("{} adherence gaps for {} (tolerance {} days):", gaps.len(), name, tolerance);
    for gap in &gaps {
        display_gap(gap);
    }
    Ok(())
}

fn cmd_lab_record(
    tracker_path: &Path,
    date: Option<String>,
    viral_load: Option<f64>,
    cd4: Option<f64>,
) -> Result<()> {
    let date = date_or_today(date)?;
    let measurement = Measurement::new(date, viral_load, cd4);

    Tracker::update(tracker_path, |t| t.measurements.record(measurement))?;

    println!("✓ Lab result recorded for {}", date);
    Ok(())
}

fn cmd_lab_list(tracker_path: &Path, oldest_first: bool) -> Result<()> {
    let tracker = Tracker::load(tracker_path)?;
    let log = &tracker.measurements;

    if log.is_empty() {
        println!("No lab results recorded.");
        return Ok(());
    }

    println!("{:<12} {:>16} {:>10}", "Date", "Viral load", "CD4");
    let rows: Box<dyn Iterator<Item = &Measurement>> = if oldest_first {
        Box::new(log.list().iter())
    } else {
        Box::new(log.newest_first())
    };
    for m in rows {
        println!(
            "{:<12} {:>16} {:>10}",
            m.date.to_string(),
            format_value(m.viral_load_copies_per_ml),
            format_value(m.cd4_count_cells_per_mm3)
        );
    }
    Ok(())
}

fn cmd_lab_import(tracker_path: &Path, csv_path: &Path) -> Result<()> {
    let report = Tracker::update(tracker_path, |t| {
        import_measurements(&mut t.measurements, csv_path)
    })?;

    println!("✓ Imported {} lab results", report.imported);
    if report.skipped > 0 {
        println!("  Skipped {} invalid rows", report.skipped);
    }
    Ok(())
}

fn cmd_export(
    tracker_path: &Path,
    config: &Config,
    out_dir: &Path,
    tolerance: Option<u32>,
) -> Result<()> {
    let tolerance = tolerance.unwrap_or(config.adherence.gap_tolerance_days);
    let tracker = Tracker::load(tracker_path)?;

    let measurements = export_measurements(&tracker.measurements, &out_dir.join("measurements.csv"))?;
    let refills = export_refills(&tracker.medications, &out_dir.join("refills.csv"))?;
    let gaps = export_gaps(&tracker.medications, tolerance, &out_dir.join("gaps.csv"))?;

    println!("✓ Exported to {}", out_dir.display());
    println!("  {} lab results, {} refills, {} adherence gaps", measurements, refills, gaps);
    Ok(())
}

fn cmd_seed(tracker_path: &Path, force: bool) -> Result<()> {
    Tracker::update(tracker_path, |tracker| {
        if !tracker.is_empty() && !force {
            return Err(Error::State(format!(
                "{} already has data; pass --force to replace it",
                tracker_path.display()
            )));
        }
        *tracker = demo_tracker()?;
        Ok(())
    })?;
    println!("✓ Loaded demonstration data into {}", tracker_path.display());
    Ok(())
}

/// Accept either a medication id or its name
fn resolve_medication(engine: &AdherenceEngine, key: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(key.trim()) {
        return Ok(id);
    }
    engine.find_by_name(key).map(|m| m.id).ok_or_else(|| {
        ValidationError::new(Field::MedicationId, format!("no medication named '{}'", key)).into()
    })
}

fn date_or_today(input: Option<String>) -> Result<NaiveDate> {
    match input {
        Some(s) => Ok(dates::parse_date(&s)?),
        None => Ok(dates::today()),
    }
}

fn note_unusual_supply(config: &Config, supply: i64) {
    if supply > 0 && !config.adherence.is_usual_supply(supply) {
        tracing::warn!(
            "{} days is not one of the usual supply lengths {:?}",
            supply,
            config.adherence.supply_options
        );
    }
}

fn display_summary(summary: &MedicationSummary, tolerance: u32) {
    println!();
    println!("{}", summary.name);
    println!("  id: {}", summary.id);
    println!(
        "  Started: {}   Refills: {}",
        summary.start_date, summary.refill_count
    );

    match &summary.status {
        SupplyStatus::Active {
            days_remaining,
            supply_end,
        } => println!(
            "  ✓ Active: {} days remaining (supply ends {})",
            days_remaining, supply_end
        ),
        SupplyStatus::RefillNeeded {
            supply_end,
            days_overdue,
        } => println!(
            "  ! Refill needed (supply ran out {}, {} days ago)",
            supply_end, days_overdue
        ),
    }

    if summary.gaps.is_empty() {
        println!("  No adherence gaps");
    } else {
        println!("  Adherence gaps (> {} days):", tolerance);
        for gap in &summary.gaps {
            display_gap(gap);
        }
    }
}

fn display_gap(gap: &AdherenceGap) {
    println!(
        "    {} → {}  ({} days)",
        gap.gap_start, gap.gap_end, gap.duration_days
    );
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "—".to_string(), |v| v.to_string())
}
