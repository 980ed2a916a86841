use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use medrec_core::export;
use medrec_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "medrec")]
#[command(about = "Medication order parser and days-supply calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a free-text order into name, dosage, frequency and route
    Parse {
        /// Order text, e.g. "Metformin 500mg PO BID"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Output format (text, json, csv)
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Estimate how many days a dispensed quantity lasts
    Supply {
        /// Number of doses dispensed
        #[arg(long)]
        quantity: f64,

        /// Frequency descriptor, e.g. BID, Q6H, 2x/week
        #[arg(long)]
        frequency: String,

        /// Start date (YYYY-MM-DD); also prints the refill date
        #[arg(long)]
        start: Option<String>,
    },

    /// Build a prefilled medication record and print it as JSON
    Record {
        /// Order text, e.g. "Amlodipine 5mg OD #30"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Dispensed quantity (overrides any #N in the text)
        #[arg(long)]
        quantity: Option<u32>,

        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<String>,
    },

    /// Turn a file of orders (one per line) into records
    Batch {
        /// Input file with one order per line
        #[arg(long)]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<String>,

        /// Output format (csv, json)
        #[arg(long)]
        format: Option<OutputFormat>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Initialize logging
    medrec_core::logging::init_with_level(&config.logging.level);

    match cli.command {
        Commands::Parse { text, format } => {
            cmd_parse(&text.join(" "), format.unwrap_or(config.output.format))
        }
        Commands::Supply {
            quantity,
            frequency,
            start,
        } => cmd_supply(quantity, &frequency, start.as_deref(), &config),
        Commands::Record {
            text,
            quantity,
            start,
        } => cmd_record(&text.join(" "), quantity, start.as_deref(), &config),
        Commands::Batch {
            input,
            output,
            start,
            format,
        } => cmd_batch(
            &input,
            output.as_deref(),
            start.as_deref(),
            format.unwrap_or(config.output.format),
            &config,
        ),
    }
}

fn parse_start_date(start: Option<&str>) -> Result<NaiveDate> {
    match start {
        Some(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|e| {
            Error::InvalidInput(format!("invalid start date '{}': {}", text, e))
        }),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn cmd_parse(text: &str, format: OutputFormat) -> Result<()> {
    let order = parse_order(text);

    match format {
        OutputFormat::Text => {
            let medication = &order.medication;
            println!("name:      {}", medication.name);
            println!("dosage:    {}", medication.dosage);
            println!("frequency: {}", medication.frequency);
            println!("route:     {}", medication.route);
            if let Some(quantity) = order.quantity {
                println!("quantity:  {}", quantity);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&order)?);
        }
        OutputFormat::Csv => {
            export::write_orders_csv(io::stdout().lock(), std::slice::from_ref(&order))?;
        }
    }

    Ok(())
}

fn cmd_supply(quantity: f64, frequency: &str, start: Option<&str>, config: &Config) -> Result<()> {
    let supply = days_supply(quantity, frequency);
    println!("{}", supply);

    if start.is_some() {
        let start = parse_start_date(start)?;
        match refill_date(start, supply, config.refill.rounding) {
            Some(date) => println!("refill: {}", date),
            None => println!("refill: none"),
        }
    }

    Ok(())
}

fn cmd_record(
    text: &str,
    quantity: Option<u32>,
    start: Option<&str>,
    config: &Config,
) -> Result<()> {
    let start = parse_start_date(start)?;
    let record = MedicationRecord::from_entry(text, start, quantity, config.refill.rounding)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn cmd_batch(
    input: &Path,
    output: Option<&Path>,
    start: Option<&str>,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let start = parse_start_date(start)?;
    let contents = std::fs::read_to_string(input)?;

    let records = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| MedicationRecord::from_entry(line, start, None, config.refill.rounding))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("Parsed {} orders from {:?}", records.len(), input);

    match (format, output) {
        (OutputFormat::Json, Some(path)) => {
            std::fs::write(path, export::records_to_json(&records)?)?;
            println!("Wrote {} records to {}", records.len(), path.display());
        }
        (OutputFormat::Json, None) => {
            println!("{}", export::records_to_json(&records)?);
        }
        // Text has no batch layout of its own, so it falls back to CSV
        (_, Some(path)) => {
            let count = export::write_records_csv_file(path, &records)?;
            println!("Wrote {} records to {}", count, path.display());
        }
        (_, None) => {
            let mut stdout = io::stdout().lock();
            export::write_records_csv(&mut stdout, &records)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
