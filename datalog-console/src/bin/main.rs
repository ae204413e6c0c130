use std::io;
use std::path::PathBuf;

use clap::{
    Parser,
    Subcommand,
};
use datalog_console::{
    dump,
    format,
    Session,
    SimBoard,
};
use eeprom_datalog::parser::parse_hundredths;
use eeprom_datalog::sensor::Value;

#[derive(Parser)]
#[command(name = "datalog-console")]
#[command(about = "Data logger console running against an EEPROM image", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a blank 1KB EEPROM image
    Format {
        /// Image file path
        image: PathBuf,

        /// Overwrite an existing image
        #[arg(short, long)]
        force: bool,
    },
    /// Evaluate console lines from stdin against an image
    Run {
        /// Image file path
        image: PathBuf,

        /// Simulated temperature in degrees Celsius
        #[arg(
            long,
            default_value = "21.00",
            value_parser = parse_reading,
            allow_hyphen_values = true
        )]
        temperature: i16,

        /// Simulated relative humidity in percent
        #[arg(long, default_value = "45.00", value_parser = parse_reading)]
        humidity: i16,

        /// Simulated raw LDR reading
        #[arg(long, default_value_t = 512)]
        ldr_raw: u16,
    },
    /// Print the log stored in an image
    Dump {
        /// Image file path
        image: PathBuf,
    },
}

fn parse_reading(s: &str) -> Result<i16, String> {
    parse_hundredths(s)
        .and_then(|v| i16::try_from(v).ok())
        .ok_or_else(|| format!("invalid reading: {s}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Format { image, force } => {
            format(&image, force)?;
            println!("Created blank image: {}", image.display());
            Ok(())
        }
        Commands::Run {
            image,
            temperature,
            humidity,
            ldr_raw,
        } => {
            let value = Value {
                temperature,
                humidity,
            };
            let mut session = Session::open(&image, SimBoard::new(ldr_raw), value, io::stdout())?;
            session.run(io::stdin().lock())?;
            Ok(())
        }
        Commands::Dump { image } => {
            let entries = dump(&image, &mut io::stdout())?;
            println!("{entries} entries");
            Ok(())
        }
    }
}
