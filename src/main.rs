//! boxmark command-line driver.
//!
//! Headless access to the annotation engine:
//!
//! ```text
//! boxmark list [DIR]            list annotatable images
//! boxmark dump IMAGE            print the annotations of one image
//! boxmark check                 verify that every image has an annotation file
//! boxmark config [--write]      show (or write) the effective configuration
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use boxmark::dataset::{self, PairedDataset};
use boxmark::{AppConfig, Command, CommandOutput, Session, SessionError};

/// Bounding-box annotation engine.
#[derive(Parser, Debug)]
#[command(name = "boxmark", version, about = "Bounding-box annotation engine")]
struct Cli {
    /// Data root holding the images and annotations directories.
    /// Overrides the configured data root.
    #[arg(long, global = true, value_name = "DIR")]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// List annotatable images in a directory (default: the images directory)
    List { dir: Option<PathBuf> },

    /// Print the annotations stored for an image
    Dump { image: PathBuf },

    /// Check that images and annotation files pair up and parse
    Check,

    /// Print the effective configuration as JSON
    Config {
        /// Also write it to the default config path
        #[arg(long)]
        write: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from_default_path().unwrap_or_default();
    if let Some(root) = cli.data_root.clone() {
        config.data_root = root;
    }

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: CliCommand, config: AppConfig) -> Result<(), SessionError> {
    match command {
        CliCommand::List { dir } => {
            let dir = dir.unwrap_or_else(|| config.layout().images_dir());
            for path in dataset::list_images(&dir, &config.image_extensions)? {
                println!("{}", path.display());
            }
        }
        CliCommand::Dump { image } => {
            let dump = dump_image(image, config)?;
            print!("{}", dump);
        }
        CliCommand::Check => {
            let dataset = PairedDataset::scan(config.layout(), &config.image_extensions)?;
            for index in 0..dataset.len() {
                if let Some(result) = dataset.load(index) {
                    let doc = result?;
                    println!("{}: {} annotations", doc.filename, doc.annotations.len());
                }
            }
            println!("{} pairs OK", dataset.len());
        }
        CliCommand::Config { write } => {
            let json = config.to_json().map_err(boxmark::config::ConfigError::from)?;
            println!("{}", json);
            if write {
                let path = config.save_to_default_path()?;
                eprintln!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}

/// Open the image's directory in a session, select the image and dump it.
fn dump_image(image: PathBuf, config: AppConfig) -> Result<String, SessionError> {
    let dir = image
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut session = Session::new(config);
    session.dispatch(Command::OpenDirectory(dir))?;
    session.select_path(&image)?;

    match session.dispatch(Command::Dump)? {
        CommandOutput::Dump(dump) => Ok(dump),
        _ => Ok(String::new()),
    }
}
