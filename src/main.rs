//! masterini CLI
//!
//! Entry point for the `masterini` command-line tool. Query subcommands
//! load the master and local files and answer from the merged view; `set`
//! edits and rewrites the local file alone.

use clap::{Parser, Subcommand};
use masterini::{Layer, MasterIni, DEFAULT_SECTION};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "masterini")]
#[command(about = "Query and edit a two-tier master/local INI configuration", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sections visible across both layers
    Sections {
        /// Master configuration file (may repeat; unreadable files are skipped)
        #[arg(long, short = 'm', required = true)]
        master: Vec<PathBuf>,

        /// Local override file (may repeat; unreadable files are skipped)
        #[arg(long, short = 'l')]
        local: Vec<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List option names visible in a section
    Options {
        /// Section name
        section: String,

        /// Master configuration file (may repeat; unreadable files are skipped)
        #[arg(long, short = 'm', required = true)]
        master: Vec<PathBuf>,

        /// Local override file (may repeat; unreadable files are skipped)
        #[arg(long, short = 'l')]
        local: Vec<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print one value from the merged view
    Get {
        /// Section name
        section: String,

        /// Option name
        option: String,

        /// Master configuration file (may repeat; unreadable files are skipped)
        #[arg(long, short = 'm', required = true)]
        master: Vec<PathBuf>,

        /// Local override file (may repeat; unreadable files are skipped)
        #[arg(long, short = 'l')]
        local: Vec<PathBuf>,
    },

    /// Print the merged option/value view of a section
    Items {
        /// Section name
        section: String,

        /// Master configuration file (may repeat; unreadable files are skipped)
        #[arg(long, short = 'm', required = true)]
        master: Vec<PathBuf>,

        /// Local override file (may repeat; unreadable files are skipped)
        #[arg(long, short = 'l')]
        local: Vec<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Set an option in the local file and rewrite it
    Set {
        /// Section name (created in the local file if missing)
        section: String,

        /// Option name
        option: String,

        /// Value to store
        value: String,

        /// Local override file to update
        #[arg(long, short = 'l')]
        local: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sections { master, local, json } => {
            run_sections(master, local, json);
        }
        Commands::Options {
            section,
            master,
            local,
            json,
        } => {
            run_options(&section, master, local, json);
        }
        Commands::Get {
            section,
            option,
            master,
            local,
        } => {
            run_get(&section, &option, master, local);
        }
        Commands::Items {
            section,
            master,
            local,
            json,
        } => {
            run_items(&section, master, local, json);
        }
        Commands::Set {
            section,
            option,
            value,
            local,
        } => {
            run_set(&section, &option, &value, &local);
        }
    }
}

fn load_config(master: &[PathBuf], local: &[PathBuf]) -> MasterIni {
    let mut config = MasterIni::new();
    load_layer(&mut config, master, Layer::Master);
    load_layer(&mut config, local, Layer::Local);
    config
}

fn load_layer(config: &mut MasterIni, files: &[PathBuf], layer: Layer) {
    match config.read(files, layer) {
        Ok(parsed) => {
            for path in files {
                if !parsed.contains(path) {
                    eprintln!("Warning: skipping unreadable file: {}", path.display());
                }
            }
        }
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    }
}

fn run_sections(master: Vec<PathBuf>, local: Vec<PathBuf>, json_output: bool) {
    let config = load_config(&master, &local);
    let sections = config.sections();

    if json_output {
        match serde_json::to_string_pretty(&sections) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        for section in sections {
            println!("{}", section);
        }
    }
}

fn run_options(section: &str, master: Vec<PathBuf>, local: Vec<PathBuf>, json_output: bool) {
    let config = load_config(&master, &local);

    let options = match config.options(section) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match serde_json::to_string_pretty(&options) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        for option in options {
            println!("{}", option);
        }
    }
}

fn run_get(section: &str, option: &str, master: Vec<PathBuf>, local: Vec<PathBuf>) {
    let config = load_config(&master, &local);

    match config.get(section, option) {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_items(section: &str, master: Vec<PathBuf>, local: Vec<PathBuf>, json_output: bool) {
    let config = load_config(&master, &local);

    let items = match config.items(section) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match serde_json::to_string_pretty(&items) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        for (option, value) in items {
            println!("{} = {}", option, value);
        }
    }
}

fn run_set(section: &str, option: &str, value: &str, local_path: &Path) {
    let mut config = MasterIni::new();

    // A missing local file is fine; set creates it. A present but
    // malformed one is an error.
    if let Err(e) = config.read(&[local_path], Layer::Local) {
        eprintln!("Error loading {}: {}", local_path.display(), e);
        process::exit(1);
    }

    if section != DEFAULT_SECTION && !config.local.has_section(section) {
        if let Err(e) = config.add_section(section) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
    if let Err(e) = config.set(section, option, value) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let file = match File::create(local_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error creating {}: {}", local_path.display(), e);
            process::exit(1);
        }
    };
    let mut writer = BufWriter::new(file);
    if let Err(e) = config.write_to(&mut writer).and_then(|_| writer.flush()) {
        eprintln!("Error writing {}: {}", local_path.display(), e);
        process::exit(1);
    }

    println!("Updated {}", local_path.display());
}
