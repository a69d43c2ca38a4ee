//! ypack
//!
//! Builds, lists and verifies ypak packages.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use ypak::config::MAX_COMPRESSION_LEVEL;
use ypak::{Config, PackageReader, PackageWriter, Reader, Source, YpakError};

/// ypak package tool
#[derive(Parser, Debug)]
#[command(name = "ypack")]
#[command(about = "Build and inspect ypak packages")]
#[command(version)]
struct Args {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a package from an index file listing one path per line
    Build {
        /// Index file; blank lines and lines starting with '#' are skipped
        index: PathBuf,

        /// Package to create
        package: PathBuf,

        /// zlib compression level
        #[arg(short, long, default_value_t = MAX_COMPRESSION_LEVEL)]
        level: u32,
    },

    /// List the entries of a package
    List {
        package: PathBuf,
    },

    /// Decode every entry of a package and print its CRC32
    Verify {
        package: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &args.command {
        Commands::Build {
            index,
            package,
            level,
        } => build(index, package, *level),
        Commands::List { package } => list(package),
        Commands::Verify { package } => verify(package),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn build(index: &Path, package: &Path, level: u32) -> ypak::Result<()> {
    let config = Config::builder().compression_level(level).build();
    let index_source = Source::from_path(index)
        .ok_or_else(|| YpakError::NotFound(index.display().to_string()))?;

    let mut writer = PackageWriter::create_with_config(package, &config)?;
    let mut reader = Reader::new(&index_source);
    let mut line = String::new();
    while reader.read_line(&mut line) {
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        writer.add_file(entry)?;
    }

    tracing::info!("Packing {} entries into {}", writer.len(), package.display());
    writer.commit()
}

fn list(package: &Path) -> ypak::Result<()> {
    let reader = PackageReader::create(package)?;
    for entry in reader.entries() {
        let method = entry.compression().map(|m| m.name()).unwrap_or("unknown");
        println!(
            "{:>12} {:>12} {:>6} {:>12}  {}",
            entry.uncompressed_size, entry.stored_size, method, entry.blob_offset, entry.name
        );
    }
    Ok(())
}

fn verify(package: &Path) -> ypak::Result<()> {
    let reader = PackageReader::create(package)?;
    for (index, entry) in reader.entries().iter().enumerate() {
        let source = reader.open(index)?;
        let data = source.to_buffer(0)?;
        println!("{:08x}  {}", crc32fast::hash(&data), entry.name);
    }
    tracing::info!("{}: {} entries OK", package.display(), reader.len());
    Ok(())
}
