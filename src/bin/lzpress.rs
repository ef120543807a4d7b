use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use lz_press::framed::{self, HEADER_LEN};
use lz_press::{CompressionError, CompressionSettings, DecompressionError, ErrorKind, Token};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "lzpress")]
#[command(about = "Compress and decompress files with a small LZ77 codec")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress INPUT into a frame written to OUTPUT
    Compress {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Decompress the frame in INPUT into OUTPUT
    Decompress { input: PathBuf, output: PathBuf },
    /// Check that COMPRESSED decompresses to exactly the contents of RAW
    Verify { compressed: PathBuf, raw: PathBuf },
    /// Print token statistics for a frame
    Stats { compressed: PathBuf },
}

#[derive(clap::Args, Debug)]
struct Tuning {
    /// How far back a copy may reach, in bytes
    #[arg(long, default_value_t = lz_press::raw::WINDOW_SIZE)]
    window_size: usize,

    /// Shortest duplicate worth a copy token
    #[arg(long, default_value_t = lz_press::raw::MINMATCH)]
    min_match: usize,

    /// log2 of the number of match table slots
    #[arg(long, default_value_t = lz_press::raw::HASH_BITS)]
    hash_bits: u32,

    /// Positions remembered per match table slot
    #[arg(long, default_value_t = lz_press::raw::SEARCH_DEPTH)]
    search_depth: usize,
}

impl Tuning {
    fn settings(&self) -> CompressionSettings {
        let mut settings = CompressionSettings::default();
        settings
            .window_size(self.window_size)
            .min_match(self.min_match)
            .hash_bits(self.hash_bits)
            .search_depth(self.search_depth);
        settings
    }
}

/// Exit codes (2 is what clap uses for usage errors)
const EXIT_IO: u8 = 1;
const EXIT_BAD_MAGIC: u8 = 3;
const EXIT_TRUNCATED: u8 = 4;
const EXIT_CORRUPT: u8 = 5;
const EXIT_MISMATCH: u8 = 6;

#[derive(Error, Debug)]
enum CliError {
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Settings(#[from] CompressionError),
    #[error("{}: {source}", .path.display())]
    Decompress { path: PathBuf, source: DecompressionError },
    #[error("{} does not decompress to {}: first difference at byte {offset}", .compressed.display(), .raw.display())]
    Mismatch { compressed: PathBuf, raw: PathBuf, offset: usize },
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Io { .. } | CliError::Settings(_) => EXIT_IO,
            CliError::Decompress { source, .. } => match source.kind() {
                ErrorKind::BadMagic => EXIT_BAD_MAGIC,
                ErrorKind::TruncatedFrame => EXIT_TRUNCATED,
                ErrorKind::CorruptStream => EXIT_CORRUPT,
                ErrorKind::Io => EXIT_IO,
            },
            CliError::Mismatch { .. } => EXIT_MISMATCH,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Compress { input, output, tuning } => {
            let settings = tuning.settings();
            // reject bad settings before touching any file
            settings.params()?;
            let data = read_file(&input)?;
            let frame = settings.compress(&data)?;
            write_atomically(&output, &frame)?;
            tracing::info!(input = %input.display(), output = %output.display(), from = data.len(), to = frame.len(), "compressed");
        }
        Command::Decompress { input, output } => {
            let data = decompress_file(&input)?;
            write_atomically(&output, &data)?;
            tracing::info!(input = %input.display(), output = %output.display(), bytes = data.len(), "decompressed");
        }
        Command::Verify { compressed, raw } => {
            let decoded = decompress_file(&compressed)?;
            let expected = read_file(&raw)?;
            if let Some(offset) = first_difference(&decoded, &expected) {
                return Err(CliError::Mismatch { compressed, raw, offset });
            }
            println!("OK: {} bytes match", expected.len());
        }
        Command::Stats { compressed } => {
            let input = read_file(&compressed)?;
            let to_cli_error = |source: DecompressionError| CliError::Decompress { path: compressed.clone(), source };
            let frame = framed::read_frame(&input).map_err(to_cli_error)?;
            // replay too, so stats are never printed for a frame that does not decode
            lz_press::raw::decompress(&frame.tokens, frame.uncompressed_len)
                .map_err(|e| to_cli_error(e.into()))?;
            print_stats(&frame, input.len());
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}

fn decompress_file(path: &Path) -> Result<Vec<u8>, CliError> {
    let input = read_file(path)?;
    lz_press::decompress(&input).map_err(|source| CliError::Decompress { path: path.to_path_buf(), source })
}

/// Write `data` to a temporary file next to `path` and move it into place once everything
/// is on disk. If any step fails, `path` is left untouched.
fn write_atomically(path: &Path, data: &[u8]) -> Result<(), CliError> {
    let io_error = |source: io::Error| CliError::Io { path: path.to_path_buf(), source };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(data).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    match a.iter().zip(b).position(|(x, y)| x != y) {
        Some(i) => Some(i),
        None if a.len() != b.len() => Some(a.len().min(b.len())),
        None => None,
    }
}

fn print_stats(frame: &framed::Frame, frame_len: usize) {
    let mut literals = 0usize;
    let mut copies = 0usize;
    let mut copied_bytes = 0u64;
    let mut longest_copy = 0usize;
    for token in &frame.tokens {
        match *token {
            Token::Literal(_) => literals += 1,
            Token::Copy { length, .. } => {
                copies += 1;
                copied_bytes += length as u64;
                longest_copy = longest_copy.max(length);
            }
        }
    }

    println!("Uncompressed size: {} bytes", frame.uncompressed_len);
    println!("Frame size:        {} bytes ({} header)", frame_len, HEADER_LEN);
    if frame.uncompressed_len > 0 {
        println!("Ratio:             {:.3}", frame_len as f64 / frame.uncompressed_len as f64);
    }
    println!("Tokens:            {} ({} literals, {} copies)", frame.tokens.len(), literals, copies);
    println!("Copied bytes:      {}", copied_bytes);
    println!("Longest copy:      {}", longest_copy);
}
