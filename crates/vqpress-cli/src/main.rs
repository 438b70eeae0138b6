//! vqpress - Vector Quantization Image Compressor
//!
//! ## Usage
//!
//! ```bash
//! # Compress with default settings (8x8 blocks, 64 codewords) to photo.bin
//! vqpress compress photo.png
//!
//! # Smaller blocks, larger codebook
//! vqpress compress photo.png photo.bin --block-height 4 --block-width 4 --codewords 256
//!
//! # Settings from a JSON file
//! vqpress compress photo.png photo.bin --config vq.json
//!
//! # Decompress
//! vqpress decompress photo.bin restored.jpg
//!
//! # Show what a compressed file holds
//! vqpress inspect photo.bin
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use vqpress::{Compressor, VqConfig, VqFile, VQ_EXTENSION};

#[derive(Parser, Debug)]
#[command(name = "vqpress")]
#[command(author = "Daemoniorum LLC")]
#[command(version)]
#[command(about = "Vector quantization image compressor", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress an image into a codebook and index grid
    Compress {
        /// Image to compress
        input: PathBuf,

        /// Compressed output file [default: input with a .bin extension]
        output: Option<PathBuf>,

        /// Configuration file (JSON); flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Block height in pixels
        #[arg(long)]
        block_height: Option<usize>,

        /// Block width in pixels
        #[arg(long)]
        block_width: Option<usize>,

        /// Number of codewords
        #[arg(short = 'n', long)]
        codewords: Option<usize>,

        /// Maximum Lloyd iterations
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Search on a single thread
        #[arg(long)]
        no_parallel: bool,
    },

    /// Reconstruct an image from a compressed file
    Decompress {
        /// Compressed input file
        input: PathBuf,

        /// Image to write; the format follows the extension
        output: PathBuf,
    },

    /// Print the contents of a compressed file
    Inspect {
        /// Compressed input file
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {e}");
    }

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Compress {
            input,
            output,
            config,
            block_height,
            block_width,
            codewords,
            max_iterations,
            no_parallel,
        } => {
            let mut vq_config = match config {
                Some(path) => VqConfig::from_json_file(path)?,
                None => VqConfig::default(),
            };
            if let Some(v) = block_height {
                vq_config.block_height = v;
            }
            if let Some(v) = block_width {
                vq_config.block_width = v;
            }
            if let Some(v) = codewords {
                vq_config.num_codewords = v;
            }
            if let Some(v) = max_iterations {
                vq_config.max_iterations = v;
            }
            if no_parallel {
                vq_config.parallel = false;
            }
            let output = output.unwrap_or_else(|| default_output(&input));

            info!("Compressing {}", input.display());
            info!(
                "  Blocks:     {}x{}",
                vq_config.block_height, vq_config.block_width
            );
            info!("  Codewords:  {}", vq_config.num_codewords);

            let grid = vqpress::read_luminance(&input)?;
            let compressed = Compressor::new(vq_config)?.compress(&grid)?;
            compressed.save(&output)?;

            let stats = &compressed.stats;
            info!("Wrote {}", output.display());
            info!("  Image:      {}x{}", grid.height(), grid.width());
            info!(
                "  Codebook:   {} entries ({} split rounds, {} iterations{})",
                stats.codebook_size,
                stats.split_rounds,
                stats.iterations,
                if stats.converged { "" } else { ", not converged" }
            );
            info!("  PSNR:       {:.2} dB", stats.psnr);
            info!(
                "  Size:       {} -> {} bytes ({:.2}x)",
                stats.original_bytes,
                stats.compressed_bytes,
                stats.compression_ratio()
            );
        }

        Command::Decompress { input, output } => {
            let file = VqFile::load(&input)?;
            let grid = vqpress::decompress(
                &file.index_grid,
                &file.codebook,
                file.codebook.block_height(),
                file.codebook.block_width(),
            )?;
            vqpress::write_luminance(&grid, &output)?;
            info!(
                "Wrote {} ({}x{})",
                output.display(),
                grid.height(),
                grid.width()
            );
        }

        Command::Inspect { input } => {
            let file = VqFile::load(&input)?;
            println!("file:        {}", input.display());
            println!(
                "index grid:  {}x{} ({}-bit indices)",
                file.index_grid.rows(),
                file.index_grid.cols(),
                file.index_grid.index_bits()
            );
            println!(
                "blocks:      {}x{}",
                file.codebook.block_height(),
                file.codebook.block_width()
            );
            println!("codebook:    {} entries", file.codebook.len());
            let (height, width) = file.decoded_shape()?;
            println!(
                "image:       {}x{} ({} samples)",
                height,
                width,
                file.decoded_len()?
            );
            println!("file size:   {} bytes", file.encoded_len());
        }
    }

    Ok(())
}

/// `input` with its extension replaced by the compressed-file extension
fn default_output(input: &Path) -> PathBuf {
    input.with_extension(VQ_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_compress() {
        let args = Args::parse_from([
            "vqpress",
            "compress",
            "in.png",
            "out.bin",
            "--block-height",
            "4",
            "-n",
            "128",
            "--no-parallel",
        ]);
        match args.command {
            Command::Compress {
                block_height,
                block_width,
                codewords,
                no_parallel,
                ..
            } => {
                assert_eq!(block_height, Some(4));
                assert_eq!(block_width, None);
                assert_eq!(codewords, Some(128));
                assert!(no_parallel);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_output_defaults_to_bin() {
        let args = Args::parse_from(["vqpress", "compress", "photos/cat.png"]);
        match args.command {
            Command::Compress { input, output, .. } => {
                assert_eq!(output, None);
                assert_eq!(default_output(&input), PathBuf::from("photos/cat.bin"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_compress_then_decompress() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let packed = dir.path().join("in.bin");
        assert_eq!(default_output(&input), packed);
        let output = dir.path().join("out.png");

        let grid = vqpress::SampleGrid::from_fn(16, 16, |r, c| ((r / 4 + c / 4) * 40) as f32);
        vqpress::write_luminance(&grid, &input).unwrap();

        run(Command::Compress {
            input: input.clone(),
            output: None,
            config: None,
            block_height: Some(4),
            block_width: Some(4),
            codewords: Some(8),
            max_iterations: None,
            no_parallel: true,
        })
        .unwrap();
        run(Command::Decompress {
            input: packed.clone(),
            output: output.clone(),
        })
        .unwrap();
        run(Command::Inspect { input: packed }).unwrap();

        let restored = vqpress::read_luminance(&output).unwrap();
        assert_eq!((restored.height(), restored.width()), (16, 16));
    }
}
