use clap::Parser;
use std::path::PathBuf;

use mp4forge::config::PoolConfig;

#[derive(Parser)]
#[command(name = "mp4forge")]
#[command(author, version, about = "Convert media files to H.264/AAC MP4")]
pub struct Cli {
    /// Files or directories to convert (the directory to watch with --watch)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Number of concurrent conversion workers
    #[arg(short = 'n', long)]
    pub workers: Option<usize>,

    /// x264 speed preset
    #[arg(short, long)]
    pub preset: Option<String>,

    /// x264 constant rate factor
    #[arg(short, long)]
    pub crf: Option<String>,

    /// Delete (or move) the original once its output is in place
    #[arg(short, long)]
    pub delete_original: bool,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Write outputs here instead of next to each source
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Watch the input directory for new files until interrupted
    #[arg(short, long)]
    pub watch: bool,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Layer command-line flags over file-based configuration.
    pub fn apply_overrides(&self, config: &mut PoolConfig) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(preset) = &self.preset {
            config.video.preset = preset.clone();
        }
        if let Some(crf) = &self.crf {
            config.video.crf = crf.clone();
        }
        if self.delete_original {
            config.delete_original = true;
        }
        if self.recursive {
            config.recursive = true;
        }
        if let Some(dir) = &self.output_dir {
            // An empty value means "next to the source".
            config.output_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
        }
    }
}
