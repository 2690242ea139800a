use clap::Args;
use miette::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use vpk_archive::{read::VpkEntry, VpkArchive};

#[derive(Args)]
pub struct ListArgs {
    /// The VPK index, usually named `*_dir.vpk`
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,

    /// Only list this file, or the files in this directory and below it
    #[arg(value_name = "PREFIX")]
    prefix: Option<String>,
}

/// Where the data of an entry is read from
pub fn location(entry: &VpkEntry<'_>) -> String {
    if entry.entry_length() == 0 && entry.preload_bytes() > 0 {
        "preload".into()
    } else if entry.is_inline() {
        "index".into()
    } else {
        format!("{:03}", entry.archive_index())
    }
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let vpk = VpkArchive::open(&self.archive)
            .with_context(|| format!("opening {}", self.archive.display()))?;

        let files = match &self.prefix {
            Some(prefix) => vpk.resolve(prefix)?.files(),
            None => (0..vpk.len()).collect(),
        };

        for entry in files.into_iter().filter_map(|i| vpk.entry(i)) {
            println!(
                "{} {} {}",
                entry.path(),
                entry.size().dimmed(),
                location(&entry).blue()
            );
        }

        Ok(())
    }
}
