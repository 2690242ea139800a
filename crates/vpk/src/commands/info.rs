use clap::Args;
use miette::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use vpk_archive::VpkArchive;

#[derive(Args)]
pub struct InfoArgs {
    /// The VPK index, usually named `*_dir.vpk`
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let vpk = VpkArchive::open(&self.archive)
            .with_context(|| format!("opening {}", self.archive.display()))?;

        let header = vpk.header();
        let tree = vpk.tree();

        println!("{} {}", "version".bold(), header.version());
        println!("{} {}", "tree length".bold(), header.tree_length());
        if let Some(footer) = header.footer_length() {
            println!("{} {}", "footer length".bold(), footer);
        }
        println!("{} {}", "extensions".bold(), tree.extensions().len());
        println!("{} {}", "directories".bold(), tree.directories().len());
        println!("{} {}", "files".bold(), tree.len());

        Ok(())
    }
}
