use clap::Args;
use itertools::Itertools;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{fs::File, io::BufReader, path::PathBuf};
use tracing::{error, info, warn};
use vpk_archive::{ExtractOptions, Resolution, VpkArchive};

#[derive(Args)]
pub struct ExtractArgs {
    /// The VPK index, usually named `*_dir.vpk`
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,

    /// Files or directories to extract
    #[arg(
        value_name = "ENTRY",
        required_unless_present = "list_file",
        conflicts_with = "list_file"
    )]
    entries: Vec<String>,

    /// A file listing the entries to extract, one per line
    #[arg(short, long, value_name = "FILE")]
    list_file: Option<PathBuf>,

    /// A target directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

/// Non blank lines of a list file, in order
pub fn parse_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect()
}

impl ExtractArgs {
    fn requests(&self) -> Result<Vec<String>> {
        let Some(list_file) = &self.list_file else {
            return Ok(self.entries.clone());
        };

        let contents = std::fs::read_to_string(list_file)
            .into_diagnostic()
            .context(format!("reading {}", list_file.display()))?;
        Ok(parse_list(&contents))
    }

    fn extract_file(
        &self,
        vpk: &mut VpkArchive<BufReader<File>>,
        index: usize,
        options: &ExtractOptions,
    ) -> vpk_archive::error::Result<PathBuf> {
        if let Some(entry) = vpk.entry(index) {
            if entry.is_inline() {
                info!("Found entry: {}", entry.path());
            } else {
                info!("Found entry: {} in VPK {}", entry.path(), entry.archive_index());
            }
        }

        vpk.extract_to(index, &self.output, options)
    }

    pub fn handle(&self) -> Result<()> {
        let requests = self.requests()?;

        let mut vpk = VpkArchive::open(&self.archive)
            .with_context(|| format!("opening {}", self.archive.display()))?;
        info!("Got VPK version {}", vpk.version());

        let options = ExtractOptions::builder()
            .overwrite(self.overwrite)
            .build();

        let mut failures = 0usize;
        for request in requests.iter().unique() {
            let resolution = match vpk.resolve(request) {
                Ok(resolution) => resolution,
                Err(e) => {
                    error!("{request}: {e}");
                    failures += 1;
                    continue;
                }
            };

            if resolution == Resolution::NotFound {
                warn!("Entry not found: {request}");
                continue;
            }

            for index in resolution.files() {
                match self.extract_file(&mut vpk, index, &options) {
                    Ok(path) => info!("writing {}", path.display()),
                    Err(e) => {
                        error!("{request}: {e}");
                        failures += 1;
                    }
                }
            }
        }

        if failures > 0 {
            return Err(miette!("{failures} entries could not be extracted"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::parse_list;

    #[test]
    fn list_skips_blank_lines() {
        let contents = "materials/foo.vmt\r\n\n   \nsound\nscripts/game sounds.txt\n";

        assert_eq!(
            parse_list(contents),
            vec!["materials/foo.vmt", "sound", "scripts/game sounds.txt"]
        );
    }
}
