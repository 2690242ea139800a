pub mod extract;
pub mod info;
pub mod list;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Extract files or directories from a VPK package
    Extract(extract::ExtractArgs),
    /// List the files of a VPK package
    List(list::ListArgs),
    /// Show the header of a VPK index
    Info(info::InfoArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Extract(extract) => extract.handle(),
            Commands::List(list) => list.handle(),
            Commands::Info(info) => info.handle(),
        }
    }
}
