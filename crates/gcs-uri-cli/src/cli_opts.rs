use anyhow::{anyhow, Result};
use clap::Args;

use gcs_uri::Address;

#[derive(Args, Debug, Clone)]
pub struct CopyParams {
    /// Copy directories and prefixes with everything below them
    #[clap(short, long)]
    pub recursive: bool,
    /// Do not log each copied file
    #[clap(short, long)]
    pub quiet: bool,
    /// Sources followed by the destination (example: ./data gs://my-bucket/a/prefix/)
    ///
    /// Sources and destination are local paths, file: URIs or gs:// URIs.  With more than
    /// one source the destination is treated as a directory.
    #[clap(required = true, num_args = 2..)]
    pub locations: Vec<String>,
}

impl CopyParams {
    /// Splits the positional arguments into the sources and the destination.
    pub fn split(&self) -> Result<(Vec<Address>, Address)> {
        let (destination, sources) = self
            .locations
            .split_last()
            .ok_or_else(|| anyhow!("missing destination"))?;
        Ok((
            sources.iter().map(Address::from).collect(),
            Address::from(destination),
        ))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ListParams {
    /// The prefix to list (example: gs://my-bucket/a/prefix/)
    pub prefix: String,
}

#[derive(Args, Debug, Clone)]
pub struct RemoveParams {
    /// The objects to delete (example: gs://my-bucket/a/name.bin)
    #[clap(required = true)]
    pub objects: Vec<String>,
}
