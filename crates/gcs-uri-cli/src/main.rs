/*
* Copyright (C) 2024 Swift Navigation Inc.
* Contact: Swift Navigation <dev@swiftnav.com>
*
* This source is subject to the license found in the file 'LICENSE' which must
* be be distributed together with this source. All other rights reserved.
*
* THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
* EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
* WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
*/
#![cfg_attr(feature = "aggressive_lint", deny(warnings))]

mod cli_opts;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::*;
use log_derive::logfn;
use tokio::runtime::Builder;

use gcs_uri::Destinations;

use cli_opts::*;

const DEFAULT_LOG_FILTER: &str = "gcs_uri=info";

#[derive(Debug, Parser)]
#[clap(
    name = "gcs-uri",
    about = "Copy files between local paths and Cloud Storage."
)]
struct Cli {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Copy files, directories and objects
    Cp(CopyParams),
    /// List remote objects below a prefix
    Ls(ListParams),
    /// Delete remote objects
    Rm(RemoveParams),
}

#[logfn(err = "ERROR")]
async fn copy(params: CopyParams) -> Result<()> {
    let (mut sources, destination) = params.split()?;

    if sources.len() == 1 {
        let source = sources.remove(0);
        if params.recursive {
            gcs_uri::copy_tree(None, source, destination, params.quiet).await?;
        } else {
            gcs_uri::copy_item(None, source, destination, params.quiet).await?;
        }
        return Ok(());
    }

    if params.recursive {
        bail!("--recursive takes a single source");
    }
    gcs_uri::copy_batch(
        None,
        sources,
        Destinations::directory(destination),
        params.quiet,
    )
    .await?;
    Ok(())
}

#[logfn(err = "ERROR")]
async fn list(params: ListParams) -> Result<()> {
    for object in gcs_uri::list_objects(None, params.prefix.as_str()).await? {
        let size = object
            .size
            .map_or_else(|| "-".to_owned(), |size| size.to_string());
        println!("{:>12}  {}", size, object.object_ref());
    }
    Ok(())
}

#[logfn(err = "ERROR")]
async fn remove(params: RemoveParams) -> Result<()> {
    for object in &params.objects {
        gcs_uri::delete_object(None, object).await?;
        info!("Deleted '{}'", object);
    }
    Ok(())
}

async fn async_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .init();

    let cli = Cli::parse();
    debug!("{:?}", cli);

    match cli.cmd {
        Command::Cp(params) => copy(params).await,
        Command::Ls(params) => list(params).await,
        Command::Rm(params) => remove(params).await,
    }
}

fn main() -> Result<()> {
    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");
    rt.block_on(async { async_main().await })?;
    Ok(())
}
