// Vault Sentinel - Security monitoring daemon for Vault clusters
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::FmtSubscriber;
use vault_sentinel::Args;
use vault_sentinel::commands::CommandRouter;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<i32> {
    // Initialize logging - RUST_LOG wins over -v
    let rust_log = std::env::var("RUST_LOG").ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(args.log_filter(rust_log.as_deref()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let command = CommandRouter::route(args);
    debug!("Executing {}", command.name());

    let status = command.execute().await?;
    Ok(status.exit_code())
}
