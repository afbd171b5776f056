// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! amd CLI - resolve module URLs and load data modules through the loader

use amd_loader::{Bootstrap, ConfigPatch, Loader, ModuleValue, VERSION};
use anyhow::Context;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "amd",
    about = "AMD module loader: URL resolution and data module loading",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// JSON file with loader options (baseUrl, paths, prefix, config, timeout)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the resource root
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Load timeout in milliseconds (0 disables it)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the URL each module name resolves to
    Url {
        /// Module names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Load modules and print their values
    Load {
        /// Module names, e.g. `data/audio.json`
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Load a config module, then a main module
    Boot {
        /// Main module (data-main)
        #[arg(long)]
        main: Option<String>,

        /// Config module (data-config)
        #[arg(long = "data-config")]
        data_config: Option<String>,
    },
}

impl Cli {
    /// Options from the config file, then the command-line overrides
    fn config_patches(&self) -> anyhow::Result<Vec<ConfigPatch>> {
        let mut patches = Vec::new();
        if let Some(path) = &self.config {
            let patch = ConfigPatch::from_file(path)
                .with_context(|| format!("reading loader options from {}", path.display()))?;
            patches.push(patch);
        }

        let mut overrides = ConfigPatch::new();
        if let Some(base_url) = &self.base_url {
            overrides = overrides.base_url(base_url);
        }
        if let Some(timeout) = self.timeout {
            overrides = overrides.timeout(timeout);
        }
        patches.push(overrides);
        Ok(patches)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("amd_loader=debug,amd=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("amd_loader=warn")
            .init();
    }

    let mut builder = Loader::builder();
    for patch in cli.config_patches()? {
        builder = builder.config(patch);
    }
    let loader = builder.build();

    let outcome = match &cli.command {
        Command::Url { names } => {
            for name in names {
                println!("{} {}", name.cyan(), loader.url_for(name));
            }
            Ok(())
        }
        Command::Load { names } => load(&loader, names).await,
        Command::Boot { main, data_config } => {
            let bootstrap = Bootstrap {
                config: data_config.clone(),
                main: main.clone(),
            };
            match loader.bootstrap(&bootstrap).await {
                Ok(Some(value)) => {
                    print_value(main.as_deref().unwrap_or_default(), &value);
                    Ok(())
                }
                Ok(None) => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
    };

    if let Err(e) = outcome {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

async fn load(loader: &Loader, names: &[String]) -> anyhow::Result<()> {
    let args = loader.require(names.to_vec()).await?;
    for (name, value) in args.iter() {
        print_value(name, value);
    }
    Ok(())
}

fn print_value(name: &str, value: &ModuleValue) {
    match value.as_json() {
        Some(json) => {
            let pretty = serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string());
            println!("{}\n{}", name.cyan().bold(), pretty);
        }
        None => println!("{} <{}>", name.cyan().bold(), value.type_name().dimmed()),
    }
}
