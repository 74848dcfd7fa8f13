use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use harmoniq_preset_tool as tool;
use harmoniq_presets::{PresetConfig, PresetRegistry, TypeIdentity};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let registry = PresetRegistry::new(cli.config());
    match cli.command {
        Commands::List(args) => {
            let listing = tool::list(&registry, &args.identity);
            print(&listing, args.json)
        }
        Commands::Show(args) => {
            let view = tool::show(&registry, &args.target.identity, &args.target.preset)
                .with_context(|| {
                    format!(
                        "failed to read preset '{}' of {}",
                        args.target.preset, args.target.identity
                    )
                })?;
            print(&view, args.json)
        }
        Commands::Rename { identity, old, new } => tool::rename(&registry, &identity, &old, &new)
            .with_context(|| format!("failed to rename preset '{old}' of {identity}")),
        Commands::Delete(target) => tool::delete(&registry, &target.identity, &target.preset)
            .with_context(|| {
                format!(
                    "failed to delete preset '{}' of {}",
                    target.preset, target.identity
                )
            }),
        Commands::Meta(MetaCommand::Get { target, tag }) => {
            match tool::get_meta(&registry, &target.identity, &target.preset, &tag) {
                Some(value) => {
                    println!("{value}");
                    Ok(())
                }
                None => bail!("preset '{}' has no '{tag}' tag", target.preset),
            }
        }
        Commands::Meta(MetaCommand::Set { target, tag, value }) => tool::set_meta(
            &registry,
            &target.identity,
            &target.preset,
            &tag,
            value.as_deref(),
        )
        .with_context(|| format!("failed to update '{tag}' of preset '{}'", target.preset)),
    }
}

fn print<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{value}");
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    name = "harmoniq-presets",
    author,
    version,
    about = "Inspect and maintain Harmoniq Studio presets"
)]
struct Cli {
    /// Root of the writable preset layer.
    #[arg(long, value_name = "DIR", global = true)]
    user_dir: Option<PathBuf>,
    /// Root of the shipped preset layer.
    #[arg(long, value_name = "DIR", global = true)]
    system_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config(&self) -> PresetConfig {
        let mut config = PresetConfig::from_env();
        if let Some(dir) = &self.user_dir {
            config = config.with_user_root(dir);
        }
        if let Some(dir) = &self.system_dir {
            config = config.with_system_root(dir);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the presets of a component type.
    List(ListArgs),
    /// Print the stored values of one preset.
    Show(ShowArgs),
    /// Rename a preset.
    Rename {
        identity: TypeIdentity,
        old: String,
        new: String,
    },
    /// Delete a preset from the user layer.
    Delete(PresetTarget),
    /// Read or change preset meta data.
    #[command(subcommand)]
    Meta(MetaCommand),
}

#[derive(Args)]
struct ListArgs {
    /// Component type, e.g. `harmoniq.analog`.
    identity: TypeIdentity,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ShowArgs {
    #[command(flatten)]
    target: PresetTarget,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PresetTarget {
    /// Component type, e.g. `harmoniq.analog`.
    identity: TypeIdentity,
    /// Preset name.
    preset: String,
}

#[derive(Subcommand)]
enum MetaCommand {
    /// Print a meta tag.
    Get {
        #[command(flatten)]
        target: PresetTarget,
        tag: String,
    },
    /// Set a meta tag; leaving out the value removes it.
    Set {
        #[command(flatten)]
        target: PresetTarget,
        tag: String,
        value: Option<String>,
    },
}
