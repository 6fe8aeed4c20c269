use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::io::{self, Write};
use std::path::PathBuf;

use nfs_rspec::params::{declared_parameters, OsImage, ParameterSet};
use nfs_rspec::params_loader::{self, ParamOverrides};
use nfs_rspec::profile;

/// RSpec generator for an NFS server/client testbed backed by a persistent dataset
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the request RSpec
    Generate {
        /// YAML file with clientCount, phystype and osImage
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Number of NFS clients
        #[arg(long)]
        client_count: Option<u32>,

        /// Physical node type for the clients (empty for any)
        #[arg(long)]
        phystype: Option<String>,

        /// OS image URN or label
        #[arg(long)]
        os_image: Option<OsImage>,

        /// Write the RSpec here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the parameter declarations as JSON
    Params,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries the document
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match cli.command {
        Commands::Generate {
            params,
            client_count,
            phystype,
            os_image,
            output,
        } => {
            let mut bound = match &params {
                Some(path) => params_loader::load_params(path)?,
                None => ParameterSet::default(),
            };

            let overrides = ParamOverrides {
                client_count,
                phystype,
                os_image,
            };
            params_loader::apply_overrides(&mut bound, &overrides)?;

            info!(
                "Generating RSpec: clientCount={}, phystype={:?}, osImage={}",
                bound.client_count,
                bound.phystype,
                bound.os_image.label()
            );

            match output {
                Some(path) => profile::write_rspec(&bound, &path)?,
                None => {
                    let xml = profile::generate_rspec(&bound)?;
                    io::stdout()
                        .write_all(xml.as_bytes())
                        .wrap_err("Failed to write RSpec to stdout")?;
                }
            }
        }
        Commands::Params => {
            let json = serde_json::to_string_pretty(&declared_parameters())?;
            println!("{}", json);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["nfs-rspec", "generate", "--client-count", "3"]);

        match cli.command {
            Commands::Generate {
                params,
                client_count,
                phystype,
                os_image,
                output,
            } => {
                assert_eq!(params, None);
                assert_eq!(client_count, Some(3));
                assert_eq!(phystype, None);
                assert_eq!(os_image, None);
                assert_eq!(output, None);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_os_image_argument() {
        let cli = Cli::parse_from([
            "nfs-rspec",
            "generate",
            "--os-image",
            "MPI+CUDA",
            "-o",
            "out.xml",
        ]);
        match cli.command {
            Commands::Generate { os_image, output, .. } => {
                assert_eq!(os_image, Some(OsImage::MpiCuda));
                assert_eq!(output, Some(PathBuf::from("out.xml")));
            }
            _ => panic!("expected generate"),
        }

        assert!(Cli::try_parse_from(["nfs-rspec", "generate", "--os-image", "ubuntu"]).is_err());
    }

    #[test]
    fn test_params_subcommand() {
        let cli = Cli::parse_from(["nfs-rspec", "params"]);
        assert!(matches!(cli.command, Commands::Params));
    }
}
