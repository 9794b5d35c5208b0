use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use trellis_image_config::FsConfigSource;
use trellis_image_resolver::{ImageResolver, ImageSpec, StandardResolver};
use trellis_platform::StandardEndpoints;

/// Trellis - client tooling for the Trellis ML platform
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.trellis)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Work with the platform's pre-built framework images
  Image {
    #[command(subcommand)]
    command: ImageCommands,
  },
}

#[derive(Subcommand)]
enum ImageCommands {
  /// Resolve a framework image URI from the configuration tables
  Resolve(ResolveArgs),
}

#[derive(Args)]
struct ResolveArgs {
  /// The framework or algorithm name
  #[arg(long)]
  framework: String,

  /// The region to pull the image from
  #[arg(long)]
  region: String,

  /// The framework or algorithm version
  #[arg(long)]
  version: Option<String>,

  /// The interpreter runtime version, e.g. py38
  #[arg(long)]
  py_version: Option<String>,

  /// The instance type the image will run on
  #[arg(long)]
  instance_type: Option<String>,

  /// Elastic inference accelerator type
  #[arg(long)]
  accelerator_type: Option<String>,

  /// What the image is used for: training, inference, or eia
  #[arg(long)]
  image_scope: Option<String>,

  /// The container version of the image
  #[arg(long)]
  container_version: Option<String>,

  /// Distributed-training configuration as a JSON object
  #[arg(long)]
  distribution: Option<String>,

  /// The base framework version for composite frameworks
  #[arg(long)]
  base_framework_version: Option<String>,

  /// Resolve a training-compiler image
  #[arg(long)]
  training_compiler: bool,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let data_dir = cli.data_dir.unwrap_or_else(|| {
    dirs::home_dir()
      .expect("could not determine home directory")
      .join(".trellis")
  });

  match cli.command {
    Some(Commands::Image { command }) => match command {
      ImageCommands::Resolve(args) => {
        resolve_image(args, data_dir)?;
      }
    },
    None => {
      println!("trellis - use --help to see available commands");
    }
  }

  Ok(())
}

fn resolve_image(args: ResolveArgs, data_dir: PathBuf) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { resolve_image_async(args, data_dir).await })
}

async fn resolve_image_async(args: ResolveArgs, data_dir: PathBuf) -> Result<()> {
  let distribution = match args.distribution.as_deref() {
    Some(raw) => {
      let value: serde_json::Value =
        serde_json::from_str(raw).context("failed to parse distribution as JSON")?;
      match value {
        serde_json::Value::Object(map) => Some(map),
        _ => bail!("distribution must be a JSON object"),
      }
    }
    None => None,
  };

  let source = FsConfigSource::new(data_dir.join("image-config"));
  let resolver = StandardResolver::new(source, StandardEndpoints);

  let spec = ImageSpec {
    framework: args.framework,
    region: args.region,
    version: args.version,
    py_version: args.py_version,
    instance_type: args.instance_type,
    accelerator_type: args.accelerator_type,
    image_scope: args.image_scope,
    container_version: args.container_version,
    distribution,
    base_framework_version: args.base_framework_version,
    training_compiler: args.training_compiler,
  };

  let uri = resolver
    .resolve(&spec)
    .await
    .context("failed to resolve image URI")?;

  println!("{}", uri);
  Ok(())
}
