use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use thumbnailer::config::{self, CONFIG_FILENAME, SitePaths, ThumbnailerConfig};
use thumbnailer::host::{BuildPipeline, RequestHandler, ResourceRegistry};
use thumbnailer::imaging::RustBackend;
use thumbnailer::precompute::Precompute;
use thumbnailer::proxy::ThumbnailProxy;
use thumbnailer::serve::{Server, StaticFiles};
use thumbnailer::sitemap::{Sitemap, SitemapProjector, project};
use thumbnailer::{output, specs};

/// Name of the resource listing written into the build directory.
const RESOURCES_FILENAME: &str = "thumbnails.json";

#[derive(Parser)]
#[command(name = "thumbnailer")]
#[command(about = "Derived image variants for static sites")]
#[command(long_about = "\
Derived image variants for static sites

Every image under the site's images directory gets one variant per entry in
[dimensions]. `build` renders them all into the build directory; `serve`
renders them on demand and caches them until the source image changes.

Project structure:

  thumbnailer.toml               # Config ([dimensions] is required)
  source/
  └── images/
      ├── cat.png                # → cat-thumb.png, cat-large.png
      └── blog/
          └── dog.jpg            # → blog/dog-thumb.jpg, blog/dog-large.jpg
  build/                         # `build` output
  tmp/thumbnail-cache/           # `serve` cache

Run 'thumbnailer gen-config' to generate a documented thumbnailer.toml.")]
#[command(version)]
struct Cli {
    /// Project root; site directories in the config are relative to it
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file [default: <root>/thumbnailer.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every variant into the build directory and register them
    Build,
    /// Preview server rendering variants on demand
    Serve {
        /// Port to listen on (overrides [serve].port)
        #[arg(long)]
        port: Option<u16>,
        /// Interface to bind (overrides [serve].interface)
        #[arg(long)]
        interface: Option<String>,
    },
    /// Show the variants of one image (path relative to the source directory)
    Specs { image: PathBuf },
    /// List the resources the build registers
    Sitemap {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate config and check every variant path for collisions
    Check,
    /// Print a stock thumbnailer.toml with all options documented
    GenConfig,
}

fn load(cli: &Cli) -> Result<(ThumbnailerConfig, SitePaths), config::ConfigError> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join(CONFIG_FILENAME));
    let config = config::load_config(&config_path)?;
    let paths = config.site.resolve(&cli.root);
    Ok((config, paths))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Build => {
            let (config, paths) = load(&cli)?;
            let backend = RustBackend::new();

            println!("==> Rendering variants → {}", paths.build_dir.display());
            let (tx, printer) = output::spawn_printer(output::print_build_event);
            let mut pipeline = BuildPipeline::new(paths.clone());
            Precompute::new(&backend, &config)
                .with_events(tx)
                .attach(&mut pipeline);
            let result = pipeline.run();
            // Dropping the hooks closes the event channel
            drop(pipeline);
            let printed = printer.finish();
            result.map_err(|e| e as Box<dyn std::error::Error>)?;
            printed?;

            let mut sitemap = Sitemap::new();
            SitemapProjector::new(&config, &paths).project_into(&mut sitemap)?;
            std::fs::create_dir_all(&paths.build_dir)?;
            let listing = paths.build_dir.join(RESOURCES_FILENAME);
            std::fs::write(&listing, serde_json::to_string_pretty(sitemap.resources())?)?;
            println!(
                "==> Registered {} resources → {}",
                sitemap.len(),
                listing.display()
            );
        }
        Command::Serve { port, interface } => {
            let (config, paths) = load(&cli)?;
            let mut serve = config.serve.clone();
            if let Some(port) = port {
                serve.port = *port;
            }
            if let Some(interface) = interface {
                serve.interface = interface.clone();
            }

            let (tx, _proxy_printer) = output::spawn_printer(output::print_proxy_event);
            let proxy = ThumbnailProxy::from_config(
                StaticFiles::new(&paths.source_dir),
                RustBackend::new(),
                &config,
                &paths,
            )?
            .with_events(tx);
            println!("==> Indexed {} variants", proxy.index().len());
            let proxy = Arc::new(proxy);

            let server = Server::bind(&serve)?;
            server.stop_on_ctrlc()?;
            println!(
                "==> Serving {} on http://{} (Ctrl-C to stop)",
                paths.source_dir.display(),
                server.addr()
            );
            let (failures_tx, _failure_printer) =
                output::spawn_printer(output::print_request_failure);
            let handler: Arc<dyn RequestHandler> = proxy.clone();
            server.run(handler, config::effective_workers(&serve), Some(failures_tx))?;
            println!("Cache: {}", proxy.stats());
        }
        Command::Specs { image } => {
            let (config, paths) = load(&cli)?;
            let logical = image.strip_prefix(&paths.source_dir).unwrap_or(image);
            let specs = specs::resolve(logical, &config.dimensions);
            output::print_spec_set(logical, &specs);
        }
        Command::Sitemap { json } => {
            let (config, paths) = load(&cli)?;
            let resources = project(&config, &paths)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&resources)?);
            } else {
                output::print_resources(&resources, &paths.root);
            }
        }
        Command::Check => {
            let (config, paths) = load(&cli)?;
            let discovery = config.discovery()?;
            let images = specs::resolve_site(&config, &paths)?;
            let variants = images.iter().map(|i| i.specs.variants().count()).sum();
            let patterns: Vec<&str> = discovery.patterns().collect();
            output::print_check(&patterns, images.len(), variants);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
