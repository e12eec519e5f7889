use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use vellum::{
    ContentModel, ContentModelBuilder, DirectoryDelivery, ExportConfig, ExportError,
    ExportOutcome, ExporterBuilder, FilesystemResourceProvider, PageSize,
};

/// Export a resume content model (JSON) to a paginated PDF.
#[derive(Parser, Debug)]
#[command(name = "vellum", version, about)]
struct Cli {
    /// Path to the content model JSON.
    data: PathBuf,

    /// Directory the PDF is saved into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Export settings (JSON, camelCase keys).
    #[arg(long)]
    config: Option<PathBuf>,

    /// A4, Letter, or <width>x<height>mm.
    #[arg(long)]
    page_size: Option<PageSize>,

    /// Device pixels per CSS pixel.
    #[arg(long)]
    scale: Option<f32>,

    /// Extra font directories. May be repeated.
    #[arg(long)]
    font_dir: Vec<PathBuf>,

    /// Load the fonts installed on this system.
    #[arg(long)]
    system_fonts: bool,

    /// Directory image sources resolve against. Defaults to the data file's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Print the built markup instead of exporting.
    #[arg(long)]
    dump_markup: bool,
}

#[tokio::main]
async fn main() -> Result<(), ExportError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("vellum=info"))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ExportConfig::from_file(path)?,
        None => ExportConfig::default(),
    };
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }
    if let Some(scale) = cli.scale {
        config.scale = scale;
    }

    log::info!("Loading content from {}", cli.data.display());
    let model = ContentModel::from_file(&cli.data)?;

    if cli.dump_markup {
        let fragment = ContentModelBuilder::new(config.theme.clone()).build(&model);
        println!("{}", fragment.to_markup());
        return Ok(());
    }

    let assets = cli.assets.clone().unwrap_or_else(|| {
        cli.data
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let delivery = DirectoryDelivery::new(&cli.out_dir);

    let mut builder = ExporterBuilder::new()
        .with_config(config)
        .with_resource_provider(Arc::new(FilesystemResourceProvider::new(&assets)))
        .with_delivery(Arc::new(delivery.clone()));
    #[cfg(feature = "system-fonts")]
    {
        builder = builder.with_system_fonts(cli.system_fonts);
        for dir in &cli.font_dir {
            builder = builder.with_font_dir(dir);
        }
    }
    #[cfg(not(feature = "system-fonts"))]
    if cli.system_fonts || !cli.font_dir.is_empty() {
        log::warn!("Built without system-fonts; --system-fonts and --font-dir are ignored");
    }
    let exporter = builder.build()?;

    match exporter.export(&model).await? {
        ExportOutcome::Delivered(receipt) => {
            println!(
                "Saved {} ({} page(s))",
                delivery.path_for(&receipt.filename).display(),
                receipt.pages
            );
        }
        ExportOutcome::AlreadyRunning => {
            log::warn!("An export was already running");
        }
    }
    Ok(())
}
