//! `cotizador init` command - initialize a new cotizador project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::core::project::{Project, ProjectError, PROJECT_DIR, QUOTES_DIR};
use crate::schema::template::{TemplateContext, TemplateGenerator};

/// Name of the generated sample payload
const SAMPLE_PAYLOAD: &str = "ejemplo.json";

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Force initialization even if .cotizador/ already exists
    #[arg(long)]
    pub force: bool,

    /// Default profit margin percent written to the config
    #[arg(long)]
    pub margin: Option<f64>,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    let mut ctx = TemplateContext::default();
    if let Some(margin) = args.margin {
        ctx = ctx.with_margin(margin);
    }

    match Project::init_with(&path, args.force, &ctx) {
        Ok(project) => {
            write_samples(&project, &ctx, args.force)?;
            println!(
                "{} Initialized cotizador project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(project.root(), &ctx);
            println!();
            println!("Next steps:");
            println!(
                "  {} Price the sample quote",
                style(format!("cotizador quote {}/{}", QUOTES_DIR, SAMPLE_PAYLOAD)).yellow()
            );
            println!(
                "  {} Check the catalog",
                style("cotizador validate").yellow()
            );
            println!(
                "  {} Try a formula",
                style("cotizador eval \"perimetro * 2\" --ancho 1.5 --alto 1.2").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} cotizador project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("cotizador init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

/// Write the sample catalog and payload, keeping existing files unless forced
fn write_samples(project: &Project, ctx: &TemplateContext, force: bool) -> Result<()> {
    let generator = TemplateGenerator::new().map_err(|e| miette::miette!("{}", e))?;

    let catalog_path = project.root().join(&ctx.catalog);
    if force || !catalog_path.exists() {
        let catalog = generator
            .generate_catalog(ctx)
            .map_err(|e| miette::miette!("{}", e))?;
        std::fs::write(&catalog_path, catalog).into_diagnostic()?;
    }

    let payload_path = project.quotes_dir().join(SAMPLE_PAYLOAD);
    if force || !payload_path.exists() {
        let payload = generator
            .generate_payload(ctx)
            .map_err(|e| miette::miette!("{}", e))?;
        std::fs::write(&payload_path, payload).into_diagnostic()?;
    }

    Ok(())
}

fn print_structure(root: &Path, ctx: &TemplateContext) {
    let entries = [
        format!("{}/", PROJECT_DIR),
        format!("{}/config.yaml", PROJECT_DIR),
        ctx.catalog.clone(),
        format!("{}/", QUOTES_DIR),
        format!("{}/{}", QUOTES_DIR, SAMPLE_PAYLOAD),
    ];

    for entry in &entries {
        if root.join(entry).exists() {
            let prefix = if entry.ends_with('/') { "📁" } else { "📄" };
            println!("  {} {}", prefix, style(entry).dim());
        }
    }
}
