//! `cotizador quote` command - price a payload against a catalog

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{catalog_path, find_project};
use crate::cli::output::render_result;
use crate::cli::GlobalOpts;
use crate::core::loader::{load_catalog, load_payload};
use crate::core::Config;
use crate::entities::request::{FormulaErrorPolicy, PricingPolicy};
use crate::entities::result::RowStatus;
use crate::pricing::price_payload;

#[derive(clap::Args, Debug)]
pub struct QuoteArgs {
    /// Quote payload (JSON or YAML; "-" reads stdin)
    pub payload: PathBuf,

    /// Catalog file (default: `catalog` from the project config)
    #[arg(long, short = 'c')]
    pub catalog: Option<PathBuf>,

    /// Profit margin percent (overrides the payload)
    #[arg(long, short = 'm')]
    pub margin: Option<f64>,

    /// Number of identical units (overrides the payload)
    #[arg(long, short = 'n', allow_negative_numbers = true)]
    pub quantity: Option<i64>,

    /// Reject unresolved or missing provider selections
    #[arg(long)]
    pub strict: bool,

    /// Price failed formulas as zero instead of invalidating the quote
    #[arg(long, conflicts_with = "strict")]
    pub zero_failed: bool,

    /// Decimals shown in human-readable output
    #[arg(long)]
    pub decimals: Option<usize>,

    /// Write the output to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: QuoteArgs, global: &GlobalOpts) -> Result<()> {
    let project = find_project(global);
    let mut config = Config::load_with(project.as_ref());

    if args.strict {
        config.apply_policy(PricingPolicy::strict());
    }
    if args.zero_failed {
        config.formula_errors = Some(FormulaErrorPolicy::Zero);
    }
    if args.decimals.is_some() {
        config.decimals = args.decimals;
    }

    let catalog_file = catalog_path(args.catalog, &config, project.as_ref())?;
    let catalog = load_catalog(&catalog_file)?;
    let mut payload = load_payload(&args.payload)?;

    if let Some(margin) = args.margin {
        payload.margen_ganancia = Some(margin);
    }
    if let Some(quantity) = args.quantity {
        payload.cantidad = quantity;
    }

    let result = price_payload(&catalog, &payload, config.margin(), config.policy())?;

    let format = global.format.resolve(config.default_format.as_deref());
    let rendered = render_result(&result, format, config.decimals())?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &rendered).into_diagnostic()?;
            if !global.quiet {
                eprintln!(
                    "{} Wrote quote for {} to {}",
                    style("✓").green(),
                    style(&result.producto_id).cyan(),
                    style(path.display()).cyan()
                );
            }
        }
        None => print!("{}", rendered),
    }

    if !result.is_valid() {
        let failed: Vec<&str> = result
            .rows_with_status(RowStatus::Failed)
            .map(|row| row.material_id.as_str())
            .collect();
        return Err(miette::miette!(
            help = "Fix the formulas in the catalog, or pass --zero-failed to price them as 0",
            "quote is invalid: formula failed for {}",
            failed.join(", ")
        ));
    }

    Ok(())
}
