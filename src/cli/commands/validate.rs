//! `cotizador validate` command - check a catalog and quote payloads

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{catalog_path, find_project};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader::{load_catalog, load_payload};
use crate::core::Config;
use crate::entities::catalog::Catalog;
use crate::entities::result::RowStatus;
use crate::pricing::price_payload;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Catalog file (default: `catalog` from the project config)
    pub catalog: Option<PathBuf>,

    /// Quote payloads to price against the catalog (repeatable)
    #[arg(long, short = 'p')]
    pub payload: Vec<PathBuf>,

    /// Show summary only, don't show individual problems
    #[arg(long)]
    pub summary: bool,
}

/// Outcome for one checked file
#[derive(Debug, Serialize)]
struct FileReport {
    archivo: String,
    problemas: Vec<String>,
    avisos: Vec<String>,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            archivo: path.display().to_string(),
            problemas: Vec::new(),
            avisos: Vec::new(),
        }
    }

    fn passed(&self) -> bool {
        self.problemas.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    valido: bool,
    archivos: Vec<FileReport>,
}

impl ValidationReport {
    fn problem_count(&self) -> usize {
        self.archivos.iter().map(|f| f.problemas.len()).sum()
    }
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let project = find_project(global);
    let config = Config::load_with(project.as_ref());
    let catalog_file = catalog_path(args.catalog, &config, project.as_ref())?;

    let mut files = Vec::new();
    let (catalog_report, catalog) = check_catalog(&catalog_file);
    files.push(catalog_report);

    // Payloads can only be priced against a catalog that loaded
    if let Some(ref catalog) = catalog {
        for path in &args.payload {
            files.push(check_payload(path, catalog, &config));
        }
    }

    let report = ValidationReport {
        valido: files.iter().all(FileReport::passed),
        archivos: files,
    };

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&report).into_diagnostic()?);
        }
        _ => print_report(&report, args.summary || global.quiet),
    }

    let problems = report.problem_count();
    match problems {
        0 => Ok(()),
        1 => Err(miette::miette!("Validation failed: 1 problem found")),
        n => Err(miette::miette!("Validation failed: {} problems found", n)),
    }
}

fn check_catalog(path: &Path) -> (FileReport, Option<Catalog>) {
    let mut report = FileReport::new(path);
    match load_catalog(path) {
        Ok(catalog) => {
            report.problemas = catalog.validate().iter().map(|e| e.to_string()).collect();
            tracing::debug!(
                products = catalog.products.len(),
                materials = catalog.materials.len(),
                problems = report.problemas.len(),
                "catalog checked"
            );
            (report, Some(catalog))
        }
        Err(e) => {
            report.problemas.push(e.to_string());
            (report, None)
        }
    }
}

fn check_payload(path: &Path, catalog: &Catalog, config: &Config) -> FileReport {
    let mut report = FileReport::new(path);
    let payload = match load_payload(path) {
        Ok(payload) => payload,
        Err(e) => {
            report.problemas.push(e.to_string());
            return report;
        }
    };

    match price_payload(catalog, &payload, config.margin(), config.policy()) {
        Ok(result) => {
            for row in result.rows_with_status(RowStatus::Failed) {
                report.problemas.push(format!(
                    "material '{}': {}",
                    row.material_id,
                    row.error.as_deref().unwrap_or("formula failed")
                ));
            }
            report.avisos = result.avisos.iter().map(|w| w.to_string()).collect();
        }
        Err(e) => report.problemas.push(e.to_string()),
    }
    report
}

fn print_report(report: &ValidationReport, summary: bool) {
    for file in &report.archivos {
        if file.passed() {
            println!("{} {}", style("✓").green(), file.archivo);
        } else {
            println!(
                "{} {} - {} problem(s)",
                style("✗").red(),
                file.archivo,
                file.problemas.len()
            );
        }
        if summary {
            continue;
        }
        for problem in &file.problemas {
            println!("    {}", style(problem).red());
        }
        for warning in &file.avisos {
            println!("    {}", style(warning).yellow());
        }
    }

    println!();
    let passed = report.archivos.iter().filter(|f| f.passed()).count();
    println!(
        "  Files checked: {}   passed: {}   failed: {}",
        style(report.archivos.len()).cyan(),
        style(passed).green(),
        style(report.archivos.len() - passed).red()
    );

    if report.valido {
        println!("{} All files passed validation!", style("✓").green().bold());
    }
}
