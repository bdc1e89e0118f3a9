//! `cotizador eval` command - evaluate a quantity formula

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::cli::helpers::{format_number, parse_key_val};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::formula::Formula;
use crate::entities::dimensions::Dimensions;
use crate::entities::request::PricingRequest;

#[derive(clap::Args, Debug)]
pub struct EvalArgs {
    /// Formula to evaluate, e.g. "perimetro * 2 + hojas"
    pub formula: String,

    /// Width in meters
    #[arg(long, default_value_t = 1.0)]
    pub ancho: f64,

    /// Height in meters
    #[arg(long, default_value_t = 1.0)]
    pub alto: f64,

    /// Evaluate with a mesh (malla = 1)
    #[arg(long)]
    pub malla: bool,

    /// Horizontal splits
    #[arg(long, default_value_t = 0)]
    pub divisiones_horizontales: u32,

    /// Vertical splits (hojas = splits + 1)
    #[arg(long, default_value_t = 0)]
    pub divisiones_verticales: u32,

    /// Decorative muntins
    #[arg(long, default_value_t = 0)]
    pub divisiones_decorativas: u32,

    /// Extra variable (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub vars: Vec<(String, f64)>,
}

#[derive(Serialize)]
struct EvalOutput<'a> {
    formula: &'a str,
    resultado: f64,
    variables: BTreeMap<String, f64>,
}

pub fn run(args: EvalArgs, global: &GlobalOpts) -> Result<()> {
    let mut dimensions = Dimensions::new(args.ancho, args.alto)?;
    dimensions.divisiones_horizontales = args.divisiones_horizontales;
    dimensions.divisiones_verticales = args.divisiones_verticales;
    dimensions.divisiones_decorativas = args.divisiones_decorativas;

    let mut request = PricingRequest::new("eval", dimensions);
    request.with_mesh = args.malla;
    request.variables = args.vars.into_iter().collect();
    let env = request.environment()?;

    let formula = Formula::parse(&args.formula)?;
    let value = formula.evaluate(&env)?;
    tracing::debug!(formula = formula.source(), value, "formula evaluated");

    // Only the variables the formula references
    let used: BTreeMap<String, f64> = formula
        .variables()
        .into_iter()
        .filter_map(|name| env.get(&name).map(|v| (name, *v)))
        .collect();

    let output = EvalOutput {
        formula: formula.source(),
        resultado: value,
        variables: used,
    };

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&output).into_diagnostic()?);
        }
        _ => {
            if global.verbose {
                for (name, v) in &output.variables {
                    eprintln!("{} = {}", name, v);
                }
            }
            println!("{}", format_plain(value));
        }
    }

    Ok(())
}

/// Shortest exact-looking rendering: `3`, `2.5`, `0.333333`
fn format_plain(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let fixed = format_number(value, 6);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
