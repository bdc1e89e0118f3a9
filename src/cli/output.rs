//! Rendering of pricing results
//!
//! `table` and `md` are for people; `json` and `yaml` carry the full
//! result; `csv` and `tsv` carry one record per material row.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_md, format_money, format_number, truncate_str};
use crate::cli::OutputFormat;
use crate::entities::result::{MaterialCostRow, PricingResult, QuoteStatus, RowStatus};

const FORMULA_WIDTH: usize = 28;

/// Flat record for delimited output
#[derive(Debug, Serialize)]
struct RowRecord<'a> {
    material: &'a str,
    nombre: &'a str,
    proveedor: &'a str,
    variante: &'a str,
    formula: &'a str,
    cantidad: String,
    factor: String,
    rendimiento: String,
    precio_efectivo: String,
    importe: String,
    impuesto: String,
    malla: bool,
    estado: String,
}

impl<'a> RowRecord<'a> {
    fn new(row: &'a MaterialCostRow, decimals: usize) -> Self {
        Self {
            material: &row.material_id,
            nombre: &row.name,
            proveedor: row.provider_id.as_deref().unwrap_or(""),
            variante: row.variant_id.as_deref().unwrap_or(""),
            formula: &row.formula,
            cantidad: format_number(row.raw_quantity, decimals.max(3)),
            factor: format_number(row.coverage_factor, decimals.max(3)),
            rendimiento: format_number(row.yield_quantity, decimals.max(3)),
            precio_efectivo: format_number(row.effective_price, decimals),
            importe: format_number(row.importe, decimals),
            impuesto: format_number(row.tax_amount, decimals),
            malla: row.malla,
            estado: row.estado.to_string(),
        }
    }
}

/// Render a result in the given format
///
/// `auto` must be resolved by the caller; it renders as a table here.
pub fn render_result(result: &PricingResult, format: OutputFormat, decimals: usize) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(result).into_diagnostic()?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Yaml => serde_yml::to_string(result).into_diagnostic(),
        OutputFormat::Csv => render_delimited(result, b',', decimals),
        OutputFormat::Tsv => render_delimited(result, b'\t', decimals),
        OutputFormat::Md => Ok(render_markdown(result, decimals)),
        OutputFormat::Table | OutputFormat::Auto => Ok(render_table(result, decimals)),
    }
}

fn render_delimited(result: &PricingResult, delimiter: u8, decimals: usize) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    for row in &result.materiales {
        writer.serialize(RowRecord::new(row, decimals)).into_diagnostic()?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| miette::miette!("failed to write rows: {}", e))?;
    String::from_utf8(bytes).into_diagnostic()
}

fn status_label(status: QuoteStatus) -> String {
    match status {
        QuoteStatus::Completa => style(status.to_string()).green().to_string(),
        QuoteStatus::Incompleta => style(status.to_string()).yellow().to_string(),
        QuoteStatus::Invalida => style(status.to_string()).red().bold().to_string(),
    }
}

fn row_label(status: RowStatus) -> String {
    match status {
        RowStatus::Ok => style(status.to_string()).green().to_string(),
        RowStatus::Unresolved | RowStatus::Substituted => {
            style(status.to_string()).yellow().to_string()
        }
        RowStatus::Failed => style(status.to_string()).red().to_string(),
    }
}

/// Label/value pairs of the cost summary, in display order
fn summary_lines(result: &PricingResult, decimals: usize) -> Vec<(&'static str, String)> {
    let c = &result.costos;
    let money = |v: f64| format_money(v, decimals);
    let mut lines = vec![
        ("Materiales", money(c.total_materiales)),
        ("Mano de obra fabricación", money(c.mano_obra_fabricacion)),
        ("Mano de obra instalación", money(c.mano_obra_instalacion)),
    ];
    if c.total_malla > 0.0 {
        lines.push(("Malla (materiales)", money(c.materiales_malla)));
        lines.push(("Malla (mano de obra)", money(c.mano_obra_malla)));
    }
    lines.push(("Subtotal", money(c.subtotal)));
    lines.push(("Ganancia", money(c.ganancia_neta)));
    lines.push(("Precio unitario", money(c.precio_unitario)));
    lines.push(("Total", money(c.total)));
    lines.push(("Impuestos (informativo)", money(c.total_impuestos)));
    lines
}

fn render_table(result: &PricingResult, decimals: usize) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {}  {}\n",
        style("Cotización").bold(),
        style(&result.producto_id).cyan(),
        result.producto
    ));
    out.push_str(&format!(
        "Cantidad: {}   Margen: {}%   Estado: {}\n\n",
        result.cantidad,
        format_number(result.margen_ganancia, decimals),
        status_label(result.estado)
    ));

    let mut builder = Builder::default();
    builder.push_record([
        "Material",
        "Proveedor",
        "Fórmula",
        "Cantidad",
        "Factor",
        "Rendimiento",
        "Precio",
        "Importe",
        "Estado",
    ]);
    for row in &result.materiales {
        builder.push_record([
            row.material_id.clone(),
            row.provider_id.clone().unwrap_or_else(|| "-".to_string()),
            truncate_str(&row.formula, FORMULA_WIDTH),
            format_number(row.raw_quantity, 3),
            format_number(row.coverage_factor, 3),
            format_number(row.yield_quantity, 3),
            format_money(row.effective_price, decimals),
            format_money(row.importe, decimals),
            row_label(row.estado),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    out.push_str(&table.to_string());
    out.push_str("\n\n");

    let mut builder = Builder::default();
    for (label, value) in summary_lines(result, decimals) {
        builder.push_record([label.to_string(), value]);
    }
    let mut totals = builder.build();
    totals.with(Style::blank());
    out.push_str(&totals.to_string());
    out.push('\n');

    if !result.avisos.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}\n", style("Avisos:").yellow().bold()));
        for warning in &result.avisos {
            out.push_str(&format!("  {} {}\n", style("!").yellow(), warning));
        }
    }

    out
}

fn render_markdown(result: &PricingResult, decimals: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "## Cotización {} {}\n\n",
        escape_md(&result.producto_id),
        escape_md(&result.producto)
    ));
    out.push_str(&format!(
        "Cantidad: {} | Margen: {}% | Estado: {}\n\n",
        result.cantidad,
        format_number(result.margen_ganancia, decimals),
        result.estado
    ));

    let mut builder = Builder::default();
    builder.push_record(["Material", "Proveedor", "Rendimiento", "Precio", "Importe", "Estado"]);
    for row in &result.materiales {
        builder.push_record([
            escape_md(&row.material_id),
            escape_md(row.provider_id.as_deref().unwrap_or("-")),
            format_number(row.yield_quantity, 3),
            format_money(row.effective_price, decimals),
            format_money(row.importe, decimals),
            row.estado.to_string(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::markdown());
    out.push_str(&table.to_string());
    out.push_str("\n\n");

    let mut builder = Builder::default();
    builder.push_record(["Concepto", "Importe"]);
    for (label, value) in summary_lines(result, decimals) {
        builder.push_record([label.to_string(), value]);
    }
    let mut totals = builder.build();
    totals.with(Style::markdown());
    out.push_str(&totals.to_string());
    out.push('\n');

    if !result.avisos.is_empty() {
        out.push_str("\n### Avisos\n\n");
        for warning in &result.avisos {
            out.push_str(&format!("- {}\n", escape_md(&warning.to_string())));
        }
    }

    out
}
