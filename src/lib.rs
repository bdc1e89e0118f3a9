//! Cotizador: quotation pricing for window and door fabrication
//!
//! Given a product's dimensions, material/provider/variant selections and
//! labor rules, the engine computes an itemized cost breakdown and the
//! quoted price. Material quantities come from per-product formulas over
//! the opening's measurements.
//!
//! ```
//! use cotizador::entities::{Dimensions, MaterialLine, PricingRequest, ProviderOffer, Selection};
//! use cotizador::pricing::price_quote;
//!
//! let mut request = PricingRequest::new("VF", Dimensions::new(1.0, 2.0).unwrap());
//! request.add_line(
//!     MaterialLine::new("VIDRIO", "area", 1.0),
//!     Selection::resolved(ProviderOffer::new("VITRO", 400.0)),
//! );
//! request.margin_percent = 25.0;
//!
//! let result = price_quote(&request).unwrap();
//! assert!((result.costos.total - 1000.0).abs() < 1e-9);
//! ```

pub mod cli;
pub mod core;
pub mod entities;
pub mod pricing;
pub mod schema;
pub mod yaml;

/// Install the tracing subscriber (stderr, `COTIZADOR_LOG` filter)
///
/// `verbose` raises the default level from `warn` to `debug`; an explicit
/// `COTIZADOR_LOG` always wins.
pub fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_level = match (verbose, quiet) {
        (true, _) => "debug",
        (false, true) => "error",
        (false, false) => "warn",
    };

    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("COTIZADOR_LOG")
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init();
}
