//! Entity type definitions
//!
//! **Setup data (from the catalog):**
//! - [`Catalog`] - products, materials with provider offers, labor rules, mesh
//! - [`LaborRule`] - per-area labor pricing with applicability filters
//! - [`MeshConfiguration`] - materials that roll up into the mesh line
//!
//! **Per quote:**
//! - [`QuotePayload`] - the caller's request as it arrives
//! - [`PricingRequest`] - resolved, immutable engine input
//! - [`PricingResult`] - itemized breakdown and totals

pub mod catalog;
pub mod dimensions;
pub mod labor;
pub mod material;
pub mod mesh;
pub mod payload;
pub mod request;
pub mod result;

pub use catalog::{Catalog, Material, Product, ProductMaterial};
pub use dimensions::Dimensions;
pub use labor::{Applicability, LaborRule, LaborType};
pub use material::{MaterialLine, ProviderOffer, Selection, VariantSurcharge};
pub use mesh::MeshConfiguration;
pub use payload::{QuotePayload, Selections};
pub use request::{FormulaErrorPolicy, PricingPolicy, PricingRequest, QuoteLine, UnresolvedPolicy};
pub use result::{
    Costs, LineOutcome, MaterialCostRow, MeshBreakdown, PricingResult, PricingWarning,
    QuoteStatus, RowStatus,
};
