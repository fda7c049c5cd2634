//! Invoice document adapters.
//!
//! - `writer` - Minimal deterministic PDF object writer
//! - `invoice` - Invoice page layout on top of the writer
//! - `logo` - Logo asset sources

mod invoice;
mod logo;
mod writer;

pub use invoice::{IssuerDetails, PdfInvoiceRenderer};
pub use logo::{HttpLogoSource, StaticLogoSource};
