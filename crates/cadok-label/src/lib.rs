// crates/cadok-label/src/lib.rs
// ============================================================================
// Module: CADOK Label
// Description: Shipping label composition and rendering.
// Purpose: Produce printable labels that expose only apparent addresses.
// Dependencies: crate::{compose, document, pdf}
// ============================================================================

//! ## Overview
//! Label generation for anonymized deliveries: a layout document model, a
//! built-in minimal PDF renderer, and the composer that assembles the label
//! around a redirection code and an apparent address. Real destinations
//! never enter this crate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod compose;
pub mod document;
pub mod pdf;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use compose::ApparentAddress;
pub use compose::ComposedLabel;
pub use compose::LabelComposer;
pub use compose::LabelError;
pub use document::DocumentRenderer;
pub use document::ImageBlock;
pub use document::LabelBlock;
pub use document::LabelDocument;
pub use document::QrEncoder;
pub use document::QrError;
pub use document::QrImage;
pub use document::RenderError;
pub use document::TextBlock;
pub use pdf::MinimalPdfRenderer;
