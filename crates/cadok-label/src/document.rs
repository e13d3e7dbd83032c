// crates/cadok-label/src/document.rs
// ============================================================================
// Module: Label Document Model
// Description: Layout instructions handed to a document renderer.
// Purpose: Decouple label composition from the rendering backend.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A [`LabelDocument`] is a fixed-layout list of positioned blocks. The
//! composer produces documents; a [`DocumentRenderer`] turns them into bytes.
//! The built-in renderer emits PDF, but the port exists so deployments can
//! swap in another backend without touching composition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Blocks
// ============================================================================

/// Positioned text block.
///
/// # Invariants
/// - Coordinates are points from the bottom-left page corner.
/// - `lines` render top-down starting at `y_pt`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Left edge in points.
    pub x_pt: f64,
    /// Baseline of the first line in points.
    pub y_pt: f64,
    /// Font size in points.
    pub font_size_pt: f64,
    /// Line spacing in points.
    pub leading_pt: f64,
    /// Text lines, top-down.
    pub lines: Vec<String>,
}

/// Positioned raster image block (JPEG payload).
///
/// # Invariants
/// - `jpeg` holds a complete baseline JPEG stream; the renderer embeds it
///   verbatim and never re-encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    /// Left edge in points.
    pub x_pt: i64,
    /// Bottom edge in points.
    pub y_pt: i64,
    /// Rendered width in points.
    pub width_pt: i64,
    /// Rendered height in points.
    pub height_pt: i64,
    /// Pixel width of the JPEG.
    pub width_px: u32,
    /// Pixel height of the JPEG.
    pub height_px: u32,
    /// JPEG bytes.
    pub jpeg: Vec<u8>,
}

/// One layout instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelBlock {
    /// Positioned text.
    Text(TextBlock),
    /// Positioned JPEG image.
    Image(ImageBlock),
}

/// Fixed-layout document handed to the renderer.
///
/// # Invariants
/// - Page dimensions are points; blocks outside the page are clipped by the
///   viewer, not validated here.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDocument {
    /// Page width in points.
    pub page_width_pt: f64,
    /// Page height in points.
    pub page_height_pt: f64,
    /// Layout blocks in paint order.
    pub blocks: Vec<LabelBlock>,
}

// ============================================================================
// SECTION: Renderer Port
// ============================================================================

/// Document rendering errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer rejected the document.
    #[error("document rendering failed: {0}")]
    Backend(String),
}

/// Renders layout instructions into a byte blob.
pub trait DocumentRenderer: Send + Sync {
    /// Renders the document.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when rendering fails.
    fn render(&self, document: &LabelDocument) -> Result<Vec<u8>, RenderError>;
}

// ============================================================================
// SECTION: QR Encoder Port
// ============================================================================

/// QR encoding errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum QrError {
    /// The encoder rejected the payload.
    #[error("qr encoding failed: {0}")]
    Encoder(String),
}

/// Encoded QR image returned by an external encoder.
///
/// # Invariants
/// - `jpeg` holds a complete baseline JPEG stream with the given pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    /// JPEG bytes.
    pub jpeg: Vec<u8>,
    /// Pixel width.
    pub width_px: u32,
    /// Pixel height.
    pub height_px: u32,
}

/// External QR encoder collaborator.
pub trait QrEncoder: Send + Sync {
    /// Encodes a payload string into a QR image.
    ///
    /// # Errors
    ///
    /// Returns [`QrError`] when encoding fails.
    fn encode(&self, payload: &str) -> Result<QrImage, QrError>;
}
