// crates/cadok-label/src/compose.rs
// ============================================================================
// Module: Label Composer
// Description: Assembles printable shipping labels around redirection codes.
// Purpose: Render labels that carry only the apparent address, never the
//          real destination.
// Dependencies: cadok-core, crate::document, serde_json
// ============================================================================

//! ## Overview
//! The composer builds the fixed label layout: branding header, sender block
//! (public display name and origin city only), recipient block showing the
//! apparent address with the redirection code as the attention line, a QR
//! payload, and numbered sender instructions.
//!
//! Security posture: this module never receives decrypted destinations. Its
//! inputs are the mapping (code), the sender's public profile, and the
//! apparent address; the confidentiality property of the whole subsystem
//! rests on that signature.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use cadok_core::MappingStatus;
use cadok_core::PublicAddress;
use cadok_core::RedirectionMapping;
use cadok_core::RelayPoint;
use cadok_core::TradeSummary;
use cadok_core::UserProfile;
use serde_json::json;
use thiserror::Error;

use crate::document::DocumentRenderer;
use crate::document::ImageBlock;
use crate::document::LabelBlock;
use crate::document::LabelDocument;
use crate::document::QrEncoder;
use crate::document::QrError;
use crate::document::RenderError;
use crate::document::TextBlock;

// ============================================================================
// SECTION: Apparent Address
// ============================================================================

/// The address actually printed on the label.
///
/// # Invariants
/// - Never a private residence: either the central redirection hub or a
///   relay point's public storefront address.
#[derive(Debug, Clone, PartialEq)]
pub enum ApparentAddress {
    /// Central redirection hub.
    CentralHub {
        /// Hub display name.
        name: String,
        /// Hub public address.
        address: PublicAddress,
    },
    /// Chosen relay point.
    Relay(RelayPoint),
}

impl ApparentAddress {
    /// Returns the display name printed above the address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::CentralHub {
                name, ..
            } => name,
            Self::Relay(point) => &point.name,
        }
    }

    /// Returns the public address to print verbatim.
    #[must_use]
    pub const fn address(&self) -> &PublicAddress {
        match self {
            Self::CentralHub {
                address, ..
            } => address,
            Self::Relay(point) => &point.address,
        }
    }
}

// ============================================================================
// SECTION: Errors and Output
// ============================================================================

/// Label composition errors.
///
/// # Invariants
/// - Composition either fully succeeds or fails with one actionable reason;
///   partially-valid labels are never returned.
#[derive(Debug, Error)]
pub enum LabelError {
    /// The mapping is not active.
    #[error("cannot compose a label for a {status} mapping")]
    InvalidState {
        /// Status that blocked composition.
        status: MappingStatus,
    },
    /// The mapping belongs to a different trade.
    #[error("mapping does not belong to the trade")]
    TradeMismatch,
    /// Rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// QR encoding failed.
    #[error(transparent)]
    Qr(#[from] QrError),
}

/// Composed label artifact.
///
/// # Invariants
/// - `bytes` contain the redirection code and the apparent address, and
///   never any part of the real destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedLabel {
    /// Rendered document bytes (PDF).
    pub bytes: Vec<u8>,
    /// Suggested filename.
    pub filename: String,
    /// JSON payload embedded in the QR code.
    pub qr_payload: String,
}

// ============================================================================
// SECTION: Layout Constants
// ============================================================================

/// Page width in points (A5 portrait).
const PAGE_WIDTH_PT: f64 = 420.0;
/// Page height in points (A5 portrait).
const PAGE_HEIGHT_PT: f64 = 595.0;
/// QR square side in points.
const QR_SIDE_PT: i64 = 110;

// ============================================================================
// SECTION: Composer
// ============================================================================

/// Shipping label composer.
pub struct LabelComposer {
    /// Document rendering backend.
    renderer: Arc<dyn DocumentRenderer>,
    /// Optional QR encoder; without one the payload renders as text.
    qr: Option<Arc<dyn QrEncoder>>,
    /// Base URL for tracking links; the code is appended as a path segment.
    tracking_base_url: String,
}

impl LabelComposer {
    /// Creates a composer over a renderer and optional QR encoder.
    #[must_use]
    pub fn new(
        renderer: Arc<dyn DocumentRenderer>,
        qr: Option<Arc<dyn QrEncoder>>,
        tracking_base_url: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            qr,
            tracking_base_url: tracking_base_url.into(),
        }
    }

    /// Composes a printable label for an active mapping.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::InvalidState`] when the mapping is not active,
    /// [`LabelError::TradeMismatch`] when the mapping serves another trade,
    /// and rendering/QR errors otherwise.
    pub fn compose(
        &self,
        trade: &TradeSummary,
        sender: &UserProfile,
        mapping: &RedirectionMapping,
        apparent: &ApparentAddress,
    ) -> Result<ComposedLabel, LabelError> {
        if mapping.status != MappingStatus::Active {
            return Err(LabelError::InvalidState {
                status: mapping.status,
            });
        }
        if mapping.trade_id != trade.id {
            return Err(LabelError::TradeMismatch);
        }

        let code = mapping.code.as_str();
        let tracking_url = format!("{}/{code}", self.tracking_base_url.trim_end_matches('/'));
        let qr_payload = json!({
            "type": "cadok_delivery",
            "trade_id": trade.id.as_str(),
            "redirection_code": code,
            "tracking_url": tracking_url,
        })
        .to_string();

        let mut blocks = vec![
            header_block(),
            sender_block(sender),
            recipient_block(code, apparent),
            instructions_block(code, &tracking_url),
        ];
        blocks.push(self.qr_block(&qr_payload)?);

        let document = LabelDocument {
            page_width_pt: PAGE_WIDTH_PT,
            page_height_pt: PAGE_HEIGHT_PT,
            blocks,
        };
        let bytes = self.renderer.render(&document)?;
        Ok(ComposedLabel {
            bytes,
            filename: format!("cadok-label-{code}.pdf"),
            qr_payload,
        })
    }

    /// Builds the QR block: an image when an encoder is wired, otherwise the
    /// payload as scannable text.
    fn qr_block(&self, payload: &str) -> Result<LabelBlock, LabelError> {
        match &self.qr {
            Some(encoder) => {
                let image = encoder.encode(payload)?;
                Ok(LabelBlock::Image(ImageBlock {
                    x_pt: 280,
                    y_pt: 330,
                    width_pt: QR_SIDE_PT,
                    height_pt: QR_SIDE_PT,
                    width_px: image.width_px,
                    height_px: image.height_px,
                    jpeg: image.jpeg,
                }))
            }
            None => Ok(LabelBlock::Text(TextBlock {
                x_pt: 280.0,
                y_pt: 430.0,
                font_size_pt: 6.0,
                leading_pt: 7.0,
                lines: vec!["Scan data:".to_string(), payload.to_string()],
            })),
        }
    }
}

// ============================================================================
// SECTION: Layout Blocks
// ============================================================================

/// Branding header block.
fn header_block() -> LabelBlock {
    LabelBlock::Text(TextBlock {
        x_pt: 30.0,
        y_pt: 560.0,
        font_size_pt: 20.0,
        leading_pt: 14.0,
        lines: vec![
            "CADOK".to_string(),
            "Anonymized delivery - ship exactly as printed".to_string(),
        ],
    })
}

/// Sender block: public display name and origin city only.
fn sender_block(sender: &UserProfile) -> LabelBlock {
    LabelBlock::Text(TextBlock {
        x_pt: 30.0,
        y_pt: 505.0,
        font_size_pt: 10.0,
        leading_pt: 12.0,
        lines: vec![
            "FROM".to_string(),
            sender.display_name.clone(),
            sender.city.clone(),
        ],
    })
}

/// Recipient block: apparent address verbatim, code as the attention line.
fn recipient_block(code: &str, apparent: &ApparentAddress) -> LabelBlock {
    let address = apparent.address();
    LabelBlock::Text(TextBlock {
        x_pt: 30.0,
        y_pt: 440.0,
        font_size_pt: 12.0,
        leading_pt: 15.0,
        lines: vec![
            "TO (redirection address)".to_string(),
            format!("ATTN: {code}"),
            apparent.display_name().to_string(),
            address.street.clone(),
            format!("{} {}", address.zip_code, address.city),
            address.country.clone(),
        ],
    })
}

/// Numbered sender instructions.
fn instructions_block(code: &str, tracking_url: &str) -> LabelBlock {
    LabelBlock::Text(TextBlock {
        x_pt: 30.0,
        y_pt: 250.0,
        font_size_pt: 9.0,
        leading_pt: 12.0,
        lines: vec![
            "Sender instructions".to_string(),
            "1. Stick this label flat on the parcel.".to_string(),
            "2. Ship to the printed redirection address, exactly as shown.".to_string(),
            "3. Do not alter the label or add any other address.".to_string(),
            format!("4. Keep code {code} with your proof of shipment."),
            format!("Tracking: {tracking_url}"),
        ],
    })
}
