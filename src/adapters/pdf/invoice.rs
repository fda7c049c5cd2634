//! Fixed-layout PDF invoice.
//!
//! Layout, top to bottom: issuer header (logo or name), status badge,
//! bill-to block, a single line-item table, subtotal/tax/total block,
//! payment instructions, footer.

use rust_decimal::Decimal;

use crate::domain::billing::format_money;
use crate::ports::{InvoiceDocument, InvoiceRenderer, LogoImage};

use super::writer::{single_page, Content, Font, JpegInfo, PageImage, Rgb, A4};

const MARGIN: f32 = 50.0;
const LOGO_BOX: (f32, f32) = (140.0, 56.0);

const GREEN: Rgb = Rgb(0.13, 0.55, 0.25);
const RED: Rgb = Rgb(0.80, 0.15, 0.15);
const ACCENT: Rgb = Rgb(0.10, 0.24, 0.45);

/// Issuer details printed on every invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuerDetails {
    pub company_name: String,
    pub company_email: String,
    pub company_address: String,
    /// Pay bill number shown in the payment instructions.
    pub paybill_shortcode: Option<String>,
}

/// Renders invoices as single-page A4 PDFs.
#[derive(Debug, Clone)]
pub struct PdfInvoiceRenderer {
    issuer: IssuerDetails,
}

impl PdfInvoiceRenderer {
    pub fn new(issuer: IssuerDetails) -> Self {
        Self { issuer }
    }
}

/// Badge colour for a status label.
pub fn badge_color(status: &str) -> Rgb {
    match status.trim().to_lowercase().as_str() {
        "paid" => GREEN,
        "pending" | "unpaid" => RED,
        _ => Rgb::gray(0.45),
    }
}

impl InvoiceRenderer for PdfInvoiceRenderer {
    fn render(&self, doc: &InvoiceDocument, logo: Option<&LogoImage>) -> Vec<u8> {
        let (page_w, page_h) = A4;
        let right = page_w - MARGIN;
        let mut c = Content::new();
        let amount = format_money(doc.amount, &doc.currency);
        let number = doc.invoice_number.as_str();

        // Header
        let image = logo.and_then(|logo| {
            JpegInfo::sniff(&logo.bytes).map(|info| PageImage {
                info,
                data: logo.bytes.as_slice(),
            })
        });
        let top = page_h - MARGIN;
        match &image {
            Some(img) => {
                let scale = (LOGO_BOX.0 / img.info.width as f32)
                    .min(LOGO_BOX.1 / img.info.height as f32);
                let (w, h) = (img.info.width as f32 * scale, img.info.height as f32 * scale);
                c.image(MARGIN, top - h, w, h);
            }
            None => {
                c.text(Font::Bold, 20.0, MARGIN, top - 22.0, ACCENT, &self.issuer.company_name);
            }
        }
        let mut y = top - LOGO_BOX.1 - 14.0;
        if image.is_some() {
            c.text(Font::Bold, 11.0, MARGIN, y, ACCENT, &self.issuer.company_name);
            y -= 14.0;
        }
        if !self.issuer.company_address.is_empty() {
            c.text(Font::Regular, 9.0, MARGIN, y, Rgb::gray(0.3), &self.issuer.company_address);
            y -= 12.0;
        }
        c.text(Font::Regular, 9.0, MARGIN, y, Rgb::gray(0.3), &self.issuer.company_email);

        c.text_right(Font::Bold, 26.0, right, top - 24.0, ACCENT, "INVOICE");
        c.text_right(Font::Regular, 10.0, right, top - 44.0, Rgb::BLACK, number);
        c.text_right(
            Font::Regular,
            10.0,
            right,
            top - 58.0,
            Rgb::BLACK,
            &format!("Date: {}", doc.date.format("%d %b %Y")),
        );

        // Status badge
        let label = doc.status.to_uppercase();
        let badge_w = Font::Bold.text_width(&label, 10.0) + 20.0;
        let badge_y = top - 86.0;
        c.fill_rect(right - badge_w, badge_y, badge_w, 20.0, badge_color(&doc.status));
        c.text(Font::Bold, 10.0, right - badge_w + 10.0, badge_y + 6.5, Rgb::WHITE, &label);

        // Bill to
        let mut y = page_h - 210.0;
        c.text(Font::Bold, 10.0, MARGIN, y, Rgb::gray(0.4), "BILL TO");
        y -= 16.0;
        c.text(Font::Bold, 12.0, MARGIN, y, Rgb::BLACK, &doc.recipient_name);
        y -= 14.0;
        c.text(Font::Regular, 10.0, MARGIN, y, Rgb::BLACK, &doc.recipient_email);

        // Line items: one row, quantity 1, no tax.
        let cycle_x = 215.0;
        let qty_right = 345.0;
        let unit_right = 445.0;
        let total_right = right - 8.0;
        y -= 40.0;
        c.fill_rect(MARGIN, y - 8.0, right - MARGIN, 24.0, Rgb::gray(0.92));
        c.text(Font::Bold, 10.0, MARGIN + 8.0, y, Rgb::BLACK, "Description");
        c.text(Font::Bold, 10.0, cycle_x, y, Rgb::BLACK, "Billing cycle");
        c.text_right(Font::Bold, 10.0, qty_right, y, Rgb::BLACK, "Qty");
        c.text_right(Font::Bold, 10.0, unit_right, y, Rgb::BLACK, "Unit price");
        c.text_right(Font::Bold, 10.0, total_right, y, Rgb::BLACK, "Line total");
        y -= 28.0;
        c.text(Font::Regular, 10.0, MARGIN + 8.0, y, Rgb::BLACK, &doc.plan_name);
        c.text(Font::Regular, 10.0, cycle_x, y, Rgb::BLACK, &doc.billing_cycle.label());
        c.text_right(Font::Regular, 10.0, qty_right, y, Rgb::BLACK, "1");
        c.text_right(Font::Regular, 10.0, unit_right, y, Rgb::BLACK, &amount);
        c.text_right(Font::Regular, 10.0, total_right, y, Rgb::BLACK, &amount);
        y -= 14.0;
        c.line(MARGIN, y, right, y, 0.5, Rgb::gray(0.8));

        // Totals
        let label_x = 360.0;
        let tax = format_money(Decimal::ZERO, &doc.currency);
        for (label, value) in [("Subtotal", amount.as_str()), ("Tax", tax.as_str())] {
            y -= 18.0;
            c.text(Font::Regular, 10.0, label_x, y, Rgb::gray(0.3), label);
            c.text_right(Font::Regular, 10.0, total_right, y, Rgb::BLACK, value);
        }
        y -= 8.0;
        c.line(label_x, y, right, y, 0.5, Rgb::gray(0.8));
        y -= 18.0;
        c.text(Font::Bold, 12.0, label_x, y, Rgb::BLACK, "Total");
        c.text_right(Font::Bold, 12.0, total_right, y, Rgb::BLACK, &amount);

        // Payment instructions
        y -= 60.0;
        c.text(Font::Bold, 11.0, MARGIN, y, ACCENT, "How to pay with M-Pesa");
        let steps = [
            "Go to M-Pesa > Lipa na M-Pesa > Pay Bill".to_string(),
            format!(
                "Business number: {}",
                self.issuer.paybill_shortcode.as_deref().unwrap_or("-")
            ),
            format!("Account number: {}", number),
            format!("Amount: {}", amount),
        ];
        for step in &steps {
            y -= 16.0;
            c.text(Font::Regular, 10.0, MARGIN, y, Rgb::BLACK, step);
        }

        // Footer
        c.line(MARGIN, 70.0, right, 70.0, 0.5, Rgb::gray(0.8));
        c.text(Font::Regular, 9.0, MARGIN, 54.0, Rgb::gray(0.4), "Thank you for your business.");
        c.text_right(
            Font::Regular,
            9.0,
            right,
            54.0,
            Rgb::gray(0.4),
            &format!("Questions? {}", self.issuer.company_email),
        );

        single_page(c, image)
    }
}
