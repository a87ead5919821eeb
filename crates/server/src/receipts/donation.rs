//! Single-donation tax receipt.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use rebuild_together_core::{DonationId, Money};

use super::PdfError;
use super::pdf::{Color, Layout, PAGE_WIDTH, TextStyle};
use crate::config::ReceiptConfig;

const MARGIN: f32 = 50.0;
const TOP: f32 = 742.0;
const BOTTOM: f32 = 50.0;

/// Everything printed on a donation receipt.
#[derive(Debug, Clone, Serialize)]
pub struct DonationReceipt {
    pub donation_id: DonationId,
    pub order_name: String,
    pub amount: Decimal,
    pub donor_email: String,
    pub donor_name: Option<String>,
    pub project_title: String,
    pub date: NaiveDate,
}

/// `RT-{year}-{first 8 of donation id, uppercased}`.
#[must_use]
pub fn receipt_number(donation_id: DonationId, issued_year: i32) -> String {
    format!("RT-{issued_year}-{}", donation_id.short_code().to_uppercase())
}

/// Long-form US date, e.g. `May 1, 2024`.
#[must_use]
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Render the receipt. Long field values wrap and the layout continues on
/// a new page when it reaches the bottom margin.
///
/// # Errors
///
/// Returns `PdfError` if the document cannot be encoded.
pub fn render(
    receipt: &DonationReceipt,
    org: &ReceiptConfig,
    issued_year: i32,
) -> Result<Vec<u8>, PdfError> {
    let number = receipt_number(receipt.donation_id, issued_year);
    let date = long_date(receipt.date);

    let title = TextStyle::bold(24.0);
    let subtitle = TextStyle::regular(12.0);
    let heading = TextStyle::bold(14.0);
    let field = TextStyle::regular(10.0);
    let fine_print = TextStyle::regular(9.0).with_color(Color::GREY);

    let mut page = Layout::new(MARGIN, TOP, BOTTOM);
    let width = PAGE_WIDTH - 100.0;

    page.text(&org.org_name, &title, 25.0);
    page.text("501(c)(3) Nonprofit Organization", &subtitle, 20.0);
    page.text("Tax-Deductible Donation Receipt", &subtitle, 20.0);
    page.rule(2.0);
    page.advance(40.0);

    let section = |page: &mut Layout, name: &str, fields: &[String]| {
        page.text(name, &heading, 20.0);
        for value in fields {
            page.paragraph(value, &field, width, 15.0);
        }
        page.advance(25.0);
    };

    section(
        &mut page,
        "Receipt Information",
        &[
            format!("Receipt Number: {number}"),
            format!("Date: {date}"),
            format!("Order ID: {}", receipt.order_name),
        ],
    );
    section(
        &mut page,
        "Donor Information",
        &[
            format!(
                "Name: {}",
                receipt
                    .donor_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or("Anonymous")
            ),
            format!("Email: {}", receipt.donor_email),
        ],
    );
    section(
        &mut page,
        "Donation Details",
        &[
            format!("Project: {}", receipt.project_title),
            format!("Donation Date: {date}"),
        ],
    );

    page.advance(10.0);
    let amount = format!("Donation Amount: {}", Money::usd(receipt.amount).display());
    page.boxed_center(&amount, &TextStyle::bold(20.0), 20.0, 40.0);
    page.advance(80.0);

    page.text(&format!("Tax ID: {}", org.tax_id), &TextStyle::bold(12.0), 30.0);

    let disclaimer = format!(
        "This is an official receipt for your tax-deductible donation to {}, a 501(c)(3) \
         nonprofit organization. No goods or services were provided in exchange for this \
         contribution. Please retain this receipt for your tax records.",
        org.org_name
    );
    page.paragraph(&disclaimer, &fine_print, width, 15.0);
    page.advance(5.0);
    page.text(
        &format!("For questions, contact: {}", org.contact_email),
        &fine_print,
        15.0,
    );

    page.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lopdf::Document;

    use super::*;

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    fn receipt() -> DonationReceipt {
        DonationReceipt {
            donation_id: "3fa85f64-5717-4562-b3fc-2c963f66afa6".parse().unwrap(),
            order_name: "#1001".to_string(),
            amount: Decimal::new(2500, 2),
            donor_email: "jane@example.org".to_string(),
            donor_name: Some("Jane Donor".to_string()),
            project_title: "Roof Repair Fund".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    #[test]
    fn test_receipt_number_format() {
        let id: DonationId = "3fa85f64-5717-4562-b3fc-2c963f66afa6".parse().unwrap();
        assert_eq!(receipt_number(id, 2024), "RT-2024-3FA85F64");
    }

    #[test]
    fn test_long_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(long_date(date), "May 1, 2024");
    }

    #[test]
    fn test_render_contains_inputs_verbatim() {
        let bytes = render(&receipt(), &ReceiptConfig::default(), 2024).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        assert!(contains(&bytes, "Name: Jane Donor"));
        assert!(contains(&bytes, "Project: Roof Repair Fund"));
        assert!(contains(&bytes, "Donation Amount: $25.00"));
        assert!(contains(&bytes, "Receipt Number: RT-2024-3FA85F64"));
        assert!(contains(&bytes, "Date: May 1, 2024"));
    }

    #[test]
    fn test_render_anonymous_donor() {
        let mut r = receipt();
        r.donor_name = Some("  ".to_string());
        let bytes = render(&r, &ReceiptConfig::default(), 2024).unwrap();
        assert!(contains(&bytes, "Name: Anonymous"));
    }

    #[test]
    fn test_long_input_paginates() {
        let mut r = receipt();
        r.project_title = "Porch and ramp accessibility rebuild ".repeat(120);
        let bytes = render(&r, &ReceiptConfig::default(), 2024).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
        assert!(contains(&bytes, "Donation Amount: $25.00"));
    }
}
