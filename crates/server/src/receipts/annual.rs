//! Annual donation summary, one per donor per year.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use rebuild_together_core::{DonorId, Money};

use super::PdfError;
use super::pdf::{Layout, TextStyle};
use crate::config::ReceiptConfig;
use crate::models::AnnualDonationLine;

const MARGIN: f32 = 60.0;
const TOP: f32 = 740.0;
const BOTTOM: f32 = 120.0;

/// One line of the donation table.
#[derive(Debug, Clone)]
pub struct SummaryLine {
    pub date: DateTime<Utc>,
    pub project_title: String,
    pub amount: Decimal,
}

/// A donor's donations for one year.
#[derive(Debug, Clone)]
pub struct AnnualSummary {
    pub donor_id: DonorId,
    pub donor_name: String,
    pub donor_email: String,
    pub year: i32,
    pub total: Decimal,
    pub lines: Vec<SummaryLine>,
}

/// `AN-{year}-{first 8 of donor id}`.
#[must_use]
pub fn receipt_number(year: i32, donor_id: DonorId) -> String {
    format!("AN-{year}-{}", donor_id.short_code())
}

/// Group donation lines by donor, preserving first-seen order.
///
/// The display name is the profile's full name, else its email, else
/// `"Donor"`.
#[must_use]
pub fn group_by_donor(year: i32, lines: Vec<AnnualDonationLine>) -> Vec<AnnualSummary> {
    let mut summaries: Vec<AnnualSummary> = Vec::new();

    for line in lines {
        let index = if let Some(i) = summaries.iter().position(|s| s.donor_id == line.donor_id) {
            i
        } else {
            let email = line.donor_email.clone().unwrap_or_default();
            let name = line
                .donor_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .or_else(|| line.donor_email.clone().filter(|e| !e.is_empty()))
                .unwrap_or_else(|| "Donor".to_string());
            summaries.push(AnnualSummary {
                donor_id: line.donor_id,
                donor_name: name,
                donor_email: email,
                year,
                total: Decimal::ZERO,
                lines: Vec::new(),
            });
            summaries.len() - 1
        };

        if let Some(summary) = summaries.get_mut(index) {
            summary.total += line.amount;
            summary.lines.push(SummaryLine {
                date: line.created_at,
                project_title: line.project_title.unwrap_or_else(|| "Project".to_string()),
                amount: line.amount,
            });
        }
    }

    summaries
}

/// Render the summary. When the cursor drops below the bottom margin the
/// page gets a "Continued on next page..." footer and the table continues.
///
/// # Errors
///
/// Returns `PdfError` if the document cannot be encoded.
pub fn render(summary: &AnnualSummary, org: &ReceiptConfig) -> Result<Vec<u8>, PdfError> {
    let body = TextStyle::regular(12.0);
    let heading = TextStyle::bold(14.0);
    let row = TextStyle::regular(10.0);

    let mut page = Layout::new(MARGIN, TOP, BOTTOM).with_continuation("Continued on next page...");

    page.text(&org.org_name, &TextStyle::bold(24.0), 30.0);
    page.text("Annual Donation Summary", &TextStyle::bold(16.0), 24.0);
    page.text(&format!("Tax ID: {}", org.tax_id), &body, 20.0);
    page.text(&format!("Year: {}", summary.year), &body, 20.0);

    page.advance(10.0);
    page.rule(1.5);
    page.advance(30.0);

    page.text("Donor Information", &heading, 24.0);
    page.text(&format!("Name: {}", summary.donor_name), &body, 20.0);
    page.text(&format!("Email: {}", summary.donor_email), &body, 20.0);
    page.text(
        &format!("Total Donations: {}", Money::usd(summary.total).display()),
        &body,
        30.0,
    );

    page.text("Donation Details", &heading, 24.0);
    for line in &summary.lines {
        page.text(
            &format!(
                "{}  |  {}  |  {}",
                line.date.format("%-m/%-d/%Y"),
                line.project_title,
                Money::usd(line.amount).display()
            ),
            &row,
            20.0,
        );
    }

    page.advance(20.0);
    page.text(
        "This is an official summary of charitable contributions for the stated year. \
         Please retain for tax records.",
        &TextStyle::regular(10.0),
        20.0,
    );

    page.finish()
}
