//! Text and JSON rendering for command output.

use crate::approval::SyncReport;
use crate::error::{QuoteError, Result};
use crate::quote::{QuoteRecord, Totals};
use crate::store::SearchPage;
use serde::Serialize;
use std::fmt::Write;

const RULE: &str =
    "================================================================================";

/// A quote together with its derived totals, for JSON output.
#[derive(Debug, Serialize)]
pub struct QuoteView<'a> {
    #[serde(flatten)]
    pub quote: &'a QuoteRecord,
    pub totals: &'a Totals,
}

impl<'a> From<&'a QuoteRecord> for QuoteView<'a> {
    fn from(quote: &'a QuoteRecord) -> Self {
        Self {
            quote,
            totals: &quote.totals,
        }
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| QuoteError::UserError(format!("failed to serialize output: {}", e)))
}

/// Full quote: header, metadata, lines and totals.
pub fn render_quote(quote: &QuoteRecord) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{} [{}]", quote.number, quote.stage);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out);

    let _ = writeln!(out, "Customer:   {}", quote.customer_id);
    if !quote.approval_status.is_empty() {
        let _ = writeln!(out, "Approval:   {}", quote.approval_status);
    }
    if let Some(name) = &quote.employee_name {
        let _ = writeln!(out, "Submitted by: {}", name);
    }
    let _ = writeln!(out, "Created:    {}", quote.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    for (label, ts) in [
        ("Modified:  ", quote.modified_at),
        ("Submitted: ", quote.submitted_at),
        ("Confirmed: ", quote.confirmed_at),
        ("Rejected:  ", quote.rejected_at),
    ] {
        if let Some(ts) = ts {
            let _ = writeln!(out, "{} {}", label, ts.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }
    if let Some(tag) = &quote.tag {
        let _ = writeln!(out, "Tag:        {}", tag);
    }
    if let Some(comment) = &quote.comment {
        let _ = writeln!(out, "Comment:    {}", comment);
    }
    for (label, address) in [
        ("Billing: ", &quote.billing_address),
        ("Shipping:", &quote.shipping_address),
    ] {
        if let Some(a) = address {
            let _ = writeln!(
                out,
                "{}   {}, {}, {} {}, {}",
                label, a.name, a.line1, a.postal_code, a.city, a.country_code
            );
        }
    }

    let _ = writeln!(out);
    if quote.items.is_empty() {
        let _ = writeln!(out, "No items.");
    } else {
        let _ = writeln!(out, "Items ({}):", quote.items.len());
        for item in &quote.items {
            let _ = writeln!(
                out,
                "  {:<14} {:<10} {:<20} {:>4} x {:>10}",
                item.id, item.product_id, item.name, item.quantity, item.sale_price
            );
        }
    }

    let _ = writeln!(out);
    out.push_str(&render_totals(&quote.totals));
    out
}

pub fn render_totals(totals: &Totals) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Totals ({}):", totals.currency);
    let _ = writeln!(out, "  Subtotal:  {:>12}", totals.sub_total);
    let _ = writeln!(out, "  Discount:  {:>12}", totals.discount_total);
    let _ = writeln!(out, "  Tax:       {:>12}", totals.tax_total);
    let _ = writeln!(out, "  Total:     {:>12}", totals.grand_total);
    out
}

/// One line per quote, plus a paging footer.
pub fn render_search(page: &SearchPage<QuoteRecord>, page_number: usize) -> String {
    let mut out = String::new();
    if page.results.is_empty() {
        let _ = writeln!(out, "No quotes found.");
        return out;
    }

    for quote in &page.results {
        let _ = writeln!(
            out,
            "{:<10} {:<10} {:>3} items {:>12} {}  {}",
            quote.number,
            quote.stage,
            quote.items.len(),
            quote.totals.grand_total,
            quote.currency,
            quote.created_at.format("%Y-%m-%d"),
        );
    }
    let _ = writeln!(
        out,
        "\nShowing {} of {} (page {})",
        page.results.len(),
        page.total_count,
        page_number
    );
    out
}

pub fn render_sync_report(report: &SyncReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Synced {} quote(s): {} updated, {} unchanged, {} failed",
        report.processed(),
        report.updated.len(),
        report.unchanged.len(),
        report.failures.len()
    );
    for change in &report.updated {
        let from = if change.from.is_empty() {
            "(none)"
        } else {
            change.from.as_str()
        };
        let _ = writeln!(out, "  {}: {} -> {}", change.number, from, change.to);
    }
    for failure in &report.failures {
        let _ = writeln!(out, "  {}: FAILED ({})", failure.number, failure.error);
    }
    out
}
