//! Commission invoice template, v1.
//!
//! Parses the text of an aggregator commission invoice (one PDF per
//! invoice). Header fields come from a fixed set of labeled patterns;
//! line items from one composite pattern describing the tabular layout.
//! The codes and rates the layout hardwires — HSN/SAC, unit token,
//! quantity, GST numbers, CGST/SGST rates, the always-zero discount, IGST
//! and cess columns — live in [`InvoiceSchema`], so a format change is a
//! schema change.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;

use payhub_io::Cell;

use super::fiscal_year_label;

/// Constants the v1 invoice layout hardwires.
#[derive(Debug, Clone)]
pub struct InvoiceSchema {
    /// GSTIN of the restaurant partner being billed.
    pub restaurant_gstin: &'static str,
    /// GSTIN of the aggregator issuing the invoice.
    pub aggregator_gstin: &'static str,
    /// HSN/SAC tax classification on every line item.
    pub hsn_sac: &'static str,
    /// Unit-of-measure token on every line item.
    pub unit_of_measure: &'static str,
    /// Quantity on every line item.
    pub quantity: &'static str,
    /// Discount column, always zero on these invoices.
    pub discount: &'static str,
    pub cgst_rate: &'static str,
    pub sgst_rate: &'static str,
    /// No interstate supply on these invoices.
    pub igst_rate: &'static str,
    pub igst_amount: &'static str,
    /// No compensation or state cess either.
    pub comp_cess_rate: &'static str,
    pub comp_cess_amount: &'static str,
    pub state_cess_rate: &'static str,
    pub state_cess_amount: &'static str,
}

pub const DEFAULT_SCHEMA: InvoiceSchema = InvoiceSchema {
    restaurant_gstin: "29ABNFM9601R1Z9",
    aggregator_gstin: "29AAFCB7707D1ZQ",
    hsn_sac: "996211",
    unit_of_measure: "OTH",
    quantity: "1",
    discount: "0",
    cgst_rate: "9",
    sgst_rate: "9",
    igst_rate: "0",
    igst_amount: "0",
    comp_cess_rate: "0",
    comp_cess_amount: "0",
    state_cess_rate: "0",
    state_cess_amount: "0",
};

/// Column order of the Commission Invoice tab. Header fields repeat across
/// all of an invoice's line-item rows.
pub fn invoice_headers() -> Vec<&'static str> {
    vec![
        "Payout Period",
        "File Name",
        "FY Year",
        "Year",
        "Month",
        "IRN",
        "Restaurant GSTIN",
        "Aggregator GSTIN",
        "PAN",
        "Invoice Date",
        "Invoice Number",
        "Original Invoice Number",
        "Invoice Type",
        "Brand ID",
        "Other Charges - Reimbursement of Discount",
        "Grand Total",
        "SR.No",
        "Description",
        "HSN",
        "Unit of Measure",
        "Quantity",
        "Unit Price",
        "Base Amount",
        "Discount",
        "Assessable Value",
        "CGST Rate",
        "CGST Amount",
        "SGST Rate",
        "SGST Amount",
        "IGST Rate",
        "IGST Amount",
        "Comp Cess Rate",
        "Comp Cess Amount",
        "State Cess Rate",
        "State Cess Amount",
        "Total Amount",
    ]
}

/// One output row: invoice header fields plus one line item's values.
/// Unmatched header fields default to empty strings, never failures —
/// the invoice date is the one exception (see [`parse`]).
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceRecord {
    pub payout_period: String,
    pub file_name: String,
    pub fy_year: String,
    pub year: i32,
    pub month: String,
    pub irn: String,
    pub restaurant_gstin: String,
    pub aggregator_gstin: String,
    pub pan: String,
    pub invoice_date: String,
    pub invoice_number: String,
    pub original_invoice_number: String,
    pub invoice_type: String,
    pub brand_id: String,
    pub other_charges_reimbursement_of_discount: String,
    pub grand_total: String,
    pub sr_no: String,
    pub description: String,
    pub hsn: String,
    pub unit_of_measure: String,
    pub quantity: String,
    pub unit_price: String,
    pub base_amount: String,
    pub discount: String,
    pub assessable_value: String,
    pub cgst_rate: String,
    pub cgst_amount: String,
    pub sgst_rate: String,
    pub sgst_amount: String,
    pub igst_rate: String,
    pub igst_amount: String,
    pub comp_cess_rate: String,
    pub comp_cess_amount: String,
    pub state_cess_rate: String,
    pub state_cess_amount: String,
    pub total_amount: String,
}

impl InvoiceRecord {
    /// Cells in [`invoice_headers`] order. Empty strings become empty cells.
    pub fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.payout_period.clone()),
            Cell::from(self.file_name.clone()),
            Cell::from(self.fy_year.clone()),
            Cell::Number(self.year as f64),
            Cell::from(self.month.clone()),
            Cell::from(self.irn.clone()),
            Cell::from(self.restaurant_gstin.clone()),
            Cell::from(self.aggregator_gstin.clone()),
            Cell::from(self.pan.clone()),
            Cell::from(self.invoice_date.clone()),
            Cell::from(self.invoice_number.clone()),
            Cell::from(self.original_invoice_number.clone()),
            Cell::from(self.invoice_type.clone()),
            Cell::from(self.brand_id.clone()),
            Cell::from(self.other_charges_reimbursement_of_discount.clone()),
            Cell::from(self.grand_total.clone()),
            Cell::from(self.sr_no.clone()),
            Cell::from(self.description.clone()),
            Cell::from(self.hsn.clone()),
            Cell::from(self.unit_of_measure.clone()),
            Cell::from(self.quantity.clone()),
            Cell::from(self.unit_price.clone()),
            Cell::from(self.base_amount.clone()),
            Cell::from(self.discount.clone()),
            Cell::from(self.assessable_value.clone()),
            Cell::from(self.cgst_rate.clone()),
            Cell::from(self.cgst_amount.clone()),
            Cell::from(self.sgst_rate.clone()),
            Cell::from(self.sgst_amount.clone()),
            Cell::from(self.igst_rate.clone()),
            Cell::from(self.igst_amount.clone()),
            Cell::from(self.comp_cess_rate.clone()),
            Cell::from(self.comp_cess_amount.clone()),
            Cell::from(self.state_cess_rate.clone()),
            Cell::from(self.state_cess_amount.clone()),
            Cell::from(self.total_amount.clone()),
        ]
    }
}

/// First capture group of `pattern` in `text`, trimmed; empty on no match.
fn extract_value(pattern: &str, text: &str) -> String {
    Regex::new(pattern)
        .unwrap()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Parse one invoice document's text into line-item rows.
///
/// The invoice date must parse strictly as `YYYY-MM-DD` (only the token
/// before the first whitespace is considered); anything else fails the
/// whole document. Zero line-item matches yields zero rows without error.
pub fn parse(
    text: &str,
    file_name: &str,
    schema: &InvoiceSchema,
) -> Result<Vec<InvoiceRecord>, String> {
    let invoice_date_raw = extract_value(r"Invoice Date\s*:\s*(.+)", text);
    let date_token = invoice_date_raw
        .split_whitespace()
        .next()
        .ok_or("no Invoice Date found")?;
    let invoice_date = NaiveDate::parse_from_str(date_token, "%Y-%m-%d")
        .map_err(|_| format!("invalid invoice date '{}' (expected YYYY-MM-DD)", date_token))?;

    let year = invoice_date.year();
    let month = format!("{:02}", invoice_date.month());
    let fy_year = fiscal_year_label(invoice_date);

    let payout_period = extract_value(r"Service Period\s*:\s*(.+)", text);
    let irn = extract_value(r"IRN\s*:\s*(\w+)", text);
    let restaurant_gstin =
        extract_value(&format!(r"GSTIN\s*:\s*({})", schema.restaurant_gstin), text);
    let aggregator_gstin =
        extract_value(&format!(r"GSTIN\s*:\s*({})", schema.aggregator_gstin), text);
    let pan = extract_value(r"PAN\s*:\s*([A-Z0-9]+)", text);
    let invoice_number = extract_value(r"Invoice Number\s*:\s*(\w+)", text);
    let original_invoice_number = extract_value(r"Original Invoice\s*No:\s*(.*)", text);
    let invoice_type = extract_value(r"Invoice Type\s*:\s*(\w+)", text);
    let brand_id = extract_value(r"Restaurant / Store ID\s*:\s*(\d+)", text);
    let other_charges = extract_value(
        r"Other Charges - Reimbursement\s*of Discount\s*([\d.,]+)",
        text,
    );
    let grand_total = extract_value(r"Grand Total\s*([\d.,]+)", text);

    // Tabular line-item layout: serial at line start, description, then the
    // schema's fixed tokens interleaved with the numeric columns, trailing
    // total last. Anchored per line so stray numbers in the header region
    // can never start a match.
    let line_re = Regex::new(&format!(
        r"(?m)^\s*(\d+)\s+([^\n]+?)\s+{hsn}\s+{uom}\s+{qty}\s+([\d.,]+)\s+([\d.,]+)\s+{discount}\s+([\d.,]+)\s+{cgst}\s+([\d.,]+)\s+{sgst}\s+([\d.,]+).*?([\d.,]+)",
        hsn = schema.hsn_sac,
        uom = schema.unit_of_measure,
        qty = schema.quantity,
        discount = schema.discount,
        cgst = schema.cgst_rate,
        sgst = schema.sgst_rate,
    ))
    .unwrap();

    let mut rows = Vec::new();
    for caps in line_re.captures_iter(text) {
        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default();
        rows.push(InvoiceRecord {
            payout_period: payout_period.clone(),
            file_name: file_name.to_string(),
            fy_year: fy_year.clone(),
            year,
            month: month.clone(),
            irn: irn.clone(),
            restaurant_gstin: restaurant_gstin.clone(),
            aggregator_gstin: aggregator_gstin.clone(),
            pan: pan.clone(),
            invoice_date: invoice_date_raw.clone(),
            invoice_number: invoice_number.clone(),
            original_invoice_number: original_invoice_number.clone(),
            invoice_type: invoice_type.clone(),
            brand_id: brand_id.clone(),
            other_charges_reimbursement_of_discount: other_charges.clone(),
            grand_total: grand_total.clone(),
            sr_no: group(1),
            description: group(2),
            hsn: schema.hsn_sac.to_string(),
            unit_of_measure: schema.unit_of_measure.to_string(),
            quantity: schema.quantity.to_string(),
            unit_price: group(3),
            base_amount: group(4),
            discount: schema.discount.to_string(),
            assessable_value: group(5),
            cgst_rate: schema.cgst_rate.to_string(),
            cgst_amount: group(6),
            sgst_rate: schema.sgst_rate.to_string(),
            sgst_amount: group(7),
            igst_rate: schema.igst_rate.to_string(),
            igst_amount: schema.igst_amount.to_string(),
            comp_cess_rate: schema.comp_cess_rate.to_string(),
            comp_cess_amount: schema.comp_cess_amount.to_string(),
            state_cess_rate: schema.state_cess_rate.to_string(),
            state_cess_amount: schema.state_cess_amount.to_string(),
            total_amount: group(8),
        });
    }

    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // Realistic pdftotext output for a two-line commission invoice.
    pub(crate) fn sample_text() -> String {
        [
            "TAX INVOICE",
            "IRN : a1b2c3d4e5f67890a1b2c3d4e5f67890",
            "Invoice Number : CM2425IN0012345",
            "Original Invoice No: CM2425IN0012001",
            "Invoice Type : REGULAR",
            "Invoice Date : 2024-05-12 00:00:00",
            "Service Period : Apr 2024",
            "GSTIN : 29ABNFM9601R1Z9",
            "PAN : ABNFM9601R",
            "GSTIN : 29AAFCB7707D1ZQ",
            "Restaurant / Store ID : 412392",
            "",
            "1 Commission on order value 996211 OTH 1 1200.00 1200.00 0 1200.00 9 108.00 9 108.00 1416.00",
            "2 Collection charges 996211 OTH 1 250.50 250.50 0 250.50 9 22.55 9 22.55 295.60",
            "",
            "Other Charges - Reimbursement of Discount 150.00",
            "Grand Total 1861.60",
        ]
        .join("\n")
    }

    #[test]
    fn test_parse_header_fields() {
        let rows = parse(&sample_text(), "inv_1.pdf", &DEFAULT_SCHEMA).unwrap();
        assert_eq!(rows.len(), 2);

        let row = &rows[0];
        assert_eq!(row.file_name, "inv_1.pdf");
        assert_eq!(row.payout_period, "Apr 2024");
        assert_eq!(row.irn, "a1b2c3d4e5f67890a1b2c3d4e5f67890");
        assert_eq!(row.restaurant_gstin, "29ABNFM9601R1Z9");
        assert_eq!(row.aggregator_gstin, "29AAFCB7707D1ZQ");
        assert_eq!(row.pan, "ABNFM9601R");
        assert_eq!(row.invoice_date, "2024-05-12 00:00:00");
        assert_eq!(row.invoice_number, "CM2425IN0012345");
        assert_eq!(row.original_invoice_number, "CM2425IN0012001");
        assert_eq!(row.invoice_type, "REGULAR");
        assert_eq!(row.brand_id, "412392");
        assert_eq!(row.other_charges_reimbursement_of_discount, "150.00");
        assert_eq!(row.grand_total, "1861.60");
    }

    #[test]
    fn test_parse_fiscal_fields() {
        let rows = parse(&sample_text(), "inv_1.pdf", &DEFAULT_SCHEMA).unwrap();
        assert_eq!(rows[0].fy_year, "2024-25");
        assert_eq!(rows[0].year, 2024);
        assert_eq!(rows[0].month, "05");
    }

    #[test]
    fn test_parse_line_items() {
        let rows = parse(&sample_text(), "inv_1.pdf", &DEFAULT_SCHEMA).unwrap();

        assert_eq!(rows[0].sr_no, "1");
        assert_eq!(rows[0].description, "Commission on order value");
        assert_eq!(rows[0].unit_price, "1200.00");
        assert_eq!(rows[0].base_amount, "1200.00");
        assert_eq!(rows[0].assessable_value, "1200.00");
        assert_eq!(rows[0].cgst_amount, "108.00");
        assert_eq!(rows[0].sgst_amount, "108.00");
        assert_eq!(rows[0].total_amount, "1416.00");

        assert_eq!(rows[1].sr_no, "2");
        assert_eq!(rows[1].description, "Collection charges");
        assert_eq!(rows[1].total_amount, "295.60");
    }

    #[test]
    fn test_schema_constants_fill_fixed_columns() {
        let rows = parse(&sample_text(), "inv_1.pdf", &DEFAULT_SCHEMA).unwrap();
        let row = &rows[0];
        assert_eq!(row.hsn, "996211");
        assert_eq!(row.unit_of_measure, "OTH");
        assert_eq!(row.quantity, "1");
        assert_eq!(row.discount, "0");
        assert_eq!(row.cgst_rate, "9");
        assert_eq!(row.sgst_rate, "9");
        assert_eq!(row.igst_rate, "0");
        assert_eq!(row.igst_amount, "0");
        assert_eq!(row.comp_cess_rate, "0");
        assert_eq!(row.state_cess_amount, "0");
    }

    #[test]
    fn test_february_invoice_previous_fiscal_year() {
        let text = sample_text().replace("2024-05-12", "2024-02-10");
        let rows = parse(&text, "inv_1.pdf", &DEFAULT_SCHEMA).unwrap();
        assert_eq!(rows[0].fy_year, "2023-24");
        assert_eq!(rows[0].month, "02");
    }

    #[test]
    fn test_date_token_before_whitespace_only() {
        // Date line with trailing time; only the first token is parsed
        let rows = parse(&sample_text(), "inv_1.pdf", &DEFAULT_SCHEMA).unwrap();
        assert_eq!(rows[0].year, 2024);
    }

    #[test]
    fn test_bad_date_fails_document() {
        let text = sample_text().replace("2024-05-12 00:00:00", "12/05/2024");
        let err = parse(&text, "inv_1.pdf", &DEFAULT_SCHEMA).unwrap_err();
        assert!(err.contains("invalid invoice date"));
    }

    #[test]
    fn test_missing_date_fails_document() {
        let text = "Service Period : Apr 2024\nGrand Total 100.00";
        assert!(parse(text, "inv_1.pdf", &DEFAULT_SCHEMA).is_err());
    }

    #[test]
    fn test_zero_line_items_yields_zero_rows() {
        let text = "Invoice Date : 2024-05-12\nService Period : Apr 2024\n";
        let rows = parse(text, "inv_1.pdf", &DEFAULT_SCHEMA).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unmatched_header_fields_default_empty() {
        let text = "Invoice Date : 2024-05-12\n\
                    1 Commission 996211 OTH 1 100.00 100.00 0 100.00 9 9.00 9 9.00 118.00";
        let rows = parse(text, "inv_1.pdf", &DEFAULT_SCHEMA).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].irn, "");
        assert_eq!(rows[0].pan, "");
        assert_eq!(rows[0].grand_total, "");
    }

    #[test]
    fn test_line_pattern_follows_schema() {
        // A schema with a different HSN no longer matches 996211 lines
        let schema = InvoiceSchema { hsn_sac: "998599", ..DEFAULT_SCHEMA };
        let rows = parse(&sample_text(), "inv_1.pdf", &schema).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_to_row_matches_header_width() {
        let rows = parse(&sample_text(), "inv_1.pdf", &DEFAULT_SCHEMA).unwrap();
        assert_eq!(rows[0].to_row().len(), invoice_headers().len());
    }
}
