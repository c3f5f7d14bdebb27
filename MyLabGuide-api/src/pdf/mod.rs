//! PDF export of classified lab reports.
//!
//! Rendering is deliberately plain: one A4 portrait document built with
//! `printpdf`, builtin fonts only, and a manual y cursor that walks down
//! the page. When the cursor reaches the bottom margin a fresh page is
//! appended and the cursor resets, so long panels span pages instead of
//! running off the sheet.

use printpdf::*;
use std::io::BufWriter;
use thiserror::Error;

use my_lab_guide_domain::models::{LabReport, LabResult};

/// A4 portrait page size.
const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);

/// Where the cursor starts on a fresh page.
const TOP_START: Mm = Mm(280.0);

/// Cursor floor; stepping past it forces a page break.
const BOTTOM_MARGIN: Mm = Mm(20.0);

const FOOTNOTE: &str = "This report compares submitted values against general reference \
    ranges and is informational only. It is not a diagnosis. Discuss the results and any \
    advice shown here with a clinician.";

/// Errors surfaced while rendering a report to PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    /// A builtin font could not be registered with the document.
    #[error("PDF font error: {0}")]
    Font(String),

    /// The document could not be serialized into the output buffer.
    #[error("PDF write error: {0}")]
    Write(String),
}

/// Renders a classified report as a PDF document and returns its bytes.
pub fn render_report_pdf(report: &LabReport) -> Result<Vec<u8>, PdfError> {
    let (doc, page1, layer1) = PdfDocument::new("Laboratory Report", PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
    let mut layer = doc.get_page(page1).get_layer(layer1);

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PdfError::Font(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| PdfError::Font(e.to_string()))?;
    let courier = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| PdfError::Font(e.to_string()))?;

    let mut y = TOP_START;

    // Header
    layer.use_text("Laboratory Report", 16.0, Mm(20.0), y, &bold);
    step(&doc, &mut layer, &mut y, Mm(7.0));
    layer.use_text(
        format!("Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M UTC")),
        9.0,
        Mm(20.0),
        y,
        &font,
    );
    step(&doc, &mut layer, &mut y, Mm(4.5));
    layer.use_text(demographics_line(report), 9.0, Mm(20.0), y, &font);
    step(&doc, &mut layer, &mut y, Mm(8.0));

    if report.severe {
        layer.use_text(
            "SEVERELY ABNORMAL VALUES - SEEK MEDICAL REVIEW PROMPTLY",
            11.0,
            Mm(20.0),
            y,
            &bold,
        );
        step(&doc, &mut layer, &mut y, Mm(8.0));
    }

    layer.use_text(
        format!(
            "{} values submitted, {} outside the reference range",
            report.results.len(),
            report.abnormal_count
        ),
        10.0,
        Mm(20.0),
        y,
        &font,
    );
    step(&doc, &mut layer, &mut y, Mm(8.0));

    // Results table
    layer.use_text("RESULTS:", 11.0, Mm(20.0), y, &bold);
    step(&doc, &mut layer, &mut y, Mm(6.0));
    layer.use_text(
        format!(
            "{:<28} {:>10}  {:<8} {:>15}  {:<6}",
            "Test", "Value", "Unit", "Reference", "Status"
        ),
        8.0,
        Mm(25.0),
        y,
        &courier,
    );
    step(&doc, &mut layer, &mut y, Mm(4.5));
    for row in &report.results {
        layer.use_text(result_line(row), 8.0, Mm(25.0), y, &courier);
        step(&doc, &mut layer, &mut y, Mm(4.0));
    }
    step(&doc, &mut layer, &mut y, Mm(4.0));

    // Advice for abnormal rows
    let advised: Vec<&LabResult> = report
        .results
        .iter()
        .filter(|row| row.advice.is_some())
        .collect();
    if !advised.is_empty() {
        layer.use_text("ADVICE:", 11.0, Mm(20.0), y, &bold);
        step(&doc, &mut layer, &mut y, Mm(6.0));
        for row in advised {
            let advice = row.advice.as_deref().unwrap_or_default();
            for line in wrap_text(&format!("{}: {}", row.label, advice), 90) {
                layer.use_text(&line, 9.0, Mm(25.0), y, &font);
                step(&doc, &mut layer, &mut y, Mm(4.5));
            }
            step(&doc, &mut layer, &mut y, Mm(2.0));
        }
        step(&doc, &mut layer, &mut y, Mm(2.0));
    }

    // Footnote
    for line in wrap_text(FOOTNOTE, 100) {
        layer.use_text(&line, 7.0, Mm(20.0), y, &font);
        step(&doc, &mut layer, &mut y, Mm(3.5));
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| PdfError::Write(e.to_string()))
}

/// Moves the cursor down, breaking onto a fresh page at the margin.
fn step(doc: &PdfDocumentReference, layer: &mut PdfLayerReference, y: &mut Mm, amount: Mm) {
    *y -= amount;
    if y.0 < BOTTOM_MARGIN.0 {
        let (page, new_layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        *layer = doc.get_page(page).get_layer(new_layer);
        *y = TOP_START;
    }
}

fn demographics_line(report: &LabReport) -> String {
    match report.age {
        Some(age) => format!("Patient: age {}, {}", age, report.gender.as_tag()),
        None => format!("Patient: age unknown, {}", report.gender.as_tag()),
    }
}

/// One fixed-width table row: label, value, unit, interval, status.
fn result_line(row: &LabResult) -> String {
    let unit = row.unit.as_deref().unwrap_or("");
    let reference = match row.bounds {
        Some(bounds) => format!("{}-{}", bounds.low, bounds.high),
        None => "n/a".to_string(),
    };
    format!(
        "{:<28} {:>10}  {:<8} {:>15}  {:<6}",
        row.label,
        row.value,
        unit,
        reference,
        row.status.as_tag().to_uppercase()
    )
}

/// Greedy word wrap used for advice texts and the footnote.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use std::sync::Arc;

    use my_lab_guide_data::models::reference::Gender;
    use my_lab_guide_data::reference::ReferenceCatalog;
    use my_lab_guide_domain::services::{create_report_service, LabReportServiceTrait};

    fn report_for(entries: &[(&str, f64)], age: Option<u32>, gender: Gender) -> LabReport {
        let service = create_report_service(Arc::new(ReferenceCatalog::builtin()));
        let values: IndexMap<String, f64> = entries
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect();
        service.build_report(age, gender, &values).unwrap()
    }

    #[test]
    fn test_rendered_pdf_starts_with_magic_bytes() {
        let report = report_for(&[("SODIUM", 129.0), ("HB", 14.0)], Some(40), Gender::Male);
        let bytes = render_report_pdf(&report).unwrap();

        assert!(!bytes.is_empty());
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn test_severe_report_renders() {
        let report = report_for(&[("SODIUM", 128.0)], Some(40), Gender::Female);
        assert!(report.severe);

        let bytes = render_report_pdf(&report).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn test_full_catalog_panel_spans_pages_without_failing() {
        // Submitting every catalog test plus the advice section pushes the
        // cursor past one page.
        let catalog = ReferenceCatalog::builtin();
        let values: IndexMap<String, f64> =
            catalog.tests().map(|test| (test.key.clone(), 1.0)).collect();
        let service = create_report_service(Arc::new(catalog));
        let report = service.build_report(Some(9), Gender::Female, &values).unwrap();

        let full = render_report_pdf(&report).unwrap();
        assert_eq!(&full[0..4], b"%PDF");

        let small = render_report_pdf(&report_for(&[("SODIUM", 140.0)], Some(40), Gender::Male))
            .unwrap();
        assert!(full.len() > small.len());
    }

    #[test]
    fn test_result_line_formats_bounds_and_status() {
        let report = report_for(&[("SODIUM", 129.0)], Some(40), Gender::Male);
        let line = result_line(&report.results[0]);

        assert!(line.contains("Sodium (Na+)"));
        assert!(line.contains("129"));
        assert!(line.contains("135-145"));
        assert!(line.contains("LOW"));
    }

    #[test]
    fn test_result_line_marks_missing_bounds() {
        let report = report_for(&[("HEMOLYTIC_FLAG", 1.0)], Some(40), Gender::Male);
        let line = result_line(&report.results[0]);

        assert!(line.contains("n/a"));
        assert!(line.contains("NORMAL"));
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let text = "one two three four five six seven eight nine ten";
        let lines = wrap_text(text, 12);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.len() <= 12, "line too long: {line:?}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_text_on_empty_input() {
        assert_eq!(wrap_text("", 40), vec![String::new()]);
    }
}
