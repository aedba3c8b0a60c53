//! Exports of a finished review: PDF report, JSON dump, plain-text digest.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use serde::{Deserialize, Serialize};

use crate::review::pipeline::ReviewReport;

const REPORT_TITLE: &str = "Resume Analysis Report";
const PAGE_WIDTH_MM: f32 = 215.9; // US letter
const PAGE_HEIGHT_MM: f32 = 279.4;
const MARGIN_MM: f32 = 20.0;
const WRAP_COLUMNS: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Json,
    Text,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Json => "application/json",
            ExportFormat::Text => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

pub fn export_report(
    report: &ReviewReport,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> Result<ExportedFile> {
    let body = match format {
        ExportFormat::Pdf => render_pdf(report, now)?,
        ExportFormat::Json => serde_json::to_vec_pretty(report)?,
        ExportFormat::Text => render_text_summary(report, now).into_bytes(),
    };
    Ok(ExportedFile {
        file_name: format!(
            "resume_analysis_{}.{}",
            now.format("%Y%m%d_%H%M%S"),
            format.extension()
        ),
        content_type: format.content_type(),
        body,
    })
}

fn push_numbered(parts: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    parts.push(heading.to_string());
    for (i, item) in items.iter().enumerate() {
        parts.push(format!("{}. {}", i + 1, item));
    }
    parts.push(String::new());
}

/// Plain-text digest with headered sections. Empty sections are left out.
pub fn render_text_summary(report: &ReviewReport, now: DateTime<Utc>) -> String {
    let feedback = &report.feedback;
    let mut parts = vec![
        "=== RESUME ANALYSIS SUMMARY ===".to_string(),
        format!("Generated: {}", now.format("%Y-%m-%d %H:%M:%S")),
        String::new(),
    ];

    if let Some(scores) = &report.scores {
        parts.push(format!("Overall Score: {:.1}/10", scores.overall));
        parts.push(format!("Grade: {}", scores.grade));
        parts.push(String::new());
    }

    if !feedback.summary.is_empty() {
        parts.push("SUMMARY:".to_string());
        parts.push(feedback.summary.clone());
        parts.push(String::new());
    }

    push_numbered(&mut parts, "STRENGTHS:", &feedback.strengths);
    push_numbered(&mut parts, "AREAS FOR IMPROVEMENT:", &feedback.weaknesses);
    push_numbered(&mut parts, "RECOMMENDATIONS:", &feedback.recommendations);

    parts.join("\n").trim_end().to_string()
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Writes lines top to bottom, starting a new page when the cursor hits the bottom margin.
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    cursor_mm: f32,
    pages: usize,
}

impl PdfWriter {
    fn new() -> Self {
        let (doc, page, layer) = PdfDocument::new(
            REPORT_TITLE,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let layer = doc.get_page(page).get_layer(layer);
        Self {
            doc,
            layer,
            cursor_mm: PAGE_HEIGHT_MM - MARGIN_MM,
            pages: 1,
        }
    }

    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        let height = size * 0.5;
        if self.cursor_mm - height < MARGIN_MM {
            self.pages += 1;
            let (page, layer) = self.doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Layer {}", self.pages),
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.cursor_mm = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        self.cursor_mm -= height;
        self.layer
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.cursor_mm), font);
    }

    fn gap(&mut self, mm: f32) {
        self.cursor_mm -= mm;
    }
}

/// Builtin PDF fonts only cover Latin-1; anything else is replaced.
fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            '\u{2013}' | '\u{2014}' | '\u{2022}' => '-',
            c if (c as u32) < 0x100 => c,
            _ => '?',
        })
        .collect()
}

fn render_pdf(report: &ReviewReport, now: DateTime<Utc>) -> Result<Vec<u8>> {
    let mut writer = PdfWriter::new();
    let regular = writer
        .doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("failed to load PDF font: {e}"))?;
    let bold = writer
        .doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("failed to load PDF font: {e}"))?;

    writer.line(REPORT_TITLE, 22.0, &bold);
    writer.gap(4.0);
    writer.line(
        &format!("Generated: {}", now.format("%Y-%m-%d %H:%M:%S")),
        10.0,
        &regular,
    );
    writer.gap(6.0);

    if let Some(scores) = &report.scores {
        writer.line(
            &format!(
                "Overall Score: {:.1}/10 (Grade: {})",
                scores.overall, scores.grade
            ),
            14.0,
            &bold,
        );
        writer.gap(6.0);
    }

    if !report.feedback.strengths.is_empty() {
        writer.line("Strengths:", 14.0, &bold);
        writer.gap(2.0);
        for strength in &report.feedback.strengths {
            for (i, line) in wrap(&pdf_safe(strength), WRAP_COLUMNS).iter().enumerate() {
                let prefix = if i == 0 { "- " } else { "  " };
                writer.line(&format!("{prefix}{line}"), 11.0, &regular);
            }
        }
    }

    writer
        .doc
        .save_to_bytes()
        .map_err(|e| anyhow!("failed to write PDF: {e}"))
}
