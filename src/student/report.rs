//! PDF rendering of a single student record.
//!
//! The layout is fixed: A4 portrait, a bold title, a subheading carrying the
//! student id, then one label/value entry per field in [`rows`] order. Values wider
//! than the column wrap onto further lines, and onto further pages when the page
//! runs out. Text uses the
//! built-in Helvetica faces with `WinAnsiEncoding`, so nothing is embedded and the
//! output is byte-for-byte reproducible.

use super::StudentRecord;
use crate::error::Error;
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};
use std::io::{self, Write};

pub const TITLE: &str = "Student Report";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.7;
const LABEL_WIDTH: f32 = 141.7;
const LINE_HEIGHT: f32 = 22.7;
const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const VALUE_X: f32 = MARGIN + LABEL_WIDTH;
const VALUE_WIDTH: f32 = PAGE_WIDTH - MARGIN - VALUE_X;
const TOP: f32 = PAGE_HEIGHT - MARGIN;
const FIRST_ROW: f32 = TOP - 3.0 * LINE_HEIGHT;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

/// One label/value line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub label: &'static str,
    pub value: String,
}

impl ReportRow {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// Rendered report: the rows baked into it and the finished PDF bytes.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    student_id: u64,
    rows: Vec<ReportRow>,
    page_count: usize,
    bytes: Vec<u8>,
}

impl ReportDocument {
    #[must_use]
    pub const fn student_id(&self) -> u64 {
        self.student_id
    }

    #[must_use]
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Download name offered to the client.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("student_{}_report.pdf", self.student_id)
    }

    /// # Errors
    /// Returns any error raised by the writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.bytes)?;
        writer.flush()
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// The twenty report rows, in print order:
/// identity, contact, dates, class/section/roll, guardianship, addresses, reporter.
#[must_use]
pub fn rows(record: &StudentRecord) -> Vec<ReportRow> {
    vec![
        ReportRow::new("Name:", &record.name),
        ReportRow::new("Gender:", &record.gender),
        ReportRow::new("Email:", &record.email),
        ReportRow::new("Phone:", &record.phone),
        ReportRow::new("System Access:", yes_no(record.system_access)),
        ReportRow::new("DOB:", record.dob.format(DATE_FORMAT).to_string()),
        ReportRow::new(
            "Admission Date:",
            record.admission_date.format(DATE_FORMAT).to_string(),
        ),
        ReportRow::new("Class:", &record.class_name),
        ReportRow::new("Section:", &record.section),
        ReportRow::new("Roll:", record.roll.to_string()),
        ReportRow::new("Father Name:", &record.father_name),
        ReportRow::new("Father Phone:", &record.father_phone),
        ReportRow::new("Mother Name:", &record.mother_name),
        ReportRow::new("Mother Phone:", &record.mother_phone),
        ReportRow::new("Guardian Name:", &record.guardian_name),
        ReportRow::new("Guardian Phone:", &record.guardian_phone),
        ReportRow::new("Relation Of Guardian:", &record.relation_of_guardian),
        ReportRow::new("Current Address:", &record.current_address),
        ReportRow::new("Permanent Address:", &record.permanent_address),
        ReportRow::new("Reporter Name:", &record.reporter_name),
    ]
}

/// Code points of the 0x80..=0x9F block of `WinAnsiEncoding`.
fn win_ansi_extra(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        _ => return None,
    };
    Some(byte)
}

/// Encode text for a WinAnsi Type 1 font.
///
/// Printable ASCII and Latin-1 supplement characters map 1:1, the typographic
/// punctuation and letters of the 0x80 block map through [`win_ansi_extra`]; tab,
/// CR and LF become spaces. Anything else is returned as the offending character.
fn encode(text: &str) -> Result<Vec<u8>, char> {
    text.chars()
        .map(|ch| match ch {
            '\t' | '\n' | '\r' => Ok(b' '),
            ' '..='~' | '\u{a0}'..='\u{ff}' => u8::try_from(u32::from(ch)).map_err(|_| ch),
            _ => win_ansi_extra(ch).ok_or(ch),
        })
        .collect()
}

/// Helvetica advance widths for 0x20..=0x7E, in 1/1000 em.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

// Bytes outside ASCII are measured at a full em, the widest Helvetica glyph in the
// encoding, so a measured line never overflows.
fn glyph_width(byte: u8) -> u16 {
    byte.checked_sub(b' ')
        .and_then(|index| HELVETICA_ASCII.get(usize::from(index)))
        .copied()
        .unwrap_or(1000)
}

fn text_width(text: &[u8]) -> f32 {
    let units: u32 = text.iter().map(|&byte| u32::from(glyph_width(byte))).sum();
    // Widths stay far below f32's exact integer range.
    #[allow(clippy::cast_precision_loss)]
    let units = units as f32;
    units * BODY_SIZE / 1000.0
}

/// Greedy word wrap of encoded text to `max_width` points at body size.
///
/// Runs of spaces collapse to one. A word wider than a whole line is broken
/// between characters. Always yields at least one (possibly empty) line.
fn wrap(text: &[u8], max_width: f32) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut line: Vec<u8> = Vec::new();

    for word in text.split(|&byte| byte == b' ').filter(|word| !word.is_empty()) {
        let joined = if line.is_empty() {
            text_width(word)
        } else {
            text_width(&line) + text_width(b" ") + text_width(word)
        };
        if joined <= max_width {
            if !line.is_empty() {
                line.push(b' ');
            }
            line.extend_from_slice(word);
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        for &byte in word {
            if !line.is_empty() && text_width(&line) + text_width(&[byte]) > max_width {
                lines.push(std::mem::take(&mut line));
            }
            line.push(byte);
        }
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

fn show(content: &mut Content, font: Name, size: f32, x: f32, y: f32, text: &[u8]) {
    content.begin_text();
    content.set_font(font, size);
    content.next_line(x, y);
    content.show(Str(text));
    content.end_text();
}

/// Render `record` into a PDF report.
///
/// Every row is encoded before any page is laid out, so a field the font cannot
/// represent fails the whole render and nothing is produced.
///
/// # Errors
/// Returns [`Error::Render`] if a field contains a character outside the font encoding.
pub fn render(record: &StudentRecord) -> Result<ReportDocument, Error> {
    let id = record.id;
    let rows = rows(record);

    let encoded = rows
        .iter()
        .map(|row| {
            let label = encode(row.label).map_err(|ch| unsupported(id, row.label, ch))?;
            let value = encode(&row.value).map_err(|ch| unsupported(id, row.label, ch))?;
            Ok((label, value))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut pages = Vec::new();
    let mut content = Content::new();
    show(&mut content, BOLD, TITLE_SIZE, MARGIN, TOP, TITLE.as_bytes());
    show(
        &mut content,
        REGULAR,
        BODY_SIZE,
        MARGIN,
        TOP - LINE_HEIGHT,
        format!("Student ID: {id}").as_bytes(),
    );

    let mut y = FIRST_ROW;
    for (label, value) in &encoded {
        for (index, line) in wrap(value, VALUE_WIDTH).iter().enumerate() {
            if y < MARGIN {
                pages.push(std::mem::replace(&mut content, Content::new()));
                y = TOP;
            }
            if index == 0 {
                show(&mut content, REGULAR, BODY_SIZE, MARGIN, y, label);
            }
            show(&mut content, REGULAR, BODY_SIZE, VALUE_X, y, line);
            y -= LINE_HEIGHT;
        }
    }
    pages.push(content);

    let page_count = pages.len();
    let bytes = assemble(pages).map_err(|reason| Error::Render { id, reason })?;

    Ok(ReportDocument {
        student_id: id,
        rows,
        page_count,
        bytes,
    })
}

fn unsupported(id: u64, label: &str, ch: char) -> Error {
    Error::Render {
        id,
        reason: format!(
            "{} contains unsupported character {ch:?}",
            label.trim_end_matches(':')
        ),
    }
}

fn assemble(pages: Vec<Content>) -> Result<Vec<u8>, String> {
    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let regular_id = Ref::new(3);
    let bold_id = Ref::new(4);

    let count = i32::try_from(pages.len()).map_err(|_| "too many pages".to_string())?;
    let refs = (0..count)
        .map(|index| (Ref::new(5 + 2 * index), Ref::new(6 + 2 * index)))
        .collect::<Vec<_>>();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(refs.iter().map(|(page_id, _)| *page_id))
        .count(count);

    for ((page_id, content_id), content) in refs.into_iter().zip(pages) {
        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(tree_id);
        page.contents(content_id);
        page.resources()
            .fonts()
            .pair(REGULAR, regular_id)
            .pair(BOLD, bold_id);
        page.finish();

        pdf.stream(content_id, &content.finish());
    }

    pdf.type1_font(regular_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_id)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    Ok(pdf.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::student::tests::sample_student;

    const EXPECTED_LABELS: [&str; 20] = [
        "Name:",
        "Gender:",
        "Email:",
        "Phone:",
        "System Access:",
        "DOB:",
        "Admission Date:",
        "Class:",
        "Section:",
        "Roll:",
        "Father Name:",
        "Father Phone:",
        "Mother Name:",
        "Mother Phone:",
        "Guardian Name:",
        "Guardian Phone:",
        "Relation Of Guardian:",
        "Current Address:",
        "Permanent Address:",
        "Reporter Name:",
    ];

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn rows_follow_fixed_order() {
        let labels: Vec<_> = rows(&sample_student()).iter().map(|row| row.label).collect();
        assert_eq!(labels, EXPECTED_LABELS);
    }

    #[test]
    fn values_use_iso_dates_and_yes_no() {
        let rows = rows(&sample_student());
        let value = |label: &str| {
            rows.iter()
                .find(|row| row.label == label)
                .map(|row| row.value.clone())
                .unwrap()
        };
        assert_eq!(value("DOB:"), "2000-01-01");
        assert_eq!(value("Admission Date:"), "2018-06-10");
        assert_eq!(value("System Access:"), "Yes");
        assert_eq!(value("Roll:"), "5");

        let mut record = sample_student();
        record.system_access = false;
        let rows = super::rows(&record);
        assert_eq!(rows[4].value, "No");
    }

    #[test]
    fn render_produces_single_page_pdf() {
        let document = render(&sample_student()).unwrap();
        let bytes = document.as_bytes();

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(bytes, b"%%EOF"));
        assert!(contains(bytes, b"Student Report"));
        assert!(contains(bytes, b"Relation Of Guardian:"));
        assert_eq!(document.rows().len(), 20);
        assert_eq!(document.page_count(), 1);
        assert_eq!(document.filename(), "student_1_report.pdf");
    }

    #[test]
    fn render_is_deterministic() {
        let first = render(&sample_student()).unwrap();
        let second = render(&sample_student()).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn latin1_text_is_accepted_and_newlines_flattened() {
        let mut record = sample_student();
        record.name = "Zoë Müller".to_string();
        record.current_address = "12 Main St\nSpringfield".to_string();

        let document = render(&record).unwrap();
        assert!(contains(document.as_bytes(), b"12 Main St Springfield"));
    }

    #[test]
    fn typographic_punctuation_is_encoded() {
        assert_eq!(encode("O\u{2019}Brien").unwrap(), b"O\x92Brien");
        assert_eq!(encode("Fees \u{20ac}100").unwrap(), b"Fees \x80100");
        assert_eq!(encode("Smith\u{2013}Jones").unwrap(), b"Smith\x96Jones");
        assert_eq!(encode("\u{201c}A\u{201d}\u{2026}").unwrap(), b"\x93A\x94\x85");
        assert_eq!(encode("\u{0081}"), Err('\u{0081}'));

        let mut record = sample_student();
        record.father_name = "O\u{2019}Brien".to_string();
        record.current_address = "Fees \u{20ac}100".to_string();
        record.guardian_name = "Smith\u{2013}Jones".to_string();
        let document = render(&record).unwrap();
        assert_eq!(document.rows()[10].value, "O\u{2019}Brien");
        assert_eq!(document.page_count(), 1);
    }

    #[test]
    fn wrap_keeps_lines_within_width() {
        let text = b"221B Baker Street Marylebone London NW1 6XE United Kingdom of Great Britain and Northern Ireland";
        let lines = wrap(text, VALUE_WIDTH);

        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| text_width(line) <= VALUE_WIDTH));
        assert_eq!(lines.join(&b' '), text.to_vec());
    }

    #[test]
    fn wrap_breaks_overlong_words() {
        let word = vec![b'W'; 80];
        let lines = wrap(&word, VALUE_WIDTH);

        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| text_width(line) <= VALUE_WIDTH));
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn wrap_of_empty_text_is_one_empty_line() {
        assert_eq!(wrap(b"", VALUE_WIDTH), vec![Vec::<u8>::new()]);
        assert_eq!(wrap(b"Roll", VALUE_WIDTH), vec![b"Roll".to_vec()]);
    }

    #[test]
    fn long_values_spill_onto_further_pages() {
        let mut record = sample_student();
        record.permanent_address = "Flat 4 ".repeat(300);

        let document = render(&record).unwrap();
        assert_eq!(document.page_count(), 2);
        assert_eq!(document.rows().len(), 20);
        assert!(contains(document.as_bytes(), b"/Count 2"));
        assert!(contains(document.as_bytes(), b"Reporter Name:"));
    }

    #[test]
    fn unsupported_characters_fail_atomically() {
        let mut record = sample_student();
        record.guardian_name = "सीता".to_string();

        let err = render(&record).unwrap_err();
        assert!(matches!(err, Error::Render { id: 1, .. }));
        assert!(err.to_string().contains("Guardian Name"));
    }

    #[test]
    fn write_to_streams_all_bytes() {
        let document = render(&sample_student()).unwrap();
        let mut sink = Vec::new();
        document.write_to(&mut sink).unwrap();
        assert_eq!(sink, document.as_bytes());
    }
}
