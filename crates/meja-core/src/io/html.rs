//! HTML export.
//!
//! Produces a standalone page with one tab per sheet. Each cell style becomes
//! a CSS class, merged cells become `colspan`/`rowspan`, hyperlinks become
//! anchors.

use std::fmt::Write as _;
use std::io::Write;

use super::WorkbookWriter;
use crate::error::Result;
use crate::model::{CellStyle, CellType, Direction, FillPattern, HAlign, Sheet, Workbook};

#[derive(Clone, Debug, Default)]
pub struct HtmlWriter {
    /// Element id prefix; random when `None`.
    pub id: Option<String>,
    /// Page title; defaults to the workbook file name.
    pub title: Option<String>,
}

fn hex(s: &str) -> String {
    s.bytes().fold(String::with_capacity(s.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn random_id() -> String {
    let bytes: [u8; 16] = rand::random();
    let mut id = String::from("W");
    for b in bytes {
        let _ = write!(id, "{b:02x}");
    }
    id
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn style_class(id: &str, name: &str) -> String {
    format!("{id}_CS{}", hex(name))
}

fn sheet_id(id: &str, name: &str) -> String {
    format!("{id}_S{}", hex(name))
}

/// CSS declarations for a cell style.
pub fn css_for_style(style: &CellStyle) -> String {
    let mut css = style.font.css_style();
    for part in [style.h_align.css(), style.v_align.css()] {
        if !part.is_empty() {
            css.push(' ');
            css.push_str(part);
        }
    }
    if style.rotation != 0 {
        let _ = write!(css, " transform: rotate({}deg);", -style.rotation);
    }
    for direction in Direction::ALL {
        let border = style.border(direction);
        if !border.is_none() {
            let _ = write!(css, " border-{}: {};", direction.css_name(), border.css());
        }
    }
    if style.fill_pattern != FillPattern::None {
        let _ = write!(css, " background-color: {};", style.fill_bg_color.to_css());
    }
    css.push_str(if style.effective_wrap() {
        " white-space: pre-wrap;"
    } else {
        " white-space: pre;"
    });
    css
}

const SCRIPT: &str = r#"function mejaShowTab(workbookId, sheetId) {
  var sheets = document.querySelectorAll('#' + workbookId + ' > .meja-sheet');
  for (var i = 0; i < sheets.length; i++) {
    sheets[i].style.display = sheets[i].id === sheetId ? 'block' : 'none';
  }
}"#;

impl HtmlWriter {
    fn write_sheet(&self, out: &mut String, id: &str, sheet: &Sheet, visible: bool) {
        let ctx = sheet.display_context();
        let _ = writeln!(
            out,
            "<div id=\"{}\" class=\"meja-sheet\" style=\"display: {};\">",
            sheet_id(id, sheet.name()),
            if visible { "block" } else { "none" }
        );
        out.push_str("<table class=\"meja-table\">\n<colgroup>\n");
        for j in 0..sheet.column_count() {
            let _ = writeln!(out, "<col style=\"width: {}pt;\">", sheet.column_width(j));
        }
        out.push_str("</colgroup>\n");

        for i in 0..sheet.row_count() {
            let _ = writeln!(out, "<tr style=\"height: {}pt;\">", sheet.row_height(i));
            let row = sheet.row(i);
            for j in 0..sheet.column_count() {
                let Some(cell) = row.and_then(|r| r.cell(j)) else {
                    out.push_str("<td></td>\n");
                    continue;
                };
                if cell.span_x() == 0 || cell.span_y() == 0 {
                    continue;
                }
                let style = sheet.styles().get(cell.style_name());
                let _ = write!(out, "<td class=\"{}\"", style_class(id, cell.style_name()));
                if cell.span_x() > 1 {
                    let _ = write!(out, " colspan=\"{}\"", cell.span_x());
                }
                if cell.span_y() > 1 {
                    let _ = write!(out, " rowspan=\"{}\"", cell.span_y());
                }
                if style.h_align == HAlign::Automatic {
                    let align = style.effective_h_align(cell.cell_type());
                    let _ = write!(out, " style=\"{}\"", align.css());
                }
                out.push('>');
                let text = escape_html(&cell.display(&ctx));
                match cell.hyperlink() {
                    Some(link) if cell.cell_type() != CellType::Blank => {
                        let _ = write!(out, "<a href=\"{}\">{text}</a>", escape_html(link));
                    }
                    _ => out.push_str(&text),
                }
                out.push_str("</td>\n");
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</table>\n</div>\n");
    }

    /// Render the whole page.
    pub fn render(&self, workbook: &Workbook) -> String {
        let id = self.id.clone().unwrap_or_else(random_id);
        let title = self.title.clone().unwrap_or_else(|| {
            workbook
                .location()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Workbook".to_string())
        });

        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(out, "<title>{}</title>", escape_html(&title));
        out.push_str("<style>\n");
        let _ = writeln!(
            out,
            "#{id} .meja-tabs button {{ border: 1px solid #888; background: #eee; margin-right: 2px; }}"
        );
        let _ = writeln!(out, "#{id} .meja-table {{ border-collapse: collapse; table-layout: fixed; }}");
        for name in workbook.cell_style_names() {
            let style = workbook.cell_style(&name);
            let _ = writeln!(out, ".{} {{ {} }}", style_class(&id, &name), css_for_style(&style));
        }
        out.push_str("</style>\n<script>\n");
        out.push_str(SCRIPT);
        out.push_str("\n</script>\n</head>\n<body>\n");

        let _ = writeln!(out, "<div id=\"{id}\" class=\"meja-workbook\">");
        out.push_str("<div class=\"meja-tabs\">\n");
        let names: Vec<String> = workbook.sheets().map(|s| s.name()).collect();
        for name in &names {
            let _ = writeln!(
                out,
                "<button onclick=\"mejaShowTab('{id}', '{}')\">{}</button>",
                sheet_id(&id, name),
                escape_html(name)
            );
        }
        out.push_str("</div>\n");

        let current = workbook.current_sheet_index().unwrap_or(0);
        for (index, handle) in workbook.sheets().enumerate() {
            let sheet = handle.read();
            self.write_sheet(&mut out, &id, &sheet, index == current);
        }
        out.push_str("</div>\n</body>\n</html>\n");
        out
    }
}

impl WorkbookWriter for HtmlWriter {
    fn write(&self, workbook: &Workbook, output: &mut dyn Write) -> Result<()> {
        output.write_all(self.render(workbook).as_bytes())?;
        Ok(())
    }
}
