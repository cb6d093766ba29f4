use crate::reporting::model::Finding;
use colored::Colorize;
use unicode_width::UnicodeWidthStr;

const BOX_WIDTH: usize = 70;
const INNER_WIDTH: usize = BOX_WIDTH - 2;

fn visual_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn top_border() -> String {
    format!("╔{}╗", "═".repeat(INNER_WIDTH))
}

fn middle_border() -> String {
    format!("╠{}╣", "═".repeat(INNER_WIDTH))
}

fn bottom_border() -> String {
    format!("╚{}╝", "═".repeat(INNER_WIDTH))
}

/// Left-aligned box line, truncated when wider than the box
fn box_line(content: &str) -> String {
    let mut safe_content = format!(" {} ", content);
    while visual_width(&safe_content) > INNER_WIDTH {
        safe_content.pop();
    }
    let padding = INNER_WIDTH.saturating_sub(visual_width(&safe_content));
    format!("║{}{}║", safe_content, " ".repeat(padding))
}

fn box_line_centered(content: &str) -> String {
    let safe_content = format!(" {} ", content);
    let width = visual_width(&safe_content);

    if width >= INNER_WIDTH {
        return box_line(content);
    }

    let remaining = INNER_WIDTH - width;
    let left = remaining / 2;
    let right = remaining - left;

    format!("║{}{}{}║", " ".repeat(left), safe_content, " ".repeat(right))
}

/// Boxed summary: a title, `label: value` rows, then one line per finding.
pub fn summary_box(title: &str, rows: &[(&str, String)], findings: &[Finding]) -> String {
    let mut out = Vec::new();
    out.push(top_border());
    out.push(box_line_centered(title));
    out.push(middle_border());

    for (label, value) in rows {
        out.push(box_line(&format!("{:<14} {}", format!("{}:", label), value)));
    }

    out.push(middle_border());
    if findings.is_empty() {
        out.push(box_line("No findings"));
    } else {
        out.push(box_line(&format!("Findings: {}", findings.len())));
        for f in findings {
            out.push(box_line(&format!("[{}] {}", f.severity, f.title)));
            out.push(box_line(&format!("    {}", f.url)));
        }
    }
    out.push(bottom_border());
    out.join("\n")
}

pub fn render(title: &str, rows: &[(&str, String)], findings: &[Finding]) {
    let boxed = summary_box(title, rows, findings);
    if findings.is_empty() {
        println!("\n{}\n", boxed.green());
    } else {
        println!("\n{}\n", boxed.yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_have_equal_width() {
        let findings = vec![Finding::suspicious_screen(
            "https://victim.example.com/App/TestScreen",
            "/App/TestScreen",
        )];
        let boxed = summary_box(
            "OUTSYSTEMS SCAN SUMMARY",
            &[("Application", "App".to_string()), ("Screens", "12".to_string())],
            &findings,
        );
        for line in boxed.lines() {
            assert_eq!(visual_width(line), BOX_WIDTH, "{}", line);
        }
        assert!(boxed.contains("Findings: 1"));
    }

    #[test]
    fn test_long_content_is_truncated() {
        let long = "x".repeat(200);
        assert_eq!(visual_width(&box_line(&long)), BOX_WIDTH);
    }
}
