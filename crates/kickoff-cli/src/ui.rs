use console::{measure_text_width, pad_str, style, Alignment, Color};

use kickoff_core::{Greeting, ScaffoldReport};

/// 枠線の種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    /// 左右が二重線
    DoubleSingle,
    /// 角丸
    Round,
}

impl BorderStyle {
    /// (左上, 右上, 左下, 右下, 横, 縦)
    fn chars(self) -> (char, char, char, char, char, char) {
        match self {
            BorderStyle::DoubleSingle => ('╓', '╖', '╙', '╜', '─', '║'),
            BorderStyle::Round => ('╭', '╮', '╰', '╯', '─', '│'),
        }
    }
}

/// 行を中央揃えで枠に囲む。
///
/// 内側に上下 1 行・左右 3 桁の余白、外側に 1 行・1 桁の余白を取る。
/// 幅は ANSI エスケープを除いた表示幅で計算する。
pub fn render_box(lines: &[String], border: BorderStyle, color: Color) -> String {
    let (tl, tr, bl, br, h, v) = border.chars();
    let inner = lines.iter().map(|l| measure_text_width(l)).max().unwrap_or(0) + 6;
    let paint = |s: String| style(s).fg(color).to_string();

    let mut out = Vec::with_capacity(lines.len() + 6);
    out.push(String::new());
    out.push(format!(" {}", paint(format!("{tl}{}{tr}", h.to_string().repeat(inner)))));
    let blank = format!(" {}{}{}", paint(v.to_string()), " ".repeat(inner), paint(v.to_string()));
    out.push(blank.clone());
    for line in lines {
        out.push(format!(
            " {}{}{}",
            paint(v.to_string()),
            pad_str(line, inner, Alignment::Center, None),
            paint(v.to_string())
        ));
    }
    out.push(blank);
    out.push(format!(" {}", paint(format!("{bl}{}{br}", h.to_string().repeat(inner)))));
    out.push(String::new());
    out.join("\n")
}

/// ウェルカムバナーの行。
pub fn welcome_lines(greeting: &Greeting) -> Vec<String> {
    vec![
        format!(
            "💁 {} {}",
            greeting.title,
            style(format!("(v{})", greeting.version)).dim()
        ),
        style(&greeting.tagline).yellow().to_string(),
    ]
}

/// 完了メッセージの行。
pub fn completion_lines(report: &ScaffoldReport) -> Vec<String> {
    let mut lines = vec!["🎊 You can start the project following these steps:".to_string()];
    lines.extend(
        report
            .next_steps
            .iter()
            .map(|step| style(step).green().to_string()),
    );
    lines
}

pub fn render_welcome(greeting: &Greeting) {
    println!(
        "{}",
        render_box(&welcome_lines(greeting), BorderStyle::DoubleSingle, Color::Green)
    );
}

pub fn render_completion(report: &ScaffoldReport) {
    println!(
        "{}",
        render_box(&completion_lines(report), BorderStyle::Round, Color::White)
    );
}

/// 成功メッセージ (末尾に緑のチェック)。
pub fn format_done(message: &str) -> String {
    format!("{message} {}", style("✔").green())
}

/// 失敗メッセージ。
pub fn format_failed(message: &str) -> String {
    format!("{} {}", style("✗").red(), style(message).red())
}

/// 警告メッセージ。
pub fn format_warning(message: &str) -> String {
    format!("{} {}", style("!").yellow(), style(message).yellow())
}

/// スキップしたステップのメッセージ。
pub fn format_skipped(message: &str) -> String {
    format!("{} {}", style("-").dim(), style(message).dim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kickoff_core::SessionConfig;
    use std::path::PathBuf;

    fn plain(s: &str) -> String {
        console::strip_ansi_codes(s).to_string()
    }

    fn report(next_steps: &[&str]) -> ScaffoldReport {
        ScaffoldReport {
            session: SessionConfig {
                dir_name: "my-app".to_string(),
            },
            destination: PathBuf::from("/work/my-app"),
            files: Vec::new(),
            installed: true,
            next_steps: next_steps.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn welcome_lines_include_version_and_tagline() {
        let lines = welcome_lines(&Greeting::new("1.2.3"));
        assert_eq!(lines.len(), 2);
        assert_eq!(plain(&lines[0]), "💁 Welcome to use vue-kickoff (v1.2.3)");
        assert_eq!(
            plain(&lines[1]),
            "You can create a frontend project very quickly."
        );
    }

    #[test]
    fn completion_lines_list_next_steps() {
        let lines = completion_lines(&report(&["cd my-app", "npm run serve"]));
        let lines: Vec<String> = lines.iter().map(|l| plain(l)).collect();
        assert_eq!(
            lines,
            vec![
                "🎊 You can start the project following these steps:",
                "cd my-app",
                "npm run serve",
            ]
        );
    }

    #[test]
    fn render_box_aligns_borders() {
        let boxed = plain(&render_box(
            &["short".to_string(), "a longer line".to_string()],
            BorderStyle::Round,
            Color::White,
        ));
        let rows: Vec<&str> = boxed.lines().filter(|l| !l.is_empty()).collect();
        assert!(rows[0].trim_start().starts_with('╭'));
        assert!(rows.last().unwrap().trim_start().starts_with('╰'));
        let widths: Vec<usize> = rows.iter().map(|r| measure_text_width(r)).collect();
        assert!(widths.iter().all(|w| *w == widths[0]), "widths: {widths:?}");
        assert!(boxed.contains("a longer line"));
    }

    #[test]
    fn render_box_double_single_border() {
        let boxed = plain(&render_box(
            &["hi".to_string()],
            BorderStyle::DoubleSingle,
            Color::Green,
        ));
        assert!(boxed.contains('╓'));
        assert!(boxed.contains('║'));
        assert!(boxed.contains('╜'));
    }

    #[test]
    fn format_helpers_mark_status() {
        assert!(plain(&format_done("Finish installing dependencies.")).ends_with("✔"));
        assert!(plain(&format_failed("boom")).starts_with("✗"));
        assert!(plain(&format_skipped("skipped")).starts_with("-"));
        assert_eq!(plain(&format_warning("cleanup failed")), "! cleanup failed");
    }
}
