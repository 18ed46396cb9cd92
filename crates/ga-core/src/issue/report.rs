//! Plain-text issue reports.

use std::fmt::Write;

use super::{Info, IssueSummary, IssueTable};

/// Rows listed under "most severe instances" unless configured otherwise.
pub const DEFAULT_MAX_EXAMPLES: usize = 5;

const BANNER_WIDTH: usize = 60;

/// Everything [`render`] needs.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub issue_name: &'a str,
    pub description: Option<&'a str>,
    /// Info keys per verbosity level; a level shows its keys and all lower ones.
    pub verbosity_levels: &'a [(u8, &'a [&'a str])],
    pub issues: &'a IssueTable,
    pub summary: &'a IssueSummary,
    pub info: &'a Info,
    pub verbosity: u8,
    pub max_examples: usize,
}

/// `"---- <name> issues ----"`, centred in 60 dashes.
pub fn banner(issue_name: &str) -> String {
    format!("{:-^width$}", format!(" {} issues ", issue_name), width = BANNER_WIDTH)
}

/// Render the report. Pure: depends only on the input.
pub fn render(input: &ReportInput<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", banner(input.issue_name));
    out.push('\n');
    let _ = writeln!(
        out,
        "Number of examples with this issue: {}",
        input.issues.num_issues()
    );
    let _ = writeln!(
        out,
        "Overall dataset quality in terms of this issue: {:.4}",
        input.summary.score
    );

    if let Some(description) = input.description {
        out.push('\n');
        let _ = writeln!(out, "About this issue:");
        for line in wrap(description, 72) {
            let _ = writeln!(out, "    {}", line);
        }
    }

    let entries: Vec<(&str, &serde_json::Value)> = input
        .verbosity_levels
        .iter()
        .filter(|(level, _)| *level <= input.verbosity)
        .flat_map(|(_, keys)| keys.iter())
        .filter_map(|key| input.info.get(*key).map(|v| (*key, v)))
        .collect();
    if !entries.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "Additional Information:");
        for (key, value) in entries {
            let _ = writeln!(out, "{}: {}", key, value);
        }
    }

    let rows = input.issues.most_severe(input.max_examples);
    if !rows.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "Examples representing most severe instances of this issue:");
        let flag_col = input.issues.flag_column();
        let score_col = input.issues.score_column();
        let index_width = rows
            .iter()
            .map(|i| i.to_string().len())
            .max()
            .unwrap_or(0)
            .max("index".len());
        let _ = writeln!(
            out,
            "{:>iw$}  {}  {}",
            "index",
            flag_col,
            score_col,
            iw = index_width
        );
        for i in rows {
            let _ = writeln!(
                out,
                "{:>iw$}  {:>fw$}  {:>sw$.6}",
                i,
                input.issues.flags()[i],
                input.issues.scores()[i],
                iw = index_width,
                fw = flag_col.len(),
                sw = score_col.len()
            );
        }
    }
    out
}

/// Greedy word wrap.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
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
