//! Plain-text rendering of dashboard views for the terminal.

use std::fmt::Write;

use evalview_core::credentials::{CredentialState, CredentialStatus};
use evalview_core::detail::{DetailModal, DetailView};
use evalview_core::results::{ResultsPanel, ResultsView, StatusKind, StatusLine};

pub fn credential_line(status: &CredentialStatus) -> String {
    let state = match status.state {
        CredentialState::Checking => "checking",
        CredentialState::Connected => "connected",
        CredentialState::Disconnected => "disconnected",
    };
    format!("AWS: {} [{state}]", status.message)
}

pub fn status_line(status: &StatusLine) -> String {
    match status.kind {
        StatusKind::Error => format!("error: {}", status.message),
        StatusKind::Info | StatusKind::Success => status.message.clone(),
    }
}

pub fn results_panel(panel: &ResultsPanel) -> String {
    match panel {
        ResultsPanel::Idle => String::new(),
        ResultsPanel::NoResults { job_id } => {
            format!("No results found for JOB_ID: {job_id}\n")
        }
        ResultsPanel::Failed {
            error,
            searched_path,
        } => {
            let mut out = format!("Error: {error}\n");
            if let Some(path) = searched_path {
                let _ = writeln!(out, "Searched: {path}");
            }
            out
        }
        ResultsPanel::Loaded(view) => results_view(view),
    }
}

fn results_view(view: &ResultsView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Results for {}", view.job_id);
    let _ = writeln!(out, "{}", "=".repeat(12 + view.job_id.as_str().len()));
    let _ = writeln!(out, "Total test cases: {}", view.summary.total);
    for metric in &view.summary.metrics {
        let _ = writeln!(
            out,
            "  {:<24} {:>7}  [{}]",
            metric.label, metric.display, metric.tier
        );
    }
    out.push('\n');

    let mut header = vec!["Test Case".to_string(), "Result".to_string()];
    header.extend(view.columns.iter().map(|c| c.label.clone()));

    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.test_case_id.clone(), row.outcome.clone()];
            cells.extend(row.cells.iter().map(|cell| match cell {
                Some(cell) => cell.text.clone(),
                None => "-".to_string(),
            }));
            cells
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

pub fn detail_modal(modal: &DetailModal) -> String {
    match modal {
        DetailModal::Closed => String::new(),
        DetailModal::Loading { title, .. } => format!("{title}\nLoading...\n"),
        DetailModal::Failed { title, message, .. } => format!("{title}\n{message}\n"),
        DetailModal::Loaded(view) => detail_view(view),
    }
}

fn detail_view(view: &DetailView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.title);
    let _ = writeln!(out, "{}", "=".repeat(view.title.chars().count()));
    if view.metrics.is_empty() {
        out.push_str("No scores recorded.\n");
    }
    for metric in &view.metrics {
        let _ = writeln!(out, "{} {} [{}]", metric.label, metric.text, metric.tier);
        let _ = writeln!(out, "  {}", metric.context);
    }
    out.push_str("\nRaw record:\n");
    out.push_str(&view.raw);
    out.push('\n');
    out
}
