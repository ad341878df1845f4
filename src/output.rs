use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Success,
    Error,
    Info,
}

/// Transient notification: one line on stderr, mirrored to the log.
pub fn notify(notice: Notice, message: &str) {
    match notice {
        Notice::Success => {
            info!(notice = "success", "{message}");
            eprintln!("ok: {message}");
        }
        Notice::Error => {
            error!("{message}");
            eprintln!("error: {message}");
        }
        Notice::Info => {
            info!("{message}");
            eprintln!("{message}");
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print `value` as JSON in `--json` mode, otherwise run `human`.
    pub fn emit<T, F>(&self, value: &T, human: F) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T),
    {
        if self.json {
            self.json(value)
        } else {
            human(value);
            Ok(())
        }
    }
}

/// Left-aligned columns sized to their widest cell.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.to_vec())];
    for row in rows {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

/// `[#####-----] 50%`
pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (usize::from(percent.min(100)) * width + 50) / 100;
    format!("[{}{}] {percent}%", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_aligns_columns() {
        let rendered = table(
            &["NAME", "ROWS"],
            &[
                vec!["short".to_string(), "3".to_string()],
                vec!["much longer".to_string(), "120".to_string()],
            ],
        );
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "NAME         ROWS");
        assert_eq!(lines[1], "short        3");
        assert_eq!(lines[2], "much longer  120");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10), "[----------] 0%");
        assert_eq!(progress_bar(50, 10), "[#####-----] 50%");
        assert_eq!(progress_bar(100, 4), "[####] 100%");
    }
}
