//! Builder for the markdown tables shown to analysts.
//!
//! Tables follow the platform's readable-output layout:
//!
//! ```text
//! ### <title>
//! |h1|h2|
//! |---|---|
//! | v1 | v2 |
//! ```

/// Placeholder rendered instead of a table with no rows.
const NO_ENTRIES: &str = "**No entries.**";

/// Builder for a titled markdown table.
///
/// # Example
///
/// ```ignore
/// let table = TableBuilder::new("Command uptime Outputs")
///     .headers(["command", "Output", "ErrorOutput"])
///     .row(["uptime", " 10:00 up 3 days", ""])
///     .build();
/// ```
pub struct TableBuilder {
    title: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Set the column headers.
    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Append one row. Missing cells render empty; extra cells are dropped.
    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rows
            .push(cells.into_iter().map(|c| escape_cell(c.as_ref())).collect());
        self
    }

    /// Build the markdown string.
    pub fn build(&self) -> String {
        let mut out = format!("### {}\n", escape_line_breaks(&self.title));

        if self.rows.is_empty() || self.headers.is_empty() {
            out.push_str(NO_ENTRIES);
            out.push('\n');
            return out;
        }

        out.push('|');
        for header in &self.headers {
            out.push_str(&escape_cell(header));
            out.push('|');
        }
        out.push('\n');

        out.push('|');
        out.push_str(&"---|".repeat(self.headers.len()));
        out.push('\n');

        for row in &self.rows {
            out.push('|');
            for i in 0..self.headers.len() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                out.push(' ');
                out.push_str(cell);
                out.push_str(" |");
            }
            out.push('\n');
        }

        out
    }
}

/// Make a value safe inside a single table cell.
fn escape_cell(value: &str) -> String {
    escape_line_breaks(&value.replace('|', "\\|"))
}

/// Keep a value on one markdown line.
fn escape_line_breaks(value: &str) -> String {
    value
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}
