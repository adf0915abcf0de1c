use chrono::{Days, NaiveDate};

/// Structured search filters, compiled into a single Gmail query string.
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub sender: Option<String>,
    pub subject: Option<String>,
    /// Date in `YYYY/MM/DD` (or `YYYY-MM-DD`, normalized during resolve).
    pub after: Option<String>,
    pub before: Option<String>,
    /// Free-form query fragment, appended verbatim.
    pub query: Option<String>,
    /// Relative day count; resolved to an absolute `after` date.
    pub days: Option<u64>,
}

impl SearchCriteria {
    /// Resolve relative/loosely-formatted fields against `today`: a day count
    /// overrides `after`, and dates are normalized to Gmail's `/` separator.
    pub fn resolve(mut self, today: NaiveDate) -> Self {
        if let Some(days) = self.days.take() {
            let from = today
                .checked_sub_days(Days::new(days))
                .unwrap_or(NaiveDate::MIN);
            self.after = Some(from.format("%Y/%m/%d").to_string());
        }
        self.after = self.after.map(|d| d.replace('-', "/"));
        self.before = self.before.map(|d| d.replace('-', "/"));
        self
    }

    /// Compile into one query string; empty when no criteria were supplied.
    /// An empty result means an unscoped full-mailbox fetch — callers must
    /// require explicit confirmation before running with it.
    pub fn compile(&self) -> String {
        let mut clauses = Vec::new();

        if let Some(sender) = &self.sender {
            // Gmail has no wildcard syntax; strip the markers and match exact.
            if sender.contains('*') || sender.contains('?') {
                let cleaned: String = sender.chars().filter(|c| *c != '*' && *c != '?').collect();
                clauses.push(format!("from:{cleaned}"));
            } else {
                clauses.push(format!("from:{sender}"));
            }
        }

        if let Some(subject) = &self.subject {
            // Avoid nesting quotes if the caller already quoted something.
            if subject.contains('"') {
                clauses.push(format!("subject:{subject}"));
            } else {
                clauses.push(format!("subject:\"{subject}\""));
            }
        }

        if let Some(after) = &self.after {
            clauses.push(format!("after:{after}"));
        }

        if let Some(before) = &self.before {
            clauses.push(format!("before:{before}"));
        }

        if let Some(query) = &self.query {
            clauses.push(query.clone());
        }

        clauses.join(" ")
    }
}
