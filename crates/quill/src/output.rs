//! Colored status lines on stderr.
//!
//! Stdout is reserved for rendered HTML.

use console::{Style, Term};

pub(crate) struct Output {
    term: Term,
    ok: Style,
    warn: Style,
    fail: Style,
    muted: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red().bold(),
            muted: Style::new().dim(),
        }
    }

    /// Write one line; a closed or broken stderr is ignored.
    fn line(&self, style: Option<&Style>, msg: &str) {
        let text = match style {
            Some(style) => style.apply_to(msg).to_string(),
            None => msg.to_owned(),
        };
        let _ = self.term.write_line(&text);
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(None, msg);
    }

    pub(crate) fn detail(&self, msg: &str) {
        self.line(Some(&self.muted), msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(Some(&self.ok), msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(Some(&self.warn), msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(Some(&self.fail), msg);
    }
}
