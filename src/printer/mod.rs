//! Terminal output for responses (owo-colors).

use std::fmt::Debug;

use owo_colors::OwoColorize;

use crate::response::Response;

pub struct StatusPrinter {
    pub color: bool,
}

impl Default for StatusPrinter {
    fn default() -> Self {
        use is_terminal::IsTerminal;
        Self { color: std::io::stdout().is_terminal() }
    }
}

impl StatusPrinter {
    pub fn plain() -> Self {
        Self { color: false }
    }

    /// One-line summary: `ok 0.001234s 30` or `failed 0.000010s panic: ...`.
    pub fn render<T: Debug>(&self, response: &Response<T>) -> String {
        let elapsed = format!("{:.6}s", response.execution_time());
        match (response.result(), response.error()) {
            (Some(value), _) => {
                let status = if self.color { "ok".green().bold().to_string() } else { "ok".to_string() };
                format!("{status} {elapsed} {value:?}")
            }
            (None, Some(err)) => {
                let status = if self.color { "failed".red().bold().to_string() } else { "failed".to_string() };
                let detail = if self.color { err.to_string().red().to_string() } else { err.to_string() };
                format!("{status} {elapsed} {detail}")
            }
            (None, None) => elapsed,
        }
    }

    pub fn print<T: Debug>(&self, response: &Response<T>) {
        println!("{}", self.render(response));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_success_and_failure() {
        let printer = StatusPrinter::plain();
        let ok = Response::call(|| 30);
        assert!(printer.render(&ok).starts_with("ok "));
        assert!(printer.render(&ok).ends_with(" 30"));

        let failed = Response::<i32>::execute(|| Err("bad input"));
        let line = printer.render(&failed);
        assert!(line.starts_with("failed "));
        assert!(line.ends_with("str: bad input"));
    }

    #[test]
    fn colored_output_has_escape_codes() {
        let printer = StatusPrinter { color: true };
        let ok = Response::call(|| "x");
        assert!(printer.render(&ok).contains("\u{1b}["));
    }
}
