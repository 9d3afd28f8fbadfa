use anyhow::{Context, Result};
use std::io::{Stdout, Write};

use super::{Alert, Notifier};

/// Writes the alert message as one line.
pub struct ConsoleNotifier<W: Write + Send = Stdout> {
    out: W,
}

impl ConsoleNotifier<Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write + Send> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Notifier for ConsoleNotifier<W> {
    fn name(&self) -> &'static str {
        "console"
    }

    fn notify(&mut self, alert: &Alert) -> Result<()> {
        writeln!(self.out, "{}", alert.message).context("write alert to console")?;
        self.out.flush().context("flush console")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MOTION_MESSAGE;

    #[test]
    fn writes_one_line_per_alert() -> Result<()> {
        let alert = Alert {
            message: MOTION_MESSAGE.to_string(),
            cycle: 1,
            counter: 1,
            score: 510,
            unix_time_s: 0,
        };
        let mut console = ConsoleNotifier::new(Vec::new());
        console.notify(&alert)?;
        console.notify(&alert)?;
        let text = String::from_utf8(console.into_inner())?;
        assert_eq!(text, "MOTION DETECTED\nMOTION DETECTED\n");
        Ok(())
    }
}
