//! User-facing progress output.

use std::fmt::Display;
use std::io::Write;

/// The writers a run reports to.
///
/// Progress text is best effort: a closed pipe must not change the task's
/// outcome, so write failures are ignored.
pub struct Console<'a> {
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
}

impl<'a> Console<'a> {
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write) -> Self {
        Self { out, err }
    }

    /// Write `text` to the output writer without a newline.
    pub fn print(&mut self, text: impl Display) {
        let _ = write!(self.out, "{}", text);
        let _ = self.out.flush();
    }

    /// Write a line to the output writer.
    pub fn line(&mut self, text: impl Display) {
        let _ = writeln!(self.out, "{}", text);
    }

    /// Write a line to the error writer.
    pub fn warn(&mut self, text: impl Display) {
        let _ = writeln!(self.err, "{}", text);
    }

    /// Both writers, for streaming task output.
    pub fn streams(&mut self) -> (&mut (dyn Write + 'a), &mut (dyn Write + 'a)) {
        (&mut *self.out, &mut *self.err)
    }
}
