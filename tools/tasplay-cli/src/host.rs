//! Console host - prints what a game would receive

use std::io::Write;

use tasplay_core::{CommandError, Host, InputFrame};

/// Host that writes each applied frame to stdout
pub struct ConsoleHost {
    /// Print frames as they're applied
    pub echo: bool,
    pub restricted: bool,
    pub safe_mode: bool,
    /// Frames applied since creation
    pub applied: u64,
    out: std::io::Stdout,
}

impl ConsoleHost {
    pub fn new(echo: bool, restricted: bool) -> Self {
        Self {
            echo,
            restricted,
            safe_mode: true,
            applied: 0,
            out: std::io::stdout(),
        }
    }

    pub fn println(&mut self, line: impl std::fmt::Display) {
        // A closed stdout (e.g. piped into `head`) isn't worth failing over
        let _ = writeln!(self.out.lock(), "{line}");
    }
}

impl Host for ConsoleHost {
    fn apply_inputs(&mut self, frame: &InputFrame) {
        if self.echo {
            let tick = self.applied;
            let text = frame.text().trim_start().to_string();
            self.println(format_args!("{tick:>6}  {text}"));
        }
        self.applied += 1;
    }

    fn is_restricted_mode_enabled(&self) -> bool {
        self.restricted
    }

    fn set_safe_mode(&mut self, safe: bool) {
        tracing::info!("Safe mode {}", if safe { "on" } else { "off" });
        self.safe_mode = safe;
    }

    fn console(&mut self, args: &[String]) -> Result<(), CommandError> {
        self.println(format_args!("console: {}", args.join(" ")));
        Ok(())
    }
}
