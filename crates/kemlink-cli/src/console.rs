//! Console driver.
//!
//! Implements the [`Driver`] trait for a line-oriented terminal: commands are
//! read from an async line source, a one-second interval keeps countdowns
//! moving while the user is idle, and output is written line by line.

use std::io::{self, Write};

use kemlink_app::{App, AppAction, AppEvent, Driver, SystemEnv};
use kemlink_core::{Role, env::Environment, scheduler::TICK_PERIOD};
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin},
    time::{Interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::ui;

/// Console driver errors.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// I/O error reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Console driver implementing the [`Driver`] trait.
///
/// Generic over the line source and the output sink so tests can script a
/// session. Input ends on EOF, after which the runtime exits.
pub struct ConsoleDriver<R = BufReader<Stdin>, W = io::Stdout> {
    env: SystemEnv,
    lines: Lines<R>,
    out: W,
    ticker: Interval,
    input_closed: bool,
    last_seq: Option<u64>,
}

impl ConsoleDriver {
    /// Driver over the process's stdin and stdout.
    ///
    /// Must be called within a tokio runtime.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), io::stdout())
    }
}

impl<R, W> ConsoleDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Driver reading lines from `input` and writing to `out`.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(input: R, out: W) -> Self {
        let mut ticker = tokio::time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            env: SystemEnv::new(),
            lines: input.lines(),
            out,
            ticker,
            input_closed: false,
            last_seq: None,
        }
    }

    /// Output written so far.
    pub fn output(&self) -> &W {
        &self.out
    }

    fn write_lines(&mut self, lines: &[String]) -> Result<(), ConsoleError> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<R, W> Driver for ConsoleDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    type Error = ConsoleError;
    type Instant = std::time::Instant;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        tokio::select! {
            biased;

            line = self.lines.next_line(), if !self.input_closed => {
                match line? {
                    Some(line) => Ok(app.handle(AppEvent::Input(line))),
                    None => {
                        debug!("input closed");
                        self.input_closed = true;
                        Ok(vec![])
                    },
                }
            }

            _ = self.ticker.tick() => Ok(app.handle(AppEvent::Tick)),
        }
    }

    fn now(&self) -> Self::Instant {
        self.env.now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let Some(notification) = app.notification() else {
            return Ok(());
        };
        if self.last_seq == Some(notification.seq) {
            return Ok(());
        }
        self.last_seq = Some(notification.seq);

        let lines = ui::notification_lines(notification);
        self.write_lines(&lines)
    }

    fn show_help(&mut self) -> Result<(), Self::Error> {
        let mut lines = vec!["Commands:".to_string()];
        lines.extend(ui::help_lines());
        self.write_lines(&lines)
    }

    fn show_status(&mut self, app: &App) -> Result<(), Self::Error> {
        let lines: Vec<_> =
            Role::ALL.iter().flat_map(|role| ui::panel_lines(app.panel(*role))).collect();
        self.write_lines(&lines)
    }

    fn stop(&mut self) {
        if let Err(error) = self.out.flush() {
            warn!(%error, "failed to flush console output");
        }
    }

    fn is_finished(&self) -> bool {
        self.input_closed
    }
}
