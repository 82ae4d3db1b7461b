use std::io::{self, BufRead, Write};

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::AdvisorConfig;
use crate::engine::{Engine, Reply, TurnEvent};
use crate::parse::Command;
use crate::session::{Session, SessionSummary};

/// Console front end: one stdin line per turn, the reply on stdout.
pub struct Advisor {
    config: AdvisorConfig,
    engine: Engine,
    session: Session,
}

impl Advisor {
    pub fn new(config: AdvisorConfig) -> Self {
        let engine = Engine::new(config.engine.clone());
        let session = engine.new_session();
        Self {
            config,
            engine,
            session,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Reads until end of input or `q`.
    pub fn run_with<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> Result<()> {
        let mut line = String::new();
        self.print_banner(&mut out)?;

        loop {
            self.print_prompt(&mut out)?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("q") {
                break;
            }

            let reply = self.engine.handle(&mut self.session, trimmed);
            self.print_reply(&mut out, &reply)?;
        }

        if self.session.initial_bankroll.is_some() {
            self.print_summary(&mut out, &self.session.summary())?;
        }
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn print_banner<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let start = self.engine.config().commands.word(Command::Start);
        if self.config.no_color {
            writeln!(out, "Baccarat advisor. Send \"{start}\" to begin, q to quit.")
        } else {
            writeln!(
                out,
                "{} Send \"{}\" to begin, q to quit.",
                "Baccarat advisor.".bold().cyan(),
                start.bold().yellow()
            )
        }
    }

    fn print_prompt<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.config.no_color {
            write!(out, "> ")?;
        } else {
            write!(out, "{} ", ">".bold().green())?;
        }
        out.flush()
    }

    fn print_reply<W: Write>(&self, out: &mut W, reply: &Reply) -> io::Result<()> {
        if self.config.no_color {
            return writeln!(out, "{}", reply.text);
        }
        match &reply.event {
            TurnEvent::Rejected(_) => writeln!(out, "{}", reply.text.red()),
            TurnEvent::Ended(_) => writeln!(out, "{}", reply.text.bold().magenta()),
            TurnEvent::Settled(report) if report.ruined => {
                writeln!(out, "{}", reply.text.bold().red())
            }
            _ => writeln!(out, "{}", reply.text),
        }
    }

    pub fn print_summary<W: Write>(&self, out: &mut W, summary: &SessionSummary) -> io::Result<()> {
        if self.config.no_color {
            writeln!(
                out,
                "Summary: rounds={}, final={:.2}, net={:.2}",
                summary.rounds, summary.final_bankroll, summary.net
            )
        } else {
            writeln!(
                out,
                "{} {} {} {:.2} {} {:.2}",
                "Summary".bold().magenta(),
                summary.rounds,
                "Final".bold().white(),
                summary.final_bankroll,
                "Net".bold().white(),
                summary.net
            )
        }
    }
}
