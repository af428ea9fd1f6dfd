use anyhow::{Context, Result};
use log::debug;

use std::io::{BufRead, Write};

use crate::config::MachineConfig;
use crate::error::{SessionError, ValidationError};
use crate::session::{Command, Session, SessionState, SessionSummary, SpinReport, Wager};
use crate::slots::Reels;

/// Digits only, like a typed dollar amount.
pub fn parse_amount(input: &str) -> Result<u64, ValidationError> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::NotANumber);
    }
    input.parse().map_err(|_| ValidationError::NotANumber)
}

pub struct Console<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> Console<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Console { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> O {
        self.output
    }

    /// `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush().context("flushing prompt")?;
        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("reading input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Re-asks until `check` accepts the parsed amount.
    fn ask_amount<F>(&mut self, prompt: &str, check: F) -> Result<Option<u64>>
    where
        F: Fn(u64) -> Result<(), ValidationError>,
    {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            match parse_amount(&answer).and_then(|amount| check(amount).map(|()| amount)) {
                Ok(amount) => return Ok(Some(amount)),
                Err(why) => writeln!(self.output, "{}", why)?,
            }
        }
    }

    pub fn deposit(&mut self) -> Result<Option<u64>> {
        self.ask_amount("What would you like to deposit? $", |amount| {
            if amount == 0 {
                Err(ValidationError::NotPositive)
            } else {
                Ok(())
            }
        })
    }

    /// Lines are asked once; the bet is re-asked until the balance covers it.
    pub fn wager<R: Reels>(&mut self, session: &Session<R>) -> Result<Option<Wager>> {
        let prompt = format!(
            "Enter the number of lines to bet on (1-{})? ",
            session.config().max_lines
        );
        let Some(lines) = self.ask_amount(&prompt, |n| session.validate_lines(n as usize))? else {
            return Ok(None);
        };
        let lines = lines as usize;
        let Some(bet_per_line) = self.ask_amount("What would you like to bet on each line? $", |bet| {
            session.validate_wager(&Wager {
                lines,
                bet_per_line: bet,
            })
        })?
        else {
            return Ok(None);
        };
        Ok(Some(Wager {
            lines,
            bet_per_line,
        }))
    }

    pub fn render(&mut self, report: &SpinReport) -> Result<()> {
        writeln!(
            self.output,
            "You are betting ${} on {} lines. Total bet is equal to: ${}",
            report.wager.bet_per_line,
            report.wager.lines,
            report.wager.total()
        )?;
        writeln!(self.output, "{}", report.grid)?;
        writeln!(self.output, "You won ${}.", report.outcome.winnings)?;
        write!(self.output, "You won on lines:")?;
        for line in &report.outcome.winning_lines {
            write!(self.output, " {}", line)?;
        }
        writeln!(self.output)?;
        Ok(())
    }

    /// Plays until the player quits, input runs out, or the balance can no
    /// longer cover the minimum bet.
    pub fn run<R: Reels>(&mut self, config: MachineConfig, reels: R) -> Result<SessionSummary> {
        let Some(deposit) = self.deposit()? else {
            return Ok(SessionSummary::default());
        };
        let mut session = Session::new(config, deposit, reels)?;

        loop {
            writeln!(self.output, "Current balance is ${}", session.balance())?;
            if session.balance() < session.config().min_bet {
                writeln!(self.output, "You do not have enough left to place a bet.")?;
                session.handle(Command::Quit)?;
                break;
            }

            let command = match self.ask("Press enter to play (q to quit).")? {
                Some(answer) if answer != "q" => match self.wager(&session)? {
                    Some(wager) => Command::PlaceBet(wager),
                    None => Command::Quit,
                },
                _ => Command::Quit,
            };
            match session.handle(command) {
                Ok(Some(report)) => self.render(&report)?,
                Ok(None) => {}
                Err(SessionError::Validation(why)) => {
                    debug!("wager bounced at the session: {}", why);
                    writeln!(self.output, "{}", why)?;
                }
                Err(SessionError::Configuration(why)) => {
                    return Err(why).context("machine configuration is broken");
                }
            }
            if session.state() == SessionState::Terminated {
                break;
            }
        }

        writeln!(self.output, "You left with ${}", session.balance())?;
        self.output.flush()?;
        Ok(session.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{single_row_config, FixedReels};
    use crate::slots::tests::grid;
    use std::io::Cursor;

    fn play<R: Reels>(input: &str, config: MachineConfig, reels: R) -> (SessionSummary, String) {
        let mut console = Console::new(Cursor::new(input.to_string()), Vec::new());
        let summary = console.run(config, reels).unwrap();
        let output = String::from_utf8(console.into_output()).unwrap();
        (summary, output)
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 42 \n"), Ok(42));
        assert_eq!(parse_amount("0"), Ok(0));
        assert_eq!(parse_amount("-3"), Err(ValidationError::NotANumber));
        assert_eq!(parse_amount("4.5"), Err(ValidationError::NotANumber));
        assert_eq!(parse_amount(""), Err(ValidationError::NotANumber));
        assert_eq!(
            parse_amount("99999999999999999999999"),
            Err(ValidationError::NotANumber)
        );
    }

    #[test]
    fn test_winning_session() {
        let reels = FixedReels::new(grid(&[&["C"], &["C"], &["C"]]));
        let (summary, output) = play("100\n\n1\n10\nq\n", single_row_config(), reels);
        assert_eq!(summary.final_balance, 120);
        assert_eq!(summary.spins, 1);
        assert!(output.contains("You are betting $10 on 1 lines. Total bet is equal to: $10"));
        assert!(output.contains("C | C | C\n"));
        assert!(output.contains("You won $30.\nYou won on lines: 1\n"));
        assert!(output.contains("Current balance is $120"));
        assert!(output.ends_with("You left with $120\n"));
    }

    #[test]
    fn test_reprompts_on_bad_input() {
        let reels = FixedReels::new(grid(&[&["A", "B", "C"], &["B", "C", "D"], &["C", "D", "A"]]));
        let (summary, output) = play(
            "abc\n0\n5\n\n5\n2\n0\n3\n2\nq\n",
            MachineConfig::default(),
            reels,
        );
        assert!(output.contains("Please enter a number."));
        assert!(output.contains("Amount must be greater than 0."));
        assert!(output.contains("Enter a valid number of lines."));
        assert!(output.contains("Amount must be between $1 - $100."));
        assert!(output.contains(
            "You do not have enough to bet that amount, your current balance is: $5"
        ));
        assert!(output.contains("You won $0.\nYou won on lines:\n"));
        assert_eq!(summary.total_wagered, 4);
        assert!(output.ends_with("You left with $1\n"));
    }

    #[test]
    fn test_end_of_input_quits() {
        let reels = FixedReels::new(grid(&[&["A"], &["A"], &["A"]]));
        let (summary, output) = play("100\n", MachineConfig::default(), reels);
        assert_eq!(summary.spins, 0);
        assert!(output.ends_with("You left with $100\n"));

        let reels = FixedReels::new(grid(&[&["A"], &["A"], &["A"]]));
        let (summary, output) = play("", MachineConfig::default(), reels);
        assert_eq!(summary, SessionSummary::default());
        assert!(!output.contains("You left with"));
    }

    #[test]
    fn test_huge_deposit_cannot_overflow() {
        let reels = FixedReels::new(grid(&[&["C"], &["C"], &["C"]]));
        let (summary, output) = play(
            "18446744073709551615\n\n1\n10\nq\n",
            single_row_config(),
            reels,
        );
        assert_eq!(summary.spins, 0);
        assert_eq!(summary.final_balance, u64::MAX);
        assert!(output.contains(
            "That bet could win more than the machine can hold, your current balance is: $18446744073709551615"
        ));
        assert!(output.ends_with("You left with $18446744073709551615\n"));
    }

    #[test]
    fn test_broken_paytable_aborts_run() {
        let reels = FixedReels::new(grid(&[&["Z"], &["Z"], &["Z"]]));
        let mut console = Console::new(Cursor::new("100\n\n1\n1\n".to_string()), Vec::new());
        let err = console.run(MachineConfig::default(), reels).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("machine configuration is broken"));
        assert!(message.contains("no value configured for symbol Z"));
        let output = String::from_utf8(console.into_output()).unwrap();
        assert!(!output.contains("You left with"));
    }

    #[test]
    fn test_broke_player_is_sent_home() {
        let reels = FixedReels::new(grid(&[&["A", "B", "C"], &["B", "C", "D"], &["C", "D", "A"]]));
        let (summary, output) = play("3\n\n3\n1\n", MachineConfig::default(), reels);
        assert_eq!(summary.final_balance, 0);
        assert!(output.contains("You do not have enough left to place a bet."));
        assert!(output.ends_with("You left with $0\n"));
    }
}
