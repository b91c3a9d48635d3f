// REPL implementation using editline
//
// Lines starting with ':' are meta-commands; everything else is compiled in
// the current notation and run against the session's calculator.

use editline::{LineEditor, terminals::StdioTerminal};
use log::debug;
use polycalc_core::{Calculator, Error, Notation, State};
use std::io::Write;

use crate::{format_stack, report_error};

const META_HELP: &str = "\
:infix :prefix :postfix   switch notation
:stack                    show the stack
:clear                    clear the stack
:words                    list defined symbols
:help <name>              documentation for a symbol
:quit                     exit";

#[derive(Debug, PartialEq)]
enum Command {
    Notation(Notation),
    Stack,
    Clear,
    Words,
    Help(Option<String>),
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or(":");
    let argument = words.next().map(str::to_string);

    match name {
        ":infix" => Ok(Command::Notation(Notation::Infix)),
        ":prefix" => Ok(Command::Notation(Notation::Prefix)),
        ":postfix" => Ok(Command::Notation(Notation::Postfix)),
        ":stack" => Ok(Command::Stack),
        ":clear" => Ok(Command::Clear),
        ":words" => Ok(Command::Words),
        ":help" => Ok(Command::Help(argument)),
        ":quit" | ":q" => Ok(Command::Quit),
        other => Err(format!("unknown command '{}', try :help", other)),
    }
}

pub(crate) struct Session {
    calc: Calculator,
    notation: Notation,
    show_code: bool,
}

impl Session {
    pub(crate) fn new(calc: Calculator, notation: Notation, show_code: bool) -> Self {
        Self {
            calc,
            notation,
            show_code,
        }
    }

    /// Runs a meta-command. Returns false when the session should end.
    fn command(&mut self, command: Command) -> bool {
        match command {
            Command::Notation(notation) => {
                self.notation = notation;
                println!("Notation: {}", notation);
            }
            Command::Stack => self.print_stack(),
            Command::Clear => self.calc.reset(),
            Command::Words => {
                let names: Vec<&str> = self.calc.engine().environment().names().collect();
                println!("{}", names.join(" "));
            }
            Command::Help(None) => println!("{}", META_HELP),
            Command::Help(Some(name)) => match self.calc.engine().environment().doc(&name) {
                Some(doc) => println!("{}", doc),
                None => println!("No documentation for '{}'", name),
            },
            Command::Quit => return false,
        }
        true
    }

    fn evaluate(&mut self, source: &str) -> Result<(), Error> {
        let executable = self.calc.compile(source, self.notation)?;
        if self.show_code {
            println!("Code: {}", executable);
        }
        self.calc.execute(&executable)?;
        Ok(())
    }

    /// Handles one input line. Returns false when the session should end.
    pub(crate) fn handle_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return true;
        }
        if trimmed.starts_with(':') {
            return match parse_command(trimmed) {
                Ok(command) => self.command(command),
                Err(message) => {
                    eprintln!("{}", message);
                    true
                }
            };
        }

        match self.evaluate(trimmed) {
            Ok(()) => self.print_stack(),
            Err(err) => {
                report_error(&err);
                if self.calc.state() == State::Faulted {
                    debug!("resetting faulted calculator");
                    self.calc.reset();
                    eprintln!("Stack cleared");
                }
            }
        }
        true
    }

    fn print_stack(&self) {
        if self.calc.stack_size() > 0 {
            println!("Stack: {}", format_stack(&self.calc));
        }
    }
}

pub fn run_repl(calc: Calculator, notation: Notation, show_code: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("polycalc v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Type `:quit` or press Ctrl-D to exit");
    println!("Type `:help` for commands, `:help <name>` for a symbol");
    println!();

    let mut session = Session::new(calc, notation, show_code);
    let mut editor = LineEditor::new(1024, 50);
    let mut terminal = StdioTerminal::new();

    loop {
        print!("\n{}> ", session.notation);
        std::io::stdout().flush()?;

        match editor.read_line(&mut terminal) {
            Ok(line) => {
                if !session.handle_line(&line) {
                    break;
                }
            }
            Err(editline::Error::Eof) => {
                // EOF (Ctrl-D)
                println!("\nGoodbye!");
                break;
            }
            Err(editline::Error::Interrupted) => {
                // Ctrl-C - just continue
                println!("^C");
                continue;
            }
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycalc_core::standard_engine;
    use std::sync::Arc;

    fn session(notation: Notation) -> Session {
        let calc = Calculator::new(Arc::new(standard_engine().unwrap()));
        Session::new(calc, notation, false)
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command(":postfix"), Ok(Command::Notation(Notation::Postfix)));
        assert_eq!(parse_command(":help sqrt"), Ok(Command::Help(Some("sqrt".to_string()))));
        assert_eq!(parse_command(":help"), Ok(Command::Help(None)));
        assert!(parse_command(":frobnicate").is_err());
    }

    #[test]
    fn test_lines_accumulate_on_stack() {
        let mut session = session(Notation::Postfix);
        assert!(session.handle_line("1 2"));
        assert!(session.handle_line("+"));
        assert_eq!(format_stack(&session.calc), "3");
    }

    #[test]
    fn test_notation_switch() {
        let mut session = session(Notation::Infix);
        session.handle_line(":prefix");
        session.handle_line("+ 1 2");
        assert_eq!(format_stack(&session.calc), "3");
    }

    #[test]
    fn test_fault_resets() {
        let mut session = session(Notation::Postfix);
        session.handle_line("1 \"a\" -");
        assert_eq!(session.calc.state(), State::Idle);
        assert_eq!(session.calc.stack_size(), 0);
        session.handle_line("2");
        assert_eq!(format_stack(&session.calc), "2");
    }

    #[test]
    fn test_quit() {
        let mut session = session(Notation::Infix);
        assert!(!session.handle_line(":quit"));
    }
}
