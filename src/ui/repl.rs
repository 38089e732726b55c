//! Line-oriented terminal front end.
//!
//! Every line the user enters is relayed and saved as its own
//! conversation. `exit` and `history` are reserved, case-insensitively.

use std::io::{self, BufRead, Write};

use crate::core::conversation::Conversation;
use crate::core::relay::Exchange;
use crate::core::session::ChatSession;

pub const WELCOME_BANNER: &str = "Welcome to the AI Chatbot! Type 'exit' to end the conversation or 'history' to view chat history.";
pub const NO_HISTORY: &str = "No chat history available.";
const PROMPT: &str = "You: ";

enum Command<'a> {
    Exit,
    History,
    Message(&'a str),
    Blank,
}

fn parse_line(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Command::Blank
    } else if trimmed.eq_ignore_ascii_case("exit") {
        Command::Exit
    } else if trimmed.eq_ignore_ascii_case("history") {
        Command::History
    } else {
        Command::Message(trimmed)
    }
}

/// Run the REPL until `exit` or end of input.
pub async fn run_repl<R, W>(session: &mut ChatSession, input: R, output: &mut W) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{WELCOME_BANNER}")?;
    let label_a = session.engine().label_a().to_string();
    let label_b = session.engine().label_b().to_string();
    let mut lines = input.lines();

    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let Some(line) = lines.next().transpose()? else {
            writeln!(output)?;
            writeln!(output, "Goodbye!")?;
            return Ok(());
        };

        match parse_line(&line) {
            Command::Blank => continue,
            Command::Exit => {
                writeln!(output, "Goodbye!")?;
                return Ok(());
            }
            Command::History => print_history(session, output)?,
            Command::Message(message) => {
                session.start_new_chat();
                let mut written: io::Result<()> = Ok(());
                let report = session
                    .send(message, |exchange| {
                        if written.is_ok() {
                            written = write_exchange(output, &label_a, &label_b, exchange);
                        }
                    })
                    .await;
                written?;

                if let Some(Err(err)) = report.map(|report| report.saved) {
                    eprintln!("Failed to save conversation: {err}");
                }
            }
        }
    }
}

fn write_exchange<W: Write>(
    output: &mut W,
    label_a: &str,
    label_b: &str,
    exchange: &Exchange,
) -> io::Result<()> {
    writeln!(
        output,
        "{label_a} (Iteration {}):\n{}",
        exchange.iteration, exchange.response_a
    )?;
    writeln!(
        output,
        "{label_b} (Iteration {}):\n{}",
        exchange.iteration, exchange.response_b
    )?;
    output.flush()
}

/// Print every stored turn, or a notice when there are none. A store that
/// cannot be read is reported on stderr.
pub fn print_history<W: Write>(session: &ChatSession, output: &mut W) -> io::Result<()> {
    match session.conversations() {
        Ok(conversations) => write_history(
            output,
            session.engine().label_a(),
            session.engine().label_b(),
            &conversations,
        ),
        Err(err) => {
            eprintln!("Failed to load chat history: {err}");
            Ok(())
        }
    }
}

pub fn write_history<W: Write>(
    output: &mut W,
    label_a: &str,
    label_b: &str,
    conversations: &[Conversation],
) -> io::Result<()> {
    if conversations.iter().all(|c| c.turns.is_empty()) {
        return writeln!(output, "{NO_HISTORY}");
    }
    for turn in conversations.iter().flat_map(|c| &c.turns) {
        writeln!(output, "User: {}", turn.user_input)?;
        writeln!(output, "{label_a}: {}", turn.response_a)?;
        writeln!(output, "{label_b}: {}", turn.response_b)?;
    }
    Ok(())
}
