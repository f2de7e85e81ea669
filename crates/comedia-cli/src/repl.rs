//! Line-oriented front end for the wizard.

use comedia_wizard::{
    AnalysisBackend, AnalysisId, Field, LineKey, ListFilter, NoticeLevel, Section, StoredAnalysis,
    WizardController, WizardEvent, WizardResult, WizardState,
};
use std::io::Write;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub(crate) const HELP: &str = "\
commands:
  next | back                    move between steps
  set <field> <value>            e.g. set titulo La comida de avión
  add <section> [text]           append a line to premisa|ruptura|remate
  edit <section> <key> <text>    replace the text of a line
  rm <section> <key>             remove a line
  show                           print the current step and inputs
  submit                         save the analysis (last step only)
  list [comediante]              stored analyses, optionally by comedian
  open <id> | delete <id>        edit or delete a stored analysis
  similar                        stored analyses sharing this draft's categories
  help | quit";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Next,
    Back,
    Set { field: Field, value: String },
    Add { section: Section, text: String },
    Edit { section: Section, key: LineKey, text: String },
    Remove { section: Section, key: LineKey },
    Show,
    Submit,
    List { comediante: Option<String> },
    Open(AnalysisId),
    Delete(AnalysisId),
    Similar,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum ParseError {
    #[error("unknown command {0:?}, try `help`")]
    Unknown(String),
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("unknown field {0:?}")]
    Field(String),
    #[error("unknown section {0:?}, expected premisa, ruptura or remate")]
    Section(String),
    #[error("line key must be a number, got {0:?}")]
    Key(String),
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

fn section(word: &str) -> Result<Section, ParseError> {
    if word.is_empty() {
        return Err(ParseError::Missing("section"));
    }
    Section::parse(word).ok_or_else(|| ParseError::Section(word.to_string()))
}

fn id(word: &str) -> Result<AnalysisId, ParseError> {
    if word.is_empty() {
        return Err(ParseError::Missing("analysis id"));
    }
    Ok(AnalysisId::new(word))
}

fn key(word: &str) -> Result<LineKey, ParseError> {
    if word.is_empty() {
        return Err(ParseError::Missing("line key"));
    }
    word.parse()
        .map(LineKey::from_index)
        .map_err(|_| ParseError::Key(word.to_string()))
}

/// Parse one input line; `Ok(None)` for blank input
pub(crate) fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let (verb, rest) = split_word(line);
    let command = match verb {
        "" => return Ok(None),
        "next" | "n" => Command::Next,
        "back" | "b" => Command::Back,
        "show" => Command::Show,
        "submit" => Command::Submit,
        "similar" => Command::Similar,
        "list" | "ls" => Command::List {
            comediante: Some(rest.trim_end().to_string()).filter(|name| !name.is_empty()),
        },
        "open" => Command::Open(id(split_word(rest).0)?),
        "delete" => Command::Delete(id(split_word(rest).0)?),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "set" => {
            let (name, value) = split_word(rest);
            if name.is_empty() {
                return Err(ParseError::Missing("field"));
            }
            let field =
                Field::from_wire_name(name).ok_or_else(|| ParseError::Field(name.to_string()))?;
            Command::Set {
                field,
                value: value.to_string(),
            }
        }
        "add" => {
            let (name, text) = split_word(rest);
            Command::Add {
                section: section(name)?,
                text: text.to_string(),
            }
        }
        "edit" => {
            let (name, rest) = split_word(rest);
            let section = section(name)?;
            let (raw_key, text) = split_word(rest);
            Command::Edit {
                section,
                key: key(raw_key)?,
                text: text.to_string(),
            }
        }
        "rm" | "remove" => {
            let (name, rest) = split_word(rest);
            let section = section(name)?;
            Command::Remove {
                section,
                key: key(split_word(rest).0)?,
            }
        }
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Text for a view event; `None` for events with no terminal counterpart
///
/// `Reset` depends on the state and is rendered by [`overview`].
pub(crate) fn render(event: &WizardEvent) -> Option<String> {
    match event {
        WizardEvent::ShowStep(step) => Some(format!("== {step} ==")),
        WizardEvent::Progress(percent) => Some(format!("progress {percent:.0}%")),
        WizardEvent::LineAdded { section, key, text } => {
            Some(format!("+ {section}[{key}] {text}"))
        }
        WizardEvent::LineRemoved { section, key } => Some(format!("- {section}[{key}]")),
        WizardEvent::SubmitPending => Some("saving...".to_string()),
        WizardEvent::Notice { level, message } => Some(match level {
            NoticeLevel::Success => format!("ok: {message}"),
            NoticeLevel::Error => format!("error: {message}"),
        }),
        WizardEvent::Reset
        | WizardEvent::HideStep(_)
        | WizardEvent::ScrollToTop
        | WizardEvent::SubmitSettled
        | WizardEvent::RefreshListing => None,
    }
}

/// Inputs belonging to the current step
pub(crate) fn describe(state: &WizardState) -> String {
    let step = state.current_step();
    let mut out = format!("{step}");
    if let Some(section) = Section::ALL.into_iter().find(|s| s.step() == step) {
        for (key, text) in state.lines(section).live() {
            out.push_str(&format!("\n  {section}[{key}] {text}"));
        }
    }
    for field in Field::ALL.into_iter().filter(|f| f.step() == step) {
        out.push_str(&format!("\n  {} = {:?}", field.wire_name(), state.field(field)));
    }
    if let Some(id) = state.editing() {
        out.push_str(&format!("\n  (editing {id})"));
    }
    out
}

/// Everything entered so far, shown after a full reset
pub(crate) fn overview(state: &WizardState) -> String {
    let mut out = match state.editing() {
        Some(id) => format!("-- editing {id} --"),
        None => "-- new analysis --".to_string(),
    };
    for field in Field::ALL {
        let value = state.field(field);
        if !value.is_empty() {
            out.push_str(&format!("\n  {} = {value:?}", field.wire_name()));
        }
    }
    for section in Section::ALL {
        for (key, text) in state.lines(section).live() {
            if !text.is_empty() {
                out.push_str(&format!("\n  {section}[{key}] {text}"));
            }
        }
    }
    out
}

/// One line per stored analysis
pub(crate) fn listing(analyses: &[StoredAnalysis]) -> String {
    if analyses.is_empty() {
        return "no analyses".to_string();
    }
    analyses
        .iter()
        .map(|stored| {
            format!(
                "{}  {} ({})",
                stored.id, stored.record.titulo, stored.record.comediante
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn flush<B, W>(wizard: &mut WizardController<B>, out: &mut W) -> std::io::Result<()>
where
    B: AnalysisBackend,
    W: Write,
{
    for event in wizard.drain_events() {
        let line = match event {
            WizardEvent::Reset => Some(overview(wizard.state())),
            other => render(&other),
        };
        if let Some(line) = line {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

/// Run one wizard command, returning text to print
async fn execute<B>(
    wizard: &mut WizardController<B>,
    command: Command,
) -> WizardResult<Option<String>>
where
    B: AnalysisBackend,
{
    let output = match command {
        Command::Next => {
            wizard.advance()?;
            None
        }
        Command::Back => {
            wizard.retreat();
            None
        }
        Command::Set { field, value } => {
            wizard.set_field(field, value);
            None
        }
        Command::Add { section, text } => {
            wizard.add_line(section, text);
            None
        }
        Command::Edit { section, key, text } => {
            wizard.edit_line(section, key, text)?;
            None
        }
        Command::Remove { section, key } => {
            wizard.remove_line(section, key)?;
            None
        }
        Command::Submit => Some(format!("saved as {}", wizard.submit().await?)),
        Command::List { comediante } => {
            let filter = ListFilter {
                comediante,
                ..ListFilter::default()
            };
            Some(listing(&wizard.listing(&filter).await?))
        }
        Command::Open(id) => {
            wizard.load_for_edit(id).await?;
            None
        }
        Command::Delete(id) => {
            wizard.delete(&id).await?;
            None
        }
        Command::Similar => Some(listing(&wizard.similar().await?)),
        Command::Show => Some(describe(wizard.state())),
        Command::Help => Some(HELP.to_string()),
        Command::Quit => None,
    };
    Ok(output)
}

/// Drive `wizard` from `input` until `quit` or end of input
///
/// Returns the number of analyses saved.
pub(crate) async fn run<B, R, W>(
    wizard: &mut WizardController<B>,
    input: R,
    out: &mut W,
) -> anyhow::Result<usize>
where
    B: AnalysisBackend,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut saved = 0;
    let mut lines = input.lines();
    flush(wizard, out)?;

    while let Some(line) = lines.next_line().await? {
        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "error: {err}")?;
                continue;
            }
        };
        tracing::debug!(?command, "wizard command");
        if command == Command::Quit {
            break;
        }

        let submitting = command == Command::Submit;
        match execute(wizard, command).await {
            Ok(output) => {
                if submitting {
                    saved += 1;
                }
                if let Some(output) = output {
                    writeln!(out, "{output}")?;
                }
            }
            // Notified errors are printed with the other events below
            Err(err) if err.is_notified() => {}
            Err(err) => writeln!(out, "error: {err}")?,
        }
        flush(wizard, out)?;
    }
    Ok(saved)
}
