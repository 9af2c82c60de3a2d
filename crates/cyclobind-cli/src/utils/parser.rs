use cyclobind::engine::bridge::BridgeCommand;
use cyclobind::engine::config::MAX_MODELS;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid number of models '{0}'. Expected 1 to 5 or 'all'.")]
    InvalidModelCount(String),

    #[error("Engine command cannot be empty.")]
    EmptyEngineCommand,

    #[error("Unterminated quote in engine command '{0}'.")]
    UnterminatedQuote(String),
}

/// Parses `"1"`..`"5"` or `"all"` into a model count.
pub fn parse_num_models(value: &str) -> Result<usize, ParseError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(MAX_MODELS);
    }
    match trimmed.parse::<usize>() {
        Ok(n) if (1..=MAX_MODELS).contains(&n) => Ok(n),
        _ => Err(ParseError::InvalidModelCount(value.to_string())),
    }
}

/// Splits a shell-like command line into program and arguments.
///
/// Words are separated by whitespace; single or double quotes group a word.
pub fn parse_engine_command(value: &str) -> Result<BridgeCommand, ParseError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in value.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        return Err(ParseError::UnterminatedQuote(value.to_string()));
    }
    if in_word {
        words.push(current);
    }

    let mut words = words.into_iter();
    let program = words.next().ok_or(ParseError::EmptyEngineCommand)?;
    Ok(BridgeCommand {
        program,
        args: words.collect(),
    })
}
