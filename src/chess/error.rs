use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }
}

/// A tag, clock annotation or move marker that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
    pub line: Option<usize>,
}

impl FormatError {
    pub fn new(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            field,
            value: value.to_string(),
            reason: reason.into(),
            line: None,
        }
    }

    /// Attaches the input line number unless one is already set.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line.get_or_insert(line);
        self
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {}: ", line)?;
        }
        write!(
            f,
            "Format error: {}='{}' ({})",
            self.field, self.value, self.reason
        )
    }
}

impl Error for FormatError {}

#[derive(Debug)]
pub enum PipelineError {
    Format { source: String, error: FormatError },
    Io {
        source: String,
        line: usize,
        error: io::Error,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format { source, error } => write!(f, "file='{}'; {}", source, error),
            Self::Io {
                source,
                line,
                error,
            } => write!(
                f,
                "file='{}'; read failed after line {}: {}",
                source, line, error
            ),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format { error, .. } => Some(error),
            Self::Io { error, .. } => Some(error),
        }
    }
}
