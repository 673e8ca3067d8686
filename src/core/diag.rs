use std::collections::HashSet;

/// Deduplicating diagnostics sink.
///
/// Warnings carry a caller-supplied key; a key is never reported twice, so a
/// condition like an unresolvable import shows up once no matter how many
/// files trip over it. One instance is created per analysis run and passed
/// explicitly to everything that warns.
#[derive(Debug, Default)]
pub struct Warner {
    warned_about: HashSet<String>,
    buffer: Option<Vec<String>>,
}

impl Warner {
    /// Warner that prints to stderr.
    pub fn new() -> Self {
        Self {
            warned_about: HashSet::new(),
            buffer: None,
        }
    }

    /// Warner that collects messages in memory instead of printing.
    pub fn buffered() -> Self {
        Self {
            warned_about: HashSet::new(),
            buffer: Some(Vec::new()),
        }
    }

    /// Emit `message` unless something was already reported about `about`.
    pub fn warn(&mut self, about: &str, message: String) {
        if !self.warned_about.insert(about.to_string()) {
            return;
        }
        self.emit(message);
    }

    /// Per-occurrence informational note; never deduplicated.
    pub fn report(&mut self, message: String) {
        self.emit(message);
    }

    /// Messages collected so far; always empty for a stderr warner.
    pub fn messages(&self) -> &[String] {
        self.buffer.as_deref().unwrap_or(&[])
    }

    fn emit(&mut self, message: String) {
        match &mut self.buffer {
            Some(buffer) => buffer.push(message),
            None => eprintln!("{message}"),
        }
    }
}
