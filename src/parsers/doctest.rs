/// A single interactive example lifted out of a docstring.
///
/// `lineno` is the 0-based line of the first `>>>` prompt, counted from the
/// start of the docstring (line 0 is the text right after the opening
/// quotes), so callers can map it back onto real file lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctestExample {
    pub source: String,
    pub lineno: usize,
}

const PS1: &str = ">>>";
const PS2: &str = "...";

/// Scan a docstring for doctest blocks and return their source snippets.
///
/// A block starts at a `>>>` prompt line and continues over `...` lines at
/// the same indentation. Expected-output lines between blocks are skipped;
/// they never contribute source.
pub fn parse_examples(docstring: &str) -> Vec<DoctestExample> {
    let lines: Vec<&str> = docstring.split('\n').collect();
    let mut examples = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_start();
        if !is_prompt(trimmed, PS1) {
            i += 1;
            continue;
        }

        let indent = &line[..line.len() - trimmed.len()];
        let start = i;
        let mut source = String::new();
        push_source_line(&mut source, trimmed, PS1);
        i += 1;

        while i < lines.len() {
            let line = lines[i];
            let Some(rest) = line.strip_prefix(indent) else {
                break;
            };
            if is_prompt(rest, PS2) {
                push_source_line(&mut source, rest, PS2);
                i += 1;
            } else {
                break;
            }
        }

        examples.push(DoctestExample {
            source,
            lineno: start,
        });
    }

    examples
}

fn is_prompt(line: &str, prompt: &str) -> bool {
    match line.strip_prefix(prompt) {
        Some(rest) => rest.is_empty() || rest.starts_with(' '),
        None => false,
    }
}

fn push_source_line(source: &mut String, line: &str, prompt: &str) {
    let rest = line.strip_prefix(prompt).unwrap_or("");
    source.push_str(rest.strip_prefix(' ').unwrap_or(rest));
    source.push('\n');
}
