//! Interactive duplicate resolution for imports.

use log::warn;
use parking_lot::Mutex;
use promptlib_core::DuplicateResolver;
use promptlib_protocol::DuplicatePolicy;
use std::io::{self, BufRead, Write};

/// Asks once on a writer and reads a yes/no answer from a reader.
///
/// Anything but `y`/`yes` keeps the stored records.
pub struct PromptResolver<R, W> {
    io: Mutex<(R, W)>,
}

impl PromptResolver<io::StdinLock<'static>, io::Stderr> {
    /// Resolver reading stdin and prompting on stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }

    fn ask(&self, duplicate_ids: &[String]) -> io::Result<bool> {
        let mut guard = self.io.lock();
        let (reader, writer) = &mut *guard;
        writeln!(
            writer,
            "Found {} duplicate id(s): {}",
            duplicate_ids.len(),
            duplicate_ids.join(", ")
        )?;
        write!(writer, "Overwrite stored prompts with imported ones? [y/N] ")?;
        writer.flush()?;
        let mut answer = String::new();
        reader.read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

impl<R: BufRead, W: Write> DuplicateResolver for PromptResolver<R, W> {
    fn resolve(&self, duplicate_ids: &[String]) -> DuplicatePolicy {
        match self.ask(duplicate_ids) {
            Ok(true) => DuplicatePolicy::Overwrite,
            Ok(false) => DuplicatePolicy::Keep,
            Err(err) => {
                warn!("failed to read duplicate answer, keeping stored prompts: {err}");
                DuplicatePolicy::Keep
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn resolve(input: &str) -> (DuplicatePolicy, String) {
        let resolver = PromptResolver::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let policy = resolver.resolve(&["a".to_string(), "b".to_string()]);
        let (_, output) = resolver.io.into_inner();
        (policy, String::from_utf8(output).expect("utf8"))
    }

    #[test]
    fn yes_overwrites() {
        let (policy, output) = resolve("Y\n");
        assert_eq!(policy, DuplicatePolicy::Overwrite);
        assert!(output.contains("Found 2 duplicate id(s): a, b"));
        assert_eq!(resolve("yes\n").0, DuplicatePolicy::Overwrite);
    }

    #[test]
    fn anything_else_keeps() {
        assert_eq!(resolve("n\n").0, DuplicatePolicy::Keep);
        assert_eq!(resolve("\n").0, DuplicatePolicy::Keep);
        assert_eq!(resolve("").0, DuplicatePolicy::Keep);
    }
}
