use crate::comparator::ComparisonContext;
use crate::error::InputError;
use std::collections::VecDeque;
use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Token that closes the list of paths
pub const SENTINEL: &str = "~";

pub const ACCURACY_PROMPT: &str = "Accuracy: ";
pub const PATH_PROMPT: &str = "Path to image (enter the ~ to finish input of paths): ";

const BAD_ACCURACY: &str = "Failed: incorrect value of accuracy.";
const TOO_FEW_PATHS: &str = "Failed: total number of input images is less than 2.";
const BAD_PATH: &str = "Failed: incorrect path to the image.";

/// Fewest paths the sentinel will accept
pub const MIN_PATHS: usize = 2;

/// Similarity threshold in percent, 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Accuracy(u32);

impl Accuracy {
    pub const MAX: u32 = 100;

    pub fn new(value: u32) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidAccuracy;

impl FromStr for Accuracy {
    type Err = InvalidAccuracy;

    /// Only plain decimal digits are accepted: no sign, no whitespace
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidAccuracy);
        }
        token.parse::<u32>().ok().and_then(Self::new).ok_or(InvalidAccuracy)
    }
}

/// Whitespace-delimited tokens pulled lazily from a line reader
struct TokenReader<R> {
    reader: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> TokenReader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    /// `Ok(None)` once the reader is exhausted
    fn next_token(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending.extend(line.split_whitespace().map(str::to_owned));
        }
    }
}

/// Prompts for the threshold and the image paths, re-prompting on bad input
pub struct InputCollector<R, W> {
    tokens: TokenReader<R>,
    output: W,
}

impl<R: BufRead, W: Write> InputCollector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            tokens: TokenReader::new(input),
            output,
        }
    }

    /// Give the output stream back, e.g. to continue the session on it
    pub fn into_output(self) -> W {
        self.output
    }

    fn prompt(&mut self, text: &str, expected: &'static str) -> Result<String, InputError> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        self.tokens
            .next_token()?
            .ok_or(InputError::UnexpectedEof { expected })
    }

    pub fn read_accuracy(&mut self) -> Result<Accuracy, InputError> {
        loop {
            let token = self.prompt(ACCURACY_PROMPT, "an accuracy value")?;
            match token.parse::<Accuracy>() {
                Ok(accuracy) => return Ok(accuracy),
                Err(InvalidAccuracy) => {
                    tracing::debug!(%token, "rejected accuracy");
                    writeln!(self.output, "{BAD_ACCURACY}")?;
                }
            }
        }
    }

    /// Existing paths until the sentinel, at least [`MIN_PATHS`] of them
    pub fn read_paths(&mut self) -> Result<Vec<PathBuf>, InputError> {
        let mut paths = Vec::new();
        loop {
            let token = self.prompt(PATH_PROMPT, "an image path")?;
            if token == SENTINEL {
                if paths.len() >= MIN_PATHS {
                    return Ok(paths);
                }
                writeln!(self.output, "{TOO_FEW_PATHS}")?;
                continue;
            }
            if !Path::new(&token).exists() {
                tracing::debug!(%token, "rejected path");
                writeln!(self.output, "{BAD_PATH}")?;
                continue;
            }
            paths.push(PathBuf::from(token));
        }
    }

    /// Full prompt sequence: accuracy, a blank line, then paths
    pub fn collect(&mut self) -> Result<ComparisonContext, InputError> {
        let accuracy = self.read_accuracy()?;
        writeln!(self.output)?;
        let paths = self.read_paths()?;
        Ok(ComparisonContext { accuracy, paths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collector(input: &str) -> InputCollector<Cursor<Vec<u8>>, Vec<u8>> {
        InputCollector::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn transcript(c: InputCollector<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(c.into_output()).unwrap()
    }

    #[test]
    fn test_accuracy_parsing() {
        assert_eq!("0".parse::<Accuracy>(), Ok(Accuracy(0)));
        assert_eq!("100".parse::<Accuracy>(), Ok(Accuracy(100)));
        assert_eq!("007".parse::<Accuracy>(), Ok(Accuracy(7)));
        for bad in ["", "101", "-5", "+5", "4.5", "abc", "12a", "99999999999999999999"] {
            assert_eq!(bad.parse::<Accuracy>(), Err(InvalidAccuracy), "{bad:?}");
        }
    }

    #[test]
    fn test_invalid_accuracy_reprompts() {
        let mut c = collector("abc\n150 -1\n42\n");
        assert_eq!(c.read_accuracy().unwrap().get(), 42);
        let out = transcript(c);
        assert_eq!(out.matches(ACCURACY_PROMPT).count(), 4);
        assert_eq!(out.matches(BAD_ACCURACY).count(), 3);
    }

    #[test]
    fn test_tokens_split_on_whitespace() {
        let mut c = collector("  \n\t 55   77\n");
        assert_eq!(c.read_accuracy().unwrap().get(), 55);
        assert_eq!(c.read_accuracy().unwrap().get(), 77);
    }

    #[test]
    fn test_sentinel_rejected_until_two_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"x").unwrap();

        let input = format!("~\n{}\n~\n{}\n~\n", a.display(), b.display());
        let mut c = collector(&input);
        assert_eq!(c.read_paths().unwrap(), vec![a, b]);

        let out = transcript(c);
        assert_eq!(out.matches(TOO_FEW_PATHS).count(), 2);
        assert_eq!(out.matches(PATH_PROMPT).count(), 5);
    }

    #[test]
    fn test_missing_paths_not_added() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        std::fs::write(&a, b"x").unwrap();
        let missing = dir.path().join("nope.png");

        let input = format!("{}\n{}\n{}\n~\n", a.display(), missing.display(), dir.path().display());
        let mut c = collector(&input);
        let paths = c.read_paths().unwrap();
        assert_eq!(paths, vec![a, dir.path().to_path_buf()]);
        assert_eq!(transcript(c).matches(BAD_PATH).count(), 1);
    }

    #[test]
    fn test_collect_builds_context() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        std::fs::write(&a, b"x").unwrap();

        let input = format!("30\n{0}\n{0}\n~\n", a.display());
        let mut c = collector(&input);
        let ctx = c.collect().unwrap();
        assert_eq!(ctx.accuracy.get(), 30);
        assert_eq!(ctx.paths, vec![a.clone(), a]);
        assert!(transcript(c).starts_with("Accuracy: \nPath to image"));
    }

    #[test]
    fn test_end_of_input_is_an_error() {
        let mut c = collector("abc\n");
        assert!(matches!(
            c.read_accuracy(),
            Err(InputError::UnexpectedEof { expected: "an accuracy value" })
        ));

        let mut c = collector("");
        assert!(matches!(c.read_paths(), Err(InputError::UnexpectedEof { .. })));
    }
}
