use std::collections::VecDeque;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// I/O port the syscalls talk to. End of input is reported as `Ok(None)`.
pub trait Console {
    fn write_str(&mut self, s: &str) -> io::Result<()>;

    /// Next line of input without its terminator.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Next character of input, line terminators included.
    fn read_char(&mut self) -> io::Result<Option<char>>;
}

/// Line-buffered console over any reader/writer pair.
///
/// `read_char` pulls a whole line and hands it out one character at a time, the way
/// a terminal in cooked mode delivers input. A `read_line` after a partial
/// `read_char` returns the rest of that line.
pub struct IoConsole<R, W> {
    input: R,
    output: W,
    pending: VecDeque<char>,
}

impl IoConsole<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> IoConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            pending: VecDeque::new(),
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Invalid UTF-8 decodes to U+FFFD instead of failing.
    fn next_raw_line(&mut self) -> io::Result<Option<String>> {
        let mut bytes = Vec::new();
        if self.input.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

fn strip_terminator(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

impl<R: BufRead, W: Write> Console for IoConsole<R, W> {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.output.write_all(s.as_bytes())?;
        self.output.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        if !self.pending.is_empty() {
            let rest: String = self.pending.drain(..).collect();
            return Ok(Some(strip_terminator(rest)));
        }
        Ok(self.next_raw_line()?.map(strip_terminator))
    }

    fn read_char(&mut self) -> io::Result<Option<char>> {
        if self.pending.is_empty() {
            match self.next_raw_line()? {
                Some(line) => self.pending.extend(line.chars()),
                None => return Ok(None),
            }
        }
        Ok(self.pending.pop_front())
    }
}
