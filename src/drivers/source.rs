use std::collections::VecDeque;
use std::fmt;
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use crate::drivers::SweepError;
/// Why a sweep source stopped producing lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceEnd {
    /// End of stream, or the process exited with status 0.
    Finished,
    /// The process exited with a failure status.
    Exited { code: Option<i32> },
    /// Reading from the source failed.
    Failed(String),
    /// `stop()` was requested.
    Cancelled,
}
impl fmt::Display for SourceEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceEnd::Finished => write!(f, "source finished"),
            SourceEnd::Exited { code: Some(code) } => write!(f, "source exited with code {code}"),
            SourceEnd::Exited { code: None } => write!(f, "source killed by signal"),
            SourceEnd::Failed(reason) => write!(f, "source failed: {reason}"),
            SourceEnd::Cancelled => write!(f, "source stopped"),
        }
    }
}
/// Result of one read attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceRead {
    Line(String),
    /// Nothing available yet; the source is still alive.
    Idle,
    End(SourceEnd),
}
/// Anything that yields sweep records line by line.
pub trait SweepSource {
    fn read_line(&mut self) -> Result<SourceRead, SweepError>;
    /// Release the underlying handle. Called once by the producer on exit.
    fn shutdown(&mut self) {}
    fn describe(&self) -> String;
}
impl<S: SweepSource + ?Sized> SweepSource for Box<S> {
    fn read_line(&mut self) -> Result<SourceRead, SweepError> {
        (**self).read_line()
    }
    fn shutdown(&mut self) {
        (**self).shutdown()
    }
    fn describe(&self) -> String {
        (**self).describe()
    }
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    lines: VecDeque<String>,
}
impl ManualSource {
    pub fn new<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}
impl SweepSource for ManualSource {
    fn read_line(&mut self) -> Result<SourceRead, SweepError> {
        Ok(match self.lines.pop_front() {
            Some(line) => SourceRead::Line(line),
            None => SourceRead::End(SourceEnd::Finished),
        })
    }
    fn describe(&self) -> String {
        "manual".into()
    }
}
/// Replays records from any buffered reader (a capture file, stdin).
pub struct ReaderSource<R: BufRead> {
    reader: R,
    label: String,
    line: Vec<u8>,
}
impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            line: Vec::new(),
        }
    }
}
impl<R: BufRead> SweepSource for ReaderSource<R> {
    fn read_line(&mut self) -> Result<SourceRead, SweepError> {
        self.line.clear();
        if self.reader.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(SourceRead::End(SourceEnd::Finished));
        }
        Ok(SourceRead::Line(
            String::from_utf8_lossy(&self.line).into_owned(),
        ))
    }
    fn describe(&self) -> String {
        self.label.clone()
    }
}
/// Runs the external sweep program and reads its stdout.
pub struct ProcessSource {
    program: String,
    child: Child,
    stdout: BufReader<ChildStdout>,
    line: Vec<u8>,
    reaped: bool,
}
impl ProcessSource {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, SweepError> {
        log::info!("starting {program} {}", args.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => SweepError::ProgramNotFound {
                    program: program.to_string(),
                },
                _ => SweepError::Spawn {
                    program: program.to_string(),
                    source: err,
                },
            })?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            return Err(SweepError::MissingStdout);
        };
        Ok(Self {
            program: program.to_string(),
            child,
            stdout: BufReader::new(stdout),
            line: Vec::new(),
            reaped: false,
        })
    }
}
impl SweepSource for ProcessSource {
    fn read_line(&mut self) -> Result<SourceRead, SweepError> {
        self.line.clear();
        if self.stdout.read_until(b'\n', &mut self.line)? > 0 {
            return Ok(SourceRead::Line(
                String::from_utf8_lossy(&self.line).into_owned(),
            ));
        }
        // stdout closed; wait for the exit status to show up.
        match self.child.try_wait()? {
            Some(status) => {
                self.reaped = true;
                if status.success() {
                    Ok(SourceRead::End(SourceEnd::Finished))
                } else {
                    Ok(SourceRead::End(SourceEnd::Exited {
                        code: status.code(),
                    }))
                }
            }
            None => Ok(SourceRead::Idle),
        }
    }
    fn shutdown(&mut self) {
        if self.reaped {
            return;
        }
        if let Ok(None) = self.child.try_wait() {
            log::info!("terminating {}", self.program);
            if let Err(err) = self.child.kill() {
                log::warn!("failed to terminate {}: {err}", self.program);
            }
        }
        let _ = self.child.wait();
        self.reaped = true;
    }
    fn describe(&self) -> String {
        self.program.clone()
    }
}
impl Drop for ProcessSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    #[test]
    fn manual_source_ends_when_drained() {
        let mut source = ManualSource::new(["a", "b"]);
        assert_eq!(source.read_line().unwrap(), SourceRead::Line("a".into()));
        assert_eq!(source.read_line().unwrap(), SourceRead::Line("b".into()));
        assert_eq!(
            source.read_line().unwrap(),
            SourceRead::End(SourceEnd::Finished)
        );
    }
    #[test]
    fn reader_source_yields_lines() {
        let data = "2024-01-01, 00:00:00, 1, 2, 1, 1, -50\nsecond\n";
        let mut source = ReaderSource::new(Cursor::new(data), "capture.csv");
        match source.read_line().unwrap() {
            SourceRead::Line(line) => assert!(line.starts_with("2024-01-01")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            source.read_line().unwrap(),
            SourceRead::Line("second\n".into())
        );
        assert_eq!(
            source.read_line().unwrap(),
            SourceRead::End(SourceEnd::Finished)
        );
        assert_eq!(source.describe(), "capture.csv");
    }
    #[test]
    fn reader_source_tolerates_invalid_utf8() {
        let mut source = ReaderSource::new(Cursor::new(vec![0xff, b'a', b'\n']), "raw");
        assert!(matches!(source.read_line().unwrap(), SourceRead::Line(_)));
    }
    #[test]
    fn missing_program_is_reported() {
        let err = ProcessSource::spawn("definitely-not-a-sweep-program", &[]).err();
        assert!(matches!(err, Some(SweepError::ProgramNotFound { .. })));
    }
    #[test]
    fn end_reasons_render() {
        assert_eq!(
            SourceEnd::Exited { code: Some(1) }.to_string(),
            "source exited with code 1"
        );
        assert_eq!(SourceEnd::Cancelled.to_string(), "source stopped");
    }
    #[cfg(unix)]
    #[test]
    fn shutdown_kills_and_reaps_live_child() {
        let args = ["-c".to_string(), "while :; do echo x; sleep 0.01; done".to_string()];
        let mut source = ProcessSource::spawn("sh", &args).unwrap();
        assert_eq!(source.read_line().unwrap(), SourceRead::Line("x\n".into()));
        source.shutdown();
        assert!(source.reaped);
        let status = source.child.try_wait().unwrap().expect("child was waited on");
        assert!(!status.success());
    }
}
