//! Scoring through an external program, e.g. a wrapper script around a
//! Python MOS predictor.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use tracing::warn;

use super::MosModel;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs `program args... <wav path>` and reads the score from the last
/// non-empty line of its standard output.
///
/// With a timeout set, a run that outlives it is killed and counts as a
/// failure for that file only.
#[derive(Debug, Clone)]
pub struct CommandModel {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandModel {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Split a whitespace-separated command line into program and arguments.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| anyhow!("empty scorer command"))?;
        Ok(Self::new(program, parts.collect()))
    }
}

fn parse_score(stdout: &str) -> Result<f32> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| anyhow!("scorer printed nothing"))?;
    line.parse::<f32>()
        .with_context(|| format!("scorer output {line:?} is not a number"))
}

/// Read a child's pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// `None` if the child is still running at the deadline.
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn collect(reader: JoinHandle<Vec<u8>>) -> Result<String> {
    let bytes = reader
        .join()
        .map_err(|_| anyhow!("scorer output reader panicked"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl MosModel for CommandModel {
    fn predict(&mut self, path: &Path) -> Result<f32> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to run {}", self.program))?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(timeout) => match wait_until(&mut child, Instant::now() + timeout)? {
                Some(status) => status,
                None => {
                    // Only the direct child is killed; the pipe readers are
                    // left to finish on their own.
                    if let Err(e) = child.kill() {
                        warn!(program = %self.program, "failed to kill scorer: {e}");
                    }
                    let _ = child.wait();
                    bail!(
                        "{} timed out after {:.1}s",
                        self.program,
                        timeout.as_secs_f32()
                    );
                }
            },
            None => child.wait()?,
        };

        let stdout = collect(stdout)?;
        if !status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                status,
                collect(stderr)?.trim()
            );
        }
        parse_score(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_last_line() {
        assert_eq!(parse_score("loading model\n3.75\n\n").unwrap(), 3.75);
        assert!(parse_score("").is_err());
        assert!(parse_score("done").is_err());
    }

    #[test]
    fn splits_command_line() {
        let model = CommandModel::from_command_line("python3 wvmos_score.py --cuda").unwrap();
        assert_eq!(model.program, "python3");
        assert_eq!(model.args, ["wvmos_score.py", "--cuda"]);
        assert!(CommandModel::from_command_line("   ").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn runs_program_with_path_argument() {
        let mut model = CommandModel::new(
            "sh",
            vec!["-c".into(), "test -n \"$1\" && echo 3.25".into(), "sh".into()],
        );
        assert_eq!(model.predict(Path::new("/tmp/a.wav")).unwrap(), 3.25);
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_an_error() {
        let mut model = CommandModel::new("sh", vec!["-c".into(), "exit 3".into(), "sh".into()]);
        assert!(model.predict(Path::new("/tmp/a.wav")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn hung_program_is_killed_and_next_file_scores() {
        let script = r#"case "$1" in *slow*) exec sleep 5;; esac; echo 3.5"#;
        let mut model = CommandModel::new("sh", vec!["-c".into(), script.into(), "sh".into()])
            .with_timeout(Some(Duration::from_millis(200)));

        let started = Instant::now();
        let err = model.predict(Path::new("/tmp/slow.wav")).unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(3));

        assert_eq!(model.predict(Path::new("/tmp/ok1.wav")).unwrap(), 3.5);
        assert_eq!(model.predict(Path::new("/tmp/ok2.wav")).unwrap(), 3.5);
    }
}
