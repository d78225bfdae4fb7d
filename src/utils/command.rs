//! Running external tools with file-backed stdin/stdout and captured stderr

use super::executor::{Completion, Invocation, Redirect};
use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::{self, ScopedJoinHandle};
use tracing::{debug, error};

/// Output file of a dump, optionally gzip encoded
pub(crate) enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    pub(crate) fn create(redirect: &Redirect) -> io::Result<Self> {
        let file = BufWriter::new(File::create(&redirect.path)?);
        Ok(if redirect.gzip {
            Sink::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            Sink::Plain(file)
        })
    }

    /// Flush everything, writing the gzip trailer if any
    pub(crate) fn finish(self) -> io::Result<()> {
        let mut inner = match self {
            Sink::Plain(w) => w,
            Sink::Gzip(encoder) => encoder.finish()?,
        };
        inner.flush()?;
        inner.get_ref().sync_all()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

/// Open an input file, transparently gunzipping it if requested
pub(crate) fn open_source(redirect: &Redirect) -> io::Result<Box<dyn Read + Send>> {
    let file = File::open(&redirect.path)?;
    Ok(if redirect.gzip {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    })
}

fn tool_error(program: &str, status: &str, message: impl ToString) -> Error {
    Error::ExternalTool {
        tool: program.to_string(),
        status: status.to_string(),
        stderr: message.to_string(),
    }
}

/// Run an invocation to completion
///
/// Only failures to start or plumb the process are errors here; the exit
/// status is reported in the returned [`Completion`].
pub fn run(invocation: &Invocation) -> Result<Completion> {
    let program = which::which(&invocation.program)
        .map_err(|e| tool_error(&invocation.program, "not found", e))?;

    // Open both ends before spawning so a bad path never leaves a child
    // blocked on a pipe nobody reads.
    let source = invocation
        .stdin
        .as_ref()
        .map(|r| {
            open_source(r).map_err(|e| {
                tool_error(&invocation.program, "not started", format!("cannot read {:?}: {}", r.path, e))
            })
        })
        .transpose()?;
    let sink = invocation
        .stdout
        .as_ref()
        .map(|r| {
            Sink::create(r).map_err(|e| {
                tool_error(&invocation.program, "not started", format!("cannot write {:?}: {}", r.path, e))
            })
        })
        .transpose()?;

    let mut cmd = Command::new(&program);
    cmd.args(&invocation.args);
    cmd.envs(invocation.envs.iter().map(|(k, v)| (k, v)));
    cmd.stdin(if source.is_some() { Stdio::piped() } else { Stdio::null() });
    cmd.stdout(if sink.is_some() { Stdio::piped() } else { Stdio::null() });
    cmd.stderr(Stdio::piped());

    debug!("Running command: {}", invocation.command_line());

    let mut child = cmd
        .spawn()
        .map_err(|e| tool_error(&invocation.program, "failed to start", e))?;

    let pumped = pump(&mut child, source, sink);
    let status = child
        .wait()
        .map_err(|e| tool_error(&invocation.program, "lost", e))?;

    let stderr = pumped.map_err(|e| {
        error!("I/O with {} failed: {}", invocation.program, e);
        tool_error(&invocation.program, &status.to_string(), e)
    })?;

    Ok(Completion {
        code: status.code(),
        stderr,
    })
}

/// Move data between the files and the child's pipes until all are closed
fn pump(
    child: &mut Child,
    source: Option<Box<dyn Read + Send>>,
    sink: Option<Sink>,
) -> io::Result<String> {
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    thread::scope(|scope| {
        let feeder = match (source, stdin) {
            (Some(source), Some(pipe)) => Some(scope.spawn(move || feed(source, pipe))),
            _ => None,
        };
        let collector = stderr.map(|mut pipe| {
            scope.spawn(move || -> io::Result<String> {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf)?;
                Ok(String::from_utf8_lossy(&buf).trim().to_string())
            })
        });

        let drained = match (sink, stdout) {
            (Some(sink), Some(pipe)) => drain(pipe, sink),
            _ => Ok(()),
        };

        let fed = feeder.map_or(Ok(()), join);
        let collected = collector.map_or(Ok(String::new()), join);

        drained?;
        fed?;
        collected
    })
}

fn feed(mut source: Box<dyn Read + Send>, mut pipe: ChildStdin) -> io::Result<()> {
    match io::copy(&mut source, &mut pipe) {
        Ok(_) => Ok(()),
        // The child stopped reading; its exit status tells the story
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e),
    }
}

fn drain(mut pipe: ChildStdout, mut sink: Sink) -> io::Result<()> {
    io::copy(&mut pipe, &mut sink)?;
    sink.finish()
}

fn join<T>(handle: ScopedJoinHandle<'_, io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "pipe thread panicked")))
}
