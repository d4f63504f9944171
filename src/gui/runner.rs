//! Child pipeline process: spawn, stream output, stop.

use parking_lot::Mutex;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Events sent from the child's reader/waiter threads to the window.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Line(String),
    Exited(Option<i32>),
}

/// Arguments passed to the child: `--ab <ab> --alls <alls> run-all`.
pub fn command_args(ab: &Path, alls: &Path) -> Vec<OsString> {
    vec![
        "--ab".into(),
        ab.as_os_str().to_owned(),
        "--alls".into(),
        alls.as_os_str().to_owned(),
        "run-all".into(),
    ]
}

/// The child runs next to `ab` so its outputs and logs land beside the inputs.
pub fn working_dir(ab: &Path) -> PathBuf {
    match ab.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn pump_lines<R>(source: R, tx: Sender<RunEvent>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                    if tx.send(RunEvent::Line(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(RunEvent::Line(format!("[log read error] {}", e)));
                    break;
                }
            }
        }
    })
}

/// A running `fiber-analyzer run-all` child.
pub struct PipelineProcess {
    child: Arc<Mutex<Option<Child>>>,
    events: Receiver<RunEvent>,
}

impl PipelineProcess {
    /// Re-launch the current executable on the given inputs.
    pub fn spawn(ab: &Path, alls: &Path) -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        let mut command = Command::new(&exe);
        command
            .args(command_args(ab, alls))
            .current_dir(working_dir(ab))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = command.spawn()?;
        tracing::info!("Spawned {} (pid {})", exe.display(), child.id());

        let (tx, events) = channel();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(pump_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(pump_lines(stderr, tx.clone()));
        }

        let child = Arc::new(Mutex::new(Some(child)));
        let waiter_child = Arc::clone(&child);
        thread::spawn(move || {
            let code = loop {
                let status = match waiter_child.lock().as_mut() {
                    Some(child) => child.try_wait(),
                    None => break None,
                };
                match status {
                    Ok(Some(status)) => break status.code(),
                    Ok(None) => thread::sleep(POLL_INTERVAL),
                    Err(e) => {
                        let _ = tx.send(RunEvent::Line(format!("[wait error] {}", e)));
                        break None;
                    }
                }
            };
            // drain remaining output before reporting the exit
            for reader in readers {
                let _ = reader.join();
            }
            waiter_child.lock().take();
            let _ = tx.send(RunEvent::Exited(code));
        });

        Ok(Self { child, events })
    }

    /// Events received since the last call.
    pub fn poll(&self) -> Vec<RunEvent> {
        self.events.try_iter().collect()
    }

    /// Kill the child if it is still running.
    pub fn stop(&self) {
        if let Some(child) = self.child.lock().as_mut() {
            match child.kill() {
                Ok(()) => tracing::info!("Stop requested (pid {})", child.id()),
                Err(e) => tracing::warn!("Stop failed: {}", e),
            }
        }
    }
}

impl Drop for PipelineProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_arguments() {
        let args = command_args(Path::new("data/ab.xlsx"), Path::new("data/alls.xlsx"));
        assert_eq!(
            args,
            ["--ab", "data/ab.xlsx", "--alls", "data/alls.xlsx", "run-all"]
                .map(OsString::from)
                .to_vec()
        );
    }

    #[test]
    fn child_runs_beside_ab() {
        assert_eq!(working_dir(Path::new("data/ab.xlsx")), PathBuf::from("data"));
        assert_eq!(working_dir(Path::new("ab.xlsx")), PathBuf::from("."));
    }

    #[test]
    fn output_lines_are_pumped_until_eof() {
        let (tx, rx) = channel();
        let source = std::io::Cursor::new(b"first\r\nsecond\nthird".to_vec());
        pump_lines(source, tx).join().unwrap();
        let lines: Vec<RunEvent> = rx.try_iter().collect();
        assert_eq!(
            lines,
            ["first", "second", "third"].map(|l| RunEvent::Line(l.to_string()))
        );
    }
}
