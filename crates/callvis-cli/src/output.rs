//! Output sinks: DOT text to a file or stdout, and Graphviz image rendering.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{ChildStdin, Command, Output, Stdio};
use std::thread;
use std::time::Instant;

use tracing::info;

use callvis_error::{Error, Result};

/// Write DOT text to `path`, or stdout when `None`.
pub fn write_output(dot: &str, path: Option<&str>) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, dot).map_err(|e| {
                Error::from(e)
                    .with_operation("output::write_output")
                    .with_context("path", path)
            })?;
            info!(path, "output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(dot.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| Error::from(e).with_operation("output::write_output"))?;
        }
    }
    Ok(())
}

/// Converts DOT text to an image with an external Graphviz binary.
#[derive(Debug, Clone)]
pub struct Renderer {
    program: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::graphviz()
    }
}

impl Renderer {
    /// The system `dot` binary, looked up on `PATH`.
    pub fn graphviz() -> Self {
        Self::with_program("dot")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Path of the image for `format`: `<out_name>.<format>`, or a fixed
    /// name in the temp directory when `out_name` is empty.
    pub fn image_path(out_name: &str, format: &str) -> PathBuf {
        if out_name.is_empty() {
            env::temp_dir().join(format!("callvis.{format}"))
        } else {
            PathBuf::from(format!("{out_name}.{format}"))
        }
    }

    /// Run `<program> -T<format> -o <image>` with `dot` on stdin and return
    /// the image path.
    pub fn render_image(&self, dot: &str, format: &str, out_name: &str) -> Result<PathBuf> {
        if format.is_empty() {
            return Err(Error::invalid_argument("empty output format")
                .with_operation("output::Renderer::render_image"));
        }

        let image = Self::image_path(out_name, format);
        let start = Instant::now();

        let mut child = Command::new(&self.program)
            .arg(format!("-T{format}"))
            .arg("-o")
            .arg(&image)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // stdin is fed from its own thread while stderr drains here, so a
        // renderer that fills its stderr pipe before reading cannot stall us
        let stdin = child.stdin.take();
        let output = thread::scope(|scope| -> Result<Output> {
            let writer = scope.spawn(move || feed_stdin(stdin, dot));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .map_err(|_| Error::unexpected("renderer stdin writer panicked"))?;
            written.and(output).map_err(Error::from)
        })
        .map_err(|e| e.with_operation("output::Renderer::render_image"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::render_failed(format!(
                "command '{} -T{} -o {}' failed ({}): {}",
                self.program,
                format,
                image.display(),
                output.status,
                stderr.trim()
            ))
            .with_operation("output::Renderer::render_image"));
        }

        info!(
            image = %image.display(),
            "Image rendering: {:.2}s",
            start.elapsed().as_secs_f64()
        );
        Ok(image)
    }

    fn spawn_error(&self, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            Error::renderer_unavailable(&self.program)
                .with_operation("output::Renderer::render_image")
                .set_source(err)
        } else {
            Error::from(err)
                .with_operation("output::Renderer::render_image")
                .with_context("program", &self.program)
        }
    }
}

/// A renderer that dies early closes the pipe; its exit status carries the
/// real reason, so `BrokenPipe` is not an error here.
fn feed_stdin(stdin: Option<ChildStdin>, dot: &str) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(dot.as_bytes()) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
        _ => Ok(()),
    }
}
