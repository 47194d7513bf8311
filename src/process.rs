use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::LandcoverError;

/// Exit status and combined stdout/stderr of a finished external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub status: String,
    pub output: String,
}

impl ProcessOutput {
    /// Turn a failed run into `ProcessFailed`.
    pub fn check(self, program: &str) -> Result<ProcessOutput, LandcoverError> {
        if self.success {
            return Ok(self);
        }
        Err(LandcoverError::ProcessFailed {
            program: program.to_string(),
            status: self.status,
            output: self.output,
        })
    }
}

/// Seam over external GDAL utilities so the pipeline can run against a fake.
pub trait ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput, LandcoverError>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput, LandcoverError> {
        (**self).run(program, args)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput, LandcoverError> {
        let resolved =
            locate_tool(program).ok_or_else(|| LandcoverError::MissingTool(program.to_string()))?;
        debug!(program = %resolved.display(), ?args, "spawning");
        let output = Command::new(&resolved)
            .args(args)
            .output()
            .map_err(|err| LandcoverError::ProcessFailed {
                program: program.to_string(),
                status: "spawn error".to_string(),
                output: err.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = [stdout.trim(), stderr.trim()]
            .into_iter()
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ProcessOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            output: combined,
        })
    }
}

/// Locate a GDAL utility. A name with a directory part is used as given;
/// a bare name is searched on PATH, with the platform executable suffix
/// tried after the plain name.
pub fn locate_tool(name: &str) -> Option<PathBuf> {
    let given = Path::new(name);
    if given
        .parent()
        .is_some_and(|parent| !parent.as_os_str().is_empty())
    {
        return given.is_file().then(|| given.to_path_buf());
    }
    let candidates = [
        name.to_string(),
        format!("{name}{}", std::env::consts::EXE_SUFFIX),
    ];
    std::env::split_paths(&std::env::var_os("PATH")?)
        .flat_map(|dir| candidates.iter().map(move |candidate| dir.join(candidate)))
        .find(|path| path.is_file())
}
