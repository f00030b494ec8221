//! Shader compilation.
//!
//! Every resolved `.glsl` file is compiled by an external cross-compiler into
//! the dialect the target platform renders with. Jobs run one at a time in
//! discovery order and the first failure aborts the rest.
//!
//! Dialects with named entry points (Metal) compile into generated sources
//! under `<to>/Sources`; the nominal output then only holds a redirect
//! marker, `>` followed by the entry point name. Use [`read_output`] or
//! [`output_location`] to follow it.

mod compiler;
mod dialect;
mod stream;

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tracing::{error, info};

use crate::config::ExportOptions;
use crate::error::{Result, TrellisError};
use crate::platform::Platform;
use crate::resolve::ResolvedFile;

pub use compiler::{find_compiler, BACKENDS_DIR};
pub use dialect::{dialect, Dialect};
pub use stream::{DiagnosticKind, DiagnosticRecord, DiagnosticStream};

/// File suffix of shader sources.
pub const SHADER_SUFFIX: &str = ".glsl";

const REDIRECT_MARKER: char = '>';
const READ_CHUNK: usize = 4096;

/// Whether a resolved file is a shader source.
pub fn is_shader_source(file: &ResolvedFile) -> bool {
    file.has_suffix(SHADER_SUFFIX)
}

/// One compiler invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderJob {
    pub source_path: PathBuf,
    pub dialect: Dialect,
    pub platform: Platform,
    /// Where consumers look for the compiled shader.
    pub output_path: PathBuf,
    pub temp_path: PathBuf,
}

impl ShaderJob {
    /// Plan compiling `source` into `debug_dir`.
    pub fn new(
        source: &Path,
        dialect: Dialect,
        platform: Platform,
        debug_dir: &Path,
        temp_dir: &Path,
    ) -> Self {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_name = file_name
            .strip_suffix(SHADER_SUFFIX)
            .unwrap_or(&file_name)
            .to_string();

        Self {
            source_path: source.to_path_buf(),
            dialect,
            platform,
            output_path: debug_dir.join(output_name),
            temp_path: temp_dir.to_path_buf(),
        }
    }

    /// Source file name without directories or the `.glsl` suffix.
    pub fn name(&self) -> String {
        self.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Result of a successful compile.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledShaderRef {
    pub source_path: PathBuf,
    /// Nominal output path (holds a redirect marker for entry-point dialects).
    pub output_path: PathBuf,
    /// File the compiler actually wrote.
    pub compiled_path: PathBuf,
    /// Entry point name, for dialects that use one.
    pub entry_point: Option<String>,
}

impl CompiledShaderRef {
    pub fn is_redirected(&self) -> bool {
        self.entry_point.is_some()
    }
}

/// Entry point identifier for a shader: non-identifier characters of the
/// name become `_`, followed by `_main`.
pub fn entry_point_name(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    ident.push_str("_main");
    ident
}

/// Run one compile job with the compiler at `compiler`.
///
/// Entry-point dialects write the redirect marker to the nominal output and
/// compile into `generated_sources_dir` instead.
pub fn compile_one(
    compiler: &Path,
    job: &ShaderJob,
    generated_sources_dir: &Path,
    debug: bool,
) -> Result<CompiledShaderRef> {
    if let Some(parent) = job.output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| TrellisError::io(parent, e))?;
    }

    let mut output = job.output_path.clone();
    let mut temp = job.temp_path.clone();
    let mut entry_point = None;

    if job.dialect.uses_entry_points() {
        fs::create_dir_all(generated_sources_dir)
            .map_err(|e| TrellisError::io(generated_sources_dir, e))?;

        let name = job.name();
        let entry = entry_point_name(&name);
        fs::write(&job.output_path, format!("{}{}", REDIRECT_MARKER, entry))
            .map_err(|e| TrellisError::io(&job.output_path, e))?;

        output = generated_sources_dir.join(format!("{}.{}", name, job.dialect.name()));
        temp = PathBuf::from(format!("{}.temp", output.display()));
        entry_point = Some(entry);
    }

    let mut args = vec![
        job.dialect.name().to_string(),
        job.source_path.display().to_string(),
        output.display().to_string(),
        temp.display().to_string(),
        job.platform.id().to_string(),
    ];
    if debug {
        args.push("--debug".to_string());
    }

    run_compiler(compiler, &args, &job.source_path)?;

    Ok(CompiledShaderRef {
        source_path: job.source_path.clone(),
        output_path: job.output_path.clone(),
        compiled_path: output,
        entry_point,
    })
}

/// Spawn the compiler, forward its output, and wait for it.
///
/// A non-zero exit becomes [`TrellisError::ShaderCompile`] for `source`,
/// carrying the structured diagnostics.
fn run_compiler(compiler: &Path, args: &[String], source: &Path) -> Result<()> {
    let mut child = Command::new(compiler)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| TrellisError::io(compiler, e))?;

    let stdout = child.stdout.take();
    let forward = thread::spawn(move || {
        if let Some(stdout) = stdout {
            for line in BufReader::new(stdout).lines().map_while(|l| l.ok()) {
                let line = line.trim();
                if !line.is_empty() {
                    info!("{}", line);
                }
            }
        }
    });

    let mut diagnostics = Vec::new();
    let mut parser = DiagnosticStream::new();
    if let Some(mut stderr) = child.stderr.take() {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = stderr.read(&mut buf).map_err(|e| TrellisError::io(compiler, e))?;
            if n == 0 {
                break;
            }
            for record in parser.feed(&buf[..n]) {
                log_record(&record, &mut diagnostics);
            }
        }
    }
    if let Some(record) = parser.flush() {
        log_record(&record, &mut diagnostics);
    }

    let status = child.wait().map_err(|e| TrellisError::io(compiler, e))?;
    let _ = forward.join();

    if status.success() {
        Ok(())
    } else {
        Err(TrellisError::ShaderCompile {
            file: source.to_path_buf(),
            compiled: 0,
            total: 1,
            diagnostics,
        })
    }
}

fn log_record(record: &DiagnosticRecord, diagnostics: &mut Vec<String>) {
    match record.kind {
        DiagnosticKind::Info => info!("{}", record.text),
        DiagnosticKind::StructuredError => {
            error!("{}", record.text);
            diagnostics.push(record.text.clone());
        }
    }
}

/// Compile every shader source among `files`, in order.
///
/// Outputs go to `debug_dir`; the compiler is located and the dialect chosen
/// only when there is at least one shader. Stops at the first failure,
/// reporting how many shaders compiled before it.
pub fn compile_all(
    files: &[ResolvedFile],
    debug_dir: &Path,
    options: &ExportOptions,
) -> Result<Vec<CompiledShaderRef>> {
    let sources: Vec<&ResolvedFile> = files.iter().filter(|f| is_shader_source(f)).collect();
    if sources.is_empty() {
        return Ok(Vec::new());
    }

    let dialect = dialect(&options.platform, options.graphics_api)?;
    let compiler = find_compiler(
        &options.from,
        options.toolchain_dir.as_deref(),
        &options.platform,
    )?;
    let generated = options.generated_sources_dir();

    let total = sources.len();
    let mut compiled = Vec::with_capacity(total);

    for (index, source) in sources.iter().enumerate() {
        let job = ShaderJob::new(
            &source.absolute_path,
            dialect.clone(),
            options.platform.clone(),
            debug_dir,
            &options.to,
        );
        info!("Compiling shader {} of {} ({})", index + 1, total, job.name());

        match compile_one(&compiler, &job, &generated, options.debug) {
            Ok(shader) => compiled.push(shader),
            Err(TrellisError::ShaderCompile {
                file, diagnostics, ..
            }) => {
                return Err(TrellisError::ShaderCompile {
                    file,
                    compiled: index,
                    total,
                    diagnostics,
                })
            }
            Err(e) => return Err(e),
        }
    }

    Ok(compiled)
}

/// Entry point named by a redirect marker at `output`, if it holds one.
pub fn read_redirect(output: &Path) -> Result<Option<String>> {
    let content = fs::read(output).map_err(|e| TrellisError::io(output, e))?;
    match content.strip_prefix(&[REDIRECT_MARKER as u8]) {
        Some(rest) => Ok(Some(String::from_utf8_lossy(rest).trim().to_string())),
        None => Ok(None),
    }
}

/// The file holding the compiled shader for nominal output `output`,
/// following a redirect into `generated_sources_dir`.
pub fn output_location(output: &Path, generated_sources_dir: &Path) -> Result<PathBuf> {
    if read_redirect(output)?.is_none() {
        return Ok(output.to_path_buf());
    }

    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(generated_sources_dir.join(format!("{}.{}", name, Dialect::Metal.name())))
}

/// Read the compiled shader for nominal output `output`.
pub fn read_output(output: &Path, generated_sources_dir: &Path) -> Result<Vec<u8>> {
    let location = output_location(output, generated_sources_dir)?;
    fs::read(&location).map_err(|e| TrellisError::io(&location, e))
}
