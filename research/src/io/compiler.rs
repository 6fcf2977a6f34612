//! LaTeX compiler adapter (`latexmk` by default).

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::core::text::error_lines;
use crate::error::{EntryKind, ToolError};
use crate::io::config::LatexSettings;
use crate::io::process::run_command;
use crate::io::workspace::Workspace;

const MAX_REPORTED_ERRORS: usize = 10;

/// Compile a `.tex` file inside the workspace and report the produced PDF.
///
/// The compiler runs from the document's directory so relative `\input{}` paths
/// resolve the same way they were rendered.
#[instrument(skip(workspace, settings), fields(compiler = %settings.compiler))]
pub fn compile_latex(
    workspace: &Workspace,
    settings: &LatexSettings,
    path: &str,
) -> Result<String, ToolError> {
    let source = workspace.guard(path)?;
    if source.extension().and_then(|ext| ext.to_str()) != Some("tex") {
        return Err(ToolError::InvalidArgument(format!(
            "expected a .tex file, got {path}"
        )));
    }
    if !source.exists() {
        return Err(ToolError::NotFound {
            what: EntryKind::File,
            path: path.to_string(),
        });
    }
    if source.is_dir() {
        return Err(ToolError::WrongType {
            path: path.to_string(),
            expected: EntryKind::File,
            found: EntryKind::Directory,
        });
    }

    let binary = which::which(&settings.compiler).map_err(|e| ToolError::MissingDependency {
        dependency: settings.compiler.clone(),
        detail: format!("{e}; install a TeX distribution or set latex.compiler"),
    })?;

    let workdir = source.parent().unwrap_or_else(|| workspace.root());
    let file_name = source
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    let mut cmd = Command::new(&binary);
    cmd.args(&settings.args).arg(&file_name).current_dir(workdir);

    let timeout = (settings.timeout_secs > 0).then(|| Duration::from_secs(settings.timeout_secs));
    let output = run_command(cmd, timeout, settings.output_limit_bytes).map_err(|e| {
        ToolError::CompileFailed {
            path: path.to_string(),
            errors: vec![format!("{e:#}")],
        }
    })?;

    if output.timed_out {
        warn!(path, "compiler timed out");
        return Err(ToolError::CompileFailed {
            path: path.to_string(),
            errors: vec![format!(
                "{} did not finish within {} seconds",
                settings.compiler, settings.timeout_secs
            )],
        });
    }

    let pdf = source.with_extension("pdf");
    if !output.status.success() || !pdf.is_file() {
        let mut errors = error_lines(&output.combined_text(), MAX_REPORTED_ERRORS);
        if errors.is_empty() {
            errors.push(match output.status.code() {
                Some(code) if code != 0 => format!("{} exited with status {code}", settings.compiler),
                _ => format!("{} produced no PDF output", settings.compiler),
            });
        }
        warn!(path, exit_code = ?output.status.code(), "compilation failed");
        return Err(ToolError::CompileFailed {
            path: path.to_string(),
            errors,
        });
    }

    let shown = workspace.display(&pdf);
    info!(pdf = %shown, "compiled document");
    Ok(format!("PDF successfully compiled at: {shown}"))
}

/// Whether `name` resolves to an executable on `PATH` (or is an executable path).
pub fn compiler_available(name: &str) -> bool {
    which::which(Path::new(name)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestWorkspace;

    fn settings(compiler: &str) -> LatexSettings {
        LatexSettings {
            compiler: compiler.to_string(),
            ..LatexSettings::default()
        }
    }

    #[test]
    fn rejects_wrong_extension_missing_files_and_escapes() {
        let tw = TestWorkspace::new().expect("workspace");
        tw.write("notes.md", "x");
        let ws = tw.workspace();
        let cfg = settings("latexmk");

        assert!(matches!(
            compile_latex(ws, &cfg, "notes.md").unwrap_err(),
            ToolError::InvalidArgument(_)
        ));
        assert!(matches!(
            compile_latex(ws, &cfg, "missing.tex").unwrap_err(),
            ToolError::NotFound { .. }
        ));
        assert!(matches!(
            compile_latex(ws, &cfg, "../outside.tex").unwrap_err(),
            ToolError::PathViolation { .. }
        ));
    }

    #[test]
    fn missing_compiler_is_reported() {
        let tw = TestWorkspace::new().expect("workspace");
        tw.write("main.tex", "\\documentclass{article}");
        let err = compile_latex(
            tw.workspace(),
            &settings("definitely-not-a-tex-compiler"),
            "main.tex",
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::MissingDependency { .. }));
        assert!(!compiler_available("definitely-not-a-tex-compiler"));
    }

    #[cfg(unix)]
    mod fake_compiler {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        fn install(tw: &TestWorkspace, name: &str, script: &str) -> String {
            let path = tw.path().join("bin").join(name);
            fs::create_dir_all(path.parent().expect("parent")).expect("bin dir");
            fs::write(&path, script).expect("write script");
            let mut perms = fs::metadata(&path).expect("meta").permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).expect("chmod");
            path.display().to_string()
        }

        #[test]
        fn success_reports_pdf_path() {
            let tw = TestWorkspace::new().expect("workspace");
            tw.write("doc/main.tex", "x");
            let compiler = install(
                &tw,
                "fake-latexmk",
                "#!/bin/sh\nfor last; do :; done\ntouch \"${last%.tex}.pdf\"\n",
            );

            let out = compile_latex(tw.workspace(), &settings(&compiler), "doc/main.tex")
                .expect("compile");
            assert_eq!(out, "PDF successfully compiled at: doc/main.pdf");
            assert!(tw.exists("doc/main.pdf"));
        }

        #[test]
        fn failure_surfaces_error_lines() {
            let tw = TestWorkspace::new().expect("workspace");
            tw.write("main.tex", "x");
            let compiler = install(
                &tw,
                "fake-fail",
                "#!/bin/sh\necho 'This is pdfTeX'\necho '! Undefined control sequence.'\nexit 12\n",
            );

            let err =
                compile_latex(tw.workspace(), &settings(&compiler), "main.tex").unwrap_err();
            match err {
                ToolError::CompileFailed { errors, .. } => {
                    assert_eq!(errors, vec!["! Undefined control sequence."]);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn slow_compiler_is_killed_after_timeout() {
            let tw = TestWorkspace::new().expect("workspace");
            tw.write("main.tex", "x");
            let compiler = install(&tw, "fake-slow", "#!/bin/sh\nexec sleep 5\n");
            let cfg = LatexSettings {
                timeout_secs: 1,
                ..settings(&compiler)
            };

            let err = compile_latex(tw.workspace(), &cfg, "main.tex").unwrap_err();
            match err {
                ToolError::CompileFailed { errors, .. } => {
                    assert_eq!(errors.len(), 1);
                    assert!(
                        errors[0].ends_with("did not finish within 1 seconds"),
                        "{errors:?}"
                    );
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(!tw.exists("main.pdf"));
        }

        #[test]
        fn zero_exit_without_pdf_is_a_failure() {
            let tw = TestWorkspace::new().expect("workspace");
            tw.write("main.tex", "x");
            let compiler = install(&tw, "fake-noop", "#!/bin/sh\nexit 0\n");

            let err =
                compile_latex(tw.workspace(), &settings(&compiler), "main.tex").unwrap_err();
            assert!(err.to_string().contains("produced no PDF output"));
        }
    }
}
