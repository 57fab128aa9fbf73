//! Detached helper that swaps in the new executable after we exit.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::error::UpdateError;

/// Copy attempts (one second apart) before the helper gives up.
pub const REPLACE_ATTEMPTS: u32 = 120;

/// Platform-specific helper script.
pub trait ReplaceStrategy {
    /// Script file suffix, with dot.
    fn script_suffix(&self) -> &'static str;

    /// Script text: retry the copy of `new_exe` over `old_exe` until it
    /// succeeds, relaunch `old_exe`, delete `new_exe`, delete itself.
    fn render(&self, old_exe: &Path, new_exe: &Path) -> String;

    /// Command that runs `script`.
    fn command(&self, script: &Path) -> Command;
}

/// `cmd.exe` batch file; `copy /y` fails while the old binary is locked.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsBatch;

impl ReplaceStrategy for WindowsBatch {
    fn script_suffix(&self) -> &'static str {
        ".bat"
    }

    fn render(&self, old_exe: &Path, new_exe: &Path) -> String {
        let old = old_exe.display();
        let new = new_exe.display();
        format!(
            "@echo off\r\n\
             setlocal\r\n\
             set /a tries=0\r\n\
             :waitloop\r\n\
             >nul 2>&1 copy /y \"{new}\" \"{old}\"\r\n\
             if not errorlevel 1 goto replaced\r\n\
             set /a tries+=1\r\n\
             if %tries% geq {attempts} goto cleanup\r\n\
             timeout /t 1 /nobreak >nul\r\n\
             goto waitloop\r\n\
             :replaced\r\n\
             start \"\" \"{old}\"\r\n\
             del \"{new}\" >nul 2>&1\r\n\
             :cleanup\r\n\
             (goto) 2>nul & del \"%~f0\"\r\n",
            attempts = REPLACE_ATTEMPTS,
        )
    }

    fn command(&self, script: &Path) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/c").arg(script);
        cmd
    }
}

/// POSIX shell script for Linux and macOS.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixShell;

/// Single-quote for `/bin/sh`.
fn sh_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

impl ReplaceStrategy for UnixShell {
    fn script_suffix(&self) -> &'static str {
        ".sh"
    }

    fn render(&self, old_exe: &Path, new_exe: &Path) -> String {
        let old = sh_quote(old_exe);
        let new = sh_quote(new_exe);
        format!(
            "#!/bin/sh\n\
             i=0\n\
             while [ \"$i\" -lt {attempts} ]; do\n\
             \x20 if cp -f {new} {old} 2>/dev/null; then\n\
             \x20   {old} >/dev/null 2>&1 &\n\
             \x20   rm -f {new}\n\
             \x20   rm -f \"$0\"\n\
             \x20   exit 0\n\
             \x20 fi\n\
             \x20 i=$((i + 1))\n\
             \x20 sleep 1\n\
             done\n\
             rm -f \"$0\"\n\
             exit 1\n",
            attempts = REPLACE_ATTEMPTS,
        )
    }

    fn command(&self, script: &Path) -> Command {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg(script);
        cmd
    }
}

/// Strategy for the platform this binary runs on.
pub fn platform_strategy() -> Box<dyn ReplaceStrategy> {
    if cfg!(windows) {
        Box::new(WindowsBatch)
    } else {
        Box::new(UnixShell)
    }
}

/// Write the helper script for `strategy` into the temp directory.
pub fn write_helper_script(
    strategy: &dyn ReplaceStrategy,
    old_exe: &Path,
    new_exe: &Path,
) -> Result<PathBuf, UpdateError> {
    let mut file = tempfile::Builder::new()
        .prefix("picgrab_updater_")
        .suffix(strategy.script_suffix())
        .tempfile()?;
    file.write_all(strategy.render(old_exe, new_exe).as_bytes())?;
    file.flush()?;
    let path = file
        .into_temp_path()
        .keep()
        .map_err(|e| UpdateError::Io(e.error))?;
    Ok(path)
}

/// Launch the helper detached from this process. On success the caller should
/// exit promptly so the copy can go through; on failure nothing was replaced.
pub fn apply_update(old_exe: &Path, new_exe: &Path) -> Result<(), UpdateError> {
    let strategy = platform_strategy();
    let script = write_helper_script(strategy.as_ref(), old_exe, new_exe)?;
    let mut cmd = strategy.command(&script);
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    detach(&mut cmd);
    match cmd.spawn() {
        Ok(child) => {
            tracing::info!(pid = child.id(), script = %script.display(), "update helper launched");
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&script);
            Err(UpdateError::Apply(e))
        }
    }
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // SAFETY: setsid is async-signal-safe and touches no parent state.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}
