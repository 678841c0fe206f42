use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result, fs_error};

/// File name of the auxiliary script inside the staging folder.
#[cfg(windows)]
pub const LAUNCHER_FILE_NAME: &str = "Setup.wsf";
#[cfg(not(windows))]
pub const LAUNCHER_FILE_NAME: &str = "setup.sh";

/// A written launcher script, held open read-only.
#[derive(Debug)]
pub struct LauncherFile {
    path: PathBuf,
    file: File,
}

impl LauncherFile {
    pub fn path(&self) -> &Path { &self.path }

    pub fn file(&self) -> &File { &self.file }
}

/// Write the launcher script for `installer` into `staging`.
///
/// The script runs the installer with `arguments` and waits for it, then
/// deletes the installer, itself and the staging folder, ignoring failures.
/// `arguments` is a command line fragment and is passed through unquoted.
///
/// The launcher never replaces an existing file. An installer that was
/// downloaded under the launcher's own name keeps it, and the launcher gets a
/// unique name instead.
pub fn write_launcher(staging: &Path, installer: &Path, arguments: &str) -> Result<LauncherFile> {
    let path = launcher_path(staging, installer);
    let content = render(staging, installer, &path, arguments);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(installer, std::fs::Permissions::from_mode(0o755))
            .map_err(fs_error(installer))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(fs_error(&path))?;
    let written = file
        .write_all(content.as_bytes())
        .and_then(|()| file.sync_all())
        .and_then(|()| File::open(&path));
    drop(file);
    match written {
        Ok(file) => {
            debug!(path = %path.display(), "launcher written");
            Ok(LauncherFile { path, file })
        }
        Err(e) => {
            let _ = std::fs::remove_file(&path);
            Err(fs_error(path)(e))
        }
    }
}

/// Launcher location in `staging` that cannot collide with `installer`.
///
/// Names are compared ignoring ASCII case, as on NTFS and APFS.
fn launcher_path(staging: &Path, installer: &Path) -> PathBuf {
    let taken = installer
        .file_name()
        .is_some_and(|name| name.eq_ignore_ascii_case(LAUNCHER_FILE_NAME));
    if !taken {
        return staging.join(LAUNCHER_FILE_NAME);
    }
    let (stem, ext) = LAUNCHER_FILE_NAME.rsplit_once('.').unwrap_or((LAUNCHER_FILE_NAME, ""));
    staging.join(format!("{stem}-{}.{ext}", Uuid::new_v4().simple()))
}

/// Write the launcher and start it detached from the current process, with
/// `staging` as its working directory.
///
/// Returns as soon as the launcher is running; the installer's outcome is
/// not observed.
pub fn launch(staging: &Path, installer: &Path, arguments: &str) -> Result<()> {
    let launcher = write_launcher(staging, installer, arguments)?;
    let program = interpreter();

    let mut command = Command::new(&program);
    command
        .arg(launcher.path())
        .current_dir(staging)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    detach(&mut command);

    let child = command.spawn().map_err(|source| Error::ProcessLaunch {
        program,
        source,
    })?;
    info!(pid = child.id(), launcher = %launcher.path().display(), "installer launcher started");
    Ok(())
}

#[cfg(windows)]
fn interpreter() -> PathBuf {
    let windir = std::env::var_os("WINDIR").unwrap_or_else(|| r"C:\Windows".into());
    PathBuf::from(windir).join(r"System32\wscript.exe")
}

#[cfg(not(windows))]
fn interpreter() -> PathBuf { PathBuf::from("/bin/sh") }

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(any(windows, unix)))]
fn detach(_command: &mut Command) {}

#[cfg(windows)]
fn render(staging: &Path, installer: &Path, launcher: &Path, arguments: &str) -> String {
    wsf_script(staging, installer, launcher, arguments)
}

#[cfg(not(windows))]
fn render(staging: &Path, installer: &Path, launcher: &Path, arguments: &str) -> String {
    shell_script(staging, installer, launcher, arguments)
}

/// JScript job for `wscript.exe`, which runs without a console window.
#[cfg(any(windows, test))]
fn wsf_script(staging: &Path, installer: &Path, launcher: &Path, arguments: &str) -> String {
    let installer = installer.to_string_lossy();
    let mut command_line = format!("\"{installer}\"");
    if !arguments.is_empty() {
        command_line.push(' ');
        command_line.push_str(arguments);
    }

    let mut js = String::new();
    js.push_str("var wsh = WScript.CreateObject(\"WScript.Shell\");\n");
    js.push_str(&format!("wsh.Run({}, 0, true);\n", js_string(&command_line)));
    js.push_str("var fso = WScript.CreateObject(\"Scripting.FileSystemObject\");\n");
    let launcher = launcher.to_string_lossy();
    for file in [&*installer, &*launcher] {
        js.push_str(&format!(
            "try {{ fso.DeleteFile({}, true); }} catch (err) {{}}\n",
            js_string(file)
        ));
    }
    js.push_str(&format!(
        "try {{ fso.DeleteFolder({}, true); }} catch (err) {{}}\n",
        js_string(&staging.to_string_lossy())
    ));

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <package>\n\
         \t<job>\n\
         \t\t<reference object=\"WScript.Shell\"></reference>\n\
         \t\t<reference object=\"Scripting.FileSystemObject\"></reference>\n\
         \t\t<script language=\"JScript\">{}</script>\n\
         \t</job>\n\
         </package>\n",
        xml_escape(&js)
    )
}

/// POSIX shell equivalent of the WSF job.
#[cfg(any(not(windows), test))]
fn shell_script(staging: &Path, installer: &Path, launcher: &Path, arguments: &str) -> String {
    let installer = sh_quote(&installer.to_string_lossy());
    let mut run = installer.clone();
    if !arguments.is_empty() {
        run.push(' ');
        run.push_str(arguments);
    }
    format!(
        "#!/bin/sh\n\
         {run}\n\
         rm -f {installer} 2>/dev/null\n\
         rm -f {launcher} 2>/dev/null\n\
         rm -rf {staging} 2>/dev/null\n\
         exit 0\n",
        launcher = sh_quote(&launcher.to_string_lossy()),
        staging = sh_quote(&staging.to_string_lossy()),
    )
}

#[cfg(any(windows, test))]
fn js_string(s: &str) -> String { serde_json::Value::String(s.to_string()).to_string() }

#[cfg(any(windows, test))]
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(any(not(windows), test))]
fn sh_quote(s: &str) -> String { format!("'{}'", s.replace('\'', r"'\''")) }
