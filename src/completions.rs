use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap_complete::{generate, Shell};

use crate::app::AppError;

const BIN_NAME: &str = "donmani";

pub fn generate_completions(shell: Shell, buf: &mut dyn Write) {
    let mut cmd = crate::cli::styled_command();
    generate(shell, &mut cmd, BIN_NAME, buf);
}

/// Accepts a bare name (`zsh`) or a path such as `$SHELL` (`/bin/zsh`).
fn shell_from_name(raw: &str) -> Option<Shell> {
    let name = raw.trim().rsplit('/').next()?.to_ascii_lowercase();
    match name.as_str() {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        _ => None,
    }
}

/// Where each shell looks for completion scripts without any rc edits,
/// honoring `XDG_DATA_HOME` where the shell does.
fn install_path(shell: Shell, home: &Path, xdg_data: Option<&Path>) -> Option<PathBuf> {
    let data = xdg_data
        .map(Path::to_path_buf)
        .unwrap_or_else(|| home.join(".local/share"));
    match shell {
        Shell::Bash => Some(data.join("bash-completion/completions").join(BIN_NAME)),
        Shell::Zsh => Some(home.join(".zfunc").join(format!("_{BIN_NAME}"))),
        Shell::Fish => Some(
            home.join(".config/fish/completions")
                .join(format!("{BIN_NAME}.fish")),
        ),
        _ => None,
    }
}

fn install(shell: Shell) -> io::Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "HOME is not set"))?;
    let xdg_data = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from);
    let path = install_path(shell, &home, xdg_data.as_deref()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no install location for {shell}"),
        )
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut script = Vec::new();
    generate_completions(shell, &mut script);
    std::fs::write(&path, script)?;
    Ok(path)
}

pub fn run_completions_command(shell_arg: Option<&str>, install_script: bool) -> Result<(), AppError> {
    let shell = match shell_arg {
        Some(name) => shell_from_name(name)
            .ok_or_else(|| AppError::InvalidArgument(format!("unsupported shell '{name}'")))?,
        None => std::env::var("SHELL")
            .ok()
            .as_deref()
            .and_then(shell_from_name)
            .ok_or_else(|| {
                AppError::InvalidArgument("cannot tell the shell from $SHELL; name it".into())
            })?,
    };

    if !install_script {
        generate_completions(shell, &mut io::stdout().lock());
        return Ok(());
    }
    let path = install(shell)?;
    println!("completions written to {}", path.display());
    if shell == Shell::Zsh {
        println!("add `fpath=(~/.zfunc $fpath)` before compinit in ~/.zshrc if it is missing");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap_complete::Shell;

    use super::{generate_completions, install_path, shell_from_name};

    #[test]
    fn shell_names_and_paths_are_recognized() {
        assert_eq!(shell_from_name("ZSH"), Some(Shell::Zsh));
        assert_eq!(shell_from_name("/usr/local/bin/fish"), Some(Shell::Fish));
        assert_eq!(shell_from_name("/bin/bash"), Some(Shell::Bash));
        assert_eq!(shell_from_name("pwsh"), None);
    }

    #[test]
    fn install_paths_follow_each_shells_convention() {
        let home = Path::new("/home/star");
        assert_eq!(
            install_path(Shell::Bash, home, None).unwrap(),
            Path::new("/home/star/.local/share/bash-completion/completions/donmani")
        );
        assert_eq!(
            install_path(Shell::Bash, home, Some(Path::new("/data"))).unwrap(),
            Path::new("/data/bash-completion/completions/donmani")
        );
        assert_eq!(
            install_path(Shell::Zsh, home, None).unwrap(),
            Path::new("/home/star/.zfunc/_donmani")
        );
        assert!(install_path(Shell::Elvish, home, None).is_none());
    }

    #[test]
    fn generated_script_names_the_subcommands() {
        let mut buf = Vec::new();
        generate_completions(Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("donmani"));
        assert!(script.contains("record"));
        assert!(script.contains("decorate"));
    }
}
