//! # Platform-specific utilities
//!
//! Questo modulo centralizza la risoluzione cross-platform dei binari esterni
//! (ffmpeg, ffprobe). Supporta una directory di tool dedicata tramite la
//! variabile `TOOLS_DIR` e, in alternativa, i tool di sistema nel PATH.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::debug;

pub const TOOLS_DIR_ENV: &str = "TOOLS_DIR";

/// Platform-specific command manager
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    which_command: &'static str,
    tools_dir: Option<PathBuf>,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(|| Self::new(std::env::var_os(TOOLS_DIR_ENV).map(PathBuf::from)))
    }

    fn new(tools_dir: Option<PathBuf>) -> Self {
        let mut commands = HashMap::new();
        let which_command = if cfg!(windows) {
            commands.insert("ffmpeg", "ffmpeg.exe");
            commands.insert("ffprobe", "ffprobe.exe");
            "where"
        } else {
            commands.insert("ffmpeg", "ffmpeg");
            commands.insert("ffprobe", "ffprobe");
            "which"
        };

        Self {
            commands,
            which_command,
            tools_dir: tools_dir.filter(|dir| dir.is_dir()),
        }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).copied().unwrap_or(base_name)
    }

    /// Program to spawn for a tool: the `TOOLS_DIR` copy when present, else the bare name
    pub fn program(&self, base_name: &str) -> PathBuf {
        let command = self.get_command(base_name);
        if let Some(ref dir) = self.tools_dir {
            let candidate = dir.join(command);
            if candidate.is_file() {
                debug!("Using bundled tool: {} -> {:?}", base_name, candidate);
                return candidate;
            }
        }
        PathBuf::from(command)
    }

    /// Get the command used to check if a program exists
    pub fn which_command(&self) -> &str {
        self.which_command
    }

    /// Check if a command is available in the tools directory or on the PATH
    pub async fn is_command_available(&self, base_name: &str) -> bool {
        let program = self.program(base_name);
        if program.is_absolute() {
            return true;
        }

        let result = tokio::process::Command::new(self.which_command)
            .arg(program)
            .output()
            .await;

        match result {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    /// Availability line per external tool, for the `check` command
    pub async fn get_tools_report(&self) -> String {
        let mut lines = Vec::new();
        for tool in ["ffmpeg", "ffprobe"] {
            let mark = if self.is_command_available(tool).await { "✅" } else { "❌" };
            lines.push(format!("{} {} ({})", mark, tool, self.program(tool).display()));
        }
        lines.join("\n")
    }

    /// Get system information for debugging
    pub fn system_info() -> SystemInfo {
        SystemInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        }
    }
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl std::fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_platform_commands() {
        let platform = PlatformCommands::instance();

        let ffmpeg = platform.get_command("ffmpeg");
        assert!(ffmpeg.starts_with("ffmpeg"));

        // unknown tools pass through untouched
        assert_eq!(platform.get_command("exiftool"), "exiftool");
        assert!(!platform.which_command().is_empty());
    }

    #[test]
    fn test_tools_dir_takes_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let platform = PlatformCommands::new(Some(temp_dir.path().to_path_buf()));
        let name = platform.get_command("ffprobe").to_string();

        assert_eq!(platform.program("ffprobe"), PathBuf::from(&name));

        std::fs::write(temp_dir.path().join(&name), b"").unwrap();
        assert_eq!(platform.program("ffprobe"), temp_dir.path().join(&name));
    }

    #[test]
    fn test_missing_tools_dir_is_ignored() {
        let platform = PlatformCommands::new(Some(PathBuf::from("/definitely/not/here")));
        assert_eq!(platform.program("ffmpeg"), PathBuf::from(platform.get_command("ffmpeg")));
    }

    #[tokio::test]
    async fn test_command_availability() {
        let temp_dir = TempDir::new().unwrap();
        let platform = PlatformCommands::new(Some(temp_dir.path().to_path_buf()));
        let name = platform.get_command("ffmpeg").to_string();
        std::fs::write(temp_dir.path().join(&name), b"").unwrap();

        assert!(platform.is_command_available("ffmpeg").await);
        assert!(
            !platform
                .is_command_available("media-tools-no-such-binary")
                .await
        );

        let report = platform.get_tools_report().await;
        assert!(report.contains("✅ ffmpeg"));
    }

    #[test]
    fn test_system_info() {
        let info = PlatformCommands::system_info();
        assert!(!info.os.is_empty());
        assert!(!info.arch.is_empty());
        assert!(!info.family.is_empty());
    }
}
