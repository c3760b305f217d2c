//! Open rendered pages and reference URLs in a browser.
//!
//! Launching is best effort: nothing here returns an error to the caller, and
//! failures only show up in the log.

use std::io::ErrorKind;
use std::process::{Command, Stdio};

use tracing::{info, warn};

pub const DEFAULT_BROWSER: &str = "chromium";

pub trait Launcher {
    fn open(&self, targets: &[String]);
}

/// Start `browser` with every target as an argument; when the binary is not
/// installed, hand each target to the platform opener instead.
pub struct BrowserLauncher {
    browser: String,
}

impl BrowserLauncher {
    pub fn new(browser: impl Into<String>) -> Self {
        Self {
            browser: browser.into(),
        }
    }

    /// Browser from `EPI_BROWSER`, else `chromium`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("EPI_BROWSER").unwrap_or_else(|_| DEFAULT_BROWSER.to_string()))
    }
}

impl Launcher for BrowserLauncher {
    fn open(&self, targets: &[String]) {
        if targets.is_empty() {
            return;
        }

        let spawned = Command::new(&self.browser)
            .args(targets)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(_) => info!(browser = %self.browser, targets = targets.len(), "opened browser"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(browser = %self.browser, "browser not installed, using system opener");
                for target in targets {
                    open_with_system(target);
                }
            }
            Err(e) => warn!(browser = %self.browser, error = %e, "failed to start browser"),
        }
    }
}

fn open_with_system(target: &str) {
    let mut cmd = system_opener(target);
    if let Err(e) = cmd.stdout(Stdio::null()).stderr(Stdio::null()).spawn() {
        warn!(url = target, error = %e, "failed to open target");
    }
}

#[cfg(target_os = "windows")]
fn system_opener(target: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", "", target]);
    cmd
}

#[cfg(target_os = "macos")]
fn system_opener(target: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(target);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn system_opener(target: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(target);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_target_list_spawns_nothing() {
        // A browser that cannot exist: with no targets it must not even be looked up.
        BrowserLauncher::new("/nonexistent/browser-binary").open(&[]);
    }

    #[test]
    fn system_opener_receives_target() {
        let cmd = system_opener("https://example.org");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args.last().map(String::as_str), Some("https://example.org"));
    }
}
