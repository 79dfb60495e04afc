//! # chrome-locate
//!
//! Find a Chrome or Chromium executable that can be launched in headless mode,
//! so that callers driving the browser over the DevTools protocol do not need
//! users to pass `--chrome /path/to/chrome` on every run.
//!
//! ## Search order
//!
//! On the first call to [`locate_chrome`]:
//!
//! 1. `SHEETSHOT_CHROME`, then `CHROME`: explicit overrides.
//! 2. Every directory on `PATH`, trying the platform's usual binary names
//!    (`chromium`, `google-chrome-stable`, `chrome`, …).
//! 3. Well-known install locations (`/Applications/...` on macOS,
//!    `Program Files` on Windows).
//! 4. The Playwright browser cache (`~/.cache/ms-playwright` on Linux), newest
//!    revision first. Environments provisioned with `playwright install
//!    chromium` work without further setup.
//!
//! The resolved path is memoised for the lifetime of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrome_locate::locate_chrome;
//!
//! let chrome = locate_chrome().expect("no Chrome/Chromium installed");
//! println!("using {}", chrome.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `SHEETSHOT_CHROME` / `CHROME`: path to a browser executable.
//! - `PLAYWRIGHT_BROWSERS_PATH`: override the Playwright cache directory.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variables consulted (in order) before any search.
pub const OVERRIDE_VARS: [&str; 2] = ["SHEETSHOT_CHROME", "CHROME"];

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by chrome-locate operations.
#[derive(Error, Debug)]
pub enum ChromeLocateError {
    /// The current OS has no known Chrome layout.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// Nothing usable was found anywhere in the search order.
    #[error(
        "No Chrome/Chromium executable found.\n\
         Searched: {searched}\n\
         Install Chromium, run `npx playwright install chromium`, or set SHEETSHOT_CHROME."
    )]
    NotFound { searched: String },
}

// ── Internal: platform metadata ──────────────────────────────────────────────

struct PlatformInfo {
    /// Binary names tried in every `PATH` entry.
    path_names: &'static [&'static str],
    /// Absolute install locations checked after `PATH`.
    well_known: &'static [&'static str],
    /// Relative executable paths inside a Playwright `chromium-<rev>` directory.
    playwright_layouts: &'static [&'static str],
}

fn detect_platform() -> Result<PlatformInfo, ChromeLocateError> {
    match std::env::consts::OS {
        "linux" | "freebsd" | "openbsd" | "netbsd" => Ok(PlatformInfo {
            path_names: &[
                "chromium",
                "chromium-browser",
                "google-chrome-stable",
                "google-chrome",
                "chrome",
                "headless_shell",
            ],
            well_known: &["/usr/lib/chromium/chromium", "/snap/bin/chromium"],
            playwright_layouts: &[
                "chrome-linux64/chrome",
                "chrome-linux/chrome",
                "chrome-linux/headless_shell",
                "chrome-headless-shell-linux64/chrome-headless-shell",
            ],
        }),
        "macos" => Ok(PlatformInfo {
            path_names: &["chromium", "google-chrome", "chrome"],
            well_known: &[
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
            ],
            playwright_layouts: &[
                "chrome-mac/Chromium.app/Contents/MacOS/Chromium",
                "chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
                "chrome-mac/headless_shell",
            ],
        }),
        "windows" => Ok(PlatformInfo {
            path_names: &["chrome.exe", "chromium.exe", "msedge.exe"],
            well_known: &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
            ],
            playwright_layouts: &[
                r"chrome-win64\chrome.exe",
                r"chrome-win\chrome.exe",
                r"chrome-win\headless_shell.exe",
            ],
        }),
        os => Err(ChromeLocateError::UnsupportedPlatform {
            os: os.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }),
    }
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Returns the directory where Playwright stores downloaded browsers.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/ms-playwright/`
/// - **Linux**: `~/.cache/ms-playwright/`
/// - **Windows**: `%LOCALAPPDATA%\ms-playwright\`
///
/// Override by setting `PLAYWRIGHT_BROWSERS_PATH`.
pub fn playwright_cache_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var("PLAYWRIGHT_BROWSERS_PATH") {
        if !override_dir.is_empty() && override_dir != "0" {
            return PathBuf::from(override_dir);
        }
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("ms-playwright")
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns `true` if a browser executable can be found without launching it.
pub fn is_chrome_available() -> bool {
    locate_chrome().is_ok()
}

/// Resolves the browser executable following the documented search order.
///
/// # Thread safety
///
/// Safe to call from multiple threads; the filesystem search happens at most
/// a handful of times per process and the first success is memoised.
pub fn locate_chrome() -> Result<PathBuf, ChromeLocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = search()?;

    // Best-effort cache in the OnceLock (ignore race; both will succeed).
    let _ = RESOLVED_PATH.set(path.clone());

    Ok(path)
}

/// Looks for a browser binary in every directory of a `PATH`-style value.
pub fn find_on_path(path_var: &OsStr, names: &[&str]) -> Option<PathBuf> {
    std::env::split_paths(path_var).find_map(|dir| {
        names
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| is_executable(candidate))
    })
}

/// Looks for a browser inside a Playwright cache directory.
///
/// Playwright installs each revision as `chromium-<rev>` (or
/// `chromium_headless_shell-<rev>`); the highest revision wins.
pub fn find_in_playwright_cache(cache_dir: &Path, layouts: &[&str]) -> Option<PathBuf> {
    let entries = std::fs::read_dir(cache_dir).ok()?;

    let mut revisions: Vec<(u64, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let (prefix, rev) = name.rsplit_once('-')?;
            if prefix != "chromium" && prefix != "chromium_headless_shell" {
                return None;
            }
            rev.parse::<u64>().ok().map(|r| (r, entry.path()))
        })
        .collect();

    revisions.sort_by(|a, b| b.0.cmp(&a.0));

    revisions.into_iter().find_map(|(_, dir)| {
        layouts
            .iter()
            .map(|layout| dir.join(layout))
            .find(|candidate| is_executable(candidate))
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn search() -> Result<PathBuf, ChromeLocateError> {
    // 1. Environment variable override.
    for var in OVERRIDE_VARS {
        if let Ok(env_path) = std::env::var(var) {
            let p = PathBuf::from(&env_path);
            if is_executable(&p) {
                return Ok(p);
            }
            // Fall through: variable set but unusable → keep searching.
            eprintln!(
                "chrome-locate: {var}='{}' is not an executable file; searching …",
                p.display()
            );
        }
    }

    let info = detect_platform()?;

    // 2. PATH.
    if let Some(path_var) = std::env::var_os("PATH") {
        if let Some(p) = find_on_path(&path_var, info.path_names) {
            return Ok(p);
        }
    }

    // 3. Well-known install locations.
    if let Some(p) = info
        .well_known
        .iter()
        .map(PathBuf::from)
        .find(|p| is_executable(p))
    {
        return Ok(p);
    }

    // 4. Playwright cache.
    let cache = playwright_cache_dir();
    if let Some(p) = find_in_playwright_cache(&cache, info.playwright_layouts) {
        return Ok(p);
    }

    Err(ChromeLocateError::NotFound {
        searched: format!(
            "{}, PATH ({}), {}",
            OVERRIDE_VARS.join("/"),
            info.path_names.join(", "),
            cache.display()
        ),
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
