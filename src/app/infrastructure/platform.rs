//! Operating-system "prefers dark color scheme" signal.
//!
//! The signal is a read-only input: a `watch` channel whose current value
//! is the OS preference. [`SystemThemeMonitor`] feeds it by polling the
//! desktop settings; tests and embedders feed it by hand through
//! [`system_theme_channel`].

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub fn detect_system_dark_mode() -> bool {
    // Windows: AppsUseLightTheme is 0 in dark mode
    #[cfg(target_os = "windows")]
    {
        use winreg::RegKey;
        use winreg::enums::HKEY_CURRENT_USER;

        if let Ok(hkcu) = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize")
        {
            if let Ok(value) = hkcu.get_value::<u32, _>("AppsUseLightTheme") {
                return value == 0;
            }
        }
    }

    // Linux: GNOME color scheme first, then the GTK theme name
    #[cfg(target_os = "linux")]
    {
        use std::process::Command;

        if let Ok(output) = Command::new("gsettings")
            .args(["get", "org.gnome.desktop.interface", "color-scheme"])
            .output()
        {
            let scheme = String::from_utf8_lossy(&output.stdout);
            if scheme.contains("prefer-dark") {
                return true;
            }
        }

        if let Ok(output) = Command::new("gsettings")
            .args(["get", "org.gnome.desktop.interface", "gtk-theme"])
            .output()
        {
            let theme = String::from_utf8_lossy(&output.stdout).to_lowercase();
            if theme.contains("dark") {
                return true;
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        use std::process::Command;

        if let Ok(output) = Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
        {
            if output.status.success() {
                let style = String::from_utf8_lossy(&output.stdout).to_lowercase();
                if style.contains("dark") {
                    return true;
                }
            }
        }
    }

    false
}

/// Read side of the OS theme signal.
#[derive(Debug, Clone)]
pub struct SystemThemeSignal {
    rx: watch::Receiver<bool>,
}

impl SystemThemeSignal {
    /// Current OS preference.
    pub fn prefers_dark(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the next change. `None` once the feed is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// A signal that never changes.
    pub fn fixed(prefers_dark: bool) -> Self {
        let (_feed, signal) = system_theme_channel(prefers_dark);
        signal
    }
}

/// Write side of the OS theme signal.
#[derive(Debug)]
pub struct SystemThemeFeed {
    tx: watch::Sender<bool>,
}

impl SystemThemeFeed {
    /// Publish the OS preference. Subscribers wake only on a real change.
    pub fn publish(&self, prefers_dark: bool) {
        self.tx.send_if_modified(|current| {
            if *current == prefers_dark {
                false
            } else {
                *current = prefers_dark;
                true
            }
        });
    }

    /// Number of live [`SystemThemeSignal`]s reading this feed.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn subscribe(&self) -> SystemThemeSignal {
        SystemThemeSignal {
            rx: self.tx.subscribe(),
        }
    }
}

pub fn system_theme_channel(initial: bool) -> (SystemThemeFeed, SystemThemeSignal) {
    let (tx, rx) = watch::channel(initial);
    (SystemThemeFeed { tx }, SystemThemeSignal { rx })
}

/// Polls the desktop settings and publishes changes.
pub struct SystemThemeMonitor {
    task: JoinHandle<()>,
}

impl SystemThemeMonitor {
    /// Detect the current preference synchronously, then keep polling
    /// every `interval` on the current tokio runtime.
    pub fn start(interval: Duration) -> (Self, SystemThemeSignal) {
        let (feed, signal) = system_theme_channel(detect_system_dark_mode());
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match tokio::task::spawn_blocking(detect_system_dark_mode).await {
                    Ok(prefers_dark) => feed.publish(prefers_dark),
                    Err(e) => tracing::debug!("System theme detection failed: {e}"),
                }
                if feed.tx.is_closed() {
                    break;
                }
            }
        });
        (Self { task }, signal)
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for SystemThemeMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_signal_reports_initial_value() {
        assert!(SystemThemeSignal::fixed(true).prefers_dark());
        assert!(!SystemThemeSignal::fixed(false).prefers_dark());
    }

    #[tokio::test]
    async fn publish_wakes_subscribers_on_change() {
        let (feed, mut signal) = system_theme_channel(false);
        feed.publish(true);
        assert_eq!(signal.changed().await, Some(true));
        assert!(signal.prefers_dark());
    }

    #[tokio::test]
    async fn publishing_same_value_is_not_a_change() {
        let (feed, signal) = system_theme_channel(true);
        let mut other = feed.subscribe();
        feed.publish(true);
        assert!(!other.rx.has_changed().unwrap());
        assert!(signal.prefers_dark());

        drop(feed);
        assert_eq!(other.changed().await, None);
    }
}
