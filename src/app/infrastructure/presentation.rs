use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::app::domain::theme::ResolvedTheme;

/// The single shared surface the resolved theme is reflected on.
///
/// Only the preference store writes to it.
pub trait PresentationRoot: Send + Sync {
    /// Replace any previously applied mode marker with `mode`.
    fn apply_mode(&self, mode: ResolvedTheme);

    /// The mode marker currently applied, if any.
    fn applied_mode(&self) -> Option<ResolvedTheme>;
}

/// Class list of the document root element.
///
/// Clones share the same list, so an observer can hold a read handle
/// while the preference store owns the writer.
#[derive(Debug, Clone, Default)]
pub struct DocumentRoot {
    classes: Arc<Mutex<BTreeSet<String>>>,
}

impl DocumentRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let root = Self::new();
        {
            let mut set = root.lock();
            set.extend(classes.into_iter().map(Into::into));
        }
        root
    }

    pub fn classes(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.lock().contains(class)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.classes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PresentationRoot for DocumentRoot {
    fn apply_mode(&self, mode: ResolvedTheme) {
        let mut classes = self.lock();
        for marker in ResolvedTheme::ALL {
            classes.remove(marker.class_name());
        }
        classes.insert(mode.class_name().to_string());
    }

    fn applied_mode(&self) -> Option<ResolvedTheme> {
        let classes = self.lock();
        ResolvedTheme::ALL
            .into_iter()
            .find(|mode| classes.contains(mode.class_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_replaces_previous_marker() {
        let root = DocumentRoot::new();
        assert_eq!(root.applied_mode(), None);

        root.apply_mode(ResolvedTheme::Dark);
        assert_eq!(root.applied_mode(), Some(ResolvedTheme::Dark));

        root.apply_mode(ResolvedTheme::Light);
        assert_eq!(root.classes(), vec!["light".to_string()]);
    }

    #[test]
    fn unrelated_classes_survive() {
        let root = DocumentRoot::with_classes(["antialiased", "dark"]);
        let observer = root.clone();

        root.apply_mode(ResolvedTheme::Light);

        assert!(observer.has_class("antialiased"));
        assert!(observer.has_class("light"));
        assert!(!observer.has_class("dark"));
    }
}
