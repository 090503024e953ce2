//! Reminder delivery into a directory of HTML files.

use roadmap_core::{Email, Notifier, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Writes each email to `<dir>/<recipient>.html`.
///
/// Recipients whose sanitised names collide get a numeric suffix
/// (`a_b@x.html`, `a_b@x-2.html`).
pub struct OutboxNotifier {
    dir: PathBuf,
    written: Vec<PathBuf>,
    assigned: BTreeMap<String, PathBuf>,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
            assigned: BTreeMap::new(),
        }
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&mut self, recipient: &str) -> PathBuf {
        if let Some(path) = self.assigned.get(recipient) {
            return path.clone();
        }

        let name: String = recipient
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '@' | '.' | '-' | '_' => c,
                _ => '_',
            })
            .collect();
        let mut path = self.dir.join(format!("{}.html", name));
        let mut suffix = 2;
        while self.assigned.values().any(|taken| *taken == path) {
            path = self.dir.join(format!("{}-{}.html", name, suffix));
            suffix += 1;
        }

        self.assigned.insert(recipient.to_string(), path.clone());
        path
    }
}

fn header(email: &Email) -> String {
    format!(
        "<!--\nTo: {}\nSubject: {}\n-->\n",
        email.to.replace("--", "- -"),
        email.subject.replace("--", "- -")
    )
}

impl Notifier for OutboxNotifier {
    fn send(&mut self, email: &Email) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&email.to);
        fs::write(&path, format!("{}{}", header(email), email.html_body))?;
        log::debug!("Wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}
