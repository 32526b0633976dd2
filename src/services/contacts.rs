//! Email contacts kept in `contacts.json` (lower-cased name -> address).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use super::store::{load_json, save_json};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("email pattern")
});

/// Minimum similarity ratio for a fuzzy name match.
const FUZZY_CUTOFF: f64 = 0.5;

/// Turn "john dot smith at example dot com" into "john.smith@example.com".
/// Words not touching a spoken symbol keep their spaces.
pub fn spoken_email(text: &str) -> String {
    let mut out = String::new();
    let mut glue = true;
    for word in text.split_whitespace() {
        let symbol = match word.to_lowercase().as_str() {
            "at" => Some('@'),
            "dot" => Some('.'),
            "underscore" => Some('_'),
            "dash" | "hyphen" => Some('-'),
            _ => None,
        };
        match symbol {
            Some(c) => {
                out.push(c);
                glue = true;
            }
            None => {
                if !glue {
                    out.push(' ');
                }
                out.push_str(word);
                glue = false;
            }
        }
    }
    out
}

/// First email address in `text`, accepting the spoken form.
pub fn find_email(text: &str) -> Option<String> {
    if let Some(m) = EMAIL_RE.find(text) {
        return Some(m.as_str().to_lowercase());
    }
    let spoken = spoken_email(text);
    EMAIL_RE.find(&spoken).map(|m| m.as_str().to_lowercase())
}

/// Similarity in 0..=1 from Levenshtein distance.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

pub struct ContactBook {
    path: PathBuf,
    contacts: BTreeMap<String, String>,
}

impl ContactBook {
    pub fn open(data_dir: &Path) -> Self {
        let path = data_dir.join("contacts.json");
        let contacts = load_json(&path);
        Self { path, contacts }
    }

    /// Add or replace a contact. The address may be in spoken form.
    pub fn add(&mut self, name: &str, email: &str) -> anyhow::Result<String> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            anyhow::bail!("Contact name cannot be empty");
        }
        let Some(email) = find_email(email) else {
            anyhow::bail!("'{}' is not a valid email address", email.trim());
        };
        let mut next = self.contacts.clone();
        next.insert(name.clone(), email.clone());
        save_json(&self.path, &next)?;
        self.contacts = next;
        info!(name = %name, "Contact saved");
        Ok(email)
    }

    /// All contacts ordered by name.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.contacts
            .iter()
            .map(|(n, e)| (n.as_str(), e.as_str()))
            .collect()
    }

    /// Resolve a spoken name: exact, then closest similar name, then a
    /// shared word, then first name.
    pub fn resolve(&self, spoken: &str) -> Option<&str> {
        let spoken = spoken.trim().to_lowercase();
        if spoken.is_empty() {
            return None;
        }
        if let Some(email) = self.contacts.get(&spoken) {
            return Some(email.as_str());
        }

        let best = self
            .contacts
            .keys()
            .map(|name| (similarity(&spoken, name), name))
            .filter(|(score, _)| *score >= FUZZY_CUTOFF)
            .max_by(|a, b| a.0.total_cmp(&b.0));
        if let Some((score, name)) = best {
            debug!(spoken = %spoken, name = %name, score, "Fuzzy contact match");
            return self.contacts.get(name).map(String::as_str);
        }

        let partial = self.contacts.iter().find(|(name, _)| {
            spoken.split_whitespace().filter(|w| w.len() > 2).any(|word| {
                name.split_whitespace()
                    .any(|part| part.contains(word) || word.contains(part))
            })
        });
        if let Some((_, email)) = partial {
            return Some(email.as_str());
        }

        let first = spoken.split_whitespace().next()?;
        self.contacts
            .iter()
            .find(|(name, _)| name.split_whitespace().next() == Some(first))
            .map(|(_, email)| email.as_str())
    }

    /// Addresses named in a spoken recipient list ("john and mary, bob at
    /// example dot com"). Unknown names are skipped; duplicates collapse.
    pub fn parse_recipients(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let lowered = text.to_lowercase().replace(',', " and ");
        for part in lowered.split(" and ") {
            let part = part.trim();
            let part = part
                .strip_prefix("to ")
                .or_else(|| part.strip_prefix("send "))
                .unwrap_or(part)
                .trim();
            if part.len() < 2 {
                continue;
            }
            let address = find_email(part).or_else(|| self.resolve(part).map(str::to_string));
            match address {
                Some(address) if !found.contains(&address) => found.push(address),
                Some(_) => {}
                None => debug!(part, "No recipient match"),
            }
        }
        found
    }
}
