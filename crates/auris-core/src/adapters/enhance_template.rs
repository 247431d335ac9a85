//! Placeholder text-enhancement port implementation.
//!
//! Stands in for an LLM-backed adapter; derives a title and tags from the
//! transcript deterministically by word frequency so the service is
//! runnable end to end without a live LLM dependency.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::error::Result;
use crate::model::Note;
use crate::ports::TextToTextPort;

pub struct TemplateEnhancer;

impl TextToTextPort for TemplateEnhancer {
    fn enhance(&self, text: &str) -> Result<Note> {
        let words: Vec<&str> = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .collect();

        let title = words
            .iter()
            .take(8)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        let title = if title.is_empty() {
            "Untitled note".to_string()
        } else {
            title
        };

        let mut counts: HashMap<String, usize> = HashMap::new();
        for word in &words {
            if word.len() < 4 {
                continue;
            }
            *counts.entry(word.to_lowercase()).or_insert(0) += 1;
        }
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut tags: Vec<String> = ranked.into_iter().take(5).map(|(w, _)| w).collect();
        while tags.len() < 3 {
            tags.push(format!("note-{}", tags.len() + 1));
        }

        Ok(Note {
            title,
            body: text.to_string(),
            tags,
            created_at: SystemTime::now(),
        })
    }
}
