use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::release::ReleaseClass;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{\s*(\w+)\s*\}\}").unwrap();
}

/// Replaces every `{{name}}` token with its value. Unknown names are
/// replaced with nothing.
pub fn fill(template: &str, values: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

#[derive(Default, Debug, Clone)]
pub struct Templates {
    album: Option<String>,
    single: Option<String>,
}

fn read(dir: &Path, class: ReleaseClass) -> Option<String> {
    let path = dir.join(class.template());
    match fs::read_to_string(&path) {
        Ok(t) => Some(t),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn! {?path, %class, "Template not found, pages of this class will not be rendered"};
            None
        }
        Err(error) => {
            tracing::warn! {?path, %class, ?error, "Could not read template"};
            None
        }
    }
}

impl Templates {
    pub fn load(dir: &Path) -> Self {
        Templates {
            album: read(dir, ReleaseClass::Album),
            single: read(dir, ReleaseClass::Single),
        }
    }

    pub fn get(&self, class: ReleaseClass) -> Option<&str> {
        match class {
            ReleaseClass::Album => self.album.as_deref(),
            ReleaseClass::Single => self.single.as_deref(),
        }
    }
}
