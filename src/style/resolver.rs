//! Style lookup, restyling and deletion across a project

use crate::document::{FontTraits, BODY_STYLE_NAME};
use crate::error::StyleError;
use crate::store::{Project, ProjectStore};
use crate::style::{StyleDefinition, Stylesheet};
use std::sync::OnceLock;

fn fallback_body() -> &'static StyleDefinition {
    static BODY: OnceLock<StyleDefinition> = OnceLock::new();
    BODY.get_or_init(StyleDefinition::body)
}

/// Resolves style names against a project, then a default stylesheet
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    defaults: &'a Stylesheet,
}

impl Default for StyleResolver<'static> {
    fn default() -> Self {
        Self::new(Stylesheet::system_default())
    }
}

impl<'a> StyleResolver<'a> {
    pub fn new(defaults: &'a Stylesheet) -> Self {
        Self { defaults }
    }

    /// First hit wins: the project's stylesheet, the default stylesheet,
    /// then the default Body style. Never fails.
    pub fn resolve<'r>(&'r self, name: &str, project: &'r Project) -> &'r StyleDefinition {
        project
            .stylesheet
            .get(name)
            .or_else(|| self.defaults.get(name))
            .or_else(|| self.defaults.get(BODY_STYLE_NAME))
            .unwrap_or_else(|| fallback_body())
    }

    /// Defined by the project or the defaults, without falling back
    pub fn is_defined(&self, name: &str, project: &Project) -> bool {
        project.stylesheet.contains(name) || self.defaults.contains(name)
    }

    /// Retag every run styled `old` as `new` and apply `new`'s formatting,
    /// keeping bold and italic the text carries beyond `old`'s own face.
    ///
    /// Returns the number of documents changed. Changes go through
    /// `update`; committing is left to the caller.
    pub fn replace_style_everywhere(
        &self,
        old: &str,
        new: &str,
        store: &mut dyn ProjectStore,
    ) -> Result<usize, StyleError> {
        if !self.is_defined(new, store.project()) {
            return Err(StyleError::NotFound(new.to_string()));
        }
        let old_style = self.resolve(old, store.project()).clone();
        let new_style = self.resolve(new, store.project()).clone();

        let documents = store.fetch(&|record| record.uses_style(old));
        let changed = documents.len();
        for mut record in documents {
            let runs: Vec<_> = record
                .version
                .content
                .runs()
                .iter()
                .filter(|run| run.attributes.style_name.as_deref() == Some(old))
                .map(|run| run.range())
                .collect();
            for range in runs {
                record.version.content.update_attributes(range, |attrs| {
                    let own = old_style.font.traits;
                    let character = FontTraits::new(
                        attrs.font.is_bold() && !own.bold,
                        attrs.font.is_italic() && !own.italic,
                    );
                    attrs.font = new_style
                        .font
                        .with_traits(new_style.font.traits.union(character));
                    attrs.paragraph = new_style.paragraph;
                    attrs.style_name = Some(new_style.name.clone());
                });
            }
            store.update(record)?;
        }

        log::info!("Restyled {changed} document(s) from {old:?} to {new:?}");
        Ok(changed)
    }

    /// Delete a project style. In-use styles need a replacement, which is
    /// applied everywhere first. System styles are never deleted.
    pub fn delete_style(
        &self,
        name: &str,
        replacement: Option<&str>,
        store: &mut dyn ProjectStore,
    ) -> Result<(), StyleError> {
        let is_system = self.defaults.get(name).is_some_and(|style| style.is_system)
            || store
                .project()
                .stylesheet
                .get(name)
                .is_some_and(|style| style.is_system);
        if is_system {
            return Err(StyleError::SystemStyle(name.to_string()));
        }
        if !store.project().stylesheet.contains(name) {
            return Err(StyleError::NotFound(name.to_string()));
        }
        if replacement == Some(name) {
            return Err(StyleError::SelfReplacement(name.to_string()));
        }

        let in_use = store.fetch(&|record| record.uses_style(name)).len();
        if in_use > 0 {
            match replacement {
                Some(replacement) => {
                    self.replace_style_everywhere(name, replacement, store)?;
                }
                None => {
                    return Err(StyleError::InUse {
                        name: name.to_string(),
                        documents: in_use,
                    })
                }
            }
        }

        store.project_mut().stylesheet.remove(name);
        log::info!("Deleted style {name:?}");
        Ok(())
    }
}
