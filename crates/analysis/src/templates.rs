use crate::error::{AnalysisError, Result};
use marketlens_protocol::TemplateId;
use std::collections::BTreeMap;
use std::path::Path;

const BUILTIN: &[(TemplateId, &str)] = &[
    (TemplateId::TopGainers, include_str!("../templates/top_gainers.md")),
    (TemplateId::LargeCap, include_str!("../templates/large_cap.md")),
    (TemplateId::Announcements, include_str!("../templates/announcements.md")),
    (TemplateId::Results, include_str!("../templates/results.md")),
    (TemplateId::Shareholding, include_str!("../templates/shareholding.md")),
    (TemplateId::ProfitLoss, include_str!("../templates/profit_loss.md")),
    (TemplateId::General, include_str!("../templates/general.md")),
];

/// Placeholder replaced by the user's question.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Analysis prompt text per template id.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: BTreeMap<TemplateId, String>,
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateLibrary {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            templates: BUILTIN
                .iter()
                .map(|(id, text)| (*id, (*text).to_string()))
                .collect(),
        }
    }

    /// Built-in templates, overridden by `<dir>/<template_id>.md` files that exist.
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(AnalysisError::Template(format!(
                "template directory {} does not exist",
                dir.display()
            )));
        }
        let mut library = Self::builtin();
        for id in TemplateId::ALL {
            let path = dir.join(format!("{}.md", id.as_str()));
            if !path.is_file() {
                continue;
            }
            let text = std::fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                return Err(AnalysisError::Template(format!(
                    "template {} is empty",
                    path.display()
                )));
            }
            log::debug!("template {id} overridden from {}", path.display());
            library.templates.insert(id, text);
        }
        Ok(library)
    }

    #[must_use]
    pub fn get(&self, id: TemplateId) -> &str {
        self.templates.get(&id).map_or("", String::as_str)
    }

    /// System prompt for `id` with the question filled in.
    #[must_use]
    pub fn render(&self, id: TemplateId, query: &str) -> String {
        self.get(id).replace(QUERY_PLACEHOLDER, query.trim())
    }
}
