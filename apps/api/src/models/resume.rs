use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::render::Template;

/// Number of summary characters kept in the artifact metadata.
const SUMMARY_SNIPPET_CHARS: usize = 200;

/// Incoming resume payload. Every field is optional; nothing is required to
/// produce a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeRequest {
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub template: Option<String>,
    /// Echo the rendered HTML back in the generation response.
    #[serde(rename = "includeHtml", alias = "include_html")]
    pub include_html: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub company: String,
    pub role: String,
    #[serde(alias = "from")]
    pub start: String,
    #[serde(alias = "to")]
    pub end: String,
    #[serde(alias = "desc")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub year: String,
}

impl ResumeRequest {
    /// Trims every text field and drops blank skills. Skills are deduplicated
    /// case-insensitively, keeping the first spelling in its original position.
    /// Entries whose fields are all empty are kept and render as empty slots.
    pub fn normalized(mut self) -> Self {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.email);
        trim_in_place(&mut self.phone);
        trim_in_place(&mut self.location);
        trim_in_place(&mut self.summary);

        for exp in &mut self.experience {
            trim_in_place(&mut exp.company);
            trim_in_place(&mut exp.role);
            trim_in_place(&mut exp.start);
            trim_in_place(&mut exp.end);
            trim_in_place(&mut exp.description);
        }
        for ed in &mut self.education {
            trim_in_place(&mut ed.school);
            trim_in_place(&mut ed.degree);
            trim_in_place(&mut ed.year);
        }

        let mut seen = HashSet::new();
        self.skills = self
            .skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
            .collect();

        self.template = self
            .template
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        self
    }

    /// The template to render with. Unknown ids fall back to the default.
    pub fn resolved_template(&self) -> Template {
        self.template
            .as_deref()
            .map(Template::parse)
            .unwrap_or_default()
    }

    /// Small JSON digest stored next to the artifact record.
    pub fn metadata(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "title": self.title,
            "summary_snippet": self.summary.chars().take(SUMMARY_SNIPPET_CHARS).collect::<String>(),
        })
    }
}

fn trim_in_place(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}

/// HTML produced by the template renderer. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct RenderedResume {
    pub html: String,
    pub template: Template,
    pub created_at: DateTime<Utc>,
}

/// Persisted metadata row for a generated resume. `id` is the only
/// correlation key between this row and the stored HTML / PDF blobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ResumeArtifact {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub template: String,
    pub html_path: String,
    pub pdf_path: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl ResumeArtifact {
    /// Deterministic blob path of the HTML document for `id`.
    pub fn html_path_for(id: Uuid) -> String {
        format!("resumes/{id}.html")
    }

    /// Deterministic blob path of the PDF export for `id`.
    pub fn pdf_path_for(id: Uuid) -> String {
        format!("resumes/{id}.pdf")
    }

    /// Record reconstructed purely from the id, used when the metadata row is
    /// missing. The PDF path is the conventional one and may not exist.
    pub fn reconstructed(id: Uuid) -> Self {
        Self {
            id,
            user_id: None,
            template: Template::default().id().to_string(),
            html_path: Self::html_path_for(id),
            pdf_path: Some(Self::pdf_path_for(id)),
            metadata: Value::Null,
            created_at: Utc::now(),
        }
    }
}
