//! HTML document assembly for resumes.
//!
//! Every user-supplied value goes through [`escape_html`] before it is
//! interpolated. Free-text fields additionally get their line breaks turned
//! into `<br/>` tags after escaping.

use chrono::Utc;

use crate::models::resume::{Education, Experience, ResumeRequest, RenderedResume};
use crate::render::templates::{Template, PRINT_CSS};

pub const NO_EXPERIENCE: &str = "No experience listed";
pub const NO_EDUCATION: &str = "No education listed";
pub const NO_SKILLS: &str = "No skills listed";

const UNNAMED: &str = "Unnamed";

/// Escapes the five HTML-significant characters.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes `raw` and converts `\r\n` / `\n` to `<br/>`.
pub fn escape_multiline(raw: &str) -> String {
    escape_html(raw).replace("\r\n", "\n").replace('\n', "<br/>")
}

/// Renders a complete, self-contained HTML document.
///
/// `summary` is passed separately so the caller can substitute an improved
/// version; the request's own summary is ignored.
pub fn render_resume(request: &ResumeRequest, summary: &str, template: Template) -> RenderedResume {
    RenderedResume {
        html: render_document(request, summary, template),
        template,
        created_at: Utc::now(),
    }
}

pub fn render_document(request: &ResumeRequest, summary: &str, template: Template) -> String {
    let name = if request.name.is_empty() {
        UNNAMED.to_string()
    } else {
        escape_html(&request.name)
    };

    let header = render_header(&name, request);
    let summary_section = section(
        "Professional Summary",
        &format!("<div class=\"summary\">{}</div>", escape_multiline(summary)),
    );
    let experience = section("Experience", &render_experience(&request.experience));
    let education = section("Education", &render_education(&request.education));
    let skills = section("Skills", &render_skills(&request.skills));

    let body = if template.is_two_column() {
        format!(
            "<div class=\"layout two-column\">\n<main>\n{header}{summary_section}{experience}{education}</main>\n<aside>\n{skills}</aside>\n</div>\n"
        )
    } else {
        format!("<div class=\"layout\">\n{header}{summary_section}{experience}{education}{skills}</div>\n")
    };

    let mut html = String::with_capacity(4096);
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\" />\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\" />\n");
    html.push_str(&format!("<title>Resume &mdash; {name}</title>\n"));
    html.push_str(&format!(
        "<style>{}{}</style>\n",
        template.stylesheet(),
        PRINT_CSS
    ));
    html.push_str(&format!(
        "</head>\n<body class=\"template-{}\">\n",
        template.id()
    ));
    html.push_str(&body);
    html.push_str(
        "<div class=\"no-print\" style=\"margin-top:18px;\"><button onclick=\"window.print()\">Print / Save as PDF</button></div>\n",
    );
    html.push_str("</body>\n</html>\n");
    html
}

fn render_header(name: &str, request: &ResumeRequest) -> String {
    format!(
        "<header>\n<div>\n<h1>{name}</h1>\n<div class=\"muted\">{title}</div>\n</div>\n\
         <div class=\"contact\">\n<div>{email}</div>\n<div>{phone}</div>\n<div>{location}</div>\n</div>\n</header>\n",
        title = escape_html(&request.title),
        email = escape_html(&request.email),
        phone = escape_html(&request.phone),
        location = escape_html(&request.location),
    )
}

fn section(heading: &str, inner: &str) -> String {
    format!("<section class=\"section\">\n<h2>{heading}</h2>\n{inner}</section>\n")
}

fn placeholder(text: &str) -> String {
    format!("<div class=\"muted placeholder\">{text}</div>\n")
}

fn render_experience(entries: &[Experience]) -> String {
    if entries.is_empty() {
        return placeholder(NO_EXPERIENCE);
    }
    entries
        .iter()
        .map(|exp| {
            format!(
                "<div class=\"job\">\n<div style=\"font-weight:600\">{} &mdash; {}</div>\n\
                 <div class=\"muted\">{} &mdash; {}</div>\n<div>{}</div>\n</div>\n",
                escape_html(&exp.role),
                escape_html(&exp.company),
                escape_html(&exp.start),
                escape_html(&exp.end),
                escape_multiline(&exp.description),
            )
        })
        .collect()
}

fn render_education(entries: &[Education]) -> String {
    if entries.is_empty() {
        return placeholder(NO_EDUCATION);
    }
    entries
        .iter()
        .map(|ed| {
            format!(
                "<div class=\"school\">\n<div style=\"font-weight:600\">{} &mdash; {}</div>\n\
                 <div class=\"muted\">{}</div>\n</div>\n",
                escape_html(&ed.degree),
                escape_html(&ed.school),
                escape_html(&ed.year),
            )
        })
        .collect()
}

fn render_skills(skills: &[String]) -> String {
    if skills.is_empty() {
        return placeholder(NO_SKILLS);
    }
    let items: String = skills
        .iter()
        .map(|s| format!("<li>{}</li>", escape_html(s)))
        .collect();
    format!("<ul class=\"skills\">{items}</ul>\n")
}
