use serde::{Deserialize, Serialize};

/// Visual themes the renderer knows about.
///
/// Parsing never fails: anything unrecognized renders as [`Template::Classic`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Template {
    #[default]
    Classic,
    Modern,
    Compact,
    Creative,
    TwoColumn,
}

impl Template {
    #[cfg(test)]
    pub const ALL: [Template; 5] = [
        Template::Classic,
        Template::Modern,
        Template::Compact,
        Template::Creative,
        Template::TwoColumn,
    ];

    /// Case-insensitive lookup with silent fallback to the default theme.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "modern" => Template::Modern,
            "compact" => Template::Compact,
            "creative" => Template::Creative,
            "two-column" | "two_column" | "twocolumn" => Template::TwoColumn,
            _ => Template::Classic,
        }
    }

    /// Stable identifier echoed back to clients and stored with the artifact.
    pub fn id(self) -> &'static str {
        match self {
            Template::Classic => "classic",
            Template::Modern => "modern",
            Template::Compact => "compact",
            Template::Creative => "creative",
            Template::TwoColumn => "two-column",
        }
    }

    /// Whether the document uses the main + sidebar layout instead of the
    /// single-column skeleton.
    pub fn is_two_column(self) -> bool {
        matches!(self, Template::TwoColumn)
    }

    pub fn stylesheet(self) -> &'static str {
        match self {
            Template::Classic => CLASSIC_CSS,
            Template::Modern => MODERN_CSS,
            Template::Compact => COMPACT_CSS,
            Template::Creative => CREATIVE_CSS,
            Template::TwoColumn => TWO_COLUMN_CSS,
        }
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Print rules shared by every theme: A4 pages, fixed margins, backgrounds kept.
pub const PRINT_CSS: &str = "
    @page { size: A4; margin: 12mm; }
    html { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
    @media print { .no-print { display: none; } }
";

const CLASSIC_CSS: &str = "
    body { font-family: Georgia, 'Times New Roman', serif; color: #111; margin: 24px; }
    header { display: flex; justify-content: space-between; align-items: flex-start; margin-bottom: 12px; }
    h1 { margin: 0; font-size: 24px; }
    h2 { margin: 8px 0 6px; font-size: 16px; color: #333; }
    .contact { text-align: right; font-size: 13px; color: #555; }
    .section { margin-top: 10px; }
    .job { margin-bottom: 8px; }
    .muted { color: #555; font-size: 13px; }
    ul.skills { list-style: none; padding: 0; display: flex; gap: 8px; flex-wrap: wrap; }
    ul.skills li { background: #eef2ff; padding: 6px 8px; border-radius: 6px; font-size: 13px; }
";

const MODERN_CSS: &str = "
    body { font-family: 'Segoe UI', Roboto, Arial, sans-serif; color: #111; margin: 24px; }
    header { display: flex; justify-content: space-between; align-items: flex-start; margin-bottom: 12px; }
    h1 { margin: 0; font-size: 26px; color: #0b76ff; }
    h2 { margin: 8px 0 6px; font-size: 15px; color: #333; }
    .contact { text-align: right; font-size: 13px; color: #777; }
    .muted { color: #666; }
    .section { margin-top: 12px; padding: 12px; border-left: 4px solid #eef6ff; background: #fbfdff; border-radius: 6px; }
    .job { margin-bottom: 8px; }
    ul.skills { list-style: none; padding: 0; display: flex; gap: 8px; flex-wrap: wrap; margin: 0; }
    ul.skills li { background: #e8f2ff; padding: 6px 8px; border-radius: 6px; font-size: 13px; }
";

const COMPACT_CSS: &str = "
    body { font-family: Arial, Helvetica, sans-serif; color: #111; margin: 18px; font-size: 13px; }
    header { display: block; margin-bottom: 8px; }
    h1 { margin: 0; font-size: 20px; }
    h2 { margin: 6px 0 4px; font-size: 14px; }
    .contact { font-size: 12px; color: #555; }
    .muted { color: #555; }
    .section { margin-top: 8px; }
    .job { margin-bottom: 6px; }
    ul.skills { list-style: none; padding: 0; display: flex; gap: 6px; flex-wrap: wrap; margin: 0; }
    ul.skills li { background: #f0f0f0; padding: 4px 6px; border-radius: 4px; font-size: 12px; }
";

const CREATIVE_CSS: &str = "
    body { font-family: Inter, Arial, sans-serif; color: #1f2937; margin: 24px; }
    header { display: flex; justify-content: space-between; align-items: center; gap: 12px; flex-wrap: wrap; border-bottom: 3px solid #ff6b6b; padding-bottom: 8px; }
    h1 { margin: 0; font-size: 28px; color: #ff6b6b; }
    h2 { margin: 10px 0 6px; font-size: 16px; color: #ff6b6b; text-transform: uppercase; letter-spacing: 1px; }
    .contact { text-align: right; font-size: 13px; color: #6b7280; }
    .muted { color: #6b7280; font-size: 13px; }
    .section { margin-top: 12px; }
    .job { margin-bottom: 10px; }
    ul.skills { list-style: none; padding: 0; display: flex; gap: 6px; flex-wrap: wrap; }
    ul.skills li { background: #ffe3e3; padding: 6px 8px; border-radius: 12px; font-size: 13px; }
";

const TWO_COLUMN_CSS: &str = "
    body { font-family: Inter, Arial, sans-serif; color: #111; margin: 20px; }
    .layout { display: grid; grid-template-columns: 1fr 260px; gap: 20px; }
    aside { border-left: 2px solid #e5edff; padding-left: 16px; }
    header { margin-bottom: 12px; }
    h1 { margin: 0; font-size: 28px; color: #0b76ff; }
    h2 { margin: 10px 0 6px; font-size: 16px; color: #222; }
    .contact { font-size: 13px; color: #666; }
    .muted { color: #666; font-size: 13px; }
    .section { margin-top: 12px; }
    .job { margin-bottom: 10px; }
    ul.skills { list-style: none; padding: 0; display: flex; gap: 6px; flex-wrap: wrap; }
    ul.skills li { background: #eef2ff; padding: 6px 8px; border-radius: 6px; font-size: 13px; }
";
