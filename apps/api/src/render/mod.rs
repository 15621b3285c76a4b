// Template rendering: resume data + theme -> self-contained HTML document.
// Pure code only; no I/O happens in this module.

pub mod html;
pub mod templates;

pub use html::render_resume;
pub use templates::Template;
