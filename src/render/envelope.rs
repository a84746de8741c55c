use crate::embed::page::{ENVELOPE_HTML, EnvelopeVars};

/// Wrap rendered HTML with the stylesheet link, content wrapper and script include.
pub fn wrap(html: &str) -> String {
    ENVELOPE_HTML.render(&EnvelopeVars { body: html })
}
