//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `page` - HTML pages (envelope, index, authorize)
//! - `assets` - Stylesheet and live-update script
//!
//! # Usage
//!
//! ```ignore
//! use embed::page::{ENVELOPE_HTML, EnvelopeVars};
//! use embed::assets::{MAIN_JS, MainJsVars};
//!
//! let html = ENVELOPE_HTML.render(&EnvelopeVars { body: "<h1>Hi</h1>" });
//! let js = MAIN_JS.render(&MainJsVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod page {
    use super::{Template, TemplateVars};

    /// Variables for envelope.html.
    pub struct EnvelopeVars<'a> {
        pub body: &'a str,
    }

    impl TemplateVars for EnvelopeVars<'_> {
        fn apply(&self, content: &str) -> String {
            content.replacen("__MARKVIEW_BODY__", self.body, 1)
        }
    }

    /// Presentation wrapper around rendered markdown.
    pub const ENVELOPE_HTML: Template<EnvelopeVars<'static>> =
        Template::new(include_str!("page/envelope.html"));

    /// Variables for index.html. `items` is pre-rendered `<li>` markup.
    pub struct IndexVars<'a> {
        pub items: &'a str,
    }

    impl TemplateVars for IndexVars<'_> {
        fn apply(&self, content: &str) -> String {
            content.replacen("__MARKVIEW_ITEMS__", self.items, 1)
        }
    }

    /// File listing shown once a credential is present.
    pub const INDEX_HTML: Template<IndexVars<'static>> =
        Template::new(include_str!("page/index.html"));

    /// Token form shown before authorization.
    pub const AUTH_HTML: &str = include_str!("page/auth.html");
}

pub mod assets {
    use super::{Template, TemplateVars};

    /// Variables for main.js.
    pub struct MainJsVars {
        pub ws_port: u16,
    }

    impl TemplateVars for MainJsVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__MARKVIEW_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live-update client with WebSocket port injection.
    pub const MAIN_JS: Template<MainJsVars> = Template::new(include_str!("assets/main.js"));

    pub const MARKDOWN_CSS: &str = include_str!("assets/github-markdown.css");
}

#[cfg(test)]
mod tests {
    use super::assets::{MAIN_JS, MainJsVars};
    use super::page::{INDEX_HTML, IndexVars};

    #[test]
    fn test_main_js_port() {
        let js = MAIN_JS.render(&MainJsVars { ws_port: 4000 });
        assert!(js.contains(":4000"));
        assert!(!js.contains("__MARKVIEW_WS_PORT__"));
    }

    #[test]
    fn test_index_items() {
        let html = INDEX_HTML.render(&IndexVars {
            items: "<li>a</li>",
        });
        assert!(html.contains("<ul>\n<li>a</li>\n</ul>"));
    }
}
