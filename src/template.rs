//! Canned reply rendering.
//!
//! The five fixed reply texts are minijinja templates so deployments can
//! reword them from config; the defaults render byte-for-byte what the
//! original deployment sent.

use minijinja::Environment;
use serde::Serialize;

pub const DEFAULT_ABSENT: &str = "{{ at }} There are way too many bikes without serial numbers for me to tweet. Search here: https://BikeIndex.org/bikes?serial=ABSENT";
pub const DEFAULT_NOT_FOUND: &str = "Sorry {{ at }}, I couldn't find that bike on the Bike Index https://BikeIndex.org";
pub const DEFAULT_CLOSE_MANY: &str = "Sorry {{ at }}, I couldn't find that bike on the Bike Index, but here are some similar serials https://BikeIndex.org/bikes?serial={{ serial }}";
pub const DEFAULT_MULTI_NOTICE: &str = "{{ at }} There are {{ count }} bikes with that serial number. I'll tweet them to you. https://BikeIndex.org/bikes?serial={{ serial }}";
pub const DEFAULT_TOO_MANY: &str = "Whoa, {{ at }} there are {{ count }} bikes with that serial! Too many to tweet. Check here: https://BikeIndex.org/bikes?serial={{ serial }}";

/// The canned reply texts. Construct with `Templates::default()` or from
/// the `[replies]` config table.
#[derive(Debug, Clone)]
pub struct Templates {
    pub absent: String,
    pub not_found: String,
    pub close_many: String,
    pub multi_notice: String,
    pub too_many: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            absent: DEFAULT_ABSENT.to_string(),
            not_found: DEFAULT_NOT_FOUND.to_string(),
            close_many: DEFAULT_CLOSE_MANY.to_string(),
            multi_notice: DEFAULT_MULTI_NOTICE.to_string(),
            too_many: DEFAULT_TOO_MANY.to_string(),
        }
    }
}

/// Context available to every reply template.
#[derive(Debug, Serialize)]
struct ReplyContext<'a> {
    at: &'a str,
    serial: &'a str,
    count: usize,
}

impl Templates {
    pub fn absent(&self, at: &str) -> anyhow::Result<String> {
        render(&self.absent, at, "", 0)
    }

    pub fn not_found(&self, at: &str) -> anyhow::Result<String> {
        render(&self.not_found, at, "", 0)
    }

    pub fn close_many(&self, at: &str, serial: &str) -> anyhow::Result<String> {
        render(&self.close_many, at, serial, 0)
    }

    pub fn multi_notice(&self, at: &str, serial: &str, count: usize) -> anyhow::Result<String> {
        render(&self.multi_notice, at, serial, count)
    }

    pub fn too_many(&self, at: &str, serial: &str, count: usize) -> anyhow::Result<String> {
        render(&self.too_many, at, serial, count)
    }

    /// Render every template with placeholder values. Used by `doctor` to
    /// reject a broken override before the bot goes live.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.absent("@probe")?;
        self.not_found("@probe")?;
        self.close_many("@probe", "PROBE1")?;
        self.multi_notice("@probe", "PROBE1", 2)?;
        self.too_many("@probe", "PROBE1", 9)?;
        Ok(())
    }
}

fn render(template: &str, at: &str, serial: &str, count: usize) -> anyhow::Result<String> {
    let env = Environment::new();
    let rendered = env.render_str(template, ReplyContext { at, serial, count })?;
    Ok(rendered)
}
