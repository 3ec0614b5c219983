//! Reply composition: fit the most informative description of a bike into
//! the characters left over after the fixed overhead.

use crate::error::ComposeError;
use crate::lookup::Bike;
use crate::platform::PlatformLimits;

/// Characters available for the descriptive slug when replying to `target`:
/// the platform maximum, minus the wrapped-URL length, minus the target
/// handle, minus the three framing spaces. All arithmetic is in characters.
pub fn slug_budget(limits: PlatformLimits, reply_target: &str) -> usize {
    limits
        .max_message_len
        .saturating_sub(limits.short_url_len)
        .saturating_sub(char_len(reply_target))
        .saturating_sub(3)
}

/// Normalize the registry's first frame color before measuring anything.
/// `"Silver…"` reads as gray; `"Stickers…"` is not a color at all.
/// Idempotent: neither replacement matches its own output.
pub fn normalize_color(color: &str) -> String {
    if color.starts_with("Silver") {
        "Gray".to_string()
    } else if color.starts_with("Stickers") {
        String::new()
    } else {
        color.to_string()
    }
}

/// Build the full reply text for one bike.
///
/// The status marker's length comes out of `budget` before the slug chain
/// runs. The framing spaces around the slug are emitted even when the slug
/// is empty, matching the deployed output.
pub fn compose_reply(reply_target: &str, budget: usize, bike: &Bike) -> Result<String, ComposeError> {
    let url = required(bike, bike.url.as_deref(), "url")?;
    let manufacturer = required(bike, bike.manufacturer_name.as_deref(), "manufacturer_name")?;
    let model = required(bike, bike.frame_model.as_deref(), "frame_model")?;
    let first_color = required(bike, bike.frame_colors.first().map(String::as_str), "frame_colors")?;

    let marker = if bike.stolen { "STOLEN" } else { "NOT stolen" };
    let budget = budget.saturating_sub(char_len(marker));

    let color = normalize_color(first_color);
    let slug = pick_slug(&color, manufacturer, model, budget);

    Ok(format!("{reply_target} {slug} {marker} {url}"))
}

/// The graduated abbreviation chain, most informative candidate first.
/// A later branch is never taken when an earlier one fits.
fn pick_slug(color: &str, manufacturer: &str, model: &str, budget: usize) -> String {
    let color_len = char_len(color);
    let manufacturer_len = char_len(manufacturer);
    let model_len = char_len(model);
    let full = color_len + manufacturer_len + model_len + 2;

    if full <= budget {
        format!("{color} {manufacturer} {model}")
    } else if full - color_len - 1 <= budget {
        format!("{manufacturer} {model}")
    } else if full - manufacturer_len - 1 <= budget {
        format!("{color} {model}")
    } else if full - model_len - 1 <= budget {
        format!("{color} {manufacturer}")
    } else if model_len + 2 <= budget {
        format!("a {model}")
    } else if manufacturer_len + 2 <= budget {
        format!("a {manufacturer}")
    } else if color_len + 5 <= budget {
        format!("{color} bike")
    } else {
        String::new()
    }
}

fn required<'a>(bike: &Bike, field: Option<&'a str>, name: &'static str) -> Result<&'a str, ComposeError> {
    field.ok_or_else(|| ComposeError::MissingField {
        serial: bike.serial.clone(),
        field: name,
    })
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
