//! Outcome routing: pick which reply (or sequence of replies) a lookup
//! result set warrants.

use crate::compose::{compose_reply, slug_budget};
use crate::lookup::Bike;
use crate::platform::PlatformLimits;
use crate::template::Templates;

/// Per-message replies beyond this many matches get a search link instead.
const MAX_PER_RECORD_REPLIES: usize = 3;

/// Decide the replies for one search, in posting order.
///
/// `close_bikes` is consulted only when `bikes` is empty; the caller makes
/// that second lookup call in exactly that branch and passes an empty slice
/// otherwise. A `ComposeError` bubbles out through `anyhow` so the caller
/// can fall back to a canned reply instead of posting a malformed one.
pub fn route(
    key: &str,
    at_screen_name: &str,
    bikes: &[Bike],
    close_bikes: &[Bike],
    templates: &Templates,
    limits: PlatformLimits,
) -> anyhow::Result<Vec<String>> {
    if bikes.is_empty() {
        return match close_bikes {
            [] => Ok(vec![templates.not_found(at_screen_name)?]),
            [bike] => {
                // The inexact-match prefix becomes part of the reply target,
                // so the slug budget shrinks by its length too.
                let target = format!("{at_screen_name} Inexact match: serial={}", bike.serial);
                let budget = slug_budget(limits, &target);
                Ok(vec![compose_reply(&target, budget, bike)?])
            }
            _ => Ok(vec![templates.close_many(at_screen_name, key)?]),
        };
    }

    if bikes.len() == 1 {
        let budget = slug_budget(limits, at_screen_name);
        return Ok(vec![compose_reply(at_screen_name, budget, &bikes[0])?]);
    }

    if bikes.len() <= MAX_PER_RECORD_REPLIES {
        let mut replies = Vec::with_capacity(bikes.len() + 1);
        replies.push(templates.multi_notice(at_screen_name, key, bikes.len())?);
        let budget = slug_budget(limits, at_screen_name);
        for bike in bikes {
            replies.push(compose_reply(at_screen_name, budget, bike)?);
        }
        return Ok(replies);
    }

    Ok(vec![templates.too_many(at_screen_name, key, bikes.len())?])
}
