//! Autocomplete handlers for Discord slash command parameters.
//!
//! Class names come from the local snapshot when available; billing codes are fetched
//! from the backend. Lookup failures produce no suggestions rather than an error.

use crate::{bot::BotData, errors::Error};

/// Discord autocomplete limit
const MAX_SUGGESTIONS: usize = 25;

/// Case-insensitive substring filter, sorted and capped at the Discord limit.
#[must_use]
pub fn filter_suggestions<I>(candidates: I, partial: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let partial_lower = partial.trim().to_lowercase();
    let mut matching: Vec<String> = candidates
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .collect();
    matching.sort();
    matching.truncate(MAX_SUGGESTIONS);
    matching
}

/// Provides autocomplete suggestions for class pairs.
pub async fn autocomplete_class(ctx: poise::Context<'_, BotData, Error>, partial: &str) -> Vec<String> {
    let Ok(groups) = ctx.data().app.classes().await else {
        return Vec::new();
    };
    filter_suggestions(groups.into_iter().map(|g| g.name), partial)
}

/// Provides autocomplete suggestions for active billing codes.
pub async fn autocomplete_billing_code(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(codes) = ctx.data().app.api.list_billing_codes().await else {
        return Vec::new();
    };
    filter_suggestions(
        codes.into_iter().filter(|c| c.active).map(|c| c.code),
        partial,
    )
}
