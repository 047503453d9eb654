//! Discount Discord commands - `/discounts list|create|update|delete`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, format::join_lines, handlers::autocomplete},
        core::{
            discount::{aggregate_percent, display, is_active},
            validation::parse_optional_date,
        },
        errors::{Error, Result},
        models::{DiscountPatch, NewDiscount},
    };
    use chrono::Local;
    use std::collections::{BTreeSet, HashMap};

    /// Parent command for group discounts.
    #[poise::command(
        slash_command,
        subcommands("discount_list", "discount_create", "discount_update", "discount_delete")
    )]
    pub async fn discounts(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Discount command. Available subcommands:\n\
            `/discounts list` - Discounts of a class, with the effective total per code\n\
            `/discounts create` - Give a class a percentage off a billing code\n\
            `/discounts update` - Change percentage or date window\n\
            `/discounts delete` - Remove a discount";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Lists discounts, optionally for one class pair.
    #[poise::command(slash_command, rename = "list")]
    pub async fn discount_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Class pair (optional)"]
        #[autocomplete = "autocomplete::autocomplete_class"]
        class: Option<String>,
    ) -> Result<()> {
        let app = &ctx.data().app;
        let today = Local::now().date_naive();

        let group_id = match class.as_deref() {
            Some(name) => {
                let Some(group) = app.find_class(name).await? else {
                    ctx.say(format!("❌ Class '{name}' not found.")).await?;
                    return Ok(());
                };
                Some(group.id)
            }
            None => None,
        };

        let (discounts, codes, groups) = tokio::join!(
            app.api.list_discounts(group_id),
            app.api.list_billing_codes(),
            app.classes(),
        );
        let discounts = discounts?;
        if discounts.is_empty() {
            ctx.say("🏷️ No discounts found.").await?;
            return Ok(());
        }
        let code_names: HashMap<i64, String> =
            codes?.into_iter().map(|c| (c.id, c.code)).collect();
        let group_names: HashMap<i64, String> =
            groups?.into_iter().map(|g| (g.id, g.name)).collect();
        let name_of = |names: &HashMap<i64, String>, id: i64| {
            names.get(&id).cloned().unwrap_or_else(|| format!("#{id}"))
        };

        let mut lines: Vec<String> = discounts
            .iter()
            .map(|d| {
                let marker = if is_active(d, today) { "✅" } else { "⏸️" };
                format!(
                    "{marker} #{} {} · `{}`: {}",
                    d.id,
                    name_of(&group_names, d.group_id),
                    name_of(&code_names, d.billing_id),
                    display(d, today)
                )
            })
            .collect();

        let pairs: BTreeSet<(i64, i64)> =
            discounts.iter().map(|d| (d.group_id, d.billing_id)).collect();
        lines.push("\n**Effective today:**".to_string());
        lines.extend(pairs.into_iter().map(|(group, billing)| {
            format!(
                "• {} · `{}`: {}%",
                name_of(&group_names, group),
                name_of(&code_names, billing),
                aggregate_percent(&discounts, group, billing, today)
            )
        }));

        ctx.say(join_lines("🏷️ **Discounts**", lines)).await?;
        Ok(())
    }

    /// Gives a class pair a percentage off a billing code.
    #[poise::command(slash_command, rename = "create")]
    pub async fn discount_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Class pair"]
        #[autocomplete = "autocomplete::autocomplete_class"]
        class: String,
        #[description = "Billing code"]
        #[autocomplete = "autocomplete::autocomplete_billing_code"]
        code: String,
        #[description = "Percentage off (1-100)"] percent: f64,
        #[description = "First day, YYYY-MM-DD (optional)"] start: Option<String>,
        #[description = "Last day, YYYY-MM-DD (optional)"] end: Option<String>,
    ) -> Result<()> {
        let app = &ctx.data().app;
        let start_date = parse_optional_date("start_date", start.as_deref())?;
        let end_date = parse_optional_date("end_date", end.as_deref())?;

        let Some(group) = app.find_class(&class).await? else {
            ctx.say(format!("❌ Class '{class}' not found.")).await?;
            return Ok(());
        };
        let Some(billing) = app
            .api
            .list_billing_codes()
            .await?
            .into_iter()
            .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
        else {
            ctx.say(format!("❌ Billing code '{code}' not found.")).await?;
            return Ok(());
        };

        let new_discount = NewDiscount {
            group_id: group.id,
            billing_id: billing.id,
            percent,
            start_date,
            end_date,
        };
        let created = app.api.create_discount(&new_discount).await?;
        ctx.say(format!(
            "✅ Discount #{} for {} on `{}`: {}",
            created.id,
            group.name,
            billing.code,
            display(&created, Local::now().date_naive())
        ))
        .await?;
        Ok(())
    }

    /// Changes a discount's percentage or date window.
    #[poise::command(slash_command, rename = "update")]
    pub async fn discount_update(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Discount ID"] id: i64,
        #[description = "New percentage (optional)"] percent: Option<f64>,
        #[description = "New first day, YYYY-MM-DD (optional)"] start: Option<String>,
        #[description = "New last day, YYYY-MM-DD (optional)"] end: Option<String>,
    ) -> Result<()> {
        let patch = DiscountPatch {
            percent,
            start_date: parse_optional_date("start_date", start.as_deref())?,
            end_date: parse_optional_date("end_date", end.as_deref())?,
        };
        if patch == DiscountPatch::default() {
            ctx.say("❌ Please specify at least one field to update (percent, start, or end).")
                .await?;
            return Ok(());
        }

        let updated = ctx.data().app.api.update_discount(id, &patch).await?;
        ctx.say(format!(
            "✅ Discount #{}: {}",
            updated.id,
            display(&updated, Local::now().date_naive())
        ))
        .await?;
        Ok(())
    }

    /// Removes a discount.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn discount_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Discount ID"] id: i64,
    ) -> Result<()> {
        ctx.data().app.api.delete_discount(id).await?;
        ctx.say(format!("✅ Deleted discount #{id}.")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
