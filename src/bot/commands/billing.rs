//! Billing-code Discord commands - `/billing list|toggle|create|update|delete`.
//!
//! Assigning a tuition code is checked against the student's class before anything is
//! sent; the student record shown afterwards reflects only what the backend accepted.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            format::{format_billing_code, join_lines},
            handlers::autocomplete,
        },
        context::AppContext,
        core::{
            billing::category_of,
            student::{BillingChange, toggle_billing},
        },
        errors::{Error, Result},
        models::{BillingCode, BillingCodePatch, NewBillingCode},
    };
    use std::collections::BTreeMap;

    async fn find_code(app: &AppContext, code: &str) -> Result<Option<BillingCode>> {
        let wanted = code.trim();
        Ok(app
            .api
            .list_billing_codes()
            .await?
            .into_iter()
            .find(|c| c.code.eq_ignore_ascii_case(wanted)))
    }

    /// Parent command for billing codes.
    #[poise::command(
        slash_command,
        subcommands(
            "billing_list",
            "billing_toggle",
            "billing_create",
            "billing_update",
            "billing_delete"
        )
    )]
    pub async fn billing(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Billing code command. Available subcommands:\n\
            `/billing list` - List billing codes by category\n\
            `/billing toggle` - Assign or remove a code on a student\n\
            `/billing create` - Create a billing code\n\
            `/billing update` - Change amount, description or active flag\n\
            `/billing delete` - Delete a billing code";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Lists billing codes grouped by category.
    #[poise::command(slash_command, rename = "list")]
    pub async fn billing_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let overview = ctx.data().app.billing_overview().await?;

        if overview.billing_codes.is_empty() {
            ctx.say("📂 No billing codes yet. Create one with `/billing create`.")
                .await?;
            return Ok(());
        }

        let mut by_category: BTreeMap<&str, Vec<&BillingCode>> = BTreeMap::new();
        for code in &overview.billing_codes {
            by_category.entry(code.category.as_str()).or_default().push(code);
        }

        let mut lines = Vec::new();
        for (category, codes) in by_category {
            lines.push(format!("\n**{category}**"));
            lines.extend(codes.into_iter().map(|c| format!("• {}", format_billing_code(c))));
        }
        lines.push(format!(
            "\n{} classes · {} students",
            overview.groups.len(),
            overview
                .student_total
                .map_or_else(|| "?".to_string(), |t| t.to_string())
        ));

        ctx.say(join_lines("💳 **Billing codes**", lines)).await?;
        Ok(())
    }

    /// Assigns a billing code to a student, or removes it when already assigned.
    #[poise::command(slash_command, rename = "toggle")]
    pub async fn billing_toggle(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student ID"] student_id: i64,
        #[description = "Billing code, e.g. tuition/2600"]
        #[autocomplete = "autocomplete::autocomplete_billing_code"]
        code: String,
    ) -> Result<()> {
        let app = &ctx.data().app;

        let Some(code) = find_code(app, &code).await? else {
            ctx.say(format!("❌ Billing code '{code}' not found. Use `/billing list`."))
                .await?;
            return Ok(());
        };

        let mut student = app.api.get_student(student_id).await?;
        match toggle_billing(&app.api, &mut student, &code, &app.tuition).await? {
            BillingChange::Assigned(assigned) => {
                ctx.say(format!(
                    "✅ Assigned {} to **{}**. They now have {} billing code(s).",
                    format_billing_code(&assigned),
                    student.name,
                    student.billings.len()
                ))
                .await?;
            }
            BillingChange::Unassigned(_) => {
                ctx.say(format!(
                    "✅ Removed `{}` from **{}**. They now have {} billing code(s).",
                    code.code,
                    student.name,
                    student.billings.len()
                ))
                .await?;
            }
        }
        Ok(())
    }

    /// Creates a billing code. Tuition codes must carry their amount: `tuition/2600`.
    #[poise::command(slash_command, rename = "create")]
    pub async fn billing_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Code, e.g. meal/500 or tuition/2600"] code: String,
        #[description = "Monthly amount"] amount: f64,
        #[description = "Category (defaults to the part before '/')"] category: Option<String>,
        #[description = "Description"] description: Option<String>,
    ) -> Result<()> {
        let code = code.trim().to_string();
        let category = category.unwrap_or_else(|| category_of(&code).to_string());
        let new_code = NewBillingCode {
            code,
            category,
            description,
            amount,
            active: true,
        };

        let created = ctx.data().app.api.create_billing_code(&new_code).await?;
        ctx.say(format!("✅ Created {}", format_billing_code(&created)))
            .await?;
        Ok(())
    }

    /// Updates a billing code's amount, description or active flag.
    #[poise::command(slash_command, rename = "update")]
    pub async fn billing_update(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Billing code"]
        #[autocomplete = "autocomplete::autocomplete_billing_code"]
        code: String,
        #[description = "New amount (optional)"] amount: Option<f64>,
        #[description = "New description (optional)"] description: Option<String>,
        #[description = "Active (optional)"] active: Option<bool>,
    ) -> Result<()> {
        if amount.is_none() && description.is_none() && active.is_none() {
            ctx.say("❌ Please specify at least one field to update (amount, description, or active).")
                .await?;
            return Ok(());
        }

        let app = &ctx.data().app;
        let Some(existing) = find_code(app, &code).await? else {
            ctx.say(format!("❌ Billing code '{code}' not found.")).await?;
            return Ok(());
        };

        let patch = BillingCodePatch {
            description,
            amount,
            active,
        };
        let updated = app.api.update_billing_code(existing.id, &patch).await?;
        ctx.say(format!("✅ Updated {}", format_billing_code(&updated)))
            .await?;
        Ok(())
    }

    /// Deletes a billing code.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn billing_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Billing code"]
        #[autocomplete = "autocomplete::autocomplete_billing_code"]
        code: String,
    ) -> Result<()> {
        let app = &ctx.data().app;
        let Some(existing) = find_code(app, &code).await? else {
            ctx.say(format!("❌ Billing code '{code}' not found.")).await?;
            return Ok(());
        };

        app.api.delete_billing_code(existing.id).await?;
        ctx.say(format!("✅ Deleted billing code `{}`.", existing.code))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
