//! Student commands - paginated roster, student detail and dormitory list.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        api::StudentFilter,
        bot::{
            BotData,
            format::{
                format_billing_code, format_invoice_summary, format_page_footer,
                format_student_line, join_lines_with_footer, truncate,
            },
            handlers::autocomplete,
        },
        context::StudentRoster,
        core::{
            discount::{aggregate_percent, apply_discount, display},
            invoice::summarize_year,
            paging::LoadOutcome,
        },
        errors::{Error, Result},
    };
    use chrono::{Datelike, Local};
    use std::fmt::Write;

    fn render_roster(roster: &StudentRoster, header: &str) -> Result<String> {
        let state = roster.snapshot();
        if state.items.is_empty() {
            return Ok(format!("{header}\n_No students found._"));
        }

        let mut footer = format_page_footer(
            state.items.len(),
            state.meta.as_ref(),
            roster.has_more(),
            "/students_more",
        );
        if state.rejected > 0 {
            write!(
                footer,
                "\n⚠️ {} record(s) could not be read and were skipped.",
                state.rejected
            )?;
        }
        Ok(join_lines_with_footer(
            header,
            state.items.iter().map(format_student_line),
            &footer,
        ))
    }

    /// Lists students, optionally filtered by class pair or name.
    ///
    /// Starts a fresh list; use `/students_more` to scroll further.
    #[poise::command(slash_command)]
    pub async fn students(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Class pair, e.g. 4-A"]
        #[autocomplete = "autocomplete::autocomplete_class"]
        class: Option<String>,
        #[description = "Part of the student's name"] search: Option<String>,
    ) -> Result<()> {
        let app = &ctx.data().app;

        let group_id = match class.as_deref() {
            Some(name) => {
                let Some(group) = app.find_class(name).await? else {
                    ctx.say(format!("❌ Class '{name}' not found. Use `/classes` to see all classes."))
                        .await?;
                    return Ok(());
                };
                Some(group.id)
            }
            None => None,
        };

        ctx.defer().await?;
        let filter = StudentFilter {
            group_id,
            search: search.filter(|s| !s.trim().is_empty()),
        };
        let roster = ctx.data().open_roster(ctx.author().id.get(), filter);
        roster.refresh().await?;

        let header = class.map_or_else(
            || "🎓 **Students**".to_string(),
            |c| format!("🎓 **Students in {c}**"),
        );
        ctx.say(render_roster(&roster, &header)?).await?;
        Ok(())
    }

    /// Loads the next page of the list started with `/students`.
    #[poise::command(slash_command)]
    pub async fn students_more(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let Some(roster) = ctx.data().roster(ctx.author().id.get()) else {
            ctx.say("ℹ️ No student list open. Start one with `/students`.")
                .await?;
            return Ok(());
        };

        ctx.defer().await?;
        match roster.load_more().await? {
            LoadOutcome::Loaded { added, .. } => {
                let header = format!("🎓 **Students** (+{added})");
                ctx.say(render_roster(&roster, &header)?).await?;
            }
            LoadOutcome::Skipped if !roster.has_more() => {
                ctx.say("✅ That was the last page.").await?;
            }
            LoadOutcome::Skipped => {
                ctx.say("⏳ The next page is still loading.").await?;
            }
            LoadOutcome::Superseded => {
                ctx.say("ℹ️ The list was refreshed meanwhile. Run `/students_more` again.")
                    .await?;
            }
        }
        Ok(())
    }

    /// Shows billing codes, invoices and discounts of one student.
    #[poise::command(slash_command)]
    pub async fn student(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student ID"] id: i64,
    ) -> Result<()> {
        let student = ctx.data().app.api.get_student(id).await?;
        let today = Local::now().date_naive();

        let mut response = format!(
            "🎓 **{}** (#{}) · {}\n",
            student.name,
            student.id,
            student.class_name().unwrap_or("no class")
        );
        writeln!(response, "💰 Wallet: {:.0}\n", student.wallet_balance)?;

        if student.billings.is_empty() {
            response.push_str("_No billing codes assigned_\n");
        } else {
            response.push_str("**Billing codes:**\n");
            let group_id = student.group.as_ref().map(|g| g.id);
            for code in &student.billings {
                let percent = group_id.map_or(0.0, |g| {
                    aggregate_percent(&student.discounts, g, code.id, today)
                });
                if percent > 0.0 {
                    writeln!(
                        response,
                        "• {} → {:.0} after {percent}% discount",
                        format_billing_code(code),
                        apply_discount(code.amount, percent)
                    )?;
                } else {
                    writeln!(response, "• {}", format_billing_code(code))?;
                }
            }
        }

        let months = summarize_year(&student.invoices, today.year());
        if !months.is_empty() {
            writeln!(response, "\n**Invoices {}:**", today.year())?;
            for summary in &months {
                writeln!(response, "{}", format_invoice_summary(summary))?;
            }
        }

        if !student.discounts.is_empty() {
            response.push_str("\n**Discounts:**\n");
            for discount in &student.discounts {
                writeln!(
                    response,
                    "• billing #{}: {}",
                    discount.billing_id,
                    display(discount, today)
                )?;
            }
        }

        ctx.say(truncate(response)).await?;
        Ok(())
    }

    /// Lists students living in the dormitory.
    #[poise::command(slash_command)]
    pub async fn dorm(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Page number (default 1)"]
        #[min = 1]
        page: Option<u32>,
    ) -> Result<()> {
        let page = page.unwrap_or(1).max(1);
        let roster = ctx.data().app.dorm_roster();
        roster.load(page, false).await?;

        let state = roster.snapshot();
        if state.items.is_empty() {
            ctx.say("🏠 No dormitory students on this page.").await?;
            return Ok(());
        }

        let lines = state.items.iter().map(|s| {
            format!(
                "#{} **{}** · room {} ({})",
                s.id,
                s.name,
                s.room.as_deref().unwrap_or("?"),
                s.group.as_ref().map_or("no class", |g| g.name.as_str())
            )
        });
        let footer = format_page_footer(
            state.items.len(),
            state.meta.as_ref(),
            roster.has_more(),
            &format!("/dorm page:{}", page + 1),
        );
        ctx.say(join_lines_with_footer("🏠 **Dormitory**", lines, &footer))
            .await?;
        Ok(())
    }

}

// Re-export all commands
pub use inner::*;
