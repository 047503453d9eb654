//! Invoice and payment Discord commands - `/invoices status|year|create|adjust` and `/pay`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        api::InvoiceFilter,
        bot::{
            BotData,
            format::{format_invoice_summary, join_lines, status_emoji},
            handlers::autocomplete,
        },
        core::{
            discount::{aggregate_percent, apply_discount},
            invoice::{derive_status, summarize_month, summarize_month_by_billing, summarize_year},
            student::record_payment,
        },
        errors::{Error, Result},
        models::{InvoicePatch, NewInvoice, NewPayment},
    };
    use chrono::{Datelike, Local};
    use std::{collections::HashMap, fmt::Write};

    /// Parent command for invoices.
    #[poise::command(
        slash_command,
        subcommands("invoice_status", "invoice_year", "invoice_create", "invoice_adjust")
    )]
    pub async fn invoices(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Invoice command. Available subcommands:\n\
            `/invoices status` - Payment status of one month, per billing code\n\
            `/invoices year` - Month-by-month overview of a year\n\
            `/invoices create` - Raise an invoice for a billing code\n\
            `/invoices adjust` - Correct an invoice's amounts";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows the payment status of one month for a student.
    #[poise::command(slash_command, rename = "status")]
    pub async fn invoice_status(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student ID"] student_id: i64,
        #[description = "Month 1-12 (default: current)"]
        #[min = 1]
        #[max = 12]
        month: Option<u32>,
        #[description = "Year (default: current)"] year: Option<i32>,
    ) -> Result<()> {
        let today = Local::now().date_naive();
        let year = year.unwrap_or_else(|| today.year());
        let month = month.unwrap_or_else(|| today.month());
        let api = &ctx.data().app.api;

        let filter = InvoiceFilter {
            student_id: Some(student_id),
            year: Some(year),
            month: Some(month),
        };
        let (invoices, codes) = tokio::join!(api.list_invoices(&filter), api.list_billing_codes());
        let invoices = invoices?;
        let names: HashMap<i64, String> = codes?.into_iter().map(|c| (c.id, c.code)).collect();

        let Some(total) = summarize_month(&invoices, year, month) else {
            ctx.say(format!(
                "📄 No invoices for student #{student_id} in {year}-{month:02}."
            ))
            .await?;
            return Ok(());
        };

        let lines = summarize_month_by_billing(&invoices, year, month)
            .into_iter()
            .map(|(billing_id, summary)| {
                let name = names
                    .get(&billing_id)
                    .map_or_else(|| format!("billing #{billing_id}"), Clone::clone);
                format!(
                    "{} `{name}`: {:.0} / {:.0} ({})",
                    status_emoji(summary.status),
                    summary.paid,
                    summary.required,
                    summary.status
                )
            });
        let header = format!(
            "📄 **Student #{student_id}**\n{}\nRemaining: {:.0}\n",
            format_invoice_summary(&total),
            total.remaining
        );
        ctx.say(join_lines(&header, lines)).await?;
        Ok(())
    }

    /// Month-by-month payment overview of a year.
    #[poise::command(slash_command, rename = "year")]
    pub async fn invoice_year(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student ID"] student_id: i64,
        #[description = "Year (default: current)"] year: Option<i32>,
    ) -> Result<()> {
        let year = year.unwrap_or_else(|| Local::now().year());
        let filter = InvoiceFilter {
            student_id: Some(student_id),
            year: Some(year),
            month: None,
        };
        let invoices = ctx.data().app.api.list_invoices(&filter).await?;
        let months = summarize_year(&invoices, year);

        if months.is_empty() {
            ctx.say(format!("📄 No invoices for student #{student_id} in {year}."))
                .await?;
            return Ok(());
        }

        let required: f64 = months.iter().map(|m| m.required).sum();
        let paid: f64 = months.iter().map(|m| m.paid).sum();
        let remaining: f64 = months.iter().map(|m| m.remaining).sum();
        let mut lines: Vec<String> = months.iter().map(format_invoice_summary).collect();
        lines.push(format!(
            "\n{} **Total {year}:** {paid:.0} / {required:.0} · remaining {remaining:.0}",
            status_emoji(derive_status(required, paid, remaining))
        ));

        ctx.say(join_lines(
            &format!("📅 **Student #{student_id} · {year}**"),
            lines,
        ))
        .await?;
        Ok(())
    }

    /// Raises an invoice for one of the student's billing codes.
    ///
    /// Without an explicit amount, the code's amount less the student's active group
    /// discount is used.
    #[poise::command(slash_command, rename = "create")]
    pub async fn invoice_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student ID"] student_id: i64,
        #[description = "Billing code"]
        #[autocomplete = "autocomplete::autocomplete_billing_code"]
        code: String,
        #[description = "Month 1-12"]
        #[min = 1]
        #[max = 12]
        month: u32,
        #[description = "Year (default: current)"] year: Option<i32>,
        #[description = "Required amount (default: code amount after discounts)"] amount: Option<
            f64,
        >,
    ) -> Result<()> {
        let today = Local::now().date_naive();
        let api = &ctx.data().app.api;
        let student = api.get_student(student_id).await?;

        let Some(billing) = student
            .billings
            .iter()
            .find(|b| b.code.eq_ignore_ascii_case(code.trim()))
        else {
            ctx.say(format!(
                "❌ **{}** has no billing code '{code}'. Assign it with `/billing toggle` first.",
                student.name
            ))
            .await?;
            return Ok(());
        };

        let required_amount = amount.unwrap_or_else(|| {
            let percent = student.group.as_ref().map_or(0.0, |g| {
                aggregate_percent(&student.discounts, g.id, billing.id, today)
            });
            apply_discount(billing.amount, percent)
        });

        let new_invoice = NewInvoice {
            student_id,
            billing_id: billing.id,
            year: year.unwrap_or_else(|| today.year()),
            month,
            required_amount,
        };
        let created = api.create_invoice(&new_invoice).await?;
        ctx.say(format!(
            "✅ Invoice #{} for **{}**: `{}` {}-{:02}, {:.0} required.",
            created.id, student.name, billing.code, created.year, created.month, created.required_amount
        ))
        .await?;
        Ok(())
    }

    /// Corrects an invoice's required or paid amount.
    #[poise::command(slash_command, rename = "adjust")]
    pub async fn invoice_adjust(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Invoice ID"] invoice_id: i64,
        #[description = "New required amount (optional)"] required: Option<f64>,
        #[description = "New paid amount (optional)"] paid: Option<f64>,
    ) -> Result<()> {
        if required.is_none() && paid.is_none() {
            ctx.say("❌ Please specify at least one amount to change (required or paid).")
                .await?;
            return Ok(());
        }

        let patch = InvoicePatch {
            required_amount: required,
            paid_amount: paid,
        };
        let updated = ctx.data().app.api.update_invoice(invoice_id, &patch).await?;
        let status = derive_status(
            updated.required_amount,
            updated.paid_amount,
            updated.remaining_amount,
        );
        ctx.say(format!(
            "✅ Invoice #{}: {:.0} / {:.0} {} {status}",
            updated.id,
            updated.paid_amount,
            updated.required_amount,
            status_emoji(status)
        ))
        .await?;
        Ok(())
    }

    /// Records a payment for a student, optionally against one invoice.
    #[poise::command(slash_command)]
    pub async fn pay(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student ID"] student_id: i64,
        #[description = "Amount paid"] amount: f64,
        #[description = "Invoice the payment settles (optional)"] invoice_id: Option<i64>,
        #[description = "Payment method, e.g. cash or card"] method: Option<String>,
    ) -> Result<()> {
        let api = &ctx.data().app.api;
        let mut student = api.get_student(student_id).await?;

        let payment = NewPayment {
            student_id,
            invoice_id,
            amount,
            method,
        };
        let recorded = record_payment(api, &mut student, &payment).await?;

        let mut reply = format!(
            "✅ Recorded {:.0} from **{}** on {}.",
            recorded.amount, student.name, recorded.paid_at
        );
        if let Some(invoice) = recorded
            .invoice_id
            .and_then(|id| student.invoices.iter().find(|i| i.id == id))
        {
            let status = derive_status(
                invoice.required_amount,
                invoice.paid_amount,
                invoice.remaining_amount,
            );
            write!(
                reply,
                "\nInvoice #{}: {:.0} remaining {} {status}",
                invoice.id,
                invoice.remaining_amount,
                status_emoji(status)
            )?;
        }
        ctx.say(reply).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
