//! Staff Discord commands - classes, teacher accounts and timetable uploads.
//!
//! Class and teacher lists are served from the local snapshot when one exists and
//! refreshed after every change.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, format::join_lines, handlers::autocomplete},
        core::validation::validate_timetable_file,
        errors::{Error, Result},
        models::{NewUser, User, UserPatch},
    };
    use poise::serenity_prelude as serenity;

    const TEACHER_ROLE: &str = "teacher";

    fn teacher_line(user: &User) -> String {
        format!(
            "#{} **{}** · {}{}",
            user.id,
            user.name,
            user.email,
            user.phone
                .as_deref()
                .map_or_else(String::new, |p| format!(" · {p}"))
        )
    }

    /// Lists class pairs.
    #[poise::command(slash_command)]
    pub async fn classes(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Fetch a fresh list instead of the cached one"] refresh: Option<bool>,
    ) -> Result<()> {
        let app = &ctx.data().app;
        let groups = if refresh.unwrap_or(false) {
            app.refresh_classes().await?
        } else {
            app.classes().await?
        };

        if groups.is_empty() {
            ctx.say("🏫 No classes found.").await?;
            return Ok(());
        }

        let lines = groups.iter().map(|g| {
            format!(
                "• **{}** · {} students",
                g.name,
                g.student_count
                    .map_or_else(|| "?".to_string(), |c| c.to_string())
            )
        });
        ctx.say(join_lines("🏫 **Classes**", lines)).await?;
        Ok(())
    }

    /// Parent command for teacher accounts.
    #[poise::command(
        slash_command,
        subcommands("teacher_list", "teacher_create", "teacher_update", "teacher_delete")
    )]
    pub async fn teachers(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Teacher command. Available subcommands:\n\
            `/teachers list` - List teacher accounts\n\
            `/teachers create` - Create a teacher account\n\
            `/teachers update` - Change name, e-mail or phone\n\
            `/teachers delete` - Delete a teacher account";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Lists teacher accounts.
    #[poise::command(slash_command, rename = "list")]
    pub async fn teacher_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Fetch a fresh list instead of the cached one"] refresh: Option<bool>,
    ) -> Result<()> {
        let app = &ctx.data().app;
        let cached = if refresh.unwrap_or(false) {
            None
        } else {
            app.cached_teachers().await?
        };
        let teachers = match cached {
            Some(teachers) => teachers,
            None => app.refresh_teachers().await?,
        };

        if teachers.is_empty() {
            ctx.say("👩‍🏫 No teacher accounts found.").await?;
            return Ok(());
        }
        ctx.say(join_lines(
            "👩‍🏫 **Teachers**",
            teachers.iter().map(teacher_line),
        ))
        .await?;
        Ok(())
    }

    /// Creates a teacher account. The reply is only visible to you.
    #[poise::command(slash_command, rename = "create")]
    pub async fn teacher_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Full name"] name: String,
        #[description = "Login e-mail"] email: String,
        #[description = "Initial password (at least 8 characters)"] password: String,
        #[description = "Phone (optional)"] phone: Option<String>,
    ) -> Result<()> {
        let app = &ctx.data().app;
        let new_user = NewUser {
            name,
            email,
            role: TEACHER_ROLE.to_string(),
            phone,
            password,
        };
        let created = app.api.create_user(&new_user).await?;
        app.refresh_teachers().await?;

        ctx.send(
            poise::CreateReply::default()
                .content(format!("✅ Created teacher {}", teacher_line(&created)))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Changes a teacher's name, e-mail or phone.
    #[poise::command(slash_command, rename = "update")]
    pub async fn teacher_update(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Teacher ID"] id: i64,
        #[description = "New name (optional)"] name: Option<String>,
        #[description = "New e-mail (optional)"] email: Option<String>,
        #[description = "New phone (optional)"] phone: Option<String>,
    ) -> Result<()> {
        let patch = UserPatch { name, email, phone };
        if patch == UserPatch::default() {
            ctx.say("❌ Please specify at least one field to update (name, email, or phone).")
                .await?;
            return Ok(());
        }

        let app = &ctx.data().app;
        let updated = app.api.update_user(id, &patch).await?;
        app.refresh_teachers().await?;
        ctx.say(format!("✅ Updated {}", teacher_line(&updated)))
            .await?;
        Ok(())
    }

    /// Deletes a teacher account.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn teacher_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Teacher ID"] id: i64,
    ) -> Result<()> {
        let app = &ctx.data().app;
        app.api.delete_user(id).await?;
        app.refresh_teachers().await?;
        ctx.say(format!("✅ Deleted teacher #{id}.")).await?;
        Ok(())
    }

    /// Uploads a timetable file (xlsx, xls, csv or pdf, at most 5 MiB).
    #[poise::command(slash_command)]
    pub async fn upload_timetable(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Timetable file"] file: serenity::Attachment,
        #[description = "Class pair the timetable belongs to (optional)"]
        #[autocomplete = "autocomplete::autocomplete_class"]
        class: Option<String>,
    ) -> Result<()> {
        validate_timetable_file(&file.filename, usize::try_from(file.size).unwrap_or(usize::MAX))?;
        let app = &ctx.data().app;

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

        ctx.defer().await?;
        let bytes = file.download().await?;
        let upload = app
            .api
            .upload_timetable(&file.filename, bytes, group_id)
            .await?;
        ctx.say(format!(
            "✅ Uploaded timetable `{}` (#{}).",
            upload.file_name, upload.id
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
