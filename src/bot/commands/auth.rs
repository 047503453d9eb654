//! Session commands - `login`, `logout` and `whoami`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, command_for},
        errors::{Error, Result},
        models::Credentials,
    };
    use std::fmt::Write;

    /// Logs in to the school backend.
    ///
    /// The reply is only visible to you. When a command was refused for lack of a session,
    /// the reply points back to it.
    #[poise::command(slash_command)]
    pub async fn login(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Username or e-mail"] username: String,
        #[description = "Password"] password: String,
    ) -> Result<()> {
        let credentials = Credentials { username, password };
        let outcome = ctx.data().app.login(&credentials).await?;

        let mut message = format!(
            "✅ Logged in as **{}** ({}).",
            outcome.user.name, outcome.user.role
        );
        if let Some(route) = outcome.return_to {
            write!(message, " Continue with `{}`.", command_for(&route))?;
        }

        ctx.send(
            poise::CreateReply::default()
                .content(message)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Ends the session and clears every cached list.
    #[poise::command(slash_command)]
    pub async fn logout(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.data().close_rosters();
        ctx.data().app.logout().await?;
        ctx.say("👋 Logged out.").await?;
        Ok(())
    }

    /// Shows the signed-in account.
    #[poise::command(slash_command)]
    pub async fn whoami(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        match ctx.data().app.current_user().await? {
            Some(user) => {
                ctx.say(format!(
                    "👤 **{}** · {} · {}",
                    user.name, user.email, user.role
                ))
                .await?;
            }
            None => {
                ctx.say("ℹ️ The session is valid but no account details are cached. Log in again to refresh them.")
                    .await?;
            }
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
