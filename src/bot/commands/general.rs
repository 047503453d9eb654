//! General Discord commands - ping and help.
//! These commands are reachable without a session and never touch the backend.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**SchoolDesk Help**\n\
        Every command except `/ping`, `/help` and `/login` needs a valid session.\n\n\
        **Session**\n\
        • `/login <username> <password>` - Logs in and returns you to the command you tried.\n\
        • `/logout` - Ends the session and clears cached data.\n\
        • `/whoami` - Shows the signed-in account.\n\n\
        **Students**\n\
        • `/students [class] [search]` - Lists students, one page at a time.\n\
        • `/students_more` - Loads the next page of the current list.\n\
        • `/student <id>` - Billing codes, invoices and discounts of one student.\n\
        • `/dorm [page]` - Lists dormitory students.\n\n\
        **Billing**\n\
        • `/billing <subcommand>` - Manage billing codes (list, toggle, create, update, delete).\n\
        • `/invoices <subcommand>` - Monthly status, yearly overview, create and adjust invoices.\n\
        • `/pay <student> <amount> [invoice] [method]` - Records a payment.\n\
        • `/discounts <subcommand>` - Group discounts (list, create, update, delete).\n\n\
        **Staff**\n\
        • `/classes [refresh]` - Lists class pairs.\n\
        • `/teachers <subcommand>` - Manage teacher accounts.\n\
        • `/upload_timetable <file> [class]` - Uploads a timetable file.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
