//! Bot layer - Discord-specific interface and command handlers
//!
//! Each slash command plays the role of one dashboard screen. Commands run behind the auth
//! gate (see [`command_check`]) and reach the backend only through the shared
//! [`AppContext`].

/// Discord command implementations (auth, students, billing, invoices, discounts, staff)
pub mod commands;
/// Reply formatting helpers
pub mod format;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    api::StudentFilter,
    context::{AppContext, StudentRoster},
    core::session::GateDecision,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::{error, info, instrument, warn};

/// Commands reachable without a session
const PUBLIC_COMMANDS: [&str; 3] = ["ping", "help", "login"];

/// Shared data available to all bot commands.
/// Holds the application context and the student list each Discord user is scrolling.
pub struct BotData {
    /// Backend client, auth gate, snapshots and billing rules
    pub app: AppContext,
    rosters: Mutex<HashMap<u64, Arc<StudentRoster>>>,
}

impl BotData {
    /// Creates a new `BotData` around the application context.
    #[must_use]
    pub fn new(app: AppContext) -> Self {
        Self {
            app,
            rosters: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a new student list for `user_id`, replacing (and cancelling) the previous one.
    pub fn open_roster(&self, user_id: u64, filter: StudentFilter) -> Arc<StudentRoster> {
        let roster = Arc::new(self.app.student_roster(filter));
        self.rosters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id, Arc::clone(&roster));
        roster
    }

    /// The list `user_id` is currently scrolling, if any.
    pub fn roster(&self, user_id: u64) -> Option<Arc<StudentRoster>> {
        self.rosters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .cloned()
    }

    /// Drops every open list; in-flight page requests are cancelled.
    pub fn close_rosters(&self) {
        let mut rosters = self.rosters.lock().unwrap_or_else(PoisonError::into_inner);
        // A command may still hold a clone; cancel its outstanding fetch either way.
        for roster in rosters.values() {
            roster.cancel();
        }
        rosters.clear();
    }
}

/// Route path the gate remembers for a command, e.g. `/students` or `/billing/toggle`.
#[must_use]
pub fn route_for(qualified_name: &str) -> String {
    format!("/{}", qualified_name.replace(' ', "/"))
}

/// Slash command that leads back to `route`, e.g. `/billing toggle` for `/billing/toggle`.
#[must_use]
pub fn command_for(route: &str) -> String {
    format!("/{}", route.trim_start_matches('/').replace('/', " "))
}

/// Runs before every command: public commands pass, everything else needs a valid session.
async fn command_check(ctx: poise::Context<'_, BotData, Error>) -> Result<bool> {
    let command = ctx.command();
    if PUBLIC_COMMANDS.contains(&command.name.as_str()) {
        return Ok(true);
    }

    let route = route_for(&command.qualified_name);
    match ctx.data().app.ensure_authenticated(&route).await {
        GateDecision::Allowed => Ok(true),
        GateDecision::LoginRequired(redirect) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "🔒 Please log in with `/login` first. You'll be sent back to `{}` afterwards.",
                        command_for(&redirect.return_to)
                    ))
                    .ephemeral(true),
            )
            .await?;
            Ok(false)
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            let reply = match &error {
                Error::Unauthorized => {
                    let route = route_for(&ctx.command().qualified_name);
                    ctx.data().app.auth.expire(&route);
                    format!(
                        "🔒 Your session has expired. Please `/login` again; you'll be sent back to `{}`.",
                        command_for(&route)
                    )
                }
                Error::Validation { .. } | Error::TuitionMismatch { .. } => format!("❌ {error}"),
                _ => {
                    error!("Error in command `{}`: {:?}", ctx.command().name, error);
                    format!("❌ An error occurred: {error}")
                }
            };
            if let Err(e) = ctx.say(reply).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Every command the bot registers
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::ping(),
        commands::help(),
        commands::login(),
        commands::logout(),
        commands::whoami(),
        commands::students(),
        commands::students_more(),
        commands::student(),
        commands::dorm(),
        commands::billing(),
        commands::invoices(),
        commands::pay(),
        commands::discounts(),
        commands::classes(),
        commands::teachers(),
        commands::upload_timetable(),
    ]
}

/// Builds the poise framework and runs the Discord client until it stops.
#[instrument(skip(token, app))]
pub async fn run_bot(token: String, app: AppContext) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            command_check: Some(|ctx| Box::pin(command_check(ctx))),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(BotData::new(app))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client.start().await.inspect_err(|e| warn!("Client stopped: {e:?}"))?;
    Ok(())
}
