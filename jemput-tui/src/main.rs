//! Terminal UI for jemput that lets staff log waste intake, schedule pickups, and ask the assistant.

mod app;
mod config;
mod input;
mod ui;

use std::{fs::OpenOptions, io, sync::Arc, sync::Mutex, time::Duration as StdDuration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use jemput_assistant::{MistralClient, is_topic_related};
use jemput_core::service::{JemputService, ServiceError};
use jemput_store::{MemoryStore, stores};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::{App, Screen};
use crate::config::Config;
use crate::input::Action;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config)?;

    // Storage + service setup
    let store = MemoryStore::open(&config.data_file)
        .await
        .with_context(|| format!("failed to open {}", config.data_file.display()))?;
    let service = Arc::new(JemputService::new(Arc::new(stores(Arc::new(store)))));
    let bootstrap = config
        .admin
        .as_ref()
        .map(|(username, password)| (username.as_str(), password.as_str()));
    if let Some(admin) = service.ensure_admin(bootstrap).await? {
        info!(username = %admin.username, "created initial admin account");
    }

    let client = Client::builder().user_agent("jemput/0.1").build()?;
    let assistant = MistralClient::new(client, config.mistral_api_key.clone())
        .with_api_url(config.mistral_api_url.clone())
        .with_model(config.mistral_model.clone());

    let app = App::new(service, assistant);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

// The alternate screen owns stdout, so events go to a file.
fn init_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

async fn run(terminal: &mut Term, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);
            if action == Action::Quit {
                break;
            }
            if action != Action::None {
                app.clear_messages();
                app.is_loading = true;
                terminal.draw(|frame| ui::draw(frame, &app))?;
                perform(action, &mut app).await;
                app.is_loading = false;
            }
        }
    }

    Ok(())
}

async fn perform(action: Action, app: &mut App) {
    match action {
        Action::None | Action::Quit => {}
        Action::Login => login(app).await,
        Action::Register => register(app).await,
        Action::Logout => {
            if let Some(user) = &app.user {
                info!(username = %user.username, "user logged out");
            }
            app.sign_out();
        }
        Action::ShowPickups => {
            load_pickups(app).await;
            app.screen = Screen::Pickups;
        }
        Action::ShowWastes => {
            load_wastes(app).await;
            app.screen = Screen::Wastes;
        }
        Action::ShowLocations => {
            load_locations(app).await;
            app.screen = Screen::Locations;
        }
        Action::ShowUsers => {
            load_users(app).await;
            app.screen = Screen::Users;
        }
        Action::ShowStats => {
            load_wastes(app).await;
            app.screen = Screen::Stats;
        }
        Action::ShowChat => {
            if !app.assistant.has_api_key() {
                app.info_message = Some("MISTRAL_API_KEY is not set; questions will fail".into());
            }
            load_histories(app).await;
            app.screen = Screen::Chat;
        }
        Action::NewPickup => {
            load_pickups(app).await;
            app.open_new_pickup();
        }
        Action::EditPickup => {
            if !app.open_selected_pickup() {
                app.error_message = Some("No pickup selected".into());
            }
        }
        Action::SavePickup => save_pickup(app).await,
        Action::DeletePickup => delete_pickup(app).await,
        Action::NewWaste => {
            load_wastes(app).await;
            app.open_new_waste();
        }
        Action::SaveWaste => save_waste(app).await,
        Action::DeleteWaste => delete_waste(app).await,
        Action::SaveLocation => save_location(app).await,
        Action::DeleteLocation => delete_location(app).await,
        Action::SaveUser => save_user(app).await,
        Action::DeleteUser => delete_user(app).await,
        Action::SendChat => send_chat(app).await,
        Action::NewChat => app.start_new_conversation(),
        Action::OpenHistory => open_history(app).await,
        Action::DeleteHistory => delete_history(app).await,
    }
}

async fn login(app: &mut App) {
    match app
        .service
        .authenticate(&app.login_username, &app.login_password)
        .await
    {
        Ok(user) => {
            app.sign_in(user);
            refresh(app).await;
        }
        Err(ServiceError::InvalidCredentials) => {
            app.error_message = Some("Wrong username or password".into());
        }
        Err(err) => app.error_message = Some(format!("Login failed: {err}")),
    }
}

async fn register(app: &mut App) {
    match app
        .service
        .register(&app.login_username, &app.login_password)
        .await
    {
        Ok(user) => {
            app.info_message = Some(format!("Welcome, {}", user.username));
            app.sign_in(user);
            refresh(app).await;
        }
        Err(ServiceError::DuplicateUsername(name)) => {
            app.error_message = Some(format!("Username {name} is already taken"));
        }
        Err(err) => app.error_message = Some(format!("Registration failed: {err}")),
    }
}

async fn refresh(app: &mut App) {
    load_wastes(app).await;
    if app.can_manage_records() {
        load_pickups(app).await;
    }
}

/// Reload pickups plus the wastes and technicians the form picks from.
async fn load_pickups(app: &mut App) {
    let Some(user) = app.user.clone() else {
        return;
    };
    match app.service.list_pickups(&user).await {
        Ok(rows) => {
            app.pickups = rows;
            app.pickup_index = app.pickup_index.min(app.pickups.len().saturating_sub(1));
        }
        Err(err) => {
            app.pickups.clear();
            app.error_message = Some(format!("Failed to load pickups: {err}"));
        }
    }
    match app.service.assignable_technicians().await {
        Ok(technicians) => app.restrict_technicians(technicians),
        Err(err) => app.error_message = Some(format!("Failed to load technicians: {err}")),
    }
    load_wastes(app).await;
}

/// Reload waste records plus the location names the waste form offers.
async fn load_wastes(app: &mut App) {
    match app.service.list_wastes().await {
        Ok(wastes) => {
            app.wastes = wastes;
            app.waste_index = app.waste_index.min(app.wastes.len().saturating_sub(1));
        }
        Err(err) => {
            app.wastes.clear();
            app.error_message = Some(format!("Failed to load waste records: {err}"));
        }
    }
    match app.service.location_choices().await {
        Ok(choices) => app.location_choices = choices,
        Err(err) => app.error_message = Some(format!("Failed to load locations: {err}")),
    }
}

async fn load_locations(app: &mut App) {
    match app.service.list_locations().await {
        Ok(locations) => {
            app.locations = locations;
            app.location_index = app.location_index.min(app.locations.len().saturating_sub(1));
        }
        Err(err) => {
            app.locations.clear();
            app.error_message = Some(format!("Failed to load locations: {err}"));
        }
    }
}

async fn load_users(app: &mut App) {
    let Some(user) = app.user.clone() else {
        return;
    };
    match app.service.list_users(&user).await {
        Ok(users) => {
            app.users = users;
            app.user_index = app.user_index.min(app.users.len().saturating_sub(1));
        }
        Err(err) => {
            app.users.clear();
            app.error_message = Some(format!("Failed to load accounts: {err}"));
        }
    }
}

async fn load_histories(app: &mut App) {
    let Some(user) = app.user.clone() else {
        return;
    };
    match app.service.chat_histories(&user).await {
        Ok(histories) => {
            app.histories = histories;
            app.history_index = app.history_index.min(app.histories.len().saturating_sub(1));
        }
        Err(err) => {
            app.histories.clear();
            app.error_message = Some(format!("Failed to load saved chats: {err}"));
        }
    }
}

async fn save_pickup(app: &mut App) {
    let Some(user) = app.user.clone() else {
        return;
    };
    let draft = match app.pickup_draft() {
        Ok(draft) => draft,
        Err(message) => {
            app.error_message = Some(message);
            return;
        }
    };

    match app.service.save_pickup(&user, draft).await {
        Ok(saved) => {
            let verb = if saved.created { "scheduled" } else { "updated" };
            let mut parts = vec![format!("Pickup {verb}")];
            if let Some(status) = saved.waste_status {
                parts.push(format!("waste marked {status}"));
            }
            parts.extend(
                saved
                    .warnings
                    .iter()
                    .map(|warning| format!("warning: {warning}")),
            );
            app.info_message = Some(parts.join(", "));
            app.pickup_form = None;
            app.screen = Screen::Pickups;
            load_pickups(app).await;
        }
        Err(ServiceError::Conflict { .. }) => {
            app.error_message = Some(
                "Technician already has a pickup within 2 hours of that time. Pick another time."
                    .into(),
            );
        }
        Err(err) => app.error_message = Some(format!("Save failed: {err}")),
    }
}

async fn delete_pickup(app: &mut App) {
    let (Some(user), Some(row)) = (app.user.clone(), app.selected_pickup()) else {
        app.error_message = Some("No pickup selected".into());
        return;
    };
    let id = row.pickup.id.clone();
    match app.service.delete_pickup(&user, &id).await {
        Ok(()) => {
            app.info_message = Some("Pickup deleted".into());
            load_pickups(app).await;
        }
        Err(err) => app.error_message = Some(format!("Delete failed: {err}")),
    }
}

async fn save_waste(app: &mut App) {
    let Some(user) = app.user.clone() else {
        return;
    };
    let draft = match app.waste_draft() {
        Ok(draft) => draft,
        Err(message) => {
            app.error_message = Some(message);
            return;
        }
    };

    match app.service.save_waste(&user, draft).await {
        Ok(saved) => {
            let verb = if saved.created { "recorded" } else { "updated" };
            let mut parts = vec![format!("Waste {} {verb}", saved.waste.name)];
            parts.extend(saved.warnings.iter().map(ToString::to_string));
            app.info_message = Some(parts.join(", "));
            app.waste_form = None;
            app.screen = Screen::Wastes;
            load_wastes(app).await;
        }
        Err(ServiceError::HazardNotAcknowledged) => {
            // A second Enter confirms the B3 handling notice.
            if let Some(form) = app.waste_form.as_mut() {
                form.hazard_acknowledged = true;
            }
            app.error_message = Some(
                "B3 waste needs special handling. Press Enter again to confirm.".into(),
            );
        }
        Err(err) => app.error_message = Some(format!("Save failed: {err}")),
    }
}

async fn delete_waste(app: &mut App) {
    let (Some(user), Some(waste)) = (app.user.clone(), app.selected_waste()) else {
        app.error_message = Some("No waste record selected".into());
        return;
    };
    let id = waste.id.clone();
    match app.service.delete_waste(&user, &id).await {
        Ok(()) => {
            app.info_message = Some("Waste record deleted".into());
            load_wastes(app).await;
        }
        Err(err) => app.error_message = Some(format!("Delete failed: {err}")),
    }
}

async fn save_location(app: &mut App) {
    let Some(user) = app.user.clone() else {
        return;
    };
    let draft = match app.location_draft() {
        Ok(draft) => draft,
        Err(message) => {
            app.error_message = Some(message);
            return;
        }
    };

    match app.service.save_location(&user, draft).await {
        Ok(location) => {
            app.info_message = Some(format!("Location {} saved", location.name));
            app.location_form = None;
            app.screen = Screen::Locations;
            load_locations(app).await;
            load_wastes(app).await;
        }
        Err(err) => app.error_message = Some(format!("Save failed: {err}")),
    }
}

async fn delete_location(app: &mut App) {
    let (Some(user), Some(location)) = (app.user.clone(), app.selected_location()) else {
        app.error_message = Some("No location selected".into());
        return;
    };
    let id = location.id.clone();
    match app.service.delete_location(&user, &id).await {
        Ok(()) => {
            app.info_message = Some("Location deleted".into());
            load_locations(app).await;
            load_wastes(app).await;
        }
        Err(err) => app.error_message = Some(format!("Delete failed: {err}")),
    }
}

async fn save_user(app: &mut App) {
    let Some(user) = app.user.clone() else {
        return;
    };
    let draft = match app.user_draft() {
        Ok(draft) => draft,
        Err(message) => {
            app.error_message = Some(message);
            return;
        }
    };

    match app.service.save_user(&user, draft).await {
        Ok(saved) => {
            app.info_message = Some(format!("Account {} saved", saved.username));
            app.user_form = None;
            app.screen = Screen::Users;
            load_users(app).await;
        }
        Err(ServiceError::DuplicateUsername(name)) => {
            app.error_message = Some(format!("Username {name} is already taken"));
        }
        Err(err) => app.error_message = Some(format!("Save failed: {err}")),
    }
}

async fn delete_user(app: &mut App) {
    let (Some(user), Some(target)) = (app.user.clone(), app.selected_user()) else {
        app.error_message = Some("No account selected".into());
        return;
    };
    let id = target.id.clone();
    match app.service.delete_user(&user, &id).await {
        Ok(()) => {
            app.info_message = Some("Account deleted".into());
            load_users(app).await;
        }
        Err(err) => app.error_message = Some(format!("Delete failed: {err}")),
    }
}

async fn open_history(app: &mut App) {
    let (Some(user), Some(selected)) = (app.user.clone(), app.selected_history()) else {
        app.error_message = Some("No saved chat selected".into());
        return;
    };
    let id = selected.id.clone();
    match app.service.chat_history(&user, &id).await {
        Ok(history) => {
            app.info_message = Some(format!("Opened {}", history.title));
            app.resume_conversation(history);
        }
        Err(err) => app.error_message = Some(format!("Failed to open chat: {err}")),
    }
}

async fn delete_history(app: &mut App) {
    let (Some(user), Some(selected)) = (app.user.clone(), app.selected_history()) else {
        app.error_message = Some("No saved chat selected".into());
        return;
    };
    let id = selected.id.clone();
    match app.service.delete_chat_history(&user, &id).await {
        Ok(()) => {
            if app.current_history.as_ref() == Some(&id) {
                app.start_new_conversation();
            }
            app.info_message = Some("Saved chat deleted".into());
            load_histories(app).await;
        }
        Err(err) => app.error_message = Some(format!("Delete failed: {err}")),
    }
}

async fn send_chat(app: &mut App) {
    let question = app.chat_input.trim().to_owned();
    if question.is_empty() {
        return;
    }
    let Some(conversation) = app.conversation.as_mut() else {
        return;
    };

    if !is_topic_related(&question) {
        info!(question = %question, "question looks off-topic, forwarding anyway");
    }
    conversation.push_user(question.clone());
    app.chat_input.clear();

    match app.assistant.complete(conversation).await {
        Ok(answer) => conversation.push_assistant(answer),
        Err(err) => {
            warn!(error = %err, "assistant request failed");
            conversation.rollback_last_user();
            app.chat_input = question;
            app.error_message = Some(format!("Assistant unavailable: {err}"));
            return;
        }
    }
    save_conversation(app).await;
}

/// Store the transcript after each answer so it shows up under saved chats.
async fn save_conversation(app: &mut App) {
    let (Some(user), Some(conversation)) = (app.user.clone(), app.conversation.as_ref()) else {
        return;
    };
    match app
        .service
        .save_chat_history(&user, app.current_history.as_ref(), conversation.messages())
        .await
    {
        Ok(Some(history)) => {
            app.current_history = Some(history.id);
            load_histories(app).await;
        }
        Ok(None) => {}
        Err(err) => {
            warn!(error = %err, "failed to save chat history");
            app.error_message = Some(format!("Chat not saved: {err}"));
        }
    }
}
