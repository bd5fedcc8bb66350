use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use jemput_assistant::client::MODELS;

use crate::app::{
    App, LoginField, PickupField, Screen, UserField, WasteField, cycle_choice, wrap_index,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    Login,
    Register,
    Logout,
    /// Reload pickups (and the lookups the form needs) and show the list
    ShowPickups,
    ShowWastes,
    ShowLocations,
    ShowUsers,
    ShowStats,
    ShowChat,
    NewPickup,
    EditPickup,
    SavePickup,
    DeletePickup,
    NewWaste,
    SaveWaste,
    DeleteWaste,
    SaveLocation,
    DeleteLocation,
    SaveUser,
    DeleteUser,
    /// Send `app.chat_input` to the assistant
    SendChat,
    NewChat,
    OpenHistory,
    DeleteHistory,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match app.screen {
        Screen::Login => handle_login(key, app),
        Screen::Pickups => handle_pickups(key, app),
        Screen::PickupForm => handle_pickup_form(key, app),
        Screen::Wastes => handle_wastes(key, app),
        Screen::WasteForm => handle_waste_form(key, app),
        Screen::Locations => handle_locations(key, app),
        Screen::LocationForm => handle_location_form(key, app),
        Screen::Users => handle_users(key, app),
        Screen::UserForm => handle_user_form(key, app),
        Screen::Stats => handle_stats(key, app),
        Screen::Chat => handle_chat(key, app),
    }
}

fn is_plain(key: KeyEvent) -> bool {
    !key.modifiers.contains(KeyModifiers::CONTROL) && !key.modifiers.contains(KeyModifiers::ALT)
}

fn is_ctrl(key: KeyEvent, character: char) -> bool {
    key.code == KeyCode::Char(character) && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn move_selection(index: &mut usize, len: usize, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => {
            *index = index.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if *index + 1 < len {
                *index += 1;
            }
        }
        _ => {}
    }
}

/// Keys shared by every list screen for switching to another one.
fn navigate(key: KeyEvent, app: &App) -> Option<Action> {
    let manages = app.can_manage_records();
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('w') => Some(Action::ShowWastes),
        KeyCode::Char('c') => Some(Action::ShowChat),
        KeyCode::Char('g') => Some(Action::ShowStats),
        KeyCode::Char('l') => Some(Action::Logout),
        KeyCode::Char('p') if manages => Some(Action::ShowPickups),
        KeyCode::Char('o') if manages => Some(Action::ShowLocations),
        KeyCode::Char('u') if app.can_manage_users() => Some(Action::ShowUsers),
        _ => None,
    }
}

fn handle_login(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, BackTab, Char, Down, Enter, Esc, Tab, Up};

    match key.code {
        Esc => return Action::Quit,
        Enter => return Action::Login,
        Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => return Action::Register,
        Tab | BackTab | Up | Down => {
            app.login_field = match app.login_field {
                LoginField::Username => LoginField::Password,
                LoginField::Password => LoginField::Username,
            };
        }
        Backspace => {
            login_input(app).pop();
        }
        Char(character) if is_plain(key) => {
            login_input(app).push(character);
        }
        _ => {}
    }
    Action::None
}

fn login_input(app: &mut App) -> &mut String {
    match app.login_field {
        LoginField::Username => &mut app.login_username,
        LoginField::Password => &mut app.login_password,
    }
}

fn handle_pickups(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Char, Delete, Enter};

    match key.code {
        Char('n') => Action::NewPickup,
        Enter | Char('e') => Action::EditPickup,
        Char('d') | Delete => Action::DeletePickup,
        Char('r') => Action::ShowPickups,
        code => navigate(key, app).unwrap_or_else(|| {
            move_selection(&mut app.pickup_index, app.pickups.len(), code);
            Action::None
        }),
    }
}

fn handle_wastes(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Char, Delete, Enter};

    let manages = app.can_manage_records();
    match key.code {
        Char('r') => Action::ShowWastes,
        Char('n') if manages => Action::NewWaste,
        Enter | Char('e') if manages => {
            app.clear_messages();
            if !app.open_selected_waste() {
                app.error_message = Some("No waste record selected".into());
            }
            Action::None
        }
        Char('d') | Delete if manages => Action::DeleteWaste,
        Char('n' | 'e' | 'd') | Enter | Delete => {
            app.error_message = Some("Your account can only view waste records".into());
            Action::None
        }
        code => navigate(key, app).unwrap_or_else(|| {
            move_selection(&mut app.waste_index, app.wastes.len(), code);
            Action::None
        }),
    }
}

fn handle_locations(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Char, Delete, Enter};

    match key.code {
        Char('r') => Action::ShowLocations,
        Char('n') => {
            app.clear_messages();
            app.open_new_location();
            Action::None
        }
        Enter | Char('e') => {
            app.clear_messages();
            if !app.open_selected_location() {
                app.error_message = Some("No location selected".into());
            }
            Action::None
        }
        Char('d') | Delete => Action::DeleteLocation,
        code => navigate(key, app).unwrap_or_else(|| {
            move_selection(&mut app.location_index, app.locations.len(), code);
            Action::None
        }),
    }
}

fn handle_users(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Char, Delete, Enter};

    match key.code {
        Char('r') => Action::ShowUsers,
        Char('n') => {
            app.clear_messages();
            app.open_new_user();
            Action::None
        }
        Enter | Char('e') => {
            app.clear_messages();
            if !app.open_selected_user() {
                app.error_message = Some("No account selected".into());
            }
            Action::None
        }
        Char('d') | Delete => Action::DeleteUser,
        code => navigate(key, app).unwrap_or_else(|| {
            move_selection(&mut app.user_index, app.users.len(), code);
            Action::None
        }),
    }
}

fn handle_stats(key: KeyEvent, app: &mut App) -> Action {
    match key.code {
        KeyCode::Char('r') => Action::ShowStats,
        KeyCode::Esc => home_action(app),
        _ => navigate(key, app).unwrap_or(Action::None),
    }
}

fn home_action(app: &mut App) -> Action {
    app.screen = app.home_screen();
    if app.screen == Screen::Pickups {
        Action::ShowPickups
    } else {
        Action::ShowWastes
    }
}

fn handle_pickup_form(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Backspace, Char, Down, Enter, Esc, Left, Right, Tab, Up};

    let waste_count = app.wastes.len();
    let technician_count = app.technicians.len();
    let Some(form) = app.pickup_form.as_mut() else {
        app.screen = Screen::Pickups;
        return Action::None;
    };

    match key.code {
        Esc => {
            app.pickup_form = None;
            app.screen = Screen::Pickups;
        }
        Enter => return Action::SavePickup,
        Tab | Down => form.field = form.field.next(),
        BackTab | Up => form.field = form.field.previous(),
        Left | Right => {
            let forward = key.code == Right;
            match form.field {
                PickupField::Waste => {
                    form.waste_index = cycle_choice(form.waste_index, waste_count, forward);
                }
                PickupField::Technician => {
                    form.technician_index =
                        cycle_choice(form.technician_index, technician_count, forward);
                }
                PickupField::Status => form.cycle_status(forward),
                PickupField::ScheduledAt | PickupField::Note => {}
            }
        }
        Backspace => {
            if let Some(text) = form.focused_text() {
                text.pop();
            }
        }
        Char(character) if is_plain(key) => {
            if let Some(text) = form.focused_text() {
                text.push(character);
            }
        }
        _ => {}
    }
    Action::None
}

fn handle_waste_form(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Backspace, Char, Down, Enter, Esc, Left, Right, Tab, Up};

    let Some(form) = app.waste_form.as_mut() else {
        app.screen = Screen::Wastes;
        return Action::None;
    };

    match key.code {
        Esc => {
            app.waste_form = None;
            app.screen = Screen::Wastes;
        }
        Enter => return Action::SaveWaste,
        Tab | Down => form.field = form.field.next(),
        BackTab | Up => form.field = form.field.previous(),
        Left | Right if form.field == WasteField::Kind => form.cycle_kind(key.code == Right),
        Left | Right if form.field == WasteField::Location => {
            form.cycle_location(&app.location_choices, key.code == Right);
        }
        Backspace => {
            if let Some(text) = form.focused_text() {
                text.pop();
            }
        }
        Char(character) if is_plain(key) => {
            if let Some(text) = form.focused_text() {
                text.push(character);
            }
        }
        _ => {}
    }
    Action::None
}

fn handle_location_form(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Backspace, Char, Down, Enter, Esc, Tab, Up};

    let Some(form) = app.location_form.as_mut() else {
        app.screen = Screen::Locations;
        return Action::None;
    };

    match key.code {
        Esc => {
            app.location_form = None;
            app.screen = Screen::Locations;
        }
        Enter => return Action::SaveLocation,
        Tab | Down => form.field = form.field.next(),
        BackTab | Up => form.field = form.field.previous(),
        Backspace => {
            form.focused_text().pop();
        }
        Char(character) if is_plain(key) => form.focused_text().push(character),
        _ => {}
    }
    Action::None
}

fn handle_user_form(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Backspace, Char, Down, Enter, Esc, Left, Right, Tab, Up};

    let Some(form) = app.user_form.as_mut() else {
        app.screen = Screen::Users;
        return Action::None;
    };

    match key.code {
        Esc => {
            app.user_form = None;
            app.screen = Screen::Users;
        }
        Enter => return Action::SaveUser,
        Tab | Down => form.field = form.field.next(),
        BackTab | Up => form.field = form.field.previous(),
        Left | Right if form.field == UserField::Role => form.cycle_role(key.code == Right),
        Backspace => {
            if let Some(text) = form.focused_text() {
                text.pop();
            }
        }
        Char(character) if is_plain(key) => {
            if let Some(text) = form.focused_text() {
                text.push(character);
            }
        }
        _ => {}
    }
    Action::None
}

fn handle_chat(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Backspace, Char, Down, Enter, Esc, Tab, Up};

    if is_ctrl(key, 'n') {
        return Action::NewChat;
    }
    if is_ctrl(key, 'o') {
        return Action::OpenHistory;
    }
    if is_ctrl(key, 'd') {
        return Action::DeleteHistory;
    }

    match key.code {
        Esc => return home_action(app),
        Enter => return Action::SendChat,
        Up | Down => move_selection(&mut app.history_index, app.histories.len(), key.code),
        Tab | BackTab => {
            let current = MODELS
                .iter()
                .position(|model| *model == app.assistant.model())
                .unwrap_or(0);
            let next = wrap_index(current, MODELS.len(), key.code == Tab);
            if let Some(model) = MODELS.get(next) {
                app.assistant.set_model(*model);
                app.info_message = Some(format!("Model: {model}"));
            }
        }
        Backspace => {
            app.chat_input.pop();
        }
        Char(character) if is_plain(key) => app.chat_input.push(character),
        _ => {}
    }
    Action::None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jemput_assistant::MistralClient;
    use jemput_core::model::{Role, User, UserId};
    use jemput_core::service::JemputService;
    use jemput_store::{MemoryStore, stores};
    use reqwest::Client;

    use super::*;

    fn signed_in(role: Role) -> App {
        let service = JemputService::new(Arc::new(stores(Arc::new(MemoryStore::new()))));
        let mut app = App::new(Arc::new(service), MistralClient::new(Client::new(), None));
        app.sign_in(User {
            id: UserId("U1".to_owned()),
            username: "siti".to_owned(),
            password_hash: String::new(),
            role,
        });
        app
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn management_screens_follow_role() {
        let mut citizen = signed_in(Role::User);
        assert_eq!(handle_key_event(press(KeyCode::Char('o')), &mut citizen), Action::None);
        assert_eq!(handle_key_event(press(KeyCode::Char('u')), &mut citizen), Action::None);
        assert_eq!(
            handle_key_event(press(KeyCode::Char('g')), &mut citizen),
            Action::ShowStats
        );

        let mut technician = signed_in(Role::Technician);
        assert_eq!(
            handle_key_event(press(KeyCode::Char('o')), &mut technician),
            Action::ShowLocations
        );
        assert_eq!(handle_key_event(press(KeyCode::Char('u')), &mut technician), Action::None);

        let mut admin = signed_in(Role::Admin);
        assert_eq!(
            handle_key_event(press(KeyCode::Char('u')), &mut admin),
            Action::ShowUsers
        );
    }

    #[test]
    fn chat_shortcuts_manage_history() {
        let mut app = signed_in(Role::User);
        app.screen = Screen::Chat;
        let ctrl = |character| KeyEvent::new(KeyCode::Char(character), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(ctrl('n'), &mut app), Action::NewChat);
        assert_eq!(handle_key_event(ctrl('o'), &mut app), Action::OpenHistory);
        assert_eq!(handle_key_event(ctrl('d'), &mut app), Action::DeleteHistory);

        assert_eq!(handle_key_event(press(KeyCode::Char('n')), &mut app), Action::None);
        assert_eq!(app.chat_input, "n");
    }

    #[test]
    fn unset_technician_is_picked_with_arrows() {
        let mut app = signed_in(Role::Admin);
        app.open_new_pickup();
        let technician =
            |state: &App| state.pickup_form.as_ref().and_then(|form| form.technician_index);
        assert_eq!(technician(&app), None);

        handle_key_event(press(KeyCode::Tab), &mut app);
        handle_key_event(press(KeyCode::Right), &mut app);
        assert_eq!(technician(&app), None);

        app.technicians = vec![app.user.clone().expect("signed in"); 2];
        handle_key_event(press(KeyCode::Left), &mut app);
        assert_eq!(technician(&app), Some(1));
        handle_key_event(press(KeyCode::Right), &mut app);
        assert_eq!(technician(&app), Some(0));
    }
}
