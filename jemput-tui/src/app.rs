use std::sync::Arc;

use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};
use jemput_assistant::{Conversation, MistralClient};
use jemput_core::{
    accounts::UserDraft,
    locations::{LocationDraft, parse_coordinate},
    model::{
        ChatHistory, ChatHistoryId, Location, LocationId, PickupId, PickupStatus, Role, User,
        UserId, Waste, WasteId, WasteKind,
    },
    service::{JemputService, PickupDraft, PickupRow, WasteDraft},
};

/// Format used to type and show pickup times.
pub(crate) const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Marker appended to the note when a pickup is switched to done.
pub(crate) const DONE_NOTE: &str = "[Tugas Selesai]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Login,
    Pickups,
    PickupForm,
    Wastes,
    WasteForm,
    Locations,
    LocationForm,
    Users,
    UserForm,
    Stats,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoginField {
    Username,
    Password,
}

/// Declares a form field enum with Tab order helpers.
macro_rules! form_fields {
    ($name:ident { $($field:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub(crate) enum $name {
            $($field),+
        }

        impl $name {
            const ORDER: &'static [$name] = &[$($name::$field),+];

            pub(crate) fn next(self) -> Self {
                step(Self::ORDER, self, true)
            }

            pub(crate) fn previous(self) -> Self {
                step(Self::ORDER, self, false)
            }
        }
    };
}

form_fields!(PickupField {
    Waste,
    Technician,
    Status,
    ScheduledAt,
    Note,
});

form_fields!(WasteField {
    Name,
    Kind,
    Weight,
    Location,
    Note,
});

form_fields!(LocationField {
    Name,
    Latitude,
    Longitude,
    Note,
});

form_fields!(UserField {
    Username,
    Password,
    Role,
});

fn step<T: Copy + PartialEq>(items: &[T], current: T, forward: bool) -> T {
    let index = items.iter().position(|item| *item == current).unwrap_or(0);
    items
        .get(wrap_index(index, items.len(), forward))
        .copied()
        .unwrap_or(current)
}

/// Index after moving one step through `len` items, wrapping at both ends.
pub(crate) fn wrap_index(index: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        0
    } else if forward {
        if index + 1 >= len { 0 } else { index + 1 }
    } else if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

/// Move a pick-list choice one step. An empty or out-of-range choice lands
/// on the first item going forward and the last going back.
pub(crate) fn cycle_choice(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match current {
        Some(index) if index < len => Some(wrap_index(index, len, forward)),
        _ if forward => Some(0),
        _ => Some(len - 1),
    }
}

/// Pickup being created or edited.
pub(crate) struct PickupForm {
    pub id: Option<PickupId>,
    /// `None` until a waste record is chosen, or when the linked one is gone.
    pub waste_index: Option<usize>,
    /// `None` until a technician is chosen, or when the assignee is not offered.
    pub technician_index: Option<usize>,
    pub status: PickupStatus,
    pub scheduled_at: String,
    pub note: String,
    pub field: PickupField,
}

impl PickupForm {
    /// Cycle through the standard statuses, tagging the note once a pickup is done.
    pub(crate) fn cycle_status(&mut self, forward: bool) {
        let len = PickupStatus::STANDARD.len();
        let next = PickupStatus::STANDARD
            .iter()
            .position(|status| *status == self.status)
            .map_or(0, |index| wrap_index(index, len, forward));
        self.status = PickupStatus::STANDARD
            .get(next)
            .cloned()
            .unwrap_or_default();

        if self.status == PickupStatus::Done && !self.note.contains(DONE_NOTE) {
            if !self.note.is_empty() {
                self.note.push(' ');
            }
            self.note.push_str(DONE_NOTE);
        }
    }

    pub(crate) fn focused_text(&mut self) -> Option<&mut String> {
        match self.field {
            PickupField::ScheduledAt => Some(&mut self.scheduled_at),
            PickupField::Note => Some(&mut self.note),
            PickupField::Waste | PickupField::Technician | PickupField::Status => None,
        }
    }
}

/// Waste intake being created or edited.
pub(crate) struct WasteForm {
    pub id: Option<WasteId>,
    pub name: String,
    pub kind: WasteKind,
    pub weight: String,
    /// Chosen from the location list; an edited record may hold an older free-text value.
    pub location: String,
    pub note: String,
    pub field: WasteField,
    pub hazard_acknowledged: bool,
}

impl WasteForm {
    pub(crate) fn cycle_kind(&mut self, forward: bool) {
        let len = WasteKind::STANDARD.len();
        let next = WasteKind::STANDARD
            .iter()
            .position(|kind| *kind == self.kind)
            .map_or(0, |index| wrap_index(index, len, forward));
        if let Some(kind) = WasteKind::STANDARD.get(next) {
            self.kind = kind.clone();
        }
        self.hazard_acknowledged = false;
    }

    pub(crate) fn cycle_location(&mut self, choices: &[String], forward: bool) {
        let current = choices.iter().position(|name| *name == self.location);
        if let Some(name) =
            cycle_choice(current, choices.len(), forward).and_then(|index| choices.get(index))
        {
            self.location.clone_from(name);
        }
    }

    /// Text field that receives typed characters, if any.
    pub(crate) fn focused_text(&mut self) -> Option<&mut String> {
        match self.field {
            WasteField::Name => Some(&mut self.name),
            WasteField::Weight => Some(&mut self.weight),
            WasteField::Note => Some(&mut self.note),
            WasteField::Kind | WasteField::Location => None,
        }
    }
}

/// Custom location being created or edited.
pub(crate) struct LocationForm {
    pub id: Option<LocationId>,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
    pub note: String,
    pub field: LocationField,
}

impl LocationForm {
    pub(crate) fn focused_text(&mut self) -> &mut String {
        match self.field {
            LocationField::Name => &mut self.name,
            LocationField::Latitude => &mut self.latitude,
            LocationField::Longitude => &mut self.longitude,
            LocationField::Note => &mut self.note,
        }
    }
}

/// Account being created or edited by an admin.
pub(crate) struct UserForm {
    pub id: Option<UserId>,
    pub username: String,
    /// Left empty to keep the current password of an existing account.
    pub password: String,
    pub role: Role,
    pub field: UserField,
}

impl UserForm {
    pub(crate) fn cycle_role(&mut self, forward: bool) {
        let len = Role::ALL.len();
        let next = Role::ALL
            .iter()
            .position(|role| *role == self.role)
            .map_or(0, |index| wrap_index(index, len, forward));
        if let Some(role) = Role::ALL.get(next) {
            self.role = *role;
        }
    }

    pub(crate) fn focused_text(&mut self) -> Option<&mut String> {
        match self.field {
            UserField::Username => Some(&mut self.username),
            UserField::Password => Some(&mut self.password),
            UserField::Role => None,
        }
    }
}

pub(crate) struct App {
    pub service: Arc<JemputService>,
    pub assistant: MistralClient,

    pub screen: Screen,
    pub user: Option<User>,

    pub login_username: String,
    pub login_password: String,
    pub login_field: LoginField,

    pub pickups: Vec<PickupRow>,
    pub pickup_index: usize,
    pub technicians: Vec<User>,
    pub pickup_form: Option<PickupForm>,

    pub wastes: Vec<Waste>,
    pub waste_index: usize,
    pub waste_form: Option<WasteForm>,

    pub locations: Vec<Location>,
    pub location_index: usize,
    pub location_choices: Vec<String>,
    pub location_form: Option<LocationForm>,

    pub users: Vec<User>,
    pub user_index: usize,
    pub user_form: Option<UserForm>,

    pub conversation: Option<Conversation>,
    pub chat_input: String,
    pub histories: Vec<ChatHistory>,
    pub history_index: usize,
    /// Saved conversation the transcript belongs to, once it has been stored.
    pub current_history: Option<ChatHistoryId>,

    pub is_loading: bool,
    pub error_message: Option<String>,
    pub info_message: Option<String>,
}

impl App {
    pub(crate) fn new(service: Arc<JemputService>, assistant: MistralClient) -> Self {
        Self {
            service,
            assistant,
            screen: Screen::Login,
            user: None,
            login_username: String::new(),
            login_password: String::new(),
            login_field: LoginField::Username,
            pickups: Vec::new(),
            pickup_index: 0,
            technicians: Vec::new(),
            pickup_form: None,
            wastes: Vec::new(),
            waste_index: 0,
            waste_form: None,
            locations: Vec::new(),
            location_index: 0,
            location_choices: Vec::new(),
            location_form: None,
            users: Vec::new(),
            user_index: 0,
            user_form: None,
            conversation: None,
            chat_input: String::new(),
            histories: Vec::new(),
            history_index: 0,
            current_history: None,
            is_loading: false,
            error_message: None,
            info_message: None,
        }
    }

    pub(crate) fn can_manage_records(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.role.can_manage_records())
    }

    pub(crate) fn can_manage_users(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.role.can_manage_users())
    }

    /// Screen shown right after login and when leaving the chat.
    pub(crate) fn home_screen(&self) -> Screen {
        if self.can_manage_records() {
            Screen::Pickups
        } else {
            Screen::Wastes
        }
    }

    pub(crate) fn sign_in(&mut self, user: User) {
        self.conversation = Some(Conversation::new(&user));
        self.current_history = None;
        self.user = Some(user);
        self.login_password.clear();
        self.screen = self.home_screen();
    }

    pub(crate) fn sign_out(&mut self) {
        self.user = None;
        self.pickups.clear();
        self.wastes.clear();
        self.technicians.clear();
        self.locations.clear();
        self.users.clear();
        self.histories.clear();
        self.pickup_form = None;
        self.waste_form = None;
        self.location_form = None;
        self.user_form = None;
        self.conversation = None;
        self.current_history = None;
        self.chat_input.clear();
        self.screen = Screen::Login;
    }

    pub(crate) fn clear_messages(&mut self) {
        self.error_message = None;
        self.info_message = None;
    }

    pub(crate) fn selected_pickup(&self) -> Option<&PickupRow> {
        self.pickups.get(self.pickup_index)
    }

    pub(crate) fn selected_waste(&self) -> Option<&Waste> {
        self.wastes.get(self.waste_index)
    }

    pub(crate) fn selected_location(&self) -> Option<&Location> {
        self.locations.get(self.location_index)
    }

    pub(crate) fn selected_user(&self) -> Option<&User> {
        self.users.get(self.user_index)
    }

    pub(crate) fn selected_history(&self) -> Option<&ChatHistory> {
        self.histories.get(self.history_index)
    }

    /// Open an empty pickup form scheduled for the next full hour.
    pub(crate) fn open_new_pickup(&mut self) {
        let next_hour = Local::now().naive_local() + TimeDelta::hours(1);
        let rounded = next_hour
            .with_minute(0)
            .and_then(|time| time.with_second(0))
            .unwrap_or(next_hour);
        self.pickup_form = Some(PickupForm {
            id: None,
            waste_index: cycle_choice(None, self.wastes.len(), true),
            technician_index: cycle_choice(None, self.technicians.len(), true),
            status: PickupStatus::Pending,
            scheduled_at: rounded.format(DATE_TIME_FORMAT).to_string(),
            note: String::new(),
            field: PickupField::Waste,
        });
        self.screen = Screen::PickupForm;
    }

    /// Open the selected pickup for editing. References that are no longer
    /// offered stay unselected rather than falling back to another record.
    pub(crate) fn open_selected_pickup(&mut self) -> bool {
        let Some(row) = self.selected_pickup() else {
            return false;
        };
        let pickup = &row.pickup;
        let form = PickupForm {
            id: Some(pickup.id.clone()),
            waste_index: self
                .wastes
                .iter()
                .position(|waste| waste.id == pickup.waste_id),
            technician_index: self
                .technicians
                .iter()
                .position(|user| user.id == pickup.assignee_id),
            status: pickup.status.clone(),
            scheduled_at: pickup.scheduled_at.format(DATE_TIME_FORMAT).to_string(),
            note: pickup.note.clone(),
            field: PickupField::Waste,
        };
        self.pickup_form = Some(form);
        self.screen = Screen::PickupForm;
        true
    }

    /// Build the draft from the open form, or explain what is missing.
    pub(crate) fn pickup_draft(&self) -> Result<PickupDraft, String> {
        let form = self.pickup_form.as_ref().ok_or("no pickup form open")?;
        let waste = form
            .waste_index
            .and_then(|index| self.wastes.get(index))
            .ok_or("select a waste record")?;
        let technician = form
            .technician_index
            .and_then(|index| self.technicians.get(index))
            .ok_or("select a technician")?;
        let scheduled_at =
            NaiveDateTime::parse_from_str(form.scheduled_at.trim(), DATE_TIME_FORMAT)
                .map_err(|err| format!("time must look like 2025-01-31 09:00 ({err})"))?;

        Ok(PickupDraft {
            id: form.id.clone(),
            waste_id: waste.id.clone(),
            assignee_id: technician.id.clone(),
            scheduled_at,
            status: form.status.clone(),
            note: form.note.trim().to_owned(),
        })
    }

    pub(crate) fn open_new_waste(&mut self) {
        self.waste_form = Some(WasteForm {
            id: None,
            name: String::new(),
            kind: WasteKind::Organic,
            weight: String::new(),
            location: self.location_choices.first().cloned().unwrap_or_default(),
            note: String::new(),
            field: WasteField::Name,
            hazard_acknowledged: false,
        });
        self.screen = Screen::WasteForm;
    }

    pub(crate) fn open_selected_waste(&mut self) -> bool {
        let Some(waste) = self.selected_waste() else {
            return false;
        };
        let form = WasteForm {
            id: Some(waste.id.clone()),
            name: waste.name.clone(),
            kind: waste.kind.clone(),
            weight: waste.weight_kg.to_string(),
            location: waste.location.clone(),
            note: waste.note.clone(),
            field: WasteField::Name,
            hazard_acknowledged: false,
        };
        self.waste_form = Some(form);
        self.screen = Screen::WasteForm;
        true
    }

    pub(crate) fn waste_draft(&self) -> Result<WasteDraft, String> {
        let form = self.waste_form.as_ref().ok_or("no waste form open")?;
        let weight_kg = form
            .weight
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|err| format!("weight must be a number in kg ({err})"))?;
        Ok(WasteDraft {
            id: form.id.clone(),
            name: form.name.clone(),
            kind: form.kind.clone(),
            weight_kg,
            location: form.location.clone(),
            note: form.note.clone(),
            hazard_acknowledged: form.hazard_acknowledged,
        })
    }

    /// Technicians offered in the pickup form; technicians may only book themselves.
    pub(crate) fn restrict_technicians(&mut self, technicians: Vec<User>) {
        let own: Option<UserId> = self
            .user
            .as_ref()
            .filter(|user| !user.role.can_manage_users())
            .map(|user| user.id.clone());
        self.technicians = match own {
            Some(id) => technicians.into_iter().filter(|user| user.id == id).collect(),
            None => technicians,
        };
    }

    pub(crate) fn open_new_location(&mut self) {
        self.location_form = Some(LocationForm {
            id: None,
            name: String::new(),
            latitude: String::new(),
            longitude: String::new(),
            note: String::new(),
            field: LocationField::Name,
        });
        self.screen = Screen::LocationForm;
    }

    pub(crate) fn open_selected_location(&mut self) -> bool {
        let Some(location) = self.selected_location() else {
            return false;
        };
        let form = LocationForm {
            id: Some(location.id.clone()),
            name: location.name.clone(),
            latitude: location.latitude.to_string(),
            longitude: location.longitude.to_string(),
            note: location.note.clone(),
            field: LocationField::Name,
        };
        self.location_form = Some(form);
        self.screen = Screen::LocationForm;
        true
    }

    pub(crate) fn location_draft(&self) -> Result<LocationDraft, String> {
        let form = self.location_form.as_ref().ok_or("no location form open")?;
        if form.name.trim().is_empty()
            || form.latitude.trim().is_empty()
            || form.longitude.trim().is_empty()
        {
            return Err("name, latitude and longitude are required".into());
        }
        let (Some(latitude), Some(longitude)) = (
            parse_coordinate(&form.latitude),
            parse_coordinate(&form.longitude),
        ) else {
            return Err("latitude/longitude must be decimal numbers like -6.9175".into());
        };
        Ok(LocationDraft {
            id: form.id.clone(),
            name: form.name.clone(),
            latitude,
            longitude,
            note: form.note.clone(),
        })
    }

    pub(crate) fn open_new_user(&mut self) {
        self.user_form = Some(UserForm {
            id: None,
            username: String::new(),
            password: String::new(),
            role: Role::User,
            field: UserField::Username,
        });
        self.screen = Screen::UserForm;
    }

    pub(crate) fn open_selected_user(&mut self) -> bool {
        let Some(user) = self.selected_user() else {
            return false;
        };
        let form = UserForm {
            id: Some(user.id.clone()),
            username: user.username.clone(),
            password: String::new(),
            role: user.role,
            field: UserField::Username,
        };
        self.user_form = Some(form);
        self.screen = Screen::UserForm;
        true
    }

    pub(crate) fn user_draft(&self) -> Result<UserDraft, String> {
        let form = self.user_form.as_ref().ok_or("no account form open")?;
        Ok(UserDraft {
            id: form.id.clone(),
            username: form.username.clone(),
            password: Some(form.password.clone()).filter(|password| !password.is_empty()),
            role: form.role,
        })
    }

    /// Drop the transcript and start an unsaved one.
    pub(crate) fn start_new_conversation(&mut self) {
        if let Some(user) = &self.user {
            self.conversation = Some(Conversation::new(user));
        }
        self.current_history = None;
        self.chat_input.clear();
    }

    /// Continue a saved conversation.
    pub(crate) fn resume_conversation(&mut self, history: ChatHistory) {
        if let Some(user) = &self.user {
            self.conversation = Some(Conversation::resume(user, history.messages));
            self.current_history = Some(history.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use jemput_core::model::{Pickup, WasteStatus};
    use jemput_store::{MemoryStore, stores};
    use reqwest::Client;

    use super::*;

    fn form(note: &str) -> PickupForm {
        PickupForm {
            id: None,
            waste_index: Some(0),
            technician_index: Some(0),
            status: PickupStatus::Pending,
            scheduled_at: String::new(),
            note: note.to_owned(),
            field: PickupField::Status,
        }
    }

    fn app() -> App {
        let service = JemputService::new(Arc::new(stores(Arc::new(MemoryStore::new()))));
        App::new(Arc::new(service), MistralClient::new(Client::new(), None))
    }

    fn account(id: &str, role: Role) -> User {
        User {
            id: UserId(id.to_owned()),
            username: id.to_lowercase(),
            password_hash: String::new(),
            role,
        }
    }

    fn waste(id: &str) -> Waste {
        Waste {
            id: WasteId(id.to_owned()),
            name: format!("batch {id}"),
            kind: WasteKind::Organic,
            weight_kg: 3.0,
            location: "Kota Bandung".to_owned(),
            received_at: NaiveDate::from_ymd_opt(2024, 5, 6)
                .and_then(|date| date.and_hms_opt(7, 0, 0))
                .expect("valid time"),
            input_by: "admin".to_owned(),
            note: String::new(),
            status: WasteStatus::Pending,
        }
    }

    fn row(waste_id: &str, assignee: &str) -> PickupRow {
        PickupRow {
            pickup: Pickup {
                id: PickupId("P1".to_owned()),
                waste_id: WasteId(waste_id.to_owned()),
                assignee_id: UserId(assignee.to_owned()),
                scheduled_at: NaiveDate::from_ymd_opt(2024, 5, 6)
                    .and_then(|date| date.and_hms_opt(10, 0, 0))
                    .expect("valid time"),
                status: PickupStatus::Scheduled,
                note: String::new(),
            },
            waste_name: "-".to_owned(),
            waste_location: "-".to_owned(),
            assignee_name: "-".to_owned(),
        }
    }

    #[test]
    fn choosing_done_tags_note_once() {
        let mut form = form("gerbang belakang");
        form.cycle_status(true);
        assert_eq!(form.status, PickupStatus::Scheduled);
        assert_eq!(form.note, "gerbang belakang");

        form.cycle_status(true);
        assert_eq!(form.status, PickupStatus::Done);
        assert_eq!(form.note, "gerbang belakang [Tugas Selesai]");

        form.cycle_status(false);
        form.cycle_status(true);
        assert_eq!(form.note, "gerbang belakang [Tugas Selesai]");
    }

    #[test]
    fn unknown_status_cycles_to_first_standard() {
        let mut form = form("");
        form.status = PickupStatus::from("Dibatalkan");
        form.cycle_status(false);
        assert_eq!(form.status, PickupStatus::Pending);
    }

    #[test]
    fn selection_wraps_at_both_ends() {
        assert_eq!(wrap_index(2, 3, true), 0);
        assert_eq!(wrap_index(0, 3, false), 2);
        assert_eq!(wrap_index(0, 0, true), 0);
        assert_eq!(PickupField::Note.next(), PickupField::Waste);
        assert_eq!(WasteField::Name.previous(), WasteField::Note);
        assert_eq!(UserField::Role.next(), UserField::Username);
    }

    #[test]
    fn unset_choice_starts_at_either_end() {
        assert_eq!(cycle_choice(None, 0, true), None);
        assert_eq!(cycle_choice(None, 3, true), Some(0));
        assert_eq!(cycle_choice(None, 3, false), Some(2));
        assert_eq!(cycle_choice(Some(7), 3, true), Some(0));
        assert_eq!(cycle_choice(Some(1), 3, true), Some(2));
    }

    #[test]
    fn editing_pickup_with_missing_references_keeps_them_unselected() {
        let mut app = app();
        app.user = Some(account("ADMIN", Role::Admin));
        app.wastes = vec![waste("W-OTHER")];
        app.technicians = vec![account("T1", Role::Technician)];
        app.pickups = vec![row("W-DELETED", "T-GONE")];

        assert!(app.open_selected_pickup());
        let form = app.pickup_form.as_ref().expect("form open");
        assert_eq!(form.waste_index, None);
        assert_eq!(form.technician_index, None);

        let err = app.pickup_draft().expect_err("draft must not re-point the pickup");
        assert_eq!(err, "select a waste record");

        if let Some(form) = app.pickup_form.as_mut() {
            form.waste_index = Some(0);
        }
        assert_eq!(
            app.pickup_draft().expect_err("technician still missing"),
            "select a technician"
        );
    }

    #[test]
    fn editing_pickup_keeps_existing_references() {
        let mut app = app();
        app.wastes = vec![waste("W-OTHER"), waste("W1")];
        app.technicians = vec![account("T1", Role::Technician), account("T2", Role::Technician)];
        app.pickups = vec![row("W1", "T2")];

        assert!(app.open_selected_pickup());
        let draft = app.pickup_draft().expect("complete draft");
        assert_eq!(draft.waste_id.0, "W1");
        assert_eq!(draft.assignee_id.0, "T2");
    }

    #[test]
    fn waste_location_cycles_through_choices_from_legacy_value() {
        let choices = vec!["Kota Bandung".to_owned(), "Kota Bogor".to_owned()];
        let mut form = WasteForm {
            id: None,
            name: String::new(),
            kind: WasteKind::Organic,
            weight: String::new(),
            location: "KOTA BANDUNG".to_owned(),
            note: String::new(),
            field: WasteField::Location,
            hazard_acknowledged: false,
        };
        assert!(form.focused_text().is_none());

        form.cycle_location(&choices, false);
        assert_eq!(form.location, "Kota Bogor");
        form.cycle_location(&choices, true);
        assert_eq!(form.location, "Kota Bandung");
    }

    #[test]
    fn location_form_accepts_comma_coordinates() {
        let mut app = app();
        app.open_new_location();
        if let Some(form) = app.location_form.as_mut() {
            form.name = "TPS Cibiru".to_owned();
            form.latitude = "-6,93".to_owned();
            form.longitude = "107,72".to_owned();
        }
        let draft = app.location_draft().expect("valid draft");
        assert_eq!(draft.latitude, -6.93);
        assert_eq!(draft.longitude, 107.72);

        if let Some(form) = app.location_form.as_mut() {
            form.longitude = "timur".to_owned();
        }
        assert!(app.location_draft().is_err());
    }

    #[test]
    fn blank_password_keeps_existing_one() {
        let mut app = app();
        app.users = vec![account("T1", Role::Technician)];
        assert!(app.open_selected_user());
        if let Some(form) = app.user_form.as_mut() {
            form.cycle_role(true);
        }
        let draft = app.user_draft().expect("draft");
        assert_eq!(draft.password, None);
        assert_eq!(draft.role, Role::Admin);
    }
}
