use jemput_assistant::{ChatRole, Conversation};
use jemput_core::{
    history::DEFAULT_HISTORY_TITLE,
    model::{PickupStatus, WasteKind, WasteStatus},
    stats::{daily_totals, totals_by_kind},
};
use ratatui::{
    prelude::*,
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row,
        Table, TableState, Wrap,
    },
};

use crate::app::{
    App, DATE_TIME_FORMAT, LocationField, LoginField, PickupField, Screen, UserField, WasteField,
};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header_text = match &app.user {
        Some(user) => format!("jemput - waste pickups · {} ({})", user.username, user.role),
        None => "jemput - waste pickups".to_owned(),
    };
    let header =
        Paragraph::new(header_text).block(Block::default().borders(Borders::ALL).title("Jemput"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::Login => draw_login(frame, app, *content_area),
        Screen::Pickups => draw_pickups(frame, app, *content_area),
        Screen::PickupForm => draw_pickup_form(frame, app, *content_area),
        Screen::Wastes => draw_wastes(frame, app, *content_area),
        Screen::WasteForm => draw_waste_form(frame, app, *content_area),
        Screen::Locations => draw_locations(frame, app, *content_area),
        Screen::LocationForm => draw_location_form(frame, app, *content_area),
        Screen::Users => draw_users(frame, app, *content_area),
        Screen::UserForm => draw_user_form(frame, app, *content_area),
        Screen::Stats => draw_stats(frame, app, *content_area),
        Screen::Chat => draw_chat(frame, app, *content_area),
    }

    let nav_hint = match app.screen {
        Screen::Login => "Tab switch field · Enter login · Ctrl-R register · Esc quit",
        Screen::Pickups | Screen::Wastes | Screen::Locations | Screen::Users
            if app.can_manage_users() =>
        {
            "↑/↓ move · n new · Enter edit · d delete · r reload · p pickups · w wastes · o locations · u users · g stats · c chat · l logout · q quit"
        }
        Screen::Pickups | Screen::Wastes | Screen::Locations if app.can_manage_records() => {
            "↑/↓ move · n new · Enter edit · d delete · r reload · p pickups · w wastes · o locations · g stats · c chat · l logout · q quit"
        }
        Screen::PickupForm | Screen::WasteForm | Screen::UserForm => {
            "Tab/↑/↓ field · ←/→ change choice · Enter save · Esc cancel"
        }
        Screen::LocationForm => "Tab/↑/↓ field · Enter save · Esc cancel",
        Screen::Stats => "r reload · w wastes · c chat · Esc back · q quit",
        Screen::Chat => {
            "Enter send · ↑/↓ history · Ctrl-O open · Ctrl-N new · Ctrl-D delete · Tab model · Esc back"
        }
        Screen::Pickups | Screen::Wastes | Screen::Locations | Screen::Users => {
            "↑/↓ move · r reload · g stats · c chat · l logout · q quit"
        }
    };

    let status_text = if app.is_loading {
        format!("Working… · {nav_hint}")
    } else if let Some(msg) = app.error_message.as_ref().or(app.info_message.as_ref()) {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading || app.info_message.is_some() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let marker = if focused { "> " } else { "  " };
    let style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{marker}{label:<12}"), style),
        Span::raw(value.to_owned()),
    ])
}

fn draw_login(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let masked = "*".repeat(app.login_password.chars().count());
    let lines = vec![
        field_line(
            "Username",
            &app.login_username,
            app.login_field == LoginField::Username,
        ),
        field_line(
            "Password",
            &masked,
            app.login_field == LoginField::Password,
        ),
        Line::raw(""),
        Line::raw("New here? Fill in both fields and press Ctrl-R to register."),
    ];
    let form = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Login"))
        .wrap(Wrap { trim: false });
    frame.render_widget(form, area);
}

fn draw_pickups(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = "Pickups (Enter to edit)";
    if app.pickups.is_empty() {
        let paragraph = Paragraph::new("No pickups scheduled. Press n to add one.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = app.pickups.iter().map(|row| {
        let pickup = &row.pickup;
        Row::new(vec![
            Cell::from(pickup.scheduled_at.format(DATE_TIME_FORMAT).to_string()),
            Cell::from(row.waste_name.clone()),
            Cell::from(row.waste_location.clone()),
            Cell::from(row.assignee_name.clone()),
            Cell::from(pickup.status.to_string()),
            Cell::from(pickup.note.clone()),
        ])
        .style(Style::default().fg(pickup_status_color(&pickup.status)))
    });

    let column_widths = [
        Constraint::Length(17),
        Constraint::Length(18),
        Constraint::Length(18),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Time", "Waste", "Location", "Technician", "Status", "Note"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(1);

    let mut state = TableState::default();
    state.select(Some(app.pickup_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn pickup_status_color(status: &PickupStatus) -> Color {
    match status {
        PickupStatus::Pending => Color::Yellow,
        PickupStatus::Scheduled => Color::Cyan,
        PickupStatus::Done => Color::Green,
        PickupStatus::Other(_) => Color::Magenta,
    }
}

fn draw_pickup_form(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(form) = app.pickup_form.as_ref() else {
        return;
    };

    let waste_label = form
        .waste_index
        .and_then(|index| app.wastes.get(index))
        .map_or_else(
            || choose_hint(app.wastes.is_empty(), "waste records"),
            |waste| format!("{} · {} · {} kg", waste.name, waste.location, waste.weight_kg),
        );
    let technician_label = form
        .technician_index
        .and_then(|index| app.technicians.get(index))
        .map_or_else(
            || choose_hint(app.technicians.is_empty(), "technicians"),
            |user| user.username.clone(),
        );
    let focused = |field: PickupField| form.field == field;

    let lines = vec![
        field_line("Waste", &waste_label, focused(PickupField::Waste)),
        field_line(
            "Technician",
            &technician_label,
            focused(PickupField::Technician),
        ),
        field_line("Status", form.status.as_str(), focused(PickupField::Status)),
        field_line(
            "Time",
            &form.scheduled_at,
            focused(PickupField::ScheduledAt),
        ),
        field_line("Note", &form.note, focused(PickupField::Note)),
    ];

    let title = if form.id.is_some() {
        "Edit pickup"
    } else {
        "New pickup"
    };
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn choose_hint(empty: bool, what: &str) -> String {
    if empty {
        format!("<no {what}>")
    } else {
        "<choose with ←/→>".to_owned()
    }
}

fn draw_wastes(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [table_area, totals_area] = chunks else {
        return;
    };

    let rows = app.wastes.iter().map(|waste| {
        let mut style = Style::default().fg(kind_color(&waste.kind));
        if waste.status == WasteStatus::Collected {
            style = style.add_modifier(Modifier::CROSSED_OUT | Modifier::DIM);
        }
        Row::new(vec![
            Cell::from(waste.received_at.format(DATE_TIME_FORMAT).to_string()),
            Cell::from(waste.name.clone()),
            Cell::from(waste.kind.to_string()),
            Cell::from(format!("{:.1}", waste.weight_kg)),
            Cell::from(waste.location.clone()),
            Cell::from(waste.status.to_string()),
            Cell::from(waste.note.clone()),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Length(17),
        Constraint::Length(18),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(18),
        Constraint::Length(9),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec![
                "Received", "Name", "Kind", "Kg", "Location", "Status", "Note",
            ])
            .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Waste records"))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(1);

    let mut state = TableState::default();
    if !app.wastes.is_empty() {
        state.select(Some(app.waste_index));
    }
    frame.render_stateful_widget(table, *table_area, &mut state);

    let totals = totals_by_kind(&app.wastes)
        .into_iter()
        .map(|(kind, weight)| format!("{kind}: {weight:.1} kg"))
        .collect::<Vec<_>>();
    let totals_text = if totals.is_empty() {
        "No intake recorded yet.".to_owned()
    } else {
        totals.join(" · ")
    };
    let summary = Paragraph::new(totals_text)
        .block(Block::default().borders(Borders::ALL).title("Total by kind"));
    frame.render_widget(summary, *totals_area);
}

fn kind_color(kind: &WasteKind) -> Color {
    match kind {
        WasteKind::Organic => Color::Green,
        WasteKind::Inorganic => Color::Gray,
        WasteKind::Hazardous => Color::Red,
        WasteKind::Recyclable => Color::Blue,
        WasteKind::Other(_) => Color::Magenta,
    }
}

fn draw_waste_form(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(form) = app.waste_form.as_ref() else {
        return;
    };
    let focused = |field: WasteField| form.field == field;

    let mut lines = vec![
        field_line("Name", &form.name, focused(WasteField::Name)),
        field_line("Kind", form.kind.as_str(), focused(WasteField::Kind)),
        field_line("Weight (kg)", &form.weight, focused(WasteField::Weight)),
        field_line(
            "Location",
            if form.location.is_empty() {
                "<choose with ←/→>"
            } else {
                &form.location
            },
            focused(WasteField::Location),
        ),
        field_line("Note", &form.note, focused(WasteField::Note)),
    ];
    if form.kind == WasteKind::Hazardous {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "B3 waste must be handled by a licensed operator. Saving asks for confirmation.",
            Style::default().fg(Color::Red),
        ));
    }

    let title = if form.id.is_some() {
        "Edit waste intake"
    } else {
        "New waste intake"
    };
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_locations(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = "Custom locations (shown after the West Java cities)";
    if app.locations.is_empty() {
        let paragraph = Paragraph::new("No custom locations yet. Press n to add one.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = app.locations.iter().map(|location| {
        Row::new(vec![
            Cell::from(location.name.clone()),
            Cell::from(format!("{:.4}", location.latitude)),
            Cell::from(format!("{:.4}", location.longitude)),
            Cell::from(location.note.clone()),
        ])
    });
    let column_widths = [
        Constraint::Length(24),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Name", "Lat", "Lng", "Note"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(1);

    let mut state = TableState::default();
    state.select(Some(app.location_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_location_form(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(form) = app.location_form.as_ref() else {
        return;
    };
    let focused = |field: LocationField| form.field == field;

    let lines = vec![
        field_line("Name", &form.name, focused(LocationField::Name)),
        field_line("Latitude", &form.latitude, focused(LocationField::Latitude)),
        field_line("Longitude", &form.longitude, focused(LocationField::Longitude)),
        field_line("Note", &form.note, focused(LocationField::Note)),
        Line::raw(""),
        Line::raw("Decimal degrees, e.g. -6.9175 and 107.6191."),
    ];
    let title = if form.id.is_some() {
        "Edit location"
    } else {
        "New location"
    };
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_users(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let rows = app.users.iter().map(|user| {
        Row::new(vec![
            Cell::from(user.username.clone()),
            Cell::from(user.role.to_string()),
            Cell::from(user.id.to_string()),
        ])
    });
    let column_widths = [
        Constraint::Length(20),
        Constraint::Length(12),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Username", "Role", "Id"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Accounts"))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(1);

    let mut state = TableState::default();
    if !app.users.is_empty() {
        state.select(Some(app.user_index));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_user_form(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(form) = app.user_form.as_ref() else {
        return;
    };
    let focused = |field: UserField| form.field == field;
    let masked = "*".repeat(form.password.chars().count());
    let role = form.role.to_string();

    let mut lines = vec![
        field_line("Username", &form.username, focused(UserField::Username)),
        field_line("Password", &masked, focused(UserField::Password)),
        field_line("Role", &role, focused(UserField::Role)),
    ];
    if form.id.is_some() {
        lines.push(Line::raw(""));
        lines.push(Line::raw("Leave the password empty to keep the current one."));
    }
    let title = if form.id.is_some() {
        "Edit account"
    } else {
        "New account"
    };
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "weights are non-negative kilograms"
)]
fn bar_value(weight: f64) -> u64 {
    weight.max(0.0).round() as u64
}

fn draw_stats(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Min(0)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [chart_area, table_area] = chunks else {
        return;
    };

    let bars = totals_by_kind(&app.wastes)
        .into_iter()
        .map(|(kind, weight)| {
            Bar::default()
                .label(Line::from(kind.to_string()))
                .value(bar_value(weight))
                .text_value(format!("{weight:.1}"))
                .style(Style::default().fg(kind_color(&kind)))
        })
        .collect::<Vec<_>>();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("Total weight by kind (kg)"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(11)
        .bar_gap(2);
    frame.render_widget(chart, *chart_area);

    let rows = daily_totals(&app.wastes)
        .into_iter()
        .rev()
        .map(|((day, kind), weight)| {
            Row::new(vec![
                Cell::from(day.format("%Y-%m-%d").to_string()),
                Cell::from(kind.to_string()),
                Cell::from(format!("{weight:.1}")),
            ])
            .style(Style::default().fg(kind_color(&kind)))
        });
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(8),
        ],
    )
    .header(
        Row::new(vec!["Day", "Kind", "Kg"]).style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Daily intake"))
    .column_spacing(1);
    frame.render_widget(table, *table_area);
}

fn draw_chat(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(0)])
        .split(area);
    let [saved_area, chat_area] = columns.as_ref() else {
        return;
    };
    draw_saved_chats(frame, app, *saved_area);

    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(*chat_area);

    let chunks = layout_chunks.as_ref();
    let [history_area, input_area] = chunks else {
        return;
    };

    let title = app
        .conversation
        .as_ref()
        .map_or_else(|| DEFAULT_HISTORY_TITLE.to_owned(), Conversation::title);

    let items = app
        .conversation
        .iter()
        .flat_map(Conversation::visible)
        .map(|message| {
            let (prefix, color) = match message.role {
                ChatRole::User => ("You", Color::Cyan),
                ChatRole::Assistant | ChatRole::System => ("Assistant", Color::Green),
            };
            ListItem::new(Text::from(vec![
                Line::styled(format!("{prefix}:"), Style::default().fg(color)),
                Line::raw(message.content.clone()),
                Line::raw(""),
            ]))
        })
        .collect::<Vec<ListItem<'_>>>();

    let history = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{title} ({})", app.assistant.model())),
    );
    frame.render_widget(history, *history_area);

    let input = Paragraph::new(app.chat_input.as_str())
        .block(Block::default().borders(Borders::ALL).title("Ask about waste"))
        .wrap(Wrap { trim: true });
    frame.render_widget(input, *input_area);
}

fn draw_saved_chats(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = app
        .histories
        .iter()
        .map(|history| {
            let style = if app.current_history.as_ref() == Some(&history.id) {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Text::from(vec![
                Line::styled(history.title.clone(), style),
                Line::styled(
                    history.last_modified.format(DATE_TIME_FORMAT).to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Saved chats"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if !app.histories.is_empty() {
        state.select(Some(app.history_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
