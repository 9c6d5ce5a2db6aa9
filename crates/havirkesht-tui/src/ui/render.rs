use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use havirkesht_core::utils::truncate_string;
use havirkesht_core::Section;

use crate::app::{App, AppState, FieldKind, LoginFocus};

use super::styles;
use super::tabs::{dashboard, listing};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::EditingForm => render_form_overlay(frame, app),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Havirkesht Admin";
    let user_hint = match app.console.username() {
        Some(name) => format!("{}  [?] Help", name),
        None => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::heading_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + user_hint.chars().count() + 4),
        )),
        Span::styled(user_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let current = app.section();

    let mut spans = vec![Span::raw(" ")];
    for (i, section) in Section::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, section.title());
        spans.push(Span::styled(label, styles::tab_style(*section == current)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_kind() {
        Some(kind) => listing::render(frame, app, kind, area),
        None => dashboard::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.section() {
        Section::Dashboard => "[r]efresh | [p]assword | [L]ogout | [q]uit",
        _ => "[a]dd | [d]elete | [/] search | [r]efresh | [q]uit",
    };

    let left_text = match &app.status_message {
        Some(msg) => format!(" {} ", msg),
        None => String::new(),
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::accent_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::key_style()),
        Span::styled(desc, styles::text_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Havirkesht Admin", styles::heading_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::accent_style())),
        help_line("1-5", "Switch tabs"),
        help_line("Tab", "Next tab"),
        help_line("↑/↓", "Move selection"),
        help_line("←/→ [ ]", "Previous/next page"),
        Line::from(""),
        Line::from(Span::styled(" Lists", styles::accent_style())),
        help_line("/", "Search"),
        help_line("f", "Cycle province/city filter"),
        help_line("a", "Add"),
        help_line("d", "Delete selected row"),
        help_line("r", "Refresh"),
        Line::from(""),
        Line::from(Span::styled(" Account", styles::accent_style())),
        help_line("p", "Change password"),
        help_line("L", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::frame_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn field_style(focused: bool) -> Style {
    if focused {
        styles::selected_style()
    } else {
        styles::text_style()
    }
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 13 } else { 11 };
    let area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("        Havirkesht Admin", styles::heading_style())),
        Line::from(""),
    ];

    let username_focused = app.login_focus == LoginFocus::Username;
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("    "),
        Span::styled("Username: [", styles::muted_style()),
        Span::styled(
            format!("{:<20}{}", app.login_username, cursor),
            field_style(username_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    let password_focused = app.login_focus == LoginFocus::Password;
    let cursor = if password_focused { "▌" } else { "" };
    let masked = "*".repeat(app.login_password.chars().count().min(20));
    lines.push(Line::from(vec![
        Span::raw("    "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(format!("{:<20}{}", masked, cursor), field_style(password_focused)),
        Span::styled("]", styles::muted_style()),
    ]));

    let remember_focused = app.login_focus == LoginFocus::Remember;
    let check = if app.login_remember { "[x]" } else { "[ ]" };
    lines.push(Line::from(vec![
        Span::raw("    "),
        Span::styled(format!("{} Remember me", check), field_style(remember_focused)),
    ]));

    let button_focused = app.login_focus == LoginFocus::Button;
    let button = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(button, field_style(button_focused)),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::frame_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_form_overlay(frame: &mut Frame, app: &App) {
    let Some(form) = app.form.as_ref() else {
        return;
    };

    let extra = if form.error.is_some() { 2 } else { 0 };
    let height = form.fields.len() as u16 + 6 + extra;
    let area = centered_rect_fixed(58, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let cursor = if focused && field.is_editable_text() { "▌" } else { "" };
        let hint = match field.kind {
            FieldKind::Choice(..) | FieldKind::Toggle(_) if focused => "  ←/→",
            _ => "",
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:>10}: ", field.label), styles::muted_style()),
            Span::styled(format!("{}{}", field.display(), cursor), field_style(focused)),
            Span::styled(hint, styles::muted_style()),
        ]));
    }

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [Enter]", styles::key_style()),
        Span::styled(" save  ", styles::muted_style()),
        Span::styled("[Tab]", styles::key_style()),
        Span::styled(" next field  ", styles::muted_style()),
        Span::styled("[Esc]", styles::key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(format!(" {} ", form.kind.title()))
        .title_style(styles::heading_style())
        .borders(Borders::ALL)
        .border_style(styles::frame_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let Some(intent) = app.console.state().delete_intent() else {
        return;
    };

    let area = centered_rect_fixed(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("   Delete {} \"{}\"?", intent.kind, truncate_string(&intent.label, 28)),
            styles::accent_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style())
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::accent_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::frame_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
