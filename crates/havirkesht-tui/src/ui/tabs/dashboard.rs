use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use havirkesht_core::api::ApiStatus;
use havirkesht_core::utils::format_count;
use havirkesht_core::ResourceKind;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(4)])
        .split(area);

    render_counts(frame, app, chunks[0]);
    render_connection(frame, app, chunks[1]);
}

fn render_counts(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (kind, card) in ResourceKind::ALL.into_iter().zip(cards.iter()) {
        let count = format_count(app.console.state().count(kind));
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(format!("  {}", count), styles::count_style(kind))),
        ];

        let block = Block::default()
            .title(format!(" {} ", kind.title()))
            .title_style(styles::kind_style(kind))
            .borders(Borders::ALL)
            .border_style(styles::frame_style(false));

        frame.render_widget(Paragraph::new(lines).block(block), *card);
    }
}

fn render_connection(frame: &mut Frame, app: &App, area: Rect) {
    let api = app.console.api();
    let username = app.console.username().unwrap_or_else(|| "-".to_string());

    let status_label = app
        .api_status
        .as_ref()
        .map(ApiStatus::label)
        .unwrap_or_else(|| "Checking...".to_string());
    let status = Span::styled(status_label, styles::status_style(app.api_status.as_ref()));

    let session = api.session();
    let minutes_left = session
        .current_token()
        .and_then(|credential| credential.minutes_until_expiry(session.now()));
    let expiry = minutes_left
        .map(|minutes| format!("{} min", minutes))
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(vec![
            Span::styled("  Signed in as  ", styles::muted_style()),
            Span::styled(username, styles::text_style()),
        ]),
        Line::from(vec![
            Span::styled("  API           ", styles::muted_style()),
            Span::styled(api.base_url().to_string(), styles::text_style()),
        ]),
        Line::from(vec![Span::styled("  Status        ", styles::muted_style()), status]),
        Line::from(vec![
            Span::styled("  Token expires ", styles::muted_style()),
            Span::styled(expiry, styles::expiry_style(minutes_left)),
        ]),
    ];

    let block = Block::default()
        .title(" Connection ")
        .title_style(styles::heading_style())
        .borders(Borders::ALL)
        .border_style(styles::frame_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
