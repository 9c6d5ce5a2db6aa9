use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use havirkesht_core::listing::{PageLink, PagedCollection};
use havirkesht_core::utils::format_cell;
use havirkesht_core::ResourceKind;

use crate::app::{App, AppState};
use crate::ui::styles;

/// Width of the row number column
const ROW_NUMBER_WIDTH: u16 = 5;

pub fn render(frame: &mut Frame, app: &App, kind: ResourceKind, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Search and filter
            Constraint::Min(3),    // Table
            Constraint::Length(1), // Pager
        ])
        .split(area);

    render_criteria(frame, app, kind, chunks[0]);
    render_table(frame, app, kind, chunks[1]);
    render_pager(frame, app.console.state().list(kind).collection(), chunks[2]);
}

fn render_criteria(frame: &mut Frame, app: &App, kind: ResourceKind, area: Rect) {
    let searching = app.state == AppState::Searching;
    let view = app.console.state().list(kind);

    let search_text = if searching {
        format!("{}▌", app.search_input)
    } else if view.criteria().search.is_empty() {
        "[/] search".to_string()
    } else {
        view.criteria().search.clone()
    };

    let mut spans = vec![
        Span::styled(" Search: ", styles::muted_style()),
        Span::styled(
            search_text,
            if searching { styles::input_style() } else { styles::text_style() },
        ),
    ];

    if let Some(parent) = kind.parent() {
        let label = app.filter_label(kind).unwrap_or_else(|| "all".to_string());
        spans.push(Span::styled(
            format!("   {}: ", parent.spec().singular),
            styles::muted_style(),
        ));
        spans.push(Span::styled(label, styles::accent_style()));
        spans.push(Span::styled(" [f]", styles::muted_style()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(frame: &mut Frame, app: &App, kind: ResourceKind, area: Rect) {
    let view = app.console.state().list(kind);
    let collection = view.collection();
    let columns = kind.spec().columns;
    let selection = app.selection(kind);

    let mut title = format!(" {} ({}) ", kind.title(), collection.total);
    if view.is_loading() {
        title.push_str("loading... ");
    }

    let block = Block::default()
        .title(title)
        .title_style(styles::kind_style(kind))
        .borders(Borders::ALL)
        .border_style(styles::frame_style(true));

    if let Some(error) = view.error() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    if collection.is_empty() {
        let text = if view.is_loading() {
            String::new()
        } else {
            format!(" No {} found", kind.spec().plural)
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(text, styles::muted_style())))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header_cells = std::iter::once(Cell::from("#"))
        .chain(columns.iter().map(|column| Cell::from(column.title)));
    let header = Row::new(header_cells)
        .style(styles::heading_style())
        .height(1);

    let rows: Vec<Row> = collection
        .items
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let style = if i == selection {
                styles::selected_style()
            } else {
                styles::text_style()
            };

            let cells = std::iter::once(Cell::from(format!("{:>3}", collection.row_number(i))))
                .chain(columns.iter().map(|column| Cell::from(format_cell(record, column))));
            Row::new(cells).style(style)
        })
        .collect();

    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(ROW_NUMBER_WIDTH))
        .chain(columns.iter().map(|column| Constraint::Fill(column.width)))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_pager(frame: &mut Frame, collection: &PagedCollection, area: Rect) {
    let links = collection.page_window();
    if links.is_empty() {
        return;
    }

    let arrow_style = |enabled: bool| {
        if enabled { styles::key_style() } else { styles::muted_style() }
    };

    let mut spans = vec![Span::styled(" [ ‹ ", arrow_style(collection.has_previous()))];
    for link in links {
        match link {
            PageLink::Page { number, current: true } => {
                spans.push(Span::styled(format!(" {} ", number), styles::page_style(true)));
            }
            PageLink::Page { number, current: false } => {
                spans.push(Span::styled(format!(" {} ", number), styles::page_style(false)));
            }
            PageLink::Gap => spans.push(Span::styled(" … ", styles::muted_style())),
        }
    }
    spans.push(Span::styled(" › ] ", arrow_style(collection.has_next())));
    spans.push(Span::styled(
        format!("  page {} of {}", collection.page(), collection.total_pages()),
        styles::muted_style(),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
