//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use havirkesht_core::Section;

use crate::app::{
    can_add_password_char, can_add_username_char, App, AppState, FormKind, LoginFocus,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::EditingForm => return handle_form_input(app, key).await,
        AppState::Searching => return handle_search_input(app, key),
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.confirm_delete().await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            app.select_section(Section::ALL[index]);
        }
        KeyCode::Tab => app.select_section(app.section().next()),
        KeyCode::BackTab => app.select_section(app.section().prev()),
        KeyCode::Char('r') => app.refresh().await,
        KeyCode::Char('p') => app.open_form(FormKind::ChangePassword),
        KeyCode::Char('L') => app.logout().await,
        KeyCode::Esc => app.status_message = None,
        _ => handle_list_input(app, key),
    }

    Ok(false)
}

/// Keys that only mean something on a resource list.
fn handle_list_input(app: &mut App, key: KeyEvent) {
    let Some(kind) = app.current_kind() else {
        return;
    };

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Home => app.move_selection(isize::MIN / 2),
        KeyCode::End => app.move_selection(isize::MAX / 2),
        KeyCode::Left | KeyCode::Char('[') => app.prev_page(),
        KeyCode::Right | KeyCode::Char(']') => app.next_page(),
        KeyCode::Char('/') => {
            app.search_input = app.console.state().list(kind).criteria().search.clone();
            app.state = AppState::Searching;
        }
        KeyCode::Char('f') => app.cycle_filter(),
        KeyCode::Char('a') => app.open_form(FormKind::for_resource(kind)),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_input.clear();
            app.search_now();
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            app.search_now();
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            app.search_changed();
        }
        KeyCode::Char(c) if !c.is_control() => {
            app.search_input.push(c);
            app.search_changed();
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => app.login_focus = app.login_focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.login_focus = app.login_focus.prev(),
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.attempt_login().await,
            LoginFocus::Remember => app.login_remember = !app.login_remember,
        },
        KeyCode::Char(' ') if app.login_focus == LoginFocus::Remember => {
            app.login_remember = !app.login_remember;
        }
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Remember | LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Remember | LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

async fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Esc {
        app.close_form();
        return Ok(false);
    }
    if key.code == KeyCode::Enter {
        app.submit_form().await;
        return Ok(false);
    }

    let Some(form) = app.form.as_mut() else {
        app.state = AppState::Normal;
        return Ok(false);
    };

    match key.code {
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Left => {
            if let Some(field) = form.focused_mut() {
                field.cycle(false);
            }
        }
        KeyCode::Right => {
            if let Some(field) = form.focused_mut() {
                field.cycle(true);
            }
        }
        KeyCode::Char(' ') if form.focused().is_some_and(|f| !f.is_editable_text()) => {
            if let Some(field) = form.focused_mut() {
                field.cycle(true);
            }
        }
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
    Ok(false)
}
