//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use shepherd_core::models::{ChurchEventSortColumn, DevotionSortColumn};
use shepherd_core::routes::Route;

use crate::app::{
    can_add_email_char, can_add_password_char, App, AppState, DevotionField, EventField,
    LoginFocus,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
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
        AppState::ConfirmingDelete(target) => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(target),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    match app.route {
        Route::Login => handle_login_input(app, key).await,
        Route::DevotionEdit(_) | Route::ChurchEventCreate | Route::ChurchEventEdit(_) => {
            handle_form_input(app, key).await;
            Ok(false)
        }
        _ => Ok(handle_screen_input(app, key)),
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Tab | KeyCode::Down => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                app.status_message = Some("Signing in...".to_string());
                app.attempt_login().await;
                if app.route == Route::Login {
                    app.status_message = None;
                }
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.search_query.clear();
            app.search_changed();
            app.state = AppState::Normal;
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.search_changed();
        }
        KeyCode::Char(c) if !c.is_control() => {
            app.search_query.push(c);
            app.search_changed();
        }
        _ => {}
    }
}

async fn handle_form_input(app: &mut App, key: KeyEvent) {
    let on_devotion_form = matches!(app.route, Route::DevotionEdit(_));
    match key.code {
        KeyCode::Esc => app.go_back(),
        KeyCode::Tab | KeyCode::Down => app.form_next_field(),
        KeyCode::BackTab | KeyCode::Up => app.form_prev_field(),
        KeyCode::Enter => {
            if on_devotion_form {
                if app.devotion_field == DevotionField::Save {
                    app.submit_devotion_form();
                } else {
                    app.form_next_field();
                }
            } else {
                match app.event_field {
                    EventField::Image => app.attach_image().await,
                    EventField::Save => app.submit_event_form(),
                    _ => app.form_next_field(),
                }
            }
        }
        KeyCode::Backspace => app.form_backspace(),
        KeyCode::Char(' ') => {
            if !app.form_toggle() {
                app.form_insert_char(' ');
            }
        }
        KeyCode::Char(c) => app.form_insert_char(c),
        _ => {}
    }
}

/// Keys for the list and menu screens. Returns true to quit.
fn handle_screen_input(app: &mut App, key: KeyEvent) -> bool {
    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return false;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return false;
        }
        KeyCode::Char(c @ '1'..='4') => {
            let index = (c as usize) - ('1' as usize);
            app.navigate(Route::menu()[index]);
            return false;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.select_prev();
            return false;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.select_next();
            return false;
        }
        KeyCode::Esc => {
            if app.route == Route::Home {
                app.state = AppState::ConfirmingQuit;
            } else {
                app.go_back();
            }
            return false;
        }
        _ => {}
    }

    match app.route {
        Route::Home => match key.code {
            KeyCode::Enter => {
                let target = Route::menu()[app.home_selection.min(Route::menu().len() - 1)];
                app.navigate(target);
            }
            KeyCode::Char('o') if app.session.is_authenticated() => app.sign_out(),
            _ => {}
        },
        Route::Devotions => match key.code {
            KeyCode::Char('/') => app.state = AppState::Searching,
            KeyCode::Char('r') => app.navigate(Route::Devotions),
            KeyCode::Left | KeyCode::Char('[') => app.prev_devotion_page(),
            KeyCode::Right | KeyCode::Char(']') => app.next_devotion_page(),
            KeyCode::Char('d') => app.toggle_devotion_sort(DevotionSortColumn::Date),
            KeyCode::Char('t') => app.toggle_devotion_sort(DevotionSortColumn::Title),
            KeyCode::Char('b') => app.toggle_devotion_sort(DevotionSortColumn::Book),
            KeyCode::Char('v') => app.toggle_devotion_sort(DevotionSortColumn::Views),
            KeyCode::Char('s') => app.toggle_devotion_sort(DevotionSortColumn::Status),
            KeyCode::Char('x') | KeyCode::Delete => app.request_delete(),
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(id) = app.selected_devotion().map(|d| d.id) {
                    app.navigate(Route::DevotionEdit(id));
                }
            }
            _ => {}
        },
        Route::ChurchEvents => match key.code {
            KeyCode::Char('/') => app.state = AppState::Searching,
            KeyCode::Char('r') => app.navigate(Route::ChurchEvents),
            KeyCode::Char('t') => app.toggle_event_sort(ChurchEventSortColumn::Title),
            KeyCode::Char('d') => app.toggle_event_sort(ChurchEventSortColumn::EventDate),
            KeyCode::Char('s') => app.toggle_event_sort(ChurchEventSortColumn::Status),
            KeyCode::Char('c') => app.toggle_event_sort(ChurchEventSortColumn::CheckIn),
            KeyCode::Char('n') => app.navigate(Route::ChurchEventCreate),
            KeyCode::Char('x') | KeyCode::Delete => app.request_delete(),
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(id) = app.selected_event().map(|e| e.id) {
                    app.navigate(Route::ChurchEventEdit(id));
                }
            }
            _ => {}
        },
        Route::Leaderboard => {
            if key.code == KeyCode::Char('r') {
                app.navigate(Route::Leaderboard);
            }
        }
        _ => {}
    }
    false
}
