use crate::config::ReadeckConfig;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::{CursorMove, TextArea};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsField {
    ApiUrl,
    ApiToken,
}

impl SettingsField {
    pub fn label(&self) -> &'static str {
        match self {
            SettingsField::ApiUrl => "API URL",
            SettingsField::ApiToken => "API Token",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SettingsField::ApiUrl => "The base URL of your Readeck instance",
            SettingsField::ApiToken => "Your Readeck API token",
        }
    }

    fn other(self) -> Self {
        match self {
            SettingsField::ApiUrl => SettingsField::ApiToken,
            SettingsField::ApiToken => SettingsField::ApiUrl,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum FormAction {
    Continue,
    Save,
    Cancel,
}

/// Editing state for the two Readeck connection settings.
pub struct SettingsForm<'a> {
    pub api_url: TextArea<'a>,
    pub api_token: TextArea<'a>,
    pub focus: SettingsField,
    pub reveal_token: bool,
}

impl<'a> SettingsForm<'a> {
    pub fn new(config: &ReadeckConfig) -> Self {
        let mut api_url = single_line(&config.api_url, "Enter your API URL");
        let mut api_token = single_line(&config.api_token, "Enter your API token");
        api_token.set_mask_char('\u{2022}');
        api_url.move_cursor(CursorMove::End);
        api_token.move_cursor(CursorMove::End);
        Self {
            api_url,
            api_token,
            focus: SettingsField::ApiUrl,
            reveal_token: false,
        }
    }

    pub fn field_mut(&mut self, field: SettingsField) -> &mut TextArea<'a> {
        match field {
            SettingsField::ApiUrl => &mut self.api_url,
            SettingsField::ApiToken => &mut self.api_token,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter => return FormAction::Save,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = self.focus.other();
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.reveal_token = !self.reveal_token;
                if self.reveal_token {
                    self.api_token.clear_mask_char();
                } else {
                    self.api_token.set_mask_char('\u{2022}');
                }
            }
            _ => {
                let focus = self.focus;
                self.field_mut(focus).input(key);
            }
        }
        FormAction::Continue
    }

    pub fn value(&self, field: SettingsField) -> String {
        let area = match field {
            SettingsField::ApiUrl => &self.api_url,
            SettingsField::ApiToken => &self.api_token,
        };
        area.lines().concat().trim().to_string()
    }

    /// Writes the edited values into `config`. Returns whether anything changed.
    pub fn apply(&self, config: &mut ReadeckConfig) -> bool {
        let api_url = self.value(SettingsField::ApiUrl);
        let api_token = self.value(SettingsField::ApiToken);
        let changed = api_url != config.api_url || api_token != config.api_token;
        config.api_url = api_url;
        config.api_token = api_token;
        changed
    }
}

fn single_line<'a>(value: &str, placeholder: &str) -> TextArea<'a> {
    let mut area = TextArea::new(vec![value.to_string()]);
    area.set_placeholder_text(placeholder.to_string());
    area
}
