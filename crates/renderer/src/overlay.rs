use std::f32::consts::FRAC_PI_2;

use sceneconfig::QUERY_PLACEHOLDER;
use url::form_urlencoded;

/// Which keyboard model the search box follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// A focused multi-line text field: Shift+Enter inserts a newline.
    #[default]
    Field,
    /// A window-wide key listener: single-character keys only, Enter always
    /// submits.
    Window,
}

/// Window-system independent view of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput<'a> {
    Enter,
    Backspace,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Escape,
    Text(&'a str),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayAction {
    None,
    Edited,
    Rotate(f32),
    Submit(String),
    NextShader,
    PreviousShader,
    Close,
}

#[derive(Debug, Clone)]
pub struct SearchOverlay {
    query: String,
    mode: InputMode,
    url_template: String,
    placeholder: String,
}

impl SearchOverlay {
    pub fn new(
        mode: InputMode,
        url_template: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            query: String::new(),
            mode,
            url_template: url_template.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn handle_key(&mut self, key: KeyInput<'_>, shift: bool) -> OverlayAction {
        match key {
            KeyInput::ArrowLeft => OverlayAction::Rotate(-FRAC_PI_2),
            KeyInput::ArrowRight => OverlayAction::Rotate(FRAC_PI_2),
            KeyInput::ArrowUp => OverlayAction::NextShader,
            KeyInput::ArrowDown => OverlayAction::PreviousShader,
            KeyInput::Escape => OverlayAction::Close,
            KeyInput::Backspace => {
                if self.query.pop().is_some() {
                    OverlayAction::Edited
                } else {
                    OverlayAction::None
                }
            }
            KeyInput::Enter => match self.mode {
                InputMode::Field if shift => {
                    self.query.push('\n');
                    OverlayAction::Edited
                }
                _ => OverlayAction::Submit(self.submit()),
            },
            KeyInput::Text(text) => self.insert_text(text),
            KeyInput::Other => OverlayAction::None,
        }
    }

    fn insert_text(&mut self, text: &str) -> OverlayAction {
        let accepted = match self.mode {
            InputMode::Field => {
                let before = self.query.len();
                self.query
                    .extend(text.chars().filter(|ch| !ch.is_control()));
                self.query.len() != before
            }
            InputMode::Window => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) if !ch.is_control() => {
                        self.query.push(ch);
                        true
                    }
                    _ => false,
                }
            }
        };
        if accepted {
            OverlayAction::Edited
        } else {
            OverlayAction::None
        }
    }

    /// Builds the search URL from the current query and clears it.
    pub fn submit(&mut self) -> String {
        let url = build_search_url(&self.url_template, &self.query);
        self.query.clear();
        url
    }

    /// Single-line rendition of the search box for the window title.
    pub fn title(&self, shader: Option<&str>) -> String {
        let text = if self.query.is_empty() {
            self.placeholder.clone()
        } else {
            self.query.replace('\n', " ")
        };
        match shader {
            Some(name) => format!("{text} | {name}"),
            None => text,
        }
    }
}

/// Substitutes the encoded query into `template` at `{query}`. Every
/// whitespace character (newlines included) becomes `+`; everything else is
/// form-urlencoded.
pub fn build_search_url(template: &str, query: &str) -> String {
    template.replace(QUERY_PLACEHOLDER, &encode_query(query))
}

fn encode_query(query: &str) -> String {
    let spaced: String = query
        .chars()
        .map(|ch| if ch.is_whitespace() { ' ' } else { ch })
        .collect();
    form_urlencoded::byte_serialize(spaced.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOGLE: &str = "https://www.google.com/search?q={query}";

    fn field() -> SearchOverlay {
        SearchOverlay::new(InputMode::Field, GOOGLE, "Search...")
    }

    fn window() -> SearchOverlay {
        SearchOverlay::new(InputMode::Window, GOOGLE, "Search...")
    }

    fn type_text(overlay: &mut SearchOverlay, text: &str) {
        for ch in text.chars() {
            let mut buf = [0u8; 4];
            overlay.handle_key(KeyInput::Text(ch.encode_utf8(&mut buf)), false);
        }
    }

    #[test]
    fn enter_submits_with_plus_for_whitespace() {
        let mut overlay = field();
        type_text(&mut overlay, "rust  shaders");
        overlay.handle_key(KeyInput::Enter, true);
        type_text(&mut overlay, "now ok");
        let action = overlay.handle_key(KeyInput::Enter, false);
        assert_eq!(
            action,
            OverlayAction::Submit("https://www.google.com/search?q=rust++shaders+now+ok".into())
        );
        assert_eq!(overlay.query(), "");
    }

    #[test]
    fn shift_enter_in_field_inserts_newline() {
        let mut overlay = field();
        type_text(&mut overlay, "a");
        assert_eq!(overlay.handle_key(KeyInput::Enter, true), OverlayAction::Edited);
        assert_eq!(overlay.query(), "a\n");
    }

    #[test]
    fn window_mode_submits_even_with_shift() {
        let mut overlay = window();
        type_text(&mut overlay, "hi there");
        assert_eq!(
            overlay.handle_key(KeyInput::Enter, true),
            OverlayAction::Submit("https://www.google.com/search?q=hi+there".into())
        );
    }

    #[test]
    fn window_mode_ignores_multi_character_keys() {
        let mut overlay = window();
        assert_eq!(overlay.handle_key(KeyInput::Text("Tab"), false), OverlayAction::None);
        assert_eq!(overlay.handle_key(KeyInput::Text("x"), false), OverlayAction::Edited);
        assert_eq!(overlay.handle_key(KeyInput::Other, false), OverlayAction::None);
        assert_eq!(overlay.query(), "x");
    }

    #[test]
    fn backspace_removes_last_character() {
        let mut overlay = field();
        type_text(&mut overlay, "héllo");
        overlay.handle_key(KeyInput::Backspace, false);
        assert_eq!(overlay.query(), "héll");
        let mut empty = field();
        assert_eq!(empty.handle_key(KeyInput::Backspace, false), OverlayAction::None);
    }

    #[test]
    fn arrows_rotate_by_quarter_turns() {
        let mut overlay = field();
        assert_eq!(
            overlay.handle_key(KeyInput::ArrowLeft, false),
            OverlayAction::Rotate(-FRAC_PI_2)
        );
        assert_eq!(
            overlay.handle_key(KeyInput::ArrowRight, true),
            OverlayAction::Rotate(FRAC_PI_2)
        );
        assert_eq!(overlay.query(), "");
    }

    #[test]
    fn empty_query_still_submits() {
        let mut overlay = field();
        assert_eq!(
            overlay.handle_key(KeyInput::Enter, false),
            OverlayAction::Submit("https://www.google.com/search?q=".into())
        );
    }

    #[test]
    fn reserved_characters_are_percent_encoded() {
        assert_eq!(
            build_search_url(GOOGLE, "a&b=c?\u{e9}"),
            "https://www.google.com/search?q=a%26b%3Dc%3F%C3%A9"
        );
        assert_eq!(build_search_url(GOOGLE, "line\nbreak"), "https://www.google.com/search?q=line+break");
        assert_eq!(build_search_url("q={query}", "a\tb\r\nc"), "q=a+b++c");
    }

    #[test]
    fn default_template_uses_shared_placeholder() {
        let template = crate::types::SearchParams::default().url_template;
        assert!(template.contains(QUERY_PLACEHOLDER));
        assert_eq!(build_search_url(&template, "cube"), "https://www.google.com/search?q=cube");
    }

    #[test]
    fn title_shows_placeholder_when_empty() {
        let mut overlay = field();
        assert_eq!(overlay.title(None), "Search...");
        type_text(&mut overlay, "cube");
        overlay.handle_key(KeyInput::Enter, true);
        type_text(&mut overlay, "s");
        assert_eq!(overlay.title(Some("Seascape")), "cube s | Seascape");
    }

    #[test]
    fn navigation_keys_map_to_actions() {
        let mut overlay = field();
        assert_eq!(overlay.handle_key(KeyInput::ArrowUp, false), OverlayAction::NextShader);
        assert_eq!(overlay.handle_key(KeyInput::ArrowDown, false), OverlayAction::PreviousShader);
        assert_eq!(overlay.handle_key(KeyInput::Escape, false), OverlayAction::Close);
    }
}
