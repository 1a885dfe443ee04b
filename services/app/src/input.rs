//! Line commands of the terminal front-end.
//!
//! Outside a debate each screen reads short keys. Inside a debate every line
//! is a message unless it starts with `/`.

use resonance_core::{
    category::{CATEGORIES, CategoryId},
    controller::{Event, Phase, Screen},
};

#[derive(Debug, Clone)]
pub enum Action {
    Event(Event),
    Quit,
    Unknown(String),
}

fn category_choice(line: &str) -> Option<CategoryId> {
    if let Ok(index) = line.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| CATEGORIES.get(i))
            .map(|c| c.id);
    }
    line.parse::<CategoryId>().ok()
}

fn chat_command(line: &str) -> Action {
    match line.trim() {
        "/close" => Action::Event(Event::CloseChat),
        "/back" => Action::Event(Event::Back),
        "/copy" => Action::Event(Event::Copy),
        "/new" => Action::Event(Event::Generate),
        "/quit" => Action::Quit,
        other if other.starts_with('/') => Action::Unknown(other.to_string()),
        _ => Action::Event(Event::SendChat(line.to_string())),
    }
}

/// Maps one input line to an action for the current screen.
pub fn parse(screen: &Screen, line: &str) -> Action {
    let key = line.trim();
    match screen {
        Screen::Welcome => match key {
            "q" => Action::Quit,
            _ => Action::Event(Event::Acknowledge),
        },
        Screen::Home => match key {
            "q" => Action::Quit,
            _ => category_choice(key)
                .map(|id| Action::Event(Event::SelectCategory(id)))
                .unwrap_or_else(|| Action::Unknown(key.to_string())),
        },
        Screen::Category {
            phase: Phase::Chat(_),
            ..
        } => chat_command(line),
        Screen::Category { .. } => match key {
            "" | "g" => Action::Event(Event::Generate),
            "d" => Action::Event(Event::OpenChat),
            "c" => Action::Event(Event::Copy),
            "b" => Action::Event(Event::Back),
            "q" => Action::Quit,
            other => Action::Unknown(other.to_string()),
        },
    }
}
