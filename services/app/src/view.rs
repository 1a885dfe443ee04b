//! Terminal rendering of the controller state.

use colored::Colorize;
use resonance_core::{
    category::{CATEGORIES, Category, CategoryId},
    controller::{ChatState, ChatStatus, Phase, Screen},
    format::{LineKind, strip_markup, topic_lines},
    message::{ChatMessage, MessageRole},
    topic::Topic,
};
use std::fmt::Write;

const RULE: &str = "────────────────────────────────────────";

/// Renders a full frame for the current screen.
///
/// `transcript` is only read while a debate is open.
pub fn render(screen: &Screen, transcript: &[ChatMessage], notices: &[String]) -> String {
    let mut out = String::new();
    match screen {
        Screen::Welcome => welcome(&mut out),
        Screen::Home => home(&mut out),
        Screen::Category { category, phase } => {
            let category = category.config();
            let _ = writeln!(out, "{}", category.label.bold().cyan());
            let _ = writeln!(out, "{}", category.description.dimmed());
            let _ = writeln!(out, "{}", RULE.dimmed());
            match phase {
                Phase::Idle => {
                    let _ = writeln!(out, "{}", category.invitation());
                    hints(&mut out, &[("Entrée", category.call_to_action()), ("b", "Retour")]);
                }
                Phase::Loading { .. } => {
                    let _ = writeln!(out, "{}", category.loading_hint().italic());
                }
                Phase::Result(topic) => result(&mut out, category, topic),
                Phase::Error(error) => {
                    let _ = writeln!(out, "{}", error.message().red());
                    hints(&mut out, &[("g", "Réessayer"), ("b", "Retour")]);
                }
                Phase::Chat(chat) => debate(&mut out, chat, transcript),
            }
        }
    }
    for notice in notices {
        let _ = writeln!(out, "{}", notice.green());
    }
    out
}

fn hints(out: &mut String, keys: &[(&str, &str)]) {
    let line: Vec<String> = keys
        .iter()
        .map(|(key, label)| format!("[{}] {}", key, label))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").dimmed());
}

fn welcome(out: &mut String) {
    let _ = writeln!(out, "{}", "Résonance".bold().magenta());
    let _ = writeln!(out, "Élevez vos conversations.");
    hints(out, &[("Entrée", "Commencer l'expérience"), ("q", "Quitter")]);
}

fn home(out: &mut String) {
    let _ = writeln!(out, "{}", "Choisissez un thème".bold());
    for (index, category) in CATEGORIES.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {}  {}",
            index + 1,
            category.label.bold(),
            category.description.dimmed()
        );
    }
    hints(out, &[("1-5", "Choisir"), ("q", "Quitter")]);
}

fn topic_body(out: &mut String, topic: &Topic) {
    for line in topic_lines(&topic.content) {
        match line.kind {
            LineKind::Heading => {
                let _ = writeln!(out, "{}", line.text.bold());
            }
            LineKind::Body => {
                let _ = writeln!(out, "{}", line.text);
            }
        }
    }
}

fn result(out: &mut String, category: &Category, topic: &Topic) {
    topic_body(out, topic);
    if !topic.sources.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "SOURCES VÉRIFIÉES".dimmed());
        for source in &topic.sources {
            let _ = writeln!(out, "  - {} {}", source.label(), source.uri.underline().dimmed());
        }
    }
    let regenerate = match category.id {
        CategoryId::Random => category.call_to_action(),
        _ => "Nouveau sujet",
    };
    hints(
        out,
        &[
            ("d", "Débattre avec l'IA"),
            ("c", "Copier"),
            ("g", regenerate),
            ("b", "Retour"),
        ],
    );
}

fn debate(out: &mut String, chat: &ChatState, transcript: &[ChatMessage]) {
    if let Some(first) = topic_lines(&chat.topic.content).first() {
        let _ = writeln!(out, "{} {}", "Débat :".dimmed(), first.text.italic());
    }
    for message in transcript {
        let speaker = match message.role {
            MessageRole::User => "Vous".bold().blue(),
            MessageRole::Assistant => "Résonance".bold().magenta(),
        };
        let _ = writeln!(out, "{}  {}", speaker, strip_markup(&message.text));
    }
    match &chat.status {
        ChatStatus::Opening | ChatStatus::Awaiting => {
            let _ = writeln!(out, "{}", "Résonance réfléchit...".italic().dimmed());
        }
        ChatStatus::Failed(error) => {
            let _ = writeln!(out, "{}", error.to_string().red());
        }
        ChatStatus::Ready => {}
    }
    hints(
        out,
        &[
            ("texte", "Écrivez votre argument..."),
            ("/close", "Quitter"),
            ("/copy", "Copier"),
            ("/new", "Nouveau sujet"),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use resonance_core::{error::GenerationError, topic::GroundingSource};

    fn category(phase: Phase) -> Screen {
        Screen::Category {
            category: CategoryId::History,
            phase,
        }
    }

    #[test]
    fn test_home_lists_categories_in_order() {
        let frame = render(&Screen::Home, &[], &[]);
        let history = frame.find("Histoire & Faits").unwrap();
        let random = frame.find("Aléatoire").unwrap();
        assert!(history < random);
    }

    #[test]
    fn test_result_strips_markup_and_lists_sources() {
        let topic = Topic::new(
            CategoryId::History,
            "**Le Grand Incendie**\n\n* Qui est responsable ?".to_string(),
            vec![GroundingSource {
                title: None,
                uri: "https://example.org/feu".to_string(),
            }],
        );
        let frame = render(&category(Phase::Result(topic)), &[], &[]);
        assert!(frame.contains("Le Grand Incendie"));
        assert!(frame.contains("Qui est responsable ?"));
        assert!(!frame.contains("**"));
        assert!(frame.contains("SOURCES VÉRIFIÉES"));
        assert!(frame.contains("https://example.org/feu"));
    }

    #[test]
    fn test_error_and_welcome_frames() {
        let frame = render(
            &category(Phase::Error(GenerationError::unavailable())),
            &[],
            &["Sujet copié dans le presse-papier !".to_string()],
        );
        assert!(frame.contains(GenerationError::UNAVAILABLE));
        assert!(frame.contains("Réessayer"));
        assert!(frame.contains("Sujet copié dans le presse-papier !"));

        let frame = render(&Screen::Welcome, &[], &[]);
        assert!(frame.contains("Commencer l'expérience"));
    }
}
