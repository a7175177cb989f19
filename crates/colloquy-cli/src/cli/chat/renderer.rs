//! Terminal rendering of replies.
//!
//! Replies are rendered as markdown through termimad. The typewriter
//! reveal replays the skin's finished output character by character, so
//! the text on screen after the reveal is the same styled text `history`
//! shows.

use std::io::Write;

use termimad::MadSkin;

use colloquy_core::render::{RenderEvent, Typewriter};

/// Terminal markdown renderer.
pub struct ChatRenderer {
    skin: MadSkin,
}

impl ChatRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default_dark();
        skin.inline_code
            .set_fg(termimad::crossterm::style::Color::Yellow);
        skin.bold.set_fg(termimad::crossterm::style::Color::Cyan);

        Self { skin }
    }

    /// Render a complete markdown reply.
    pub fn render_final(&self, markdown: &str) -> String {
        format!("{}", self.skin.term_text(markdown))
    }

    /// Replay `text` through the typewriter, printing each newly revealed
    /// character as it arrives. The text is rendered through the skin
    /// first, so what is revealed is the final styled output.
    pub async fn reveal(&self, typewriter: &Typewriter, text: &str) {
        let rendered = self.render_final(text);
        let mut handle = typewriter.render(rendered.trim_end().to_string());
        let mut shown = 0usize;
        while let Some(event) = handle.next_event().await {
            match event {
                RenderEvent::Tick(prefix) => {
                    print!("{}", &prefix[shown..]);
                    let _ = std::io::stdout().flush();
                    shown = prefix.len();
                }
                RenderEvent::Done => break,
            }
        }
        println!();
    }
}

impl Default for ChatRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_final_consumes_markdown_markers() {
        let renderer = ChatRenderer::new();
        let out = renderer.render_final("some **bold** and `code`");
        assert!(out.contains("bold"));
        assert!(out.contains("code"));
        assert!(!out.contains("**"));
        assert!(!out.contains('`'));
    }
}
