//! Output rendering for the chat client.
//!
//! This module provides a trait-based rendering abstraction over the
//! projected view, plus the expand/collapse presentation state for code
//! blocks. The default implementation writes to stdout with ANSI styling.

use std::collections::HashMap;
use std::io::{self, Stdout, Write};

use crate::parse::{CodeBlock, ContentSegment, InlineSpan};
use crate::types::Connectivity;

/// ANSI escape code for bold text (used for strong emphasis).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for code block bodies).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for code block headers).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for status lines).
const ANSI_YELLOW: &str = "\x1b[33m";

/// Expand/collapse state for code blocks, keyed by block id.
///
/// This is presentation state, not part of the conversation data model: it
/// lives for the lifetime of the rendered view and can be reset wholesale.
/// A block with no explicit override follows its `collapsed_by_default`.
#[derive(Debug, Default)]
pub struct CollapseState {
    overrides: HashMap<String, bool>,
}

impl CollapseState {
    /// Creates an empty state; every block follows its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the block should render expanded.
    pub fn is_expanded(&self, block: &CodeBlock) -> bool {
        self.overrides
            .get(&block.block_id)
            .copied()
            .unwrap_or(!block.collapsed_by_default)
    }

    /// Flips the block's effective state.
    pub fn toggle(&mut self, block: &CodeBlock) {
        let expanded = self.is_expanded(block);
        self.overrides.insert(block.block_id.clone(), !expanded);
    }

    /// Marks a block expanded by id.
    pub fn expand(&mut self, block_id: &str) {
        self.overrides.insert(block_id.to_string(), true);
    }

    /// Marks a block collapsed by id.
    pub fn collapse(&mut self, block_id: &str) {
        self.overrides.insert(block_id.to_string(), false);
    }

    /// Drops all overrides, as on a view remount.
    pub fn reset(&mut self) {
        self.overrides.clear();
    }
}

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies: plain text
/// with ANSI styling, plain text for piping, or a TUI.
pub trait Renderer: Send {
    /// Print one user message.
    fn print_user(&mut self, content: &str);

    /// Print one assistant message as parsed segments.
    fn print_assistant(&mut self, segments: &[ContentSegment], collapse: &CollapseState);

    /// Print the transient typing indicator.
    fn print_typing(&mut self);

    /// Print the connectivity phase and input placeholder.
    fn print_status(&mut self, connectivity: Connectivity, placeholder: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            use_color: true,
        }
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn print_spans(&mut self, spans: &[InlineSpan]) {
        for span in spans {
            match span {
                InlineSpan::Plain(text) => print!("{text}"),
                InlineSpan::Strong(text) => {
                    if self.use_color {
                        print!("{ANSI_BOLD}{text}{ANSI_RESET}");
                    } else {
                        print!("{text}");
                    }
                }
                InlineSpan::LineBreak => println!(),
            }
        }
    }

    fn print_code(&mut self, block: &CodeBlock, collapse: &CollapseState) {
        if self.use_color {
            println!("{ANSI_CYAN}[{} #{}]{ANSI_RESET}", block.language, block.block_id);
        } else {
            println!("[{} #{}]", block.language, block.block_id);
        }
        if collapse.is_expanded(block) {
            if self.use_color {
                print!("{ANSI_DIM}");
            }
            for line in &block.lines {
                println!("{line}");
            }
            if self.use_color {
                print!("{ANSI_RESET}");
            }
        } else {
            println!(
                "({} lines hidden; /expand {} to show)",
                block.lines.len(),
                block.block_id
            );
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_user(&mut self, content: &str) {
        println!("You: {content}");
        self.flush();
    }

    fn print_assistant(&mut self, segments: &[ContentSegment], collapse: &CollapseState) {
        for segment in segments {
            match segment {
                ContentSegment::Text(text) => self.print_spans(&text.spans),
                ContentSegment::Code(block) => {
                    println!();
                    self.print_code(block, collapse);
                }
            }
        }
        println!();
        self.flush();
    }

    fn print_typing(&mut self) {
        if self.use_color {
            println!("{ANSI_DIM}...{ANSI_RESET}");
        } else {
            println!("...");
        }
        self.flush();
    }

    fn print_status(&mut self, connectivity: Connectivity, placeholder: &str) {
        if self.use_color {
            println!("{ANSI_YELLOW}[{connectivity}]{ANSI_RESET} {placeholder}");
        } else {
            println!("[{connectivity}] {placeholder}");
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        eprintln!("\nError: {error}");
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, lines: usize) -> CodeBlock {
        CodeBlock {
            language: "text".to_string(),
            lines: vec!["l".to_string(); lines],
            block_id: id.to_string(),
            collapsed_by_default: lines > crate::parse::COLLAPSE_THRESHOLD,
        }
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn collapse_defaults_follow_block() {
        let state = CollapseState::new();
        assert!(state.is_expanded(&block("0-0", 3)));
        assert!(!state.is_expanded(&block("0-1", 20)));
    }

    #[test]
    fn toggle_flips_effective_state() {
        let long = block("0-0", 20);
        let mut state = CollapseState::new();

        state.toggle(&long);
        assert!(state.is_expanded(&long));
        state.toggle(&long);
        assert!(!state.is_expanded(&long));
    }

    #[test]
    fn overrides_survive_rerender_and_reset_clears() {
        let long = block("2-0", 20);
        let mut state = CollapseState::new();

        state.expand("2-0");
        assert!(state.is_expanded(&long));

        // The same block id parsed again maps to the same state.
        let reparsed = block("2-0", 20);
        assert!(state.is_expanded(&reparsed));

        state.reset();
        assert!(!state.is_expanded(&long));
    }

    #[test]
    fn collapse_by_id() {
        let short = block("1-0", 2);
        let mut state = CollapseState::new();
        state.collapse("1-0");
        assert!(!state.is_expanded(&short));
    }
}
