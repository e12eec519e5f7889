use super::shaper::ShapedText;

/// A range of glyphs that fits on one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineBreak {
    pub start: usize,
    pub end: usize,
    pub width: f32,
}

/// Greedy line breaking over shaped glyphs.
///
/// Lines break at spaces when possible; a word wider than `max_width` is split
/// between glyphs. A newline always ends the line. The space a line breaks at is
/// dropped. Always yields at least one (possibly empty) line.
pub fn break_lines(shaped: &ShapedText, text: &str, max_width: f32) -> Vec<LineBreak> {
    let glyphs = &shaped.glyphs;
    let char_at = |cluster: usize| text.get(cluster..).and_then(|s| s.chars().next());

    let mut lines = Vec::new();
    let mut start = 0;
    let mut width = 0.0f32;
    // Index of the last space on the current line and the line width before it.
    let mut last_space: Option<(usize, f32)> = None;
    let mut i = 0;

    while i < glyphs.len() {
        let advance = glyphs[i].x_advance;
        match char_at(glyphs[i].cluster) {
            Some('\n') => {
                lines.push(LineBreak { start, end: i, width });
                start = i + 1;
                width = 0.0;
                last_space = None;
                i += 1;
                continue;
            }
            Some(' ') => {
                last_space = Some((i, width));
                width += advance;
                i += 1;
                continue;
            }
            _ => {}
        }

        if width + advance > max_width && i > start {
            match last_space.take() {
                Some((space, before)) if space > start => {
                    lines.push(LineBreak {
                        start,
                        end: space,
                        width: before,
                    });
                    start = space + 1;
                    width = glyphs[start..i].iter().map(|g| g.x_advance).sum();
                }
                _ => {
                    lines.push(LineBreak { start, end: i, width });
                    start = i;
                    width = 0.0;
                }
            }
            continue;
        }

        width += advance;
        i += 1;
    }

    lines.push(LineBreak {
        start,
        end: glyphs.len(),
        width,
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::shaper::shape;

    fn words(text: &str, lines: &[LineBreak]) -> Vec<String> {
        // Fallback shaping maps glyph i to char i.
        let chars: Vec<char> = text.chars().collect();
        lines
            .iter()
            .map(|l| chars[l.start..l.end].iter().collect())
            .collect()
    }

    #[test]
    fn wraps_at_spaces() {
        let text = "aaa bbb ccc";
        // 11px fallback glyphs at size 20
        let shaped = shape(text, None, 20.0);
        let lines = break_lines(&shaped, text, 80.0);
        assert_eq!(words(text, &lines), vec!["aaa bbb", "ccc"]);
        assert!((lines[0].width - 77.0).abs() < 1e-3);
    }

    #[test]
    fn splits_words_longer_than_the_line() {
        let text = "abcdefgh";
        let shaped = shape(text, None, 20.0);
        let lines = break_lines(&shaped, text, 35.0);
        assert_eq!(words(text, &lines), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn newline_forces_a_break() {
        let text = "ab\ncd";
        let shaped = shape(text, None, 10.0);
        let lines = break_lines(&shaped, text, 1000.0);
        assert_eq!(words(text, &lines), vec!["ab", "cd"]);
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        let shaped = shape("", None, 10.0);
        let lines = break_lines(&shaped, "", 100.0);
        assert_eq!(lines, vec![LineBreak { start: 0, end: 0, width: 0.0 }]);
    }
}
