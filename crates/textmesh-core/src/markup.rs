//! Inline markup expansion: raw strings become styled pages
//!
//! A localized string cell is plain text with inline tags. A tag opens
//! with `[#` and runs to the next `]`; a literal `[` immediately before
//! the opener escapes it, so `[[#` comes out as a plain `[#`. Three tag
//! forms exist:
//!
//! - `[#- name]` pushes the named style, `[#- ]` pops back to the
//!   previous one. Each push or pop seals the current style run, so the
//!   runs of a page always tile its text exactly.
//! - `[#.]` ends the current page. The last page ends implicitly.
//! - `[#label]` opens a named annotation range, `[#/]` closes the most
//!   recently opened one.
//!
//! Tags contribute nothing to the output text; every offset recorded
//! here is a byte offset into the stripped plain-text buffer. Style
//! state survives page breaks; runs and annotations are per page.
//!
//! Two malformed-input cases are deliberately forgiven rather than
//! fatal, each with a logged warning: a style name that matches nothing
//! leaves the current style as it was, and an annotation still open at a
//! page boundary is dropped.

use log::warn;

use crate::arena::Arena;
use crate::types::{MarkupPage, Style, StyleRun, TypesetGlyph, UserTag};

/// Expand one language's raw string into pages.
pub fn expand(source: &str, styles: &[Style]) -> Vec<MarkupPage> {
    Expander::new(styles).run(source)
}

struct Expander<'a> {
    styles: &'a [Style],
    pages: Vec<MarkupPage>,
    text: String,
    runs: Vec<StyleRun>,
    run_start: u32,
    cur_style: usize,
    style_stack: Arena<usize>,
    open_tags: Arena<UserTag>,
    tags: Vec<UserTag>,
}

impl<'a> Expander<'a> {
    fn new(styles: &'a [Style]) -> Self {
        Self {
            styles,
            pages: Vec::new(),
            text: String::new(),
            runs: Vec::new(),
            run_start: 0,
            cur_style: 0,
            style_stack: Arena::new(),
            open_tags: Arena::new(),
            tags: Vec::new(),
        }
    }

    fn run(mut self, source: &str) -> Vec<MarkupPage> {
        // Byte index where the current tag body starts, if inside a tag.
        let mut tag_body: Option<(usize, bool)> = None;
        let mut prev: Option<char> = None;
        let mut iter = source.char_indices().peekable();

        while let Some((idx, c)) = iter.next() {
            if let Some((body_start, is_style)) = tag_body {
                if c == ']' {
                    self.handle_tag(&source[body_start..idx], is_style);
                    tag_body = None;
                }
                // Body characters are consumed when the tag closes.
            } else if c == '[' && matches!(iter.peek(), Some(&(_, '#'))) {
                if prev == Some('[') {
                    // '[[#': the preceding literal '[' already went to
                    // the output; drop this one so the pair collapses to
                    // a plain '[#'.
                } else {
                    let Some((hash_idx, _)) = iter.next() else {
                        break;
                    };
                    if let Some(&(dash_idx, '-')) = iter.peek() {
                        iter.next();
                        tag_body = Some((dash_idx + 1, true));
                    } else {
                        tag_body = Some((hash_idx + 1, false));
                    }
                }
            } else {
                self.text.push(c);
            }
            prev = Some(c);
        }

        if tag_body.is_some() {
            warn!("unterminated markup tag at end of string; dropped");
        }
        self.finish_page();
        self.pages
    }

    fn handle_tag(&mut self, body: &str, is_style: bool) {
        if is_style {
            self.close_run();
            let name = body.trim_start_matches(' ');
            if name.is_empty() {
                if let Some(prev_style) = self.style_stack.pop() {
                    self.cur_style = prev_style;
                }
            } else if let Some(idx) = self.styles.iter().position(|s| s.name == name) {
                self.style_stack.push(self.cur_style);
                self.cur_style = idx;
            } else {
                warn!("unknown style '{name}' in markup tag; style unchanged");
            }
        } else if body == "." {
            self.finish_page();
        } else if body == "/" {
            match self.open_tags.pop() {
                Some(mut tag) => {
                    tag.end = self.text.len() as u32;
                    self.tags.push(tag);
                }
                None => warn!("annotation close tag without an open annotation"),
            }
        } else if body.is_empty() {
            warn!("empty markup tag ignored");
        } else {
            self.open_tags.push(UserTag {
                label: body.to_string(),
                start: self.text.len() as u32,
                end: 0,
            });
        }
    }

    /// Seal the current style run at the present output length.
    fn close_run(&mut self) {
        let end = self.text.len() as u32;
        if end > self.run_start {
            self.runs.push(StyleRun {
                start: self.run_start,
                end,
                style: self.cur_style,
            });
        }
        self.run_start = end;
    }

    fn finish_page(&mut self) {
        self.close_run();
        while let Some(tag) = self.open_tags.pop() {
            warn!("annotation '{}' still open at page boundary; dropped", tag.label);
        }
        self.pages.push(MarkupPage {
            text: std::mem::take(&mut self.text),
            runs: std::mem::take(&mut self.runs),
            tags: std::mem::take(&mut self.tags),
        });
        self.run_start = 0;
    }
}

/// Build the text-offset to glyph-index table for one shaped page.
///
/// Shaping may merge offsets or skip invisible glyphs, so not every text
/// offset starts a glyph. Offsets that do get that glyph's array index
/// (the last glyph wins when several share an offset); every other slot
/// carries forward the nearest preceding assigned index, never a
/// following one. The table has `text_len + 1` entries so a range ending
/// exactly at the end of the text still resolves.
///
/// `glyphs` must already be sorted by source offset; the resulting table
/// is then monotonic non-decreasing.
pub fn glyph_index_map(text_len: usize, glyphs: &[TypesetGlyph]) -> Vec<u32> {
    let mut map = vec![u32::MAX; text_len + 1];
    for (i, glyph) in glyphs.iter().enumerate() {
        if let Some(slot) = map.get_mut(glyph.source_offset as usize) {
            *slot = i as u32;
        }
    }
    let mut prev = 0;
    for slot in &mut map {
        if *slot == u32::MAX {
            *slot = prev;
        } else {
            prev = *slot;
        }
    }
    map
}

/// Rewrite tag ranges from text offsets to glyph-array indices.
pub fn remap_tags(tags: &mut [UserTag], map: &[u32]) {
    for tag in tags {
        tag.start = map[tag.start as usize];
        tag.end = map[tag.end as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GlyphKey, Quad};

    fn styles() -> Vec<Style> {
        ["default", "bold", "title"]
            .into_iter()
            .map(|name| Style {
                name: name.to_string(),
                face: "SomeFace".to_string(),
                point_size: 24,
                line_height: 1.2,
            })
            .collect()
    }

    fn assert_tiles(page: &MarkupPage) {
        let mut cursor = 0;
        for run in &page.runs {
            assert_eq!(run.start, cursor, "gap or overlap before run {run:?}");
            assert!(run.end > run.start, "empty run {run:?}");
            cursor = run.end;
        }
        assert_eq!(cursor as usize, page.text.len(), "runs do not cover the text");
    }

    #[test]
    fn plain_text_is_one_default_page() {
        let pages = expand("Hello", &styles());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "Hello");
        assert_eq!(pages[0].runs, vec![StyleRun { start: 0, end: 5, style: 0 }]);
        assert!(pages[0].tags.is_empty());
    }

    #[test]
    fn empty_string_is_one_empty_page() {
        let pages = expand("", &styles());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].text.is_empty());
        assert!(pages[0].runs.is_empty());
    }

    #[test]
    fn style_push_and_pop_tile_the_text() {
        let pages = expand("Hello[#- bold]world[#- ]!", &styles());
        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!(page.text, "Helloworld!");
        assert_eq!(
            page.runs,
            vec![
                StyleRun { start: 0, end: 5, style: 0 },
                StyleRun { start: 5, end: 10, style: 1 },
                StyleRun { start: 10, end: 11, style: 0 },
            ]
        );
        assert_tiles(page);
    }

    #[test]
    fn greet_string_expands_to_two_pages() {
        let pages = expand("Hello[#- bold]world[#- ][#.]Page2", &styles());
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text, "Helloworld");
        assert_eq!(
            pages[0].runs,
            vec![
                StyleRun { start: 0, end: 5, style: 0 },
                StyleRun { start: 5, end: 10, style: 1 },
            ]
        );
        assert_eq!(pages[1].text, "Page2");
        assert_eq!(pages[1].runs, vec![StyleRun { start: 0, end: 5, style: 0 }]);
        assert!(pages[0].tags.is_empty() && pages[1].tags.is_empty());
    }

    #[test]
    fn style_state_survives_page_breaks() {
        let pages = expand("[#- bold]one[#.]two", &styles());
        assert_eq!(pages[1].runs, vec![StyleRun { start: 0, end: 3, style: 1 }]);
    }

    #[test]
    fn nested_styles_unwind_in_order() {
        let pages = expand("a[#- bold]b[#- title]c[#- ]d[#- ]e", &styles());
        let style_seq: Vec<usize> = pages[0].runs.iter().map(|r| r.style).collect();
        assert_eq!(style_seq, vec![0, 1, 2, 1, 0]);
        assert_tiles(&pages[0]);
    }

    #[test]
    fn unknown_style_leaves_current_style() {
        let pages = expand("ab[#- nosuch]cd", &styles());
        assert_eq!(
            pages[0].runs,
            vec![
                StyleRun { start: 0, end: 2, style: 0 },
                StyleRun { start: 2, end: 4, style: 0 },
            ]
        );
    }

    #[test]
    fn pop_on_empty_stack_keeps_default() {
        let pages = expand("a[#- ]b", &styles());
        for run in &pages[0].runs {
            assert_eq!(run.style, 0);
        }
    }

    #[test]
    fn user_tags_record_output_offsets() {
        let pages = expand("ab[#link]cd[#/]ef", &styles());
        assert_eq!(pages[0].text, "abcdef");
        assert_eq!(
            pages[0].tags,
            vec![UserTag { label: "link".into(), start: 2, end: 4 }]
        );
    }

    #[test]
    fn nested_tags_close_innermost_first() {
        let pages = expand("[#outer]a[#inner]b[#/]c[#/]", &styles());
        assert_eq!(
            pages[0].tags,
            vec![
                UserTag { label: "inner".into(), start: 1, end: 2 },
                UserTag { label: "outer".into(), start: 0, end: 3 },
            ]
        );
    }

    #[test]
    fn tag_balance_per_page() {
        let pages = expand("[#a]x[#/][#b]y[#/][#.][#c]z[#/]", &styles());
        assert_eq!(pages[0].tags.len(), 2);
        assert_eq!(pages[1].tags.len(), 1);
    }

    #[test]
    fn unterminated_tag_dropped_at_page_boundary() {
        let pages = expand("[#open]abc[#.]def", &styles());
        assert!(pages[0].tags.is_empty());
        assert!(pages[1].tags.is_empty());
    }

    #[test]
    fn escape_produces_literal_open_sequence() {
        let pages = expand("a[[#b", &styles());
        assert_eq!(pages[0].text, "a[#b");
        let pages = expand("[[[#", &styles());
        assert_eq!(pages[0].text, "[[#");
    }

    #[test]
    fn lone_bracket_is_plain_text() {
        let pages = expand("a[b]c", &styles());
        assert_eq!(pages[0].text, "a[b]c");
    }

    #[test]
    fn trailing_page_break_yields_empty_final_page() {
        let pages = expand("one[#.]", &styles());
        assert_eq!(pages.len(), 2);
        assert!(pages[1].text.is_empty());
    }

    #[test]
    fn unterminated_tag_body_is_dropped() {
        let pages = expand("ab[#oops", &styles());
        assert_eq!(pages[0].text, "ab");
        assert!(pages[0].tags.is_empty());
    }

    #[test]
    fn multibyte_text_keeps_byte_offsets() {
        let pages = expand("héllo[#- bold]wörld[#- ]", &styles());
        let page = &pages[0];
        assert_eq!(page.text, "héllowörld");
        // 'é' and 'ö' are two bytes each in UTF-8.
        assert_eq!(
            page.runs,
            vec![
                StyleRun { start: 0, end: 6, style: 0 },
                StyleRun { start: 6, end: 12, style: 1 },
            ]
        );
    }

    fn typeset(offsets: &[u32]) -> Vec<TypesetGlyph> {
        offsets
            .iter()
            .map(|&source_offset| TypesetGlyph {
                source_offset,
                key: GlyphKey::new("f", source_offset),
                quad: Quad::default(),
            })
            .collect()
    }

    #[test]
    fn index_map_carries_forward_previous_glyph() {
        // Text "a bc": offsets 0, 2, 3 produce glyphs; the space at 1
        // does not.
        let map = glyph_index_map(4, &typeset(&[0, 2, 3]));
        assert_eq!(map, vec![0, 0, 1, 2, 2]);
    }

    #[test]
    fn index_map_is_monotonic() {
        let map = glyph_index_map(6, &typeset(&[1, 4]));
        for pair in map.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn index_map_last_writer_wins_on_shared_offset() {
        let mut glyphs = typeset(&[0, 0, 2]);
        glyphs[1].key = GlyphKey::new("f", 99);
        let map = glyph_index_map(2, &glyphs);
        assert_eq!(map[0], 1);
    }

    #[test]
    fn remap_resolves_range_ends_at_text_end() {
        let map = glyph_index_map(3, &typeset(&[0, 1, 2]));
        let mut tags = vec![UserTag { label: "t".into(), start: 1, end: 3 }];
        remap_tags(&mut tags, &map);
        assert_eq!(tags[0].start, 1);
        assert_eq!(tags[0].end, 2);
    }
}
