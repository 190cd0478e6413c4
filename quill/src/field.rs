//! The editable field: logical string, display map, cursor and selection.
//!
//! [`Field`] is the only writer of its state. Every public mutation runs as one
//! transaction:
//!
//! 1. the command mutates text, cursor, selection or mode in logical terms
//! 2. if the text or rules changed, the display map is rebuilt (new generation)
//! 3. cursor and selection are clamped to the new length and moved out of
//!    atomic fragments
//! 4. subscribers are notified once with what changed
//!
//! so an observer never sees a display map older than the text it is reading.
//!
//! # Modes
//!
//! ```text
//!              focus                pointer down / shift+nav
//! Unfocused ----------> Focused ----------------------------> Selecting
//!     ^                  |   ^   pointer up / nav without shift    |
//!     |    focus lost    |   +-------------------------------------+
//!     +------------------+-----------------------------------------+
//! ```
//!
//! Losing focus clears the selection and hides the cursor. Key and paste
//! events are ignored while unfocused.

use crate::{
    diagnostic::Diagnostic,
    display_map::DisplayMap,
    input::{InputEvent, Key, Modifiers},
    matcher::match_rules,
    notation::{self, Marked},
    position::{resolve_hit, to_logical_index, Position, Side},
    rule::RuleSet,
    selection::{Endpoint, Selection},
    surface::{Hit, RenderingSurface},
    text::{self, char_len, filter_single_line},
    word,
};
use std::{borrow::Cow, fmt, mem, ops::Range};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Unfocused,
    Focused,
    Selecting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    fn side(self) -> Side {
        match self {
            Direction::Left => Side::Left,
            Direction::Right => Side::Right,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldOptions {
    /// Strip CR and LF from inserted and pasted text.
    pub single_line: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self { single_line: true }
    }
}

/// Which observable aspects a transaction changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldChange {
    pub text: bool,
    pub rules: bool,
    pub cursor: bool,
    pub selection: bool,
    pub mode: bool,
}

impl FieldChange {
    fn between(before: &Observed, after: &Observed) -> Self {
        Self {
            text: before.revision != after.revision,
            rules: before.rules_revision != after.rules_revision,
            cursor: before.cursor != after.cursor,
            selection: before.selection != after.selection,
            mode: before.mode != after.mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Where the host should draw the caret.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caret {
    pub index: usize,
    /// `None` when the field is empty and there is no fragment to attach to.
    pub position: Option<Position>,
}

type Subscriber = Box<dyn FnMut(&FieldChange, &Field)>;

#[derive(Clone, Copy, PartialEq, Eq)]
struct Observed {
    revision: u64,
    rules_revision: u64,
    cursor: Option<Endpoint>,
    selection: Option<Selection>,
    mode: Mode,
}

pub struct Field {
    text: String,
    len: usize,
    /// Bumped on every text change.
    revision: u64,
    rules: RuleSet,
    rules_revision: u64,
    options: FieldOptions,
    display_map: DisplayMap,
    /// `(revision, rules_revision)` the display map was built from.
    built_for: (u64, u64),
    mode: Mode,
    cursor: Option<Endpoint>,
    selection: Option<Selection>,
    diagnostics: Vec<Diagnostic>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    in_transaction: bool,
}

impl Field {
    pub fn new(text: impl Into<String>, rules: RuleSet) -> Self {
        Self::with_options(text, rules, FieldOptions::default())
    }

    pub fn with_options(text: impl Into<String>, rules: RuleSet, options: FieldOptions) -> Self {
        let text = text.into();
        let mut field = Self {
            len: char_len(&text),
            text,
            revision: 0,
            rules,
            rules_revision: 0,
            options,
            display_map: DisplayMap::empty(0),
            built_for: (0, 0),
            mode: Mode::Unfocused,
            cursor: None,
            selection: None,
            diagnostics: Vec::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
            in_transaction: false,
        };
        field.rebuild();
        field
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in chars; the largest valid cursor index.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn options(&self) -> FieldOptions {
        self.options
    }

    pub fn display_map(&self) -> &DisplayMap {
        &self.display_map
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Cursor index, `None` while unfocused.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor.map(|c| c.index)
    }

    pub fn cursor_endpoint(&self) -> Option<Endpoint> {
        self.cursor
    }

    /// Raw selection, possibly collapsed while a drag is in progress.
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Logical range of a non-empty selection.
    pub fn selection_range(&self) -> Option<Range<usize>> {
        self.selection
            .filter(|s| !s.is_empty())
            .map(|s| s.range())
    }

    /// Selection endpoints as positions in the current display map.
    pub fn selection_positions(&self) -> Option<(Position, Position)> {
        let selection = self.selection?;
        let anchor = self
            .display_map
            .position_at(selection.anchor.index, selection.anchor.side)?;
        let focus = self
            .display_map
            .position_at(selection.focus.index, selection.focus.side)?;
        Some((anchor, focus))
    }

    pub fn caret(&self) -> Option<Caret> {
        let cursor = self.cursor?;
        Some(Caret {
            index: cursor.index,
            position: self.display_map.position_at(cursor.index, cursor.side),
        })
    }

    /// Text with the caret and selection in cursor notation, e.g. `hel|lo`.
    pub fn to_notation(&self) -> String {
        let selection = self.selection_range().map(|range| Marked {
            range,
            cursor_at_start: self.selection.is_some_and(|s| s.is_reversed()),
        });
        notation::format(&self.text, self.cursor(), selection.as_ref())
    }

    /// Range the host should highlight.
    pub fn highlight(&self) -> Option<Range<usize>> {
        self.selection_range()
    }

    /// Drain queued diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        mem::take(&mut self.diagnostics)
    }

    /// Call `subscriber` after every transaction that changes something.
    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(&FieldChange, &Field) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Replace the text from the host side.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.transaction(|field| {
            if field.text == text {
                return;
            }
            field.len = char_len(&text);
            field.text = text;
            field.revision += 1;
        });
    }

    pub fn set_rules(&mut self, rules: RuleSet) {
        self.transaction(|field| {
            field.rules = rules;
            field.rules_revision += 1;
        });
    }

    /// Place or hide the cursor from the host side. Clears the selection.
    pub fn set_cursor(&mut self, index: Option<usize>) {
        self.transaction(|field| {
            field.selection = None;
            field.cursor = index.map(|index| Endpoint::new(field.checked(index), Side::Left));
        });
    }

    /// Select between two logical indices from the host side.
    pub fn select_range(&mut self, anchor: usize, focus: usize) {
        self.transaction(|field| {
            let (anchor, focus) = (field.checked(anchor), field.checked(focus));
            // The lower bound attaches to the char after it, the upper to the one before.
            let (anchor_side, focus_side) = if anchor <= focus {
                (Side::Left, Side::Right)
            } else {
                (Side::Right, Side::Left)
            };
            let focus = Endpoint::new(focus, focus_side);
            field.selection = Some(Selection::new(Endpoint::new(anchor, anchor_side), focus));
            field.cursor = Some(focus);
        });
    }

    pub fn focus(&mut self) {
        self.transaction(|field| {
            if field.mode != Mode::Unfocused {
                return;
            }
            field.set_mode(Mode::Focused);
            if field.cursor.is_none() {
                field.cursor = Some(Endpoint::new(field.len, Side::Right));
            }
        });
    }

    pub fn blur(&mut self) {
        self.transaction(|field| {
            field.set_mode(Mode::Unfocused);
            field.selection = None;
            field.cursor = None;
        });
    }

    /// Move the cursor one char or one word. Without `extend`, a non-empty
    /// selection collapses to its bound in `direction` instead of moving.
    pub fn move_cursor(&mut self, direction: Direction, word: bool, extend: bool) {
        self.transaction(|field| {
            let Some(cursor) = field.cursor else {
                return;
            };
            if !extend {
                if let Some(range) = field.selection_range() {
                    let index = match direction {
                        Direction::Left => range.start,
                        Direction::Right => range.end,
                    };
                    field.place(Endpoint::new(index, direction.side()), false);
                    return;
                }
            }
            let origin = match field.selection {
                Some(selection) if extend => selection.focus.index,
                _ => cursor.index,
            };
            let target = field.step(origin, direction, word);
            field.place(Endpoint::new(target, direction.side()), extend);
        });
    }

    /// Move to the start (`Left`) or end (`Right`) of the text.
    pub fn move_to_edge(&mut self, direction: Direction, extend: bool) {
        self.transaction(|field| {
            if field.cursor.is_none() {
                return;
            }
            let index = match direction {
                Direction::Left => 0,
                Direction::Right => field.len,
            };
            field.place(Endpoint::new(index, direction.side()), extend);
        });
    }

    /// Delete the selection, or one char or word next to the cursor.
    pub fn delete(&mut self, direction: Direction, word: bool) {
        self.transaction(|field| {
            let Some(cursor) = field.cursor else {
                return;
            };
            let range = field.selection_range().unwrap_or_else(|| {
                let i = cursor.index;
                match (direction, word) {
                    (Direction::Left, true) => word::previous_word_start(&field.text, i)..i,
                    (Direction::Left, false) => i.saturating_sub(1)..i,
                    (Direction::Right, true) => i..word::next_word_end(&field.text, i),
                    (Direction::Right, false) => i..(i + 1).min(field.len),
                }
            });
            field.selection = None;
            field.leave_selecting();
            if range.is_empty() {
                return;
            }
            field.replace_range(range.clone(), "");
            field.cursor = Some(Endpoint::new(range.start, Side::Left));
        });
    }

    /// Insert typed or pasted text, replacing the selection if there is one.
    pub fn insert(&mut self, text: &str) {
        let text = if self.options.single_line {
            filter_single_line(text)
        } else {
            Cow::Borrowed(text)
        };
        self.transaction(|field| {
            let Some(cursor) = field.cursor else {
                return;
            };
            let range = field
                .selection_range()
                .unwrap_or(cursor.index..cursor.index);
            field.selection = None;
            field.leave_selecting();
            if text.is_empty() && range.is_empty() {
                return;
            }
            let inserted = field.replace_range(range.clone(), &text);
            field.cursor = Some(Endpoint::new(range.start + inserted, Side::Right));
        });
    }

    /// Select between two positions. The cursor follows `focus`.
    pub fn set_selection(&mut self, anchor: Position, focus: Position) {
        self.transaction(|field| {
            let resolved = (
                to_logical_index(&field.display_map, &anchor),
                to_logical_index(&field.display_map, &focus),
            );
            let (anchor_index, focus_index) = match resolved {
                (Ok(a), Ok(f)) => (a, f),
                (Err(diagnostic), _) | (_, Err(diagnostic)) => {
                    field.report(diagnostic);
                    return;
                },
            };
            let focus = Endpoint::new(focus_index, focus.side);
            field.selection = Some(Selection::new(
                Endpoint::new(anchor_index, anchor.side),
                focus,
            ));
            field.cursor = Some(focus);
        });
    }

    pub fn select_all(&mut self) {
        self.transaction(|field| {
            if field.cursor.is_none() {
                return;
            }
            let focus = Endpoint::new(field.len, Side::Right);
            field.selection = Some(Selection::new(Endpoint::new(0, Side::Left), focus));
            field.cursor = Some(focus);
        });
    }

    /// Drop the selection, leaving the cursor where it is.
    pub fn cancel(&mut self) {
        self.transaction(|field| {
            field.selection = None;
            field.leave_selecting();
        });
    }

    /// Start a pointer selection. Focuses the field if the hit resolves.
    pub fn pointer_down(&mut self, hit: &Hit, surface: &dyn RenderingSurface) {
        self.transaction(|field| {
            let Some(at) = field.resolve(hit, surface) else {
                return;
            };
            field.focus();
            field.selection = Some(Selection::collapsed(at));
            field.cursor = Some(at);
            field.set_mode(Mode::Selecting);
        });
    }

    /// Finish a pointer selection at `hit`.
    pub fn pointer_up(&mut self, hit: &Hit, surface: &dyn RenderingSurface) {
        self.transaction(|field| {
            if field.mode != Mode::Selecting {
                return;
            }
            let Some(focus) = field.resolve(hit, surface) else {
                return;
            };
            let anchor = field.selection.map(|s| s.anchor).unwrap_or(focus);
            field.selection = Some(Selection::new(anchor, focus));
            field.cursor = Some(focus);
            field.set_mode(Mode::Focused);
        });
    }

    pub fn key_press(&mut self, key: Key, modifiers: Modifiers) {
        if self.mode == Mode::Unfocused {
            return;
        }
        match key {
            Key::ArrowLeft => self.move_cursor(Direction::Left, modifiers.ctrl, modifiers.shift),
            Key::ArrowRight => self.move_cursor(Direction::Right, modifiers.ctrl, modifiers.shift),
            Key::Home => self.move_to_edge(Direction::Left, modifiers.shift),
            Key::End => self.move_to_edge(Direction::Right, modifiers.shift),
            Key::Backspace => self.delete(Direction::Left, modifiers.ctrl),
            Key::Delete => self.delete(Direction::Right, modifiers.ctrl),
            Key::Escape => self.cancel(),
            Key::Enter => {},
            Key::Char('a' | 'A') if modifiers.ctrl || modifiers.meta => self.select_all(),
            Key::Char(ch) if !modifiers.is_command() => {
                let mut buf = [0; 4];
                self.insert(ch.encode_utf8(&mut buf));
            },
            Key::Char(_) => {},
        }
    }

    /// Dispatch one input event.
    pub fn handle(&mut self, event: &InputEvent, surface: &dyn RenderingSurface) {
        match event {
            InputEvent::FocusGained => self.focus(),
            InputEvent::FocusLost => self.blur(),
            InputEvent::PointerDown(hit) => self.pointer_down(hit, surface),
            InputEvent::PointerUp(hit) => self.pointer_up(hit, surface),
            InputEvent::KeyPress(key, modifiers) => self.key_press(*key, *modifiers),
            InputEvent::Paste(text) => {
                if self.mode != Mode::Unfocused {
                    self.insert(text);
                }
            },
        }
    }

    fn transaction<R>(&mut self, op: impl FnOnce(&mut Self) -> R) -> R {
        if self.in_transaction {
            return op(self);
        }
        self.in_transaction = true;
        let before = self.observed();
        let result = op(self);
        if self.built_for != (self.revision, self.rules_revision) {
            self.rebuild();
        }
        self.revalidate();
        self.in_transaction = false;

        let change = FieldChange::between(&before, &self.observed());
        if !change.is_empty() {
            self.notify(&change);
        }
        result
    }

    fn observed(&self) -> Observed {
        Observed {
            revision: self.revision,
            rules_revision: self.rules_revision,
            cursor: self.cursor,
            selection: self.selection,
            mode: self.mode,
        }
    }

    fn rebuild(&mut self) {
        let generation = self.display_map.generation() + 1;
        let matches = match_rules(&self.text, &self.rules);
        let (map, diagnostics) =
            DisplayMap::build(&self.text, &matches.spans, &self.rules, generation);
        self.display_map = map;
        self.built_for = (self.revision, self.rules_revision);
        for diagnostic in matches.diagnostics.into_iter().chain(diagnostics) {
            self.report(diagnostic);
        }
    }

    /// Fit endpoints to the current display map. A collapsed selection only
    /// survives while a pointer drag is in progress.
    fn revalidate(&mut self) {
        let map = &self.display_map;
        if let Some(cursor) = &mut self.cursor {
            cursor.fit(map);
        }
        if let Some(selection) = &mut self.selection {
            selection.anchor.fit(map);
            selection.focus.fit(map);
        }
        if self.mode != Mode::Selecting && self.selection.is_some_and(|s| s.is_empty()) {
            self.selection = None;
        }
    }

    fn notify(&mut self, change: &FieldChange) {
        let mut subscribers = mem::take(&mut self.subscribers);
        for (_, subscriber) in &mut subscribers {
            subscriber(change, self);
        }
        self.subscribers = subscribers;
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(%diagnostic, "field diagnostic");
        self.diagnostics.push(diagnostic);
    }

    /// Clamp a host-supplied index, reporting if it was out of range.
    fn checked(&mut self, index: usize) -> usize {
        if index > self.len {
            self.report(Diagnostic::OutOfRangeIndex {
                index,
                len: self.len,
            });
        }
        index.min(self.len)
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::debug!(from = ?self.mode, to = ?mode, "field mode");
            self.mode = mode;
        }
    }

    fn leave_selecting(&mut self) {
        if self.mode == Mode::Selecting {
            self.set_mode(Mode::Focused);
        }
    }

    /// Move the cursor to `focus`, either extending the selection from its
    /// anchor (or the old cursor) or dropping it.
    fn place(&mut self, focus: Endpoint, extend: bool) {
        if extend {
            let anchor = self
                .selection
                .map(|s| s.anchor)
                .or(self.cursor)
                .unwrap_or(focus);
            self.selection = Some(Selection::new(anchor, focus));
            self.set_mode(Mode::Selecting);
        } else {
            self.selection = None;
            self.leave_selecting();
        }
        self.cursor = Some(focus);
    }

    fn step(&self, origin: usize, direction: Direction, word: bool) -> usize {
        let target = match (direction, word) {
            (Direction::Left, true) => word::previous_word_start(&self.text, origin),
            (Direction::Right, true) => word::next_word_end(&self.text, origin),
            (Direction::Left, false) => origin.saturating_sub(1),
            (Direction::Right, false) => (origin + 1).min(self.len),
        };
        self.skip_atomic(target, direction)
    }

    /// An index inside an atomic fragment moves to its edge in `direction`.
    fn skip_atomic(&self, index: usize, direction: Direction) -> usize {
        match self.display_map.fragment_at(index) {
            Some(fragment) if fragment.is_atomic() && fragment.logical_range().start < index => {
                let range = fragment.logical_range();
                match direction {
                    Direction::Left => range.start,
                    Direction::Right => range.end,
                }
            },
            _ => index,
        }
    }

    fn resolve(&mut self, hit: &Hit, surface: &dyn RenderingSurface) -> Option<Endpoint> {
        let resolved = resolve_hit(&self.display_map, hit, surface).and_then(|position| {
            to_logical_index(&self.display_map, &position)
                .map(|index| Endpoint::new(index, position.side))
        });
        match resolved {
            Ok(endpoint) => Some(endpoint),
            Err(diagnostic) => {
                self.report(diagnostic);
                None
            },
        }
    }

    /// Replace a char range of the text, returning the chars inserted.
    fn replace_range(&mut self, range: Range<usize>, insert: &str) -> usize {
        let inserted = text::splice(&mut self.text, range, insert);
        self.len = char_len(&self.text);
        self.revision += 1;
        inserted
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("text", &self.text)
            .field("mode", &self.mode)
            .field("cursor", &self.cursor)
            .field("selection", &self.selection)
            .field("generation", &self.display_map.generation())
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}
