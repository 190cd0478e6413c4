//! Editing core for a single-line text field whose text is drawn through
//! decoration rules.
//!
//! The field keeps one plain logical string. Rules match parts of it and say
//! how each match is drawn; the [`DisplayMap`] is the resulting list of
//! addressable fragments. Editing always happens on the logical string, and
//! pointer hits on drawn fragments resolve back to logical indices through the
//! [`position`] functions.
//!
//! ```text
//! text + rules --match_rules--> spans --DisplayMap::build--> fragments
//!      ^                                                          |
//!      |                                              RenderingSurface
//!      +---- Field (move, delete, insert) <---- resolve_hit <-----+
//! ```
//!
//! Each [`Field`] owns its own state and listeners. Nothing is global.

pub mod diagnostic;
pub mod display_map;
mod error;
pub mod field;
pub mod input;
pub mod key_notation;
pub mod matcher;
pub mod notation;
pub mod position;
pub mod rule;
pub mod selection;
pub mod surface;
pub mod text;
pub mod word;


pub use diagnostic::Diagnostic;
pub use display_map::{DisplayMap, Fragment, FragmentId, FragmentKind};
pub use error::{Error, Result};
pub use field::{Caret, Direction, Field, FieldChange, FieldOptions, Mode, SubscriptionId};
pub use input::{InputEvent, Key, Modifiers};
pub use matcher::{match_rules, Match, Matches, Span};
pub use position::{resolve_hit, to_logical_index, Position, Side};
pub use rule::{Decoration, Found, Pattern, Rule, RuleSet};
pub use selection::{Endpoint, Selection};
pub use surface::{Hit, MonospaceSurface, Rect, RenderingSurface};
