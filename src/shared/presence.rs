/**
 * Presence and Cursor Math
 *
 * Presence entries are ephemeral per-connection records published through the
 * realtime channel. This module turns a presence snapshot into the remote
 * cursors a renderer needs:
 *
 * 1. drop entries that belong to the viewing user
 * 2. clamp each offset into `[0, content length]`
 * 3. map the clamped offset into the rendered text layout
 *
 * Offsets count Unicode scalar values (`char`s), never bytes, so a cursor can
 * not land inside a multi-byte character.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hue used when a cursor has no user id to hash
pub const DEFAULT_HUE: u16 = 200;

/// One participant's presence on a note channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    /// Realtime connection that published this entry
    pub connection_id: Uuid,
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Cursor position in chars
    #[serde(default)]
    pub cursor_offset: usize,
    /// Last-seen timestamp
    pub online_at: DateTime<Utc>,
}

/// Request body for publishing a cursor offset
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackCursorRequest {
    pub cursor_offset: usize,
}

/// Another participant's cursor, ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCursor {
    pub connection_id: Uuid,
    pub user_id: Uuid,
    pub email: Option<String>,
    /// Offset as published; may be stale relative to the local content
    pub cursor_offset: usize,
}

impl RemoteCursor {
    /// Text shown next to the cursor: the email, else the short user id
    pub fn label(&self) -> String {
        match self.email.as_deref() {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => self.user_id.to_string().chars().take(8).collect(),
        }
    }

    /// Stable colour hue in degrees
    pub fn hue(&self) -> u16 {
        user_hue(&self.user_id.to_string())
    }
}

/// Cursors of everyone except `own_user_id`, in snapshot order
pub fn remote_cursors(entries: &[PresenceEntry], own_user_id: Uuid) -> Vec<RemoteCursor> {
    entries
        .iter()
        .filter(|entry| entry.user_id != own_user_id)
        .map(|entry| RemoteCursor {
            connection_id: entry.connection_id,
            user_id: entry.user_id,
            email: entry.email.clone(),
            cursor_offset: entry.cursor_offset,
        })
        .collect()
}

/// Clamp an offset into `[0, chars in content]`
pub fn clamp_offset(offset: usize, content: &str) -> usize {
    offset.min(content.chars().count())
}

/// Hash a user id to a hue in `0..360`
///
/// 31-multiplier string hash over UTF-16 code units with 32-bit wrapping, so
/// every client computes the same colour for the same user.
pub fn user_hue(user_id: &str) -> u16 {
    if user_id.is_empty() {
        return DEFAULT_HUE;
    }
    let hash = user_id
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    (i64::from(hash).abs() % 360) as u16
}

/// Line/column of an offset within a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Offset after clamping
    pub offset: usize,
    /// Zero-based visual line
    pub line: usize,
    /// Zero-based column within the visual line
    pub column: usize,
}

/// Pixel coordinates of a cursor relative to the visible editor box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorCoordinates {
    pub left: f32,
    pub top: f32,
}

/// Fixed-width text layout used to place cursors
///
/// Lines break at `\n` and, when `wrap_columns` is set, after that many
/// characters. Pixel metrics are optional; without them only line/column
/// positions are produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub wrap_columns: Option<usize>,
    pub char_width: f32,
    pub line_height: f32,
    pub padding_left: f32,
    pub padding_top: f32,
    pub scroll_left: f32,
    pub scroll_top: f32,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            wrap_columns: None,
            char_width: 8.0,
            line_height: 20.0,
            padding_left: 0.0,
            padding_top: 0.0,
            scroll_left: 0.0,
            scroll_top: 0.0,
        }
    }
}

impl TextLayout {
    pub fn with_wrap(mut self, columns: usize) -> Self {
        self.wrap_columns = (columns > 0).then_some(columns);
        self
    }

    pub fn with_metrics(mut self, char_width: f32, line_height: f32) -> Self {
        self.char_width = char_width;
        self.line_height = line_height;
        self
    }

    pub fn with_padding(mut self, left: f32, top: f32) -> Self {
        self.padding_left = left;
        self.padding_top = top;
        self
    }

    pub fn with_scroll(mut self, left: f32, top: f32) -> Self {
        self.scroll_left = left;
        self.scroll_top = top;
        self
    }

    /// Map an offset to its visual line and column, clamping first
    pub fn position(&self, content: &str, offset: usize) -> CursorPosition {
        let offset = clamp_offset(offset, content);
        let mut line = 0;
        let mut column = 0;

        for ch in content.chars().take(offset) {
            if ch == '\n' {
                line += 1;
                column = 0;
                continue;
            }
            column += 1;
            if let Some(wrap) = self.wrap_columns {
                if column == wrap {
                    line += 1;
                    column = 0;
                }
            }
        }

        CursorPosition {
            offset,
            line,
            column,
        }
    }

    /// Pixel coordinates of a position after padding and scroll
    pub fn coordinates(&self, position: CursorPosition) -> CursorCoordinates {
        CursorCoordinates {
            left: self.padding_left + position.column as f32 * self.char_width - self.scroll_left,
            top: self.padding_top + position.line as f32 * self.line_height - self.scroll_top,
        }
    }
}

/// A remote cursor placed in a layout
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedCursor {
    pub cursor: RemoteCursor,
    pub position: CursorPosition,
    pub coordinates: CursorCoordinates,
}

/// Place every cursor in `layout`, preserving order
pub fn place_cursors(cursors: &[RemoteCursor], content: &str, layout: &TextLayout) -> Vec<PlacedCursor> {
    cursors
        .iter()
        .map(|cursor| {
            let position = layout.position(content, cursor.cursor_offset);
            PlacedCursor {
                cursor: cursor.clone(),
                position,
                coordinates: layout.coordinates(position),
            }
        })
        .collect()
}
