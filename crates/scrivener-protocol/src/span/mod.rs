//! Balanced-brace scanning over free-form text.
//!
//! Worker output may mix diagnostics with the response envelope. The scanner
//! yields every top-level `{...}` span in order of appearance, tracking JSON
//! string literals so that braces inside strings do not unbalance the count.
//! Spans that never close are skipped and scanning resumes after their
//! opening brace. A consumer that rejects a span can call
//! [`ObjectSpans::descend`] to visit the objects nested inside it.

/// Iterator over balanced `{...}` spans in a string.
///
/// # Example
///
/// ```
/// use scrivener_protocol::span::object_spans;
///
/// let text = r#"warming up {not json} {"a":"}"} done"#;
/// let spans: Vec<&str> = object_spans(text).collect();
/// assert_eq!(spans, vec!["{not json}", r#"{"a":"}"}"#]);
/// ```
#[derive(Debug, Clone)]
pub struct ObjectSpans<'a> {
    text: &'a str,
    cursor: usize,
    last_start: Option<usize>,
}

/// Returns an iterator over the balanced `{...}` spans of `text`.
#[must_use]
pub const fn object_spans(text: &str) -> ObjectSpans<'_> {
    ObjectSpans {
        text,
        cursor: 0,
        last_start: None,
    }
}

impl ObjectSpans<'_> {
    /// Moves the scan back inside the most recently yielded span.
    ///
    /// The next call to `next` then yields the first object nested in that
    /// span rather than the one following it. Does nothing before the first
    /// span has been yielded.
    ///
    /// ```
    /// use scrivener_protocol::span::object_spans;
    ///
    /// let mut spans = object_spans("begin { {\"a\":1} } end");
    /// assert_eq!(spans.next(), Some("{ {\"a\":1} }"));
    /// spans.descend();
    /// assert_eq!(spans.next(), Some("{\"a\":1}"));
    /// ```
    pub const fn descend(&mut self) {
        if let Some(start) = self.last_start.take() {
            self.cursor = start + 1;
        }
    }
}

impl<'a> Iterator for ObjectSpans<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = self.text.get(self.cursor..)?;
            let offset = rest.find('{')?;
            let start = self.cursor + offset;
            let tail = self.text.get(start..)?;
            match balanced_len(tail) {
                Some(len) => {
                    self.cursor = start + len;
                    self.last_start = Some(start);
                    return self.text.get(start..start + len);
                }
                None => self.cursor = start + 1,
            }
        }
    }
}

/// Returns the byte length of the balanced span opening at the start of
/// `text`, or `None` when it never closes.
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;
    for (index, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }
    None
}
