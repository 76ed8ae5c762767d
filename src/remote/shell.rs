//! Shell quoting and command template rendering.

/// Quote a value for POSIX shells
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// A command template with `{placeholder}` substitution.
///
/// Values added with [`quoted`](Self::quoted) are shell-quoted; [`raw`](Self::raw)
/// values are inserted verbatim and must already be shell-safe.
#[derive(Debug, Clone)]
pub struct Template<'a> {
    text: &'a str,
    values: Vec<(&'a str, String)>,
}

impl<'a> Template<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            values: Vec::new(),
        }
    }

    pub fn quoted(mut self, key: &'a str, value: &str) -> Self {
        self.values.push((key, shell_quote(value)));
        self
    }

    pub fn raw(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.values.push((key, value.into()));
        self
    }

    /// Substitute every known placeholder; unknown placeholders are left untouched
    ///
    /// Substituted values are never scanned again.
    pub fn render(&self) -> String {
        let mut rendered = String::with_capacity(self.text.len());
        let mut rest = self.text;
        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let key = &after[..close];
                self.values
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| (value, close))
            });
            match value {
                Some((value, close)) => {
                    rendered.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    rendered.push('{');
                    rest = after;
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

/// Render `template` with every value shell-quoted
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(Template::new(template), |template, (key, value)| {
            template.quoted(key, value)
        })
        .render()
}
