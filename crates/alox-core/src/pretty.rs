use std::fmt::{self, Formatter};

/// Options shared by the IR and LIR text dumps.
#[derive(Debug, Clone)]
pub struct PrettyOptions {
    pub indent_size: usize,
    /// Annotate values with their inferred type where one is known.
    pub show_types: bool,
    /// Append source locations to declaration headers.
    pub show_locations: bool,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            indent_size: 2,
            show_types: false,
            show_locations: false,
        }
    }
}

impl PrettyOptions {
    pub fn with_types(mut self, show_types: bool) -> Self {
        self.show_types = show_types;
        self
    }

    pub fn with_locations(mut self, show_locations: bool) -> Self {
        self.show_locations = show_locations;
        self
    }
}

pub struct PrettyCtx<'a> {
    pub options: &'a PrettyOptions,
    indent: usize,
}

impl<'a> PrettyCtx<'a> {
    pub fn new(options: &'a PrettyOptions) -> Self {
        Self { options, indent: 0 }
    }

    pub fn writeln(&self, f: &mut Formatter<'_>, line: impl AsRef<str>) -> fmt::Result {
        writeln!(f, "{:indent$}{}", "", line.as_ref(), indent = self.indent)
    }

    pub fn with_indent<F>(&mut self, mut body: F) -> fmt::Result
    where
        F: FnMut(&mut Self) -> fmt::Result,
    {
        self.indent += self.options.indent_size;
        let result = body(self);
        self.indent = self.indent.saturating_sub(self.options.indent_size);
        result
    }
}

pub trait PrettyPrintable {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result;
}

pub struct PrettyDisplay<'a, T> {
    value: &'a T,
    options: PrettyOptions,
}

impl<'a, T> fmt::Display for PrettyDisplay<'a, T>
where
    T: PrettyPrintable,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyCtx::new(&self.options);
        self.value.fmt_pretty(f, &mut ctx)
    }
}

pub fn pretty<T>(value: &T, options: PrettyOptions) -> PrettyDisplay<'_, T>
where
    T: PrettyPrintable,
{
    PrettyDisplay { value, options }
}

pub fn escape_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            ch if ch.is_control() => out.push_str(&format!("\\u{{{:x}}}", ch as u32)),
            _ => out.push(ch),
        }
    }
    out
}
